pub mod auth;
pub mod database;
pub mod error;
pub mod handlers;
pub mod market;
pub mod query;
pub mod report;
