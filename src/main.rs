// region:    --- Imports
use crate::database::DatabaseManager;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auth;
mod database;
mod error;
mod handlers;
mod market;
mod query;
mod report;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        // 계정
        .route("/register", post(handlers::handle_register))
        .route("/authorize", post(handlers::handle_authorize))
        .route(
            "/profile",
            put(handlers::handle_update_profile).delete(handlers::handle_delete_account),
        )
        // 아이템
        .route("/items", post(handlers::handle_create_item))
        .route("/items/:id", delete(handlers::handle_delete_item))
        .route("/items/:id/market", put(handlers::handle_set_visibility))
        .route("/items/:id/buy", post(handlers::handle_purchase))
        // 판매
        .route("/sales/pending", get(handlers::handle_get_pending_sales))
        .route("/sales/report", get(handlers::handle_get_sales_report))
        .route(
            "/sales/report/summary",
            get(handlers::handle_get_report_summary),
        )
        .route("/sales/:id/confirm", post(handlers::handle_confirm_sale))
        .route("/sales/:id/ignore", post(handlers::handle_ignore_sale))
        // 조회
        .route("/market", get(handlers::handle_get_market))
        .route("/inventory", get(handlers::handle_get_inventory))
        .route("/on-sale", get(handlers::handle_get_on_sale))
        .route("/orders", get(handlers::handle_get_orders))
        .route("/search/:query", get(handlers::handle_search))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20))
        .with_state(db_manager);

    // 리스너 생성 (기본 0.0.0.0:3000, BIND_ADDR로 변경 가능)
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
