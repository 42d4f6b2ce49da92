// region:    --- Imports
use crate::auth::{self, AuthUser, AuthorizeCommand, RegisterCommand, UpdateProfileCommand};
use crate::database::DatabaseManager;
use crate::error::MarketError;
use crate::market::commands::{
    self, CreateItemCommand, PurchaseCommand, SetVisibilityCommand,
};
use crate::market::model::{MarketItem, SaleDetails, User, VirtualItem};
use crate::query;
use crate::report;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Account Handlers

/// 가입 요청 처리
pub async fn handle_register(
    State(db_manager): State<Arc<DatabaseManager>>,
    Json(cmd): Json<RegisterCommand>,
) -> Result<(StatusCode, Json<User>), MarketError> {
    info!("{:<12} --> 가입 요청: {}", "Handler", cmd.email);
    let user = auth::handle_register(cmd, &db_manager).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// 자격 증명 확인 요청 처리
pub async fn handle_authorize(
    State(db_manager): State<Arc<DatabaseManager>>,
    Json(cmd): Json<AuthorizeCommand>,
) -> Result<Json<User>, MarketError> {
    info!("{:<12} --> 자격 증명 확인 요청: {}", "Handler", cmd.email);
    let user = auth::handle_authorize(cmd, &db_manager).await?;
    Ok(Json(user))
}

/// 프로필 수정 요청 처리
pub async fn handle_update_profile(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
    Json(cmd): Json<UpdateProfileCommand>,
) -> Result<Json<User>, MarketError> {
    info!("{:<12} --> 프로필 수정 요청 user: {}", "Handler", user.id);
    let updated = auth::handle_update_profile(user.id, cmd, &db_manager).await?;
    Ok(Json(updated))
}

/// 계정 삭제 요청 처리
pub async fn handle_delete_account(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
) -> Result<Json<serde_json::Value>, MarketError> {
    info!("{:<12} --> 계정 삭제 요청 user: {}", "Handler", user.id);
    auth::handle_delete_account(user.id, &db_manager).await?;
    Ok(Json(serde_json::json!({
        "message": "계정이 삭제되었습니다."
    })))
}

// endregion: --- Account Handlers

// region:    --- Command Handlers

/// 아이템 등록 요청 처리
pub async fn handle_create_item(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
    Json(cmd): Json<CreateItemCommand>,
) -> Result<(StatusCode, Json<VirtualItem>), MarketError> {
    info!("{:<12} --> 아이템 등록 요청 처리 시작: {:?}", "Handler", cmd);
    let item = commands::handle_create_item(cmd, user.id, &db_manager).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// 아이템 삭제 요청 처리
pub async fn handle_delete_item(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<i64>,
) -> Result<Json<serde_json::Value>, MarketError> {
    info!("{:<12} --> 아이템 삭제 요청 id: {}", "Handler", item_id);
    commands::handle_delete_item(item_id, user.id, &db_manager).await?;
    Ok(Json(serde_json::json!({
        "message": "아이템이 삭제되었습니다."
    })))
}

/// 마켓 노출 변경 요청 처리
pub async fn handle_set_visibility(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<i64>,
    Json(cmd): Json<SetVisibilityCommand>,
) -> Result<Json<VirtualItem>, MarketError> {
    info!(
        "{:<12} --> 마켓 노출 변경 요청 id: {}, in_market: {}",
        "Handler", item_id, cmd.in_market
    );
    let item = commands::handle_set_visibility(item_id, user.id, cmd, &db_manager).await?;
    Ok(Json(item))
}

/// 구매 요청 처리
pub async fn handle_purchase(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<i64>,
    Json(cmd): Json<PurchaseCommand>,
) -> Result<Json<serde_json::Value>, MarketError> {
    info!(
        "{:<12} --> 구매 요청 처리 시작 id: {}, buyer: {}",
        "Handler", item_id, user.id
    );
    let sale = commands::handle_purchase(item_id, user.id, cmd, &db_manager).await?;
    Ok(Json(serde_json::json!({
        "message": "구매 요청이 성공적으로 처리되었습니다.",
        "sale": sale
    })))
}

/// 판매 확정 요청 처리
pub async fn handle_confirm_sale(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
    Path(sale_id): Path<i64>,
) -> Result<Json<serde_json::Value>, MarketError> {
    info!("{:<12} --> 판매 확정 요청 id: {}", "Handler", sale_id);
    let sale = commands::handle_confirm_sale(sale_id, user.id, &db_manager).await?;
    Ok(Json(serde_json::json!({
        "message": "판매가 확정되었습니다.",
        "sale": sale
    })))
}

/// 판매 무시 요청 처리
pub async fn handle_ignore_sale(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
    Path(sale_id): Path<i64>,
) -> Result<Json<serde_json::Value>, MarketError> {
    info!("{:<12} --> 판매 무시 요청 id: {}", "Handler", sale_id);
    commands::handle_ignore_sale(sale_id, user.id, &db_manager).await?;
    Ok(Json(serde_json::json!({
        "message": "판매가 무시되고 아이템이 마켓으로 복원되었습니다."
    })))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 마켓 목록 조회
pub async fn handle_get_market(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<MarketItem>>, MarketError> {
    info!("{:<12} --> 마켓 목록 조회 user: {}", "HandlerQuery", user.id);
    let items = query::handlers::get_market_items(&db_manager, user.id).await?;
    Ok(Json(items))
}

/// 인벤토리 조회
pub async fn handle_get_inventory(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<MarketItem>>, MarketError> {
    info!("{:<12} --> 인벤토리 조회 user: {}", "HandlerQuery", user.id);
    let items = query::handlers::get_inventory(&db_manager, user.id).await?;
    Ok(Json(items))
}

/// 판매 중 아이템 조회
pub async fn handle_get_on_sale(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<MarketItem>>, MarketError> {
    info!(
        "{:<12} --> 판매 중 아이템 조회 user: {}",
        "HandlerQuery", user.id
    );
    let items = query::handlers::get_on_sale_items(&db_manager, user.id).await?;
    Ok(Json(items))
}

/// 아이템 검색
pub async fn handle_search(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(_user): AuthUser,
    Path(search_query): Path<String>,
) -> Result<Json<Vec<MarketItem>>, MarketError> {
    info!("{:<12} --> 아이템 검색 query: {}", "HandlerQuery", search_query);
    let items = query::handlers::search_items(&db_manager, search_query).await?;
    Ok(Json(items))
}

/// 구매 내역 조회
pub async fn handle_get_orders(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<SaleDetails>>, MarketError> {
    info!("{:<12} --> 구매 내역 조회 user: {}", "HandlerQuery", user.id);
    let sales = query::handlers::get_orders(&db_manager, user.id).await?;
    Ok(Json(sales))
}

/// 확정 대기 판매 조회
pub async fn handle_get_pending_sales(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<SaleDetails>>, MarketError> {
    info!(
        "{:<12} --> 확정 대기 판매 조회 user: {}",
        "HandlerQuery", user.id
    );
    let sales = query::handlers::get_pending_sales(&db_manager, user.id).await?;
    Ok(Json(sales))
}

/// 판매 보고서 조회
pub async fn handle_get_sales_report(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<SaleDetails>>, MarketError> {
    info!(
        "{:<12} --> 판매 보고서 조회 user: {}",
        "HandlerQuery", user.id
    );
    let sales = query::handlers::get_sales_report(&db_manager, user.id).await?;
    Ok(Json(sales))
}

/// 판매 보고서 요약 파라미터 (days: 7 주간 / 30 월간, offset: 과거 이동)
#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub days: Option<i64>,
    pub offset: Option<i64>,
}

/// 판매 보고서 요약 조회
pub async fn handle_get_report_summary(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user): AuthUser,
    Query(params): Query<ReportParams>,
) -> Result<Json<report::ReportSummary>, MarketError> {
    info!(
        "{:<12} --> 판매 보고서 요약 조회 user: {}, params: {:?}",
        "HandlerQuery", user.id, params
    );

    // 주간(7일)/월간(30일) 윈도우만 허용, offset은 최대 10년
    let days = params.days.unwrap_or(7);
    let offset = params.offset.unwrap_or(0);
    if !matches!(days, 7 | 30) {
        return Err(MarketError::Validation(
            "조회 구간은 7일 또는 30일만 가능합니다.",
        ));
    }
    if !(0..=3650).contains(&offset) {
        return Err(MarketError::Validation("잘못된 조회 시작 지점입니다."));
    }

    let sales = query::handlers::get_sales_report(&db_manager, user.id).await?;
    Ok(Json(report::summarize(&sales, days, offset)))
}

// endregion: --- Query Handlers
