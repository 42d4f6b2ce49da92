// region:    --- Imports
use super::queries;
use crate::database::DatabaseManager;
use crate::market::model::{MarketItem, SaleDetails, VirtualItem};
use sqlx::Error as SqlxError;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 마켓 목록 조회 (요청자 소유 아이템 제외)
pub async fn get_market_items(
    db_manager: &DatabaseManager,
    requester_id: i64,
) -> Result<Vec<MarketItem>, SqlxError> {
    info!("{:<12} --> 마켓 목록 조회 user: {}", "Query", requester_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, MarketItem>(queries::GET_MARKET_ITEMS)
                    .bind(requester_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 인벤토리 조회
pub async fn get_inventory(
    db_manager: &DatabaseManager,
    owner_id: i64,
) -> Result<Vec<MarketItem>, SqlxError> {
    info!("{:<12} --> 인벤토리 조회 user: {}", "Query", owner_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, MarketItem>(queries::GET_INVENTORY)
                    .bind(owner_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 판매 중인 아이템 조회
pub async fn get_on_sale_items(
    db_manager: &DatabaseManager,
    owner_id: i64,
) -> Result<Vec<MarketItem>, SqlxError> {
    info!("{:<12} --> 판매 중 아이템 조회 user: {}", "Query", owner_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, MarketItem>(queries::GET_ON_SALE_ITEMS)
                    .bind(owner_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 아이템 이름 검색
pub async fn search_items(
    db_manager: &DatabaseManager,
    query: String,
) -> Result<Vec<MarketItem>, SqlxError> {
    info!("{:<12} --> 아이템 검색 query: {}", "Query", query);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, MarketItem>(queries::SEARCH_ITEMS)
                    .bind(query)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 구매 내역 조회
pub async fn get_orders(
    db_manager: &DatabaseManager,
    buyer_id: i64,
) -> Result<Vec<SaleDetails>, SqlxError> {
    info!("{:<12} --> 구매 내역 조회 user: {}", "Query", buyer_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, SaleDetails>(queries::GET_ORDERS)
                    .bind(buyer_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 확정 대기 판매 조회
pub async fn get_pending_sales(
    db_manager: &DatabaseManager,
    seller_id: i64,
) -> Result<Vec<SaleDetails>, SqlxError> {
    info!("{:<12} --> 확정 대기 판매 조회 user: {}", "Query", seller_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, SaleDetails>(queries::GET_PENDING_SALES)
                    .bind(seller_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 판매 보고서 조회
pub async fn get_sales_report(
    db_manager: &DatabaseManager,
    seller_id: i64,
) -> Result<Vec<SaleDetails>, SqlxError> {
    info!("{:<12} --> 판매 보고서 조회 user: {}", "Query", seller_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, SaleDetails>(queries::GET_SALES_REPORT)
                    .bind(seller_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 아이템 조회
pub async fn get_item(db_manager: &DatabaseManager, item_id: i64) -> Result<VirtualItem, SqlxError> {
    info!("{:<12} --> 아이템 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, VirtualItem>(queries::GET_ITEM)
                    .bind(item_id)
                    .fetch_one(&mut **tx)
                    .await
            })
        })
        .await
}

// endregion: --- Query Handlers
