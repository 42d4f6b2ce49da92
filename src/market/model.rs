use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 사용자 모델 (비밀번호 해시는 응답에 포함하지 않는다)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

// 가상 아이템 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct VirtualItem {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub image: Option<String>,
    pub gcash: String,
    pub in_market: bool,
    pub bought: bool,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

// 판매(구매 요청) 모델
// approved_at이 null이면 판매자 확정 대기 상태
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sale {
    pub id: i64,
    pub reference_no: String,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub buyer_id: i64,
    pub item_id: i64,
}

// 소유자 정보가 포함된 아이템 조회 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct MarketItem {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub image: Option<String>,
    pub gcash: String,
    pub in_market: bool,
    pub bought: bool,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_image: Option<String>,
}

// 아이템과 구매자 정보가 포함된 판매 조회 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct SaleDetails {
    pub id: i64,
    pub reference_no: String,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub buyer_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub item_price: i64,
    pub item_image: Option<String>,
    pub buyer_name: String,
    pub buyer_email: String,
}
