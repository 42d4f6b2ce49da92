/// 마켓 상태 변경 커맨드 처리
/// 1. 아이템 등록/삭제
/// 2. 마켓 노출 토글
/// 3. 구매 (AVAILABLE -> PENDING)
/// 4. 판매 확정/무시 (PENDING -> SOLD / PENDING -> AVAILABLE)
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::error::MarketError;
use crate::market::model::{Sale, VirtualItem};
use crate::query::queries;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use tracing::info;

// endregion: --- Imports

// region:    --- Commands

/// 아이템 등록 명령
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateItemCommand {
    pub name: String,
    pub price: i64,
    pub image: Option<String>,
    pub gcash: String,
}

/// 마켓 노출 토글 명령
#[derive(Debug, Serialize, Deserialize)]
pub struct SetVisibilityCommand {
    pub in_market: bool,
}

/// 구매 명령
#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseCommand {
    pub reference_no: String,
}

// endregion: --- Commands

// region:    --- Command SQL

const INSERT_ITEM: &str = r#"
    INSERT INTO virtual_items (name, price, image, gcash, owner_id)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, name, price, image, gcash, in_market, bought, owner_id, created_at
"#;

const DELETE_ITEM: &str = "DELETE FROM virtual_items WHERE id = $1 AND owner_id = $2";

const HAS_PENDING_SALE: &str =
    "SELECT EXISTS(SELECT 1 FROM sales WHERE item_id = $1 AND approved_at IS NULL) AS pending";

/// 마켓 노출 변경은 bought = FALSE인 아이템에만 허용 (PENDING/SOLD 아이템 보호)
const SET_VISIBILITY: &str = r#"
    UPDATE virtual_items SET in_market = $1
    WHERE id = $2 AND owner_id = $3 AND bought = FALSE
    RETURNING id, name, price, image, gcash, in_market, bought, owner_id, created_at
"#;

/// AVAILABLE -> PENDING 조건부 전이
/// 현재 마켓에 등록된 미판매 아이템이면서 구매자가 소유자가 아닌 경우에만 성공
const MARK_ITEM_PENDING: &str = r#"
    UPDATE virtual_items SET in_market = FALSE, bought = TRUE
    WHERE id = $1 AND in_market = TRUE AND bought = FALSE AND owner_id <> $2
    RETURNING id, name, price, image, gcash, in_market, bought, owner_id, created_at
"#;

const INSERT_SALE: &str = r#"
    INSERT INTO sales (reference_no, buyer_id, item_id)
    VALUES ($1, $2, $3)
    RETURNING id, reference_no, created_at, approved_at, buyer_id, item_id
"#;

/// PENDING -> SOLD 조건부 전이 (이미 확정된 판매는 갱신하지 않는다)
const CONFIRM_SALE: &str = r#"
    UPDATE sales SET approved_at = now()
    FROM virtual_items i
    WHERE sales.id = $1 AND i.id = sales.item_id AND i.owner_id = $2
      AND sales.approved_at IS NULL
    RETURNING sales.id, sales.reference_no, sales.created_at, sales.approved_at,
              sales.buyer_id, sales.item_id
"#;

/// PENDING 판매 삭제 (확정된 판매는 삭제하지 않는다)
const DELETE_PENDING_SALE: &str = r#"
    DELETE FROM sales
    USING virtual_items i
    WHERE sales.id = $1 AND i.id = sales.item_id AND i.owner_id = $2
      AND sales.approved_at IS NULL
    RETURNING sales.item_id
"#;

const REVERT_ITEM: &str =
    "UPDATE virtual_items SET in_market = TRUE, bought = FALSE WHERE id = $1";

/// 판매 진단용 조회 (조건부 갱신 실패 사유 구분)
const GET_SALE_WITH_OWNER: &str = r#"
    SELECT i.owner_id AS owner_id
    FROM sales s
    JOIN virtual_items i ON i.id = s.item_id
    WHERE s.id = $1
"#;

// endregion: --- Command SQL

// region:    --- Validation

/// 결제 참조 번호 검증 (11자리 숫자)
pub fn is_valid_reference_no(reference_no: &str) -> bool {
    reference_no.len() == 11 && reference_no.bytes().all(|b| b.is_ascii_digit())
}

fn validate_create_item(cmd: &CreateItemCommand) -> Result<(), MarketError> {
    if cmd.name.trim().is_empty() {
        return Err(MarketError::Validation("아이템 이름은 필수입니다."));
    }
    if cmd.price <= 0 {
        return Err(MarketError::Validation("가격은 0보다 커야 합니다."));
    }
    if cmd.gcash.trim().is_empty() {
        return Err(MarketError::Validation("판매자 결제 주소는 필수입니다."));
    }
    Ok(())
}

// endregion: --- Validation

// region:    --- Command Handlers

/// 1. 아이템 등록
pub async fn handle_create_item(
    cmd: CreateItemCommand,
    owner_id: i64,
    db_manager: &DatabaseManager,
) -> Result<VirtualItem, MarketError> {
    info!("{:<12} --> 아이템 등록 요청 처리 시작: {:?}", "Command", cmd);
    validate_create_item(&cmd)?;

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let item = sqlx::query_as::<_, VirtualItem>(INSERT_ITEM)
                    .bind(cmd.name.trim())
                    .bind(cmd.price)
                    .bind(&cmd.image)
                    .bind(cmd.gcash.trim())
                    .bind(owner_id)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok(item)
            })
        })
        .await
}

/// 2. 아이템 삭제
/// 확정 대기 중인 판매가 걸려 있는 아이템은 삭제할 수 없다
pub async fn handle_delete_item(
    item_id: i64,
    owner_id: i64,
    db_manager: &DatabaseManager,
) -> Result<(), MarketError> {
    info!("{:<12} --> 아이템 삭제 요청 id: {}", "Command", item_id);

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let item = sqlx::query_as::<_, VirtualItem>(queries::GET_ITEM)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(MarketError::NotFound("아이템을 찾을 수 없습니다."))?;

                if item.owner_id != owner_id {
                    return Err(MarketError::Unauthorized(
                        "소유자만 아이템을 삭제할 수 있습니다.",
                    ));
                }

                let pending: bool = sqlx::query(HAS_PENDING_SALE)
                    .bind(item_id)
                    .fetch_one(&mut **tx)
                    .await?
                    .get("pending");
                if pending {
                    return Err(MarketError::Conflict(
                        "확정 대기 중인 판매가 있는 아이템은 삭제할 수 없습니다.",
                    ));
                }

                sqlx::query(DELETE_ITEM)
                    .bind(item_id)
                    .bind(owner_id)
                    .execute(&mut **tx)
                    .await?;
                Ok(())
            })
        })
        .await
}

/// 3. 마켓 노출 토글
pub async fn handle_set_visibility(
    item_id: i64,
    owner_id: i64,
    cmd: SetVisibilityCommand,
    db_manager: &DatabaseManager,
) -> Result<VirtualItem, MarketError> {
    info!(
        "{:<12} --> 마켓 노출 변경 요청 id: {}, in_market: {}",
        "Command", item_id, cmd.in_market
    );

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let updated = sqlx::query_as::<_, VirtualItem>(SET_VISIBILITY)
                    .bind(cmd.in_market)
                    .bind(item_id)
                    .bind(owner_id)
                    .fetch_optional(&mut **tx)
                    .await?;

                match updated {
                    Some(item) => Ok(item),
                    // 조건부 갱신 실패 사유 구분
                    None => {
                        let item = sqlx::query_as::<_, VirtualItem>(queries::GET_ITEM)
                            .bind(item_id)
                            .fetch_optional(&mut **tx)
                            .await?;
                        Err(match item {
                            None => MarketError::NotFound("아이템을 찾을 수 없습니다."),
                            Some(it) if it.owner_id != owner_id => MarketError::Unauthorized(
                                "소유자만 마켓 노출을 변경할 수 있습니다.",
                            ),
                            Some(_) => MarketError::Conflict(
                                "거래가 진행 중인 아이템은 마켓 노출을 변경할 수 없습니다.",
                            ),
                        })
                    }
                }
            })
        })
        .await
}

/// 4. 구매 (AVAILABLE -> PENDING)
/// 아이템 상태 전이와 판매 레코드 생성을 단일 트랜잭션으로 처리하고,
/// 조건부 갱신으로 동시 구매 중 하나만 성공하도록 보장한다.
pub async fn handle_purchase(
    item_id: i64,
    buyer_id: i64,
    cmd: PurchaseCommand,
    db_manager: &DatabaseManager,
) -> Result<Sale, MarketError> {
    info!(
        "{:<12} --> 구매 요청 처리 시작 id: {}, buyer: {}",
        "Command", item_id, buyer_id
    );

    if !is_valid_reference_no(&cmd.reference_no) {
        return Err(MarketError::Validation(
            "참조 번호는 11자리 숫자여야 합니다.",
        ));
    }

    let reference_no = cmd.reference_no;
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let pending = sqlx::query_as::<_, VirtualItem>(MARK_ITEM_PENDING)
                    .bind(item_id)
                    .bind(buyer_id)
                    .fetch_optional(&mut **tx)
                    .await?;

                if pending.is_none() {
                    // 조건부 전이 실패 사유 구분
                    let item = sqlx::query_as::<_, VirtualItem>(queries::GET_ITEM)
                        .bind(item_id)
                        .fetch_optional(&mut **tx)
                        .await?;
                    return Err(match item {
                        None => MarketError::NotFound("아이템을 찾을 수 없습니다."),
                        Some(it) if it.owner_id == buyer_id => {
                            MarketError::Validation("자신이 소유한 아이템은 구매할 수 없습니다.")
                        }
                        Some(_) => {
                            MarketError::Conflict("현재 구매할 수 없는 아이템입니다.")
                        }
                    });
                }

                let sale = sqlx::query_as::<_, Sale>(INSERT_SALE)
                    .bind(&reference_no)
                    .bind(buyer_id)
                    .bind(item_id)
                    .fetch_one(&mut **tx)
                    .await?;

                info!(
                    "{:<12} --> 구매 요청이 성공적으로 처리되었습니다. sale: {}",
                    "Command", sale.id
                );
                Ok(sale)
            })
        })
        .await
}

/// 5. 판매 확정 (PENDING -> SOLD)
pub async fn handle_confirm_sale(
    sale_id: i64,
    seller_id: i64,
    db_manager: &DatabaseManager,
) -> Result<Sale, MarketError> {
    info!("{:<12} --> 판매 확정 요청 id: {}", "Command", sale_id);

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let confirmed = sqlx::query_as::<_, Sale>(CONFIRM_SALE)
                    .bind(sale_id)
                    .bind(seller_id)
                    .fetch_optional(&mut **tx)
                    .await?;

                match confirmed {
                    Some(sale) => Ok(sale),
                    None => Err(diagnose_sale_failure(tx, sale_id, seller_id).await?),
                }
            })
        })
        .await
}

/// 6. 판매 무시 (PENDING -> AVAILABLE)
/// 판매 레코드 삭제와 아이템 상태 복원을 단일 트랜잭션으로 처리한다
pub async fn handle_ignore_sale(
    sale_id: i64,
    seller_id: i64,
    db_manager: &DatabaseManager,
) -> Result<(), MarketError> {
    info!("{:<12} --> 판매 무시 요청 id: {}", "Command", sale_id);

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let deleted = sqlx::query(DELETE_PENDING_SALE)
                    .bind(sale_id)
                    .bind(seller_id)
                    .fetch_optional(&mut **tx)
                    .await?;

                match deleted {
                    Some(row) => {
                        let item_id: i64 = row.get("item_id");
                        sqlx::query(REVERT_ITEM)
                            .bind(item_id)
                            .execute(&mut **tx)
                            .await?;
                        info!(
                            "{:<12} --> 판매가 무시되고 아이템이 복원되었습니다. item: {}",
                            "Command", item_id
                        );
                        Ok(())
                    }
                    None => Err(diagnose_sale_failure(tx, sale_id, seller_id).await?),
                }
            })
        })
        .await
}

/// 판매에 대한 조건부 갱신 실패 사유 구분
/// 미존재 / 비소유자 / 이미 확정을 구분해 에러로 돌려준다
async fn diagnose_sale_failure(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    sale_id: i64,
    seller_id: i64,
) -> Result<MarketError, MarketError> {
    let row = sqlx::query(GET_SALE_WITH_OWNER)
        .bind(sale_id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(match row {
        None => MarketError::NotFound("판매를 찾을 수 없습니다."),
        Some(row) => {
            let owner_id: i64 = row.get("owner_id");
            if owner_id != seller_id {
                MarketError::Unauthorized("판매자만 판매를 처리할 수 있습니다.")
            } else {
                MarketError::Conflict("이미 확정된 판매입니다.")
            }
        }
    })
}

// endregion: --- Command Handlers

// region:    --- Tests


// endregion: --- Tests
