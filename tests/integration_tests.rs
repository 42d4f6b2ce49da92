use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use marketplace_service::database::DatabaseManager;
use marketplace_service::market::model::{User, VirtualItem};
use marketplace_service::query;
use reqwest::Client;
use serde_json::json;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

const BASE_URL: &str = "http://localhost:3000";

/// 트레이싱 초기화
fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("트레이싱 구독자 설정 실패");
}

/// 데이터베이스 매니저 설정
async fn setup() -> Arc<DatabaseManager> {
    Arc::new(DatabaseManager::new().await)
}

/// 테스트 간 충돌을 피하기 위한 고유 이메일 생성
fn unique_email(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}+{}@test.local", prefix, nanos)
}

/// 테스트용 사용자 생성
async fn create_test_user(db_manager: &DatabaseManager, email: &str) -> User {
    let email = email.to_string();
    let name = email.split('@').next().unwrap().to_string();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(
                    "INSERT INTO users (email, name)
                     VALUES ($1, $2)
                     ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
                     RETURNING id, email, name, image, created_at",
                )
                .bind(&email)
                .bind(&name)
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

/// 테스트용 아이템 생성
async fn create_test_item(
    db_manager: &DatabaseManager,
    owner_id: i64,
    name: &str,
    price: i64,
    in_market: bool,
) -> VirtualItem {
    let name = name.to_string();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, VirtualItem>(
                    "INSERT INTO virtual_items (name, price, gcash, in_market, owner_id)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING id, name, price, image, gcash, in_market, bought, owner_id, created_at",
                )
                .bind(&name)
                .bind(price)
                .bind("09123456789")
                .bind(in_market)
                .bind(owner_id)
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

/// 아이템에 연결된 판매 수 조회
async fn count_sales(db_manager: &DatabaseManager, item_id: i64) -> i64 {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales WHERE item_id = $1")
                    .bind(item_id)
                    .fetch_one(&mut **tx)
                    .await
            })
        })
        .await
        .unwrap()
}

/// 판매 확정 일시 조회
async fn get_approved_at(db_manager: &DatabaseManager, sale_id: i64) -> Option<DateTime<Utc>> {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
                    "SELECT approved_at FROM sales WHERE id = $1",
                )
                .bind(sale_id)
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

/// 전체 거래 사이클 테스트
/// 등록 -> 인벤토리 -> 마켓 등록 -> 구매 -> 확정 대기 -> 확정 -> 보고서
#[tokio::test]
async fn test_trade_lifecycle() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller_email = unique_email("seller");
    let buyer_email = unique_email("buyer");
    let seller = create_test_user(&db_manager, &seller_email).await;
    create_test_user(&db_manager, &buyer_email).await;

    // 아이템 등록
    let response = client
        .post(format!("{}/items", BASE_URL))
        .header("X-User-Email", &seller_email)
        .json(&json!({
            "name": "AK skin",
            "price": 100,
            "gcash": "09123456789"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let item: VirtualItem = response.json().await.unwrap();
    assert_eq!(item.owner_id, seller.id);
    assert!(!item.in_market);

    // 소유자 인벤토리에는 보이고
    let inventory: Vec<Value> = client
        .get(format!("{}/inventory", BASE_URL))
        .header("X-User-Email", &seller_email)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(inventory.iter().any(|i| i["id"] == item.id));

    // 마켓 등록 전에는 다른 사용자의 마켓에 보이지 않는다
    let market: Vec<Value> = client
        .get(format!("{}/market", BASE_URL))
        .header("X-User-Email", &buyer_email)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!market.iter().any(|i| i["id"] == item.id));

    // 마켓 등록
    let response = client
        .put(format!("{}/items/{}/market", BASE_URL, item.id))
        .header("X-User-Email", &seller_email)
        .json(&json!({ "in_market": true }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // 다른 사용자의 마켓에 노출
    let market: Vec<Value> = client
        .get(format!("{}/market", BASE_URL))
        .header("X-User-Email", &buyer_email)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(market.iter().any(|i| i["id"] == item.id));

    // 소유자 본인의 마켓에는 노출되지 않는다
    let own_market: Vec<Value> = client
        .get(format!("{}/market", BASE_URL))
        .header("X-User-Email", &seller_email)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!own_market.iter().any(|i| i["id"] == item.id));

    // 구매
    let response = client
        .post(format!("{}/items/{}/buy", BASE_URL, item.id))
        .header("X-User-Email", &buyer_email)
        .json(&json!({ "reference_no": "09171234567" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    let sale_id = body["sale"]["id"].as_i64().unwrap();

    // PENDING 상태 확인 (bought=true는 항상 in_market=false)
    let pending_item = query::handlers::get_item(&db_manager, item.id)
        .await
        .unwrap();
    assert!(pending_item.bought);
    assert!(!pending_item.in_market);

    // 구매자 주문 목록에 미확정으로 노출
    let orders: Vec<Value> = client
        .get(format!("{}/orders", BASE_URL))
        .header("X-User-Email", &buyer_email)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order = orders.iter().find(|o| o["id"] == sale_id).unwrap();
    assert!(order["approved_at"].is_null());

    // 판매자 확정 대기 목록에 노출
    let pending: Vec<Value> = client
        .get(format!("{}/sales/pending", BASE_URL))
        .header("X-User-Email", &seller_email)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(pending.iter().any(|s| s["id"] == sale_id));

    // 판매 확정
    let response = client
        .post(format!("{}/sales/{}/confirm", BASE_URL, sale_id))
        .header("X-User-Email", &seller_email)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // 판매 보고서에 확정 판매로 노출
    let report: Vec<Value> = client
        .get(format!("{}/sales/report", BASE_URL))
        .header("X-User-Email", &seller_email)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let reported = report.iter().find(|s| s["id"] == sale_id).unwrap();
    assert_eq!(reported["item_price"], 100);
    assert!(!reported["approved_at"].is_null());

    // 보고서 요약에 오늘 날짜 버킷으로 집계
    let summary: Value = client
        .get(format!("{}/sales/report/summary?days=7", BASE_URL))
        .header("X-User-Email", &seller_email)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["total"], 100);
    assert_eq!(summary["count"], 1);
    let today_bucket = summary["days"].as_array().unwrap().last().unwrap();
    assert_eq!(today_bucket["count"], 1);
    assert_eq!(today_bucket["total"], 100);
}

/// 동시 구매 테스트: 정확히 하나의 요청만 성공해야 한다
#[tokio::test]
async fn test_concurrent_purchase() {
    // 테스트 시작 시 tracing 초기화
    init_tracing();

    let db_manager = setup().await;

    let seller = create_test_user(&db_manager, &unique_email("seller")).await;
    let item = create_test_item(&db_manager, seller.id, "동시 구매 테스트 아이템", 500, true).await;

    let mut handles = vec![];
    for i in 1..=2 {
        let buyer_email = unique_email(&format!("racer{}", i));
        create_test_user(&db_manager, &buyer_email).await;
        let item_id = item.id;

        let handle = tokio::spawn(async move {
            let client = Client::new();
            let response = client
                .post(format!("{}/items/{}/buy", BASE_URL, item_id))
                .header("X-User-Email", &buyer_email)
                .json(&json!({ "reference_no": "09171234567" }))
                .send()
                .await
                .unwrap();

            let status = response.status();
            let body: Value = response.json().await.unwrap();
            (status, body)
        });
        handles.push(handle);
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        if status == StatusCode::OK {
            successes += 1;
        } else if status == StatusCode::CONFLICT {
            assert_eq!(body["code"], "CONFLICT");
            conflicts += 1;
        }
    }

    info!("성공한 구매 수: {}, 거절된 구매 수: {}", successes, conflicts);
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);

    // 판매 레코드는 정확히 하나
    assert_eq!(count_sales(&db_manager, item.id).await, 1);
}

/// 판매 확정 중복 요청 테스트: 두 번째 확정은 거절되고 확정 일시는 유지된다
#[tokio::test]
async fn test_confirm_twice_rejected() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller_email = unique_email("seller");
    let buyer_email = unique_email("buyer");
    let seller = create_test_user(&db_manager, &seller_email).await;
    create_test_user(&db_manager, &buyer_email).await;
    let item = create_test_item(&db_manager, seller.id, "확정 중복 테스트 아이템", 300, true).await;

    let body: Value = client
        .post(format!("{}/items/{}/buy", BASE_URL, item.id))
        .header("X-User-Email", &buyer_email)
        .json(&json!({ "reference_no": "09171234567" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let sale_id = body["sale"]["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/sales/{}/confirm", BASE_URL, sale_id))
        .header("X-User-Email", &seller_email)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let first_approved_at = get_approved_at(&db_manager, sale_id).await.unwrap();

    // 두 번째 확정은 충돌
    let response = client
        .post(format!("{}/sales/{}/confirm", BASE_URL, sale_id))
        .header("X-User-Email", &seller_email)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // 확정 일시는 그대로
    let second_approved_at = get_approved_at(&db_manager, sale_id).await.unwrap();
    assert_eq!(first_approved_at, second_approved_at);
}

/// 판매 무시 테스트: 판매 삭제와 아이템 복원이 함께 일어난다
#[tokio::test]
async fn test_ignore_reverts_item() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller_email = unique_email("seller");
    let buyer_email = unique_email("buyer");
    let seller = create_test_user(&db_manager, &seller_email).await;
    create_test_user(&db_manager, &buyer_email).await;
    let item = create_test_item(&db_manager, seller.id, "무시 테스트 아이템", 200, true).await;

    let body: Value = client
        .post(format!("{}/items/{}/buy", BASE_URL, item.id))
        .header("X-User-Email", &buyer_email)
        .json(&json!({ "reference_no": "09171234567" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let sale_id = body["sale"]["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/sales/{}/ignore", BASE_URL, sale_id))
        .header("X-User-Email", &seller_email)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // 판매 삭제 + 아이템 복원 (둘 다 적용)
    assert_eq!(count_sales(&db_manager, item.id).await, 0);
    let reverted = query::handlers::get_item(&db_manager, item.id).await.unwrap();
    assert!(reverted.in_market);
    assert!(!reverted.bought);
}

/// 확정 대기 중 마켓 노출 변경 금지 테스트
#[tokio::test]
async fn test_visibility_locked_while_pending() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller_email = unique_email("seller");
    let buyer_email = unique_email("buyer");
    let seller = create_test_user(&db_manager, &seller_email).await;
    create_test_user(&db_manager, &buyer_email).await;
    let item = create_test_item(&db_manager, seller.id, "노출 잠금 테스트 아이템", 150, true).await;

    let response = client
        .post(format!("{}/items/{}/buy", BASE_URL, item.id))
        .header("X-User-Email", &buyer_email)
        .json(&json!({ "reference_no": "09171234567" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // PENDING 상태에서는 소유자도 노출을 변경할 수 없다
    let response = client
        .put(format!("{}/items/{}/market", BASE_URL, item.id))
        .header("X-User-Email", &seller_email)
        .json(&json!({ "in_market": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // 비소유자는 거절된다
    let response = client
        .put(format!("{}/items/{}/market", BASE_URL, item.id))
        .header("X-User-Email", &buyer_email)
        .json(&json!({ "in_market": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// 잘못된 참조 번호 테스트
#[tokio::test]
async fn test_invalid_reference_no() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller = create_test_user(&db_manager, &unique_email("seller")).await;
    let buyer_email = unique_email("buyer");
    create_test_user(&db_manager, &buyer_email).await;
    let item = create_test_item(&db_manager, seller.id, "참조 번호 테스트 아이템", 100, true).await;

    // 11자리 숫자가 아닌 참조 번호는 거절
    let response = client
        .post(format!("{}/items/{}/buy", BASE_URL, item.id))
        .header("X-User-Email", &buyer_email)
        .json(&json!({ "reference_no": "0917123456a" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION");

    // 아이템 상태는 그대로
    let unchanged = query::handlers::get_item(&db_manager, item.id).await.unwrap();
    assert!(unchanged.in_market);
    assert!(!unchanged.bought);
}

/// 소유자 본인 구매 금지 테스트
#[tokio::test]
async fn test_owner_cannot_buy_own_item() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller_email = unique_email("seller");
    let seller = create_test_user(&db_manager, &seller_email).await;
    let item = create_test_item(&db_manager, seller.id, "본인 구매 테스트 아이템", 100, true).await;

    // 소유자의 구매 요청은 검증 오류로 거절
    let response = client
        .post(format!("{}/items/{}/buy", BASE_URL, item.id))
        .header("X-User-Email", &seller_email)
        .json(&json!({ "reference_no": "09171234567" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION");

    // 아이템 상태와 판매 레코드는 그대로
    let unchanged = query::handlers::get_item(&db_manager, item.id).await.unwrap();
    assert!(unchanged.in_market);
    assert!(!unchanged.bought);
    assert_eq!(count_sales(&db_manager, item.id).await, 0);
}

/// 확정 대기 중 아이템 삭제 금지 테스트
#[tokio::test]
async fn test_delete_locked_while_pending() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller_email = unique_email("seller");
    let buyer_email = unique_email("buyer");
    let seller = create_test_user(&db_manager, &seller_email).await;
    create_test_user(&db_manager, &buyer_email).await;
    let item = create_test_item(&db_manager, seller.id, "삭제 잠금 테스트 아이템", 100, true).await;

    let response = client
        .post(format!("{}/items/{}/buy", BASE_URL, item.id))
        .header("X-User-Email", &buyer_email)
        .json(&json!({ "reference_no": "09171234567" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // 확정 대기 중인 판매가 있는 아이템은 소유자도 삭제할 수 없다
    let response = client
        .delete(format!("{}/items/{}", BASE_URL, item.id))
        .header("X-User-Email", &seller_email)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // 아이템과 판매 레코드는 그대로
    let unchanged = query::handlers::get_item(&db_manager, item.id).await.unwrap();
    assert!(unchanged.bought);
    assert_eq!(count_sales(&db_manager, item.id).await, 1);
}

/// 판매 보고서 요약 구간 검증 테스트
#[tokio::test]
async fn test_report_summary_window_validation() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller_email = unique_email("seller");
    create_test_user(&db_manager, &seller_email).await;

    // 허용되지 않는 구간은 모두 검증 오류로 거절
    for query_string in [
        "days=9223372036854775807",
        "days=1000000000",
        "days=12",
        "days=0",
        "days=7&offset=-1",
        "days=7&offset=9223372036854775807",
    ] {
        let response = client
            .get(format!("{}/sales/report/summary?{}", BASE_URL, query_string))
            .header("X-User-Email", &seller_email)
            .send()
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "query: {}",
            query_string
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "VALIDATION");
    }

    // 주간/월간 구간과 과거 이동은 허용
    for query_string in ["days=7", "days=30", "days=7&offset=7", "days=30&offset=30"] {
        let response = client
            .get(format!("{}/sales/report/summary?{}", BASE_URL, query_string))
            .header("X-User-Email", &seller_email)
            .send()
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "query: {}",
            query_string
        );
    }
}

/// 아이템 검색 테스트
#[tokio::test]
async fn test_search_items() {
    let db_manager = setup().await;
    let client = Client::new();

    let seller_email = unique_email("seller");
    let seller = create_test_user(&db_manager, &seller_email).await;
    let item = create_test_item(
        &db_manager,
        seller.id,
        "Glock-18 | Death Rattle",
        250,
        true,
    )
    .await;

    // 대소문자 구분 없는 부분 일치
    let results: Vec<Value> = client
        .get(format!("{}/search/death", BASE_URL))
        .header("X-User-Email", &seller_email)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(results.iter().any(|i| i["id"] == item.id));

    // 일치하지 않는 검색어는 빈 결과
    let results: Vec<Value> = client
        .get(format!("{}/search/nonexistent", BASE_URL))
        .header("X-User-Email", &seller_email)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(results.is_empty());
}

/// 가입/로그인 테스트
#[tokio::test]
async fn test_register_and_authorize() {
    let _db_manager = setup().await;
    let client = Client::new();

    let email = unique_email("register");

    // 가입
    let response = client
        .post(format!("{}/register", BASE_URL))
        .json(&json!({ "email": email, "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // 중복 가입은 충돌
    let response = client
        .post(format!("{}/register", BASE_URL))
        .json(&json!({ "email": email, "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // 올바른 자격 증명
    let response = client
        .post(format!("{}/authorize", BASE_URL))
        .json(&json!({ "email": email, "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // 잘못된 비밀번호
    let response = client
        .post(format!("{}/authorize", BASE_URL))
        .json(&json!({ "email": email, "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// 미인증 요청 거절 테스트
#[tokio::test]
async fn test_unauthenticated_rejected() {
    let client = Client::new();

    let response = client
        .get(format!("{}/market", BASE_URL))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
