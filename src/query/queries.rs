/// 아이템 조회
pub const GET_ITEM: &str = "SELECT id, name, price, image, gcash, in_market, bought, owner_id, created_at FROM virtual_items WHERE id = $1";

/// 마켓 목록 조회 (판매 중이면서 요청자 소유가 아닌 아이템)
pub const GET_MARKET_ITEMS: &str = r#"
    SELECT i.id, i.name, i.price, i.image, i.gcash, i.in_market, i.bought, i.owner_id, i.created_at,
           u.name AS owner_name, u.email AS owner_email, u.image AS owner_image
    FROM virtual_items i
    JOIN users u ON u.id = i.owner_id
    WHERE i.in_market = TRUE AND i.bought = FALSE AND i.owner_id <> $1
    ORDER BY i.created_at DESC
"#;

/// 인벤토리 조회 (요청자 소유의 모든 아이템)
pub const GET_INVENTORY: &str = r#"
    SELECT i.id, i.name, i.price, i.image, i.gcash, i.in_market, i.bought, i.owner_id, i.created_at,
           u.name AS owner_name, u.email AS owner_email, u.image AS owner_image
    FROM virtual_items i
    JOIN users u ON u.id = i.owner_id
    WHERE i.owner_id = $1
    ORDER BY i.created_at DESC
"#;

/// 판매 중인 아이템 조회 (요청자 소유 + 마켓 등록 + 미판매)
pub const GET_ON_SALE_ITEMS: &str = r#"
    SELECT i.id, i.name, i.price, i.image, i.gcash, i.in_market, i.bought, i.owner_id, i.created_at,
           u.name AS owner_name, u.email AS owner_email, u.image AS owner_image
    FROM virtual_items i
    JOIN users u ON u.id = i.owner_id
    WHERE i.owner_id = $1 AND i.in_market = TRUE AND i.bought = FALSE
    ORDER BY i.created_at DESC
"#;

/// 아이템 이름 검색 (대소문자 구분 없는 부분 일치)
pub const SEARCH_ITEMS: &str = r#"
    SELECT i.id, i.name, i.price, i.image, i.gcash, i.in_market, i.bought, i.owner_id, i.created_at,
           u.name AS owner_name, u.email AS owner_email, u.image AS owner_image
    FROM virtual_items i
    JOIN users u ON u.id = i.owner_id
    WHERE i.name ILIKE '%' || $1 || '%'
    ORDER BY i.created_at DESC
"#;

/// 구매 내역 조회 (요청자가 구매자인 판매)
pub const GET_ORDERS: &str = r#"
    SELECT s.id, s.reference_no, s.created_at, s.approved_at, s.buyer_id, s.item_id,
           i.name AS item_name, i.price AS item_price, i.image AS item_image,
           b.name AS buyer_name, b.email AS buyer_email
    FROM sales s
    JOIN virtual_items i ON i.id = s.item_id
    JOIN users b ON b.id = s.buyer_id
    WHERE s.buyer_id = $1
    ORDER BY s.created_at DESC
"#;

/// 확정 대기 판매 조회 (요청자 소유 아이템에 대한 미확정 판매)
pub const GET_PENDING_SALES: &str = r#"
    SELECT s.id, s.reference_no, s.created_at, s.approved_at, s.buyer_id, s.item_id,
           i.name AS item_name, i.price AS item_price, i.image AS item_image,
           b.name AS buyer_name, b.email AS buyer_email
    FROM sales s
    JOIN virtual_items i ON i.id = s.item_id
    JOIN users b ON b.id = s.buyer_id
    WHERE i.owner_id = $1 AND i.bought = TRUE AND s.approved_at IS NULL
    ORDER BY s.created_at DESC
"#;

/// 판매 보고서 조회 (요청자 소유 아이템에 대한 확정된 판매)
pub const GET_SALES_REPORT: &str = r#"
    SELECT s.id, s.reference_no, s.created_at, s.approved_at, s.buyer_id, s.item_id,
           i.name AS item_name, i.price AS item_price, i.image AS item_image,
           b.name AS buyer_name, b.email AS buyer_email
    FROM sales s
    JOIN virtual_items i ON i.id = s.item_id
    JOIN users b ON b.id = s.buyer_id
    WHERE i.owner_id = $1 AND s.approved_at IS NOT NULL
    ORDER BY s.approved_at DESC
"#;
