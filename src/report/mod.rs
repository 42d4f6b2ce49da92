/// 판매 보고서 집계
/// 확정된 판매를 일 단위로 버킷팅하고 합계/평균을 계산한다.
/// 주간(7일)/월간(30일) 윈도우를 offset으로 과거로 이동하며 조회할 수 있다.
// region:    --- Imports
use crate::market::model::SaleDetails;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Report Model

/// 하루치 판매 집계
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DailySales {
    pub date: NaiveDate,
    pub count: i64,
    pub total: i64,
}

/// 판매 보고서 요약
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: i64,
    pub count: i64,
    pub average: i64,
    pub days: Vec<DailySales>,
}

// endregion: --- Report Model

// region:    --- Aggregation

/// 윈도우에 포함되는 날짜 목록 (과거 -> 현재 순)
/// offset일 전을 마지막 날로 하는 number_of_days일 구간
pub fn previous_days(number_of_days: i64, offset: i64, today: NaiveDate) -> Vec<NaiveDate> {
    let mut result = Vec::with_capacity(number_of_days.max(0) as usize);
    let mut index = number_of_days - 1 + offset;
    while index >= offset {
        result.push(today - Duration::days(index));
        index -= 1;
    }
    result
}

/// 전체 판매 합계 (아이템 가격 기준)
pub fn total_sales(sales: &[SaleDetails]) -> i64 {
    sales.iter().map(|sale| sale.item_price).sum()
}

/// 평균 판매 금액 (판매가 없으면 0)
pub fn average_sale(sales: &[SaleDetails]) -> i64 {
    if sales.is_empty() {
        return 0;
    }
    total_sales(sales) / sales.len() as i64
}

/// 날짜별 판매 버킷팅 (확정 일시 기준)
pub fn bucket_by_day(days: &[NaiveDate], sales: &[SaleDetails]) -> Vec<DailySales> {
    days.iter()
        .map(|day| {
            let mut count = 0;
            let mut total = 0;
            for sale in sales {
                if let Some(approved_at) = sale.approved_at {
                    if approved_at.date_naive() == *day {
                        count += 1;
                        total += sale.item_price;
                    }
                }
            }
            DailySales {
                date: *day,
                count,
                total,
            }
        })
        .collect()
}

/// 보고서 요약 생성
pub fn summarize(sales: &[SaleDetails], number_of_days: i64, offset: i64) -> ReportSummary {
    let days = previous_days(number_of_days, offset, Utc::now().date_naive());
    ReportSummary {
        total: total_sales(sales),
        count: sales.len() as i64,
        average: average_sale(sales),
        days: bucket_by_day(&days, sales),
    }
}

// endregion: --- Aggregation

// region:    --- Tests


// endregion: --- Tests
