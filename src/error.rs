// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

// endregion: --- Imports

// region:    --- Market Error

/// 마켓 비즈니스 에러
/// 저장소 오류는 내부 오류로 감추고, 비즈니스 규칙 위반은 구분된 코드로 노출한다.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    Validation(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Internal(&'static str),

    #[error("데이터베이스 오류: {0}")]
    Database(#[from] sqlx::Error),
}

impl MarketError {
    /// 클라이언트가 분기 처리에 사용하는 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::NotFound(_) => "NOT_FOUND",
            MarketError::Conflict(_) => "CONFLICT",
            MarketError::Validation(_) => "VALIDATION",
            MarketError::Unauthorized(_) => "UNAUTHORIZED",
            MarketError::Internal(_) => "INTERNAL",
            MarketError::Database(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            MarketError::NotFound(_) => StatusCode::NOT_FOUND,
            MarketError::Conflict(_) => StatusCode::CONFLICT,
            MarketError::Validation(_) => StatusCode::BAD_REQUEST,
            MarketError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            MarketError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MarketError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let code = self.code();
        let message = match &self {
            // 저장소 오류 상세는 로그로만 남긴다
            MarketError::Database(e) => {
                error!("{:<12} --> 데이터베이스 오류: {:?}", "Error", e);
                "내부 오류가 발생했습니다.".to_string()
            }
            other => other.to_string(),
        };

        (
            self.status(),
            Json(serde_json::json!({
                "error": message,
                "code": code,
            })),
        )
            .into_response()
    }
}

// endregion: --- Market Error
