/// 인증 및 계정 처리
/// 외부 신원 공급자가 전달한 신뢰 헤더(X-User-Email 등)로 요청자를 식별하고,
/// 자격 증명 기반 가입/로그인과 프로필 관리를 제공한다.
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::error::MarketError;
use crate::market::model::User;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use axum::extract::FromRef;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Account SQL

/// 최초 로그인 시 사용자 생성, 이후에는 기존 행 반환 (프로필 수정 내용을 덮어쓰지 않는다)
const UPSERT_USER: &str = r#"
    INSERT INTO users (email, name, image)
    VALUES ($1, $2, $3)
    ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
    RETURNING id, email, name, image, created_at
"#;

const GET_USER_WITH_PASSWORD: &str =
    "SELECT id, email, name, image, password, created_at FROM users WHERE email = $1";

const INSERT_USER_WITH_PASSWORD: &str = r#"
    INSERT INTO users (email, name, password)
    VALUES ($1, $2, $3)
    RETURNING id, email, name, image, created_at
"#;

const UPDATE_PROFILE: &str = r#"
    UPDATE users SET name = $1, email = $2, image = $3
    WHERE id = $4
    RETURNING id, email, name, image, created_at
"#;

const DELETE_USER: &str = "DELETE FROM users WHERE id = $1";

// endregion: --- Account SQL

// region:    --- Commands

/// 가입 명령
#[derive(Debug, Deserialize)]
pub struct RegisterCommand {
    pub email: String,
    pub password: String,
}

/// 자격 증명 확인 명령
#[derive(Debug, Deserialize)]
pub struct AuthorizeCommand {
    pub email: String,
    pub password: String,
}

/// 프로필 수정 명령
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateProfileCommand {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

// endregion: --- Commands

// region:    --- Password

/// 비밀번호 해시 생성 (argon2 PHC 문자열)
pub fn hash_password(password: &str) -> Result<String, MarketError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| MarketError::Internal("비밀번호 해시 생성에 실패했습니다."))
}

/// 비밀번호 검증
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// endregion: --- Password

// region:    --- Auth Extractor

/// 인증된 요청자
/// 신뢰 헤더의 이메일로 사용자를 조회하고, 처음 보는 이메일이면 생성한다
#[derive(Debug)]
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<DatabaseManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let db_manager = Arc::<DatabaseManager>::from_ref(state);

        let email = parts
            .headers
            .get("x-user-email")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or(MarketError::Unauthorized("인증이 필요합니다."))?;

        let name = parts
            .headers
            .get("x-user-name")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| local_part(&email).to_string());

        let image = parts
            .headers
            .get("x-user-image")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let user = db_manager
            .transaction(|tx| {
                Box::pin(async move {
                    let user = sqlx::query_as::<_, User>(UPSERT_USER)
                        .bind(&email)
                        .bind(&name)
                        .bind(&image)
                        .fetch_one(&mut **tx)
                        .await?;
                    Ok::<_, MarketError>(user)
                })
            })
            .await?;

        Ok(AuthUser(user))
    }
}

/// 이메일 로컬 파트 (기본 표시 이름)
fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

// endregion: --- Auth Extractor

// region:    --- Account Handlers

/// 가입 처리
pub async fn handle_register(
    cmd: RegisterCommand,
    db_manager: &DatabaseManager,
) -> Result<User, MarketError> {
    info!("{:<12} --> 가입 요청 처리 시작: {}", "Auth", cmd.email);

    if !cmd.email.contains('@') {
        return Err(MarketError::Validation("올바른 이메일이 아닙니다."));
    }
    if cmd.password.is_empty() {
        return Err(MarketError::Validation("비밀번호는 필수입니다."));
    }

    let name = local_part(&cmd.email).to_string();
    let hashed = hash_password(&cmd.password)?;
    let email = cmd.email;

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let existing = sqlx::query(GET_USER_WITH_PASSWORD)
                    .bind(&email)
                    .fetch_optional(&mut **tx)
                    .await?;
                if existing.is_some() {
                    return Err(MarketError::Conflict("이미 등록된 이메일입니다."));
                }

                let user = sqlx::query_as::<_, User>(INSERT_USER_WITH_PASSWORD)
                    .bind(&email)
                    .bind(&name)
                    .bind(&hashed)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok(user)
            })
        })
        .await
}

/// 자격 증명 확인 (외부 로그인 플로우에서 호출)
pub async fn handle_authorize(
    cmd: AuthorizeCommand,
    db_manager: &DatabaseManager,
) -> Result<User, MarketError> {
    info!("{:<12} --> 자격 증명 확인: {}", "Auth", cmd.email);

    let email = cmd.email;
    let password = cmd.password;

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let row = sqlx::query_as::<_, UserWithPassword>(GET_USER_WITH_PASSWORD)
                    .bind(&email)
                    .fetch_optional(&mut **tx)
                    .await?;

                match row {
                    Some(row)
                        if row
                            .password
                            .as_deref()
                            .is_some_and(|hash| verify_password(&password, hash)) =>
                    {
                        Ok(row.into_user())
                    }
                    _ => Err(MarketError::Unauthorized("잘못된 인증 정보입니다.")),
                }
            })
        })
        .await
}

/// 프로필 수정
pub async fn handle_update_profile(
    user_id: i64,
    cmd: UpdateProfileCommand,
    db_manager: &DatabaseManager,
) -> Result<User, MarketError> {
    info!("{:<12} --> 프로필 수정 user: {}", "Auth", user_id);

    if cmd.name.trim().is_empty() {
        return Err(MarketError::Validation("이름은 필수입니다."));
    }
    if !cmd.email.contains('@') {
        return Err(MarketError::Validation("올바른 이메일이 아닙니다."));
    }

    let result = db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(UPDATE_PROFILE)
                    .bind(cmd.name.trim())
                    .bind(&cmd.email)
                    .bind(&cmd.image)
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(MarketError::from)?
                    .ok_or(MarketError::NotFound("사용자를 찾을 수 없습니다."))
            })
        })
        .await;

    // 이메일 중복은 충돌로 구분해서 보고
    match result {
        Err(MarketError::Database(sqlx::Error::Database(e)))
            if e.code().as_deref() == Some("23505") =>
        {
            Err(MarketError::Conflict("이미 등록된 이메일입니다."))
        }
        other => other,
    }
}

/// 계정 삭제 (소유 아이템과 구매 내역은 저장소 참조 규칙에 따라 연쇄 삭제)
pub async fn handle_delete_account(
    user_id: i64,
    db_manager: &DatabaseManager,
) -> Result<(), MarketError> {
    info!("{:<12} --> 계정 삭제 user: {}", "Auth", user_id);

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(DELETE_USER)
                    .bind(user_id)
                    .execute(&mut **tx)
                    .await?;
                Ok(())
            })
        })
        .await
}

/// 비밀번호 컬럼이 포함된 내부 조회 모델
#[derive(sqlx::FromRow)]
struct UserWithPassword {
    id: i64,
    email: String,
    name: String,
    image: Option<String>,
    password: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl UserWithPassword {
    fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            image: self.image,
            created_at: self.created_at,
        }
    }
}

// endregion: --- Account Handlers

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verify() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(verify_password("test_password_123", &hash));
        assert!(!verify_password("wrong_password", &hash));
    }

    #[test]
    fn test_local_part() {
        assert_eq!(local_part("buyer@example.com"), "buyer");
        assert_eq!(local_part("no-at-sign"), "no-at-sign");
    }
}

// endregion: --- Tests
