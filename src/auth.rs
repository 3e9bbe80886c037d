use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use rand::Rng;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_cookies::Cookies;

use crate::api::ApiResponse;
use crate::error::AppError;
use crate::models::{Session, User};
use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "customer_directory_session";
pub const SIGN_IN_PATH: &str = "/users/sign_in";

/// Signed-in user resolved from the session cookie / 当前登录用户
///
/// Handlers that take a `CurrentUser` are only reached by authenticated
/// requests; everyone else is redirected to the login form.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub email: String,
    pub session_id: String,
}

pub enum AuthRejection {
    /// No valid session; carries the path to come back to after login
    Unauthenticated { return_to: String },
    Internal(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthenticated { return_to } => {
                let location = format!(
                    "{}?return_to={}",
                    SIGN_IN_PATH,
                    urlencoding::encode(&return_to)
                );
                Redirect::to(&location).into_response()
            }
            AuthRejection::Internal(err) => err.into_response(),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let return_to = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let cookies = match Cookies::from_request_parts(parts, state).await {
            Ok(cookies) => cookies,
            Err((_, msg)) => {
                tracing::error!("Cookie layer missing: {}", msg);
                return Err(AuthRejection::Unauthenticated { return_to });
            }
        };

        let Some(token) = cookies.get(SESSION_COOKIE_NAME).map(|c| c.value().to_string()) else {
            return Err(AuthRejection::Unauthenticated { return_to });
        };

        match find_session_user(&state.db, &token).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => {
                tracing::debug!("Session invalid or expired");
                Err(AuthRejection::Unauthenticated { return_to })
            }
            Err(e) => Err(AuthRejection::Internal(e.into())),
        }
    }
}

/// `CurrentUser` for JSON endpoints: 401 instead of a redirect
pub struct ApiUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ApiUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(ApiUser(user)),
            Err(AuthRejection::Unauthenticated { .. }) => Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::<()>::unauthorized("Not logged in")),
            )
                .into_response()),
            Err(rejection) => Err(rejection.into_response()),
        }
    }
}

fn generate_session_token() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Check email and password / 验证邮箱和密码
pub async fn verify_credentials(
    pool: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, created_at, updated_at FROM users WHERE email = ?",
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;

    let Some(user) = user else {
        return Ok(None);
    };

    if bcrypt::verify(password, &user.password_hash)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Create session / 创建会话
pub async fn start_session(
    pool: &SqlitePool,
    user_id: &str,
    ttl_hours: i64,
) -> Result<Session, sqlx::Error> {
    // 顺便清理该用户已过期的会话
    sqlx::query("DELETE FROM sessions WHERE user_id = ? AND expires_at <= ?")
        .bind(user_id)
        .bind(chrono::Utc::now().timestamp())
        .execute(pool)
        .await?;

    let session = Session {
        id: generate_session_token(),
        user_id: user_id.to_string(),
        expires_at: chrono::Utc::now().timestamp() + ttl_hours * 60 * 60,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    sqlx::query("INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)")
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.expires_at)
        .bind(&session.created_at)
        .execute(pool)
        .await?;

    Ok(session)
}

/// Delete session (logout) / 删除会话（登出）
pub async fn end_session(pool: &SqlitePool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_session_user(
    pool: &SqlitePool,
    token: &str,
) -> Result<Option<CurrentUser>, sqlx::Error> {
    let email: Option<String> = sqlx::query_scalar(
        r#"SELECT u.email FROM sessions s
           INNER JOIN users u ON u.id = s.user_id
           WHERE s.id = ? AND s.expires_at > ?"#,
    )
    .bind(token)
    .bind(chrono::Utc::now().timestamp())
    .fetch_optional(pool)
    .await?;

    Ok(email.map(|email| CurrentUser {
        email,
        session_id: token.to_string(),
    }))
}
