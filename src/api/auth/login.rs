use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use std::sync::Arc;
use tower_cookies::cookie::{time::Duration, SameSite};
use tower_cookies::{Cookie, Cookies};

use super::types::*;
use crate::auth::{
    end_session, start_session, verify_credentials, CurrentUser, SESSION_COOKIE_NAME, SIGN_IN_PATH,
};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::safe_return_to;
use crate::views;

/// GET /users/sign_in - 登录页面
pub async fn new_session(Query(params): Query<SignInParams>) -> Html<String> {
    let return_to = safe_return_to(params.return_to.as_deref());
    Html(views::login_page(&return_to, "", None))
}

/// POST /users/sign_in - 登录
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim().to_lowercase();
    let return_to = safe_return_to(form.return_to.as_deref());

    // 检查是否被封禁
    if state.login_security.is_blocked(&email) {
        tracing::warn!("Login blocked after repeated failures: {}", email);
        let page = views::login_page(
            &return_to,
            &form.email,
            Some("Too many failed attempts. Try again later."),
        );
        return Ok((StatusCode::TOO_MANY_REQUESTS, Html(page)).into_response());
    }

    let Some(user) = verify_credentials(&state.db, &email, &form.password).await? else {
        state.login_security.record_failure(&email);
        tracing::warn!("Failed login for {}", email);
        let page = views::login_page(&return_to, &form.email, Some("Invalid email or password."));
        return Ok((StatusCode::UNAUTHORIZED, Html(page)).into_response());
    };

    // 登录成功，清除失败记录
    state.login_security.clear_failure(&email);

    let ttl_hours = state.config.session.ttl_hours;
    let session = start_session(&state.db, &user.id, ttl_hours).await?;

    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, session.id);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(state.config.session.secure_cookie);
    cookie.set_max_age(Duration::hours(ttl_hours));
    cookies.add(cookie);

    tracing::info!("User logged in: {}", user.email);
    Ok(Redirect::to(&return_to).into_response())
}

/// POST /users/sign_out - 登出
///
/// Without a live session this only clears the cookie.
pub async fn destroy_session(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    user: Option<CurrentUser>,
) -> Result<Redirect, AppError> {
    if let Some(user) = user {
        end_session(&state.db, &user.session_id).await?;
        tracing::info!("User logged out: {}", user.email);
    }

    // 必须设置相同的 path 才能正确删除 cookie
    let mut removal_cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    removal_cookie.set_path("/");
    cookies.remove(removal_cookie);

    Ok(Redirect::to(SIGN_IN_PATH))
}
