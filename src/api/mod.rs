pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod server;

use axum::{
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn unauthorized(message: &str) -> Self {
        Self {
            code: 401,
            message: message.to_string(),
            data: None,
        }
    }
}

/// Build the application router / 构建路由
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/dashboard/index", get(dashboard::index))
        .route("/customers", get(customers::index))
        .route("/api/customers", get(customers::search))
        .route("/api/health", get(server::health_check))
        .route("/users/sign_in", get(auth::new_session).post(auth::create_session))
        .route("/users/sign_out", post(auth::destroy_session))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
