use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::state::AppState;
use crate::views;

/// GET / and /dashboard/index - 首页
pub async fn index(State(state): State<Arc<AppState>>, user: CurrentUser) -> AppResult<Html<String>> {
    let customer_count = state.customers.count().await?;
    Ok(Html(views::dashboard_page(&user, customer_count)))
}
