use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::ApiResponse;
use crate::auth::{ApiUser, CurrentUser};
use crate::error::AppResult;
use crate::models::Customer;
use crate::state::AppState;
use crate::views;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub keywords: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub keywords: String,
    pub count: usize,
    pub customers: Vec<Customer>,
}

/// Blank keywords return `None`: nothing was searched
async fn run_search(state: &AppState, keywords: &str) -> AppResult<Option<Vec<Customer>>> {
    let predicate = state.customers.predicate(keywords);

    if predicate.is_empty() {
        return Ok(None);
    }

    Ok(Some(state.customers.search(&predicate).await?))
}

/// GET /customers - 客户搜索页面
pub async fn index(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Html<String>> {
    let keywords = params.keywords.unwrap_or_default();
    let results = run_search(&state, &keywords).await?;

    Ok(Html(views::customers_page(&user, &keywords, results.as_deref())))
}

/// GET /api/customers - 客户搜索（JSON）
pub async fn search(
    State(state): State<Arc<AppState>>,
    ApiUser(_user): ApiUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<ApiResponse<SearchResponse>>> {
    let keywords = params.keywords.unwrap_or_default();
    let customers = run_search(&state, &keywords).await?.unwrap_or_default();

    Ok(Json(ApiResponse::success(SearchResponse {
        keywords,
        count: customers.len(),
        customers,
    })))
}
