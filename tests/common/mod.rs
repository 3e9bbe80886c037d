#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

use customer_directory::config::AppConfig;
use customer_directory::models::NewCustomer;
use customer_directory::state::AppState;
use customer_directory::{api, db};

pub const EMAIL: &str = "bob@example.com";
pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(AppConfig::default()).await
    }

    pub async fn spawn_with(mut config: AppConfig) -> Self {
        config.auth.bcrypt_cost = 4;

        let pool = db::connect_in_memory().await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        db::create_user(&pool, EMAIL, PASSWORD, config.auth.bcrypt_cost)
            .await
            .unwrap();

        let state = Arc::new(AppState::new(pool, config));
        Self {
            router: api::router(state.clone()),
            state,
        }
    }

    pub async fn add_customer(&self, first: &str, last: &str, email: &str) {
        let username = format!("{}{}", first, last).to_lowercase();
        self.state
            .customers
            .insert(&NewCustomer::new(first, last, email, &username))
            .await
            .unwrap();
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_form(&self, uri: &str, body: String, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::from(body)).unwrap())
            .await
            .unwrap()
    }

    pub async fn submit_login(&self, email: &str, password: &str, return_to: &str) -> Response<Body> {
        let body = format!(
            "email={}&password={}&return_to={}",
            urlencoding::encode(email),
            urlencoding::encode(password),
            urlencoding::encode(return_to)
        );
        self.post_form("/users/sign_in", body, None).await
    }

    /// Log in as the seeded user and return the `name=value` cookie pair
    pub async fn login(&self) -> String {
        let response = self.submit_login(EMAIL, PASSWORD, "/").await;
        session_cookie(&response).expect("login should set a session cookie")
    }
}

pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("customer_directory_session="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Contents of each `li.list-group-item`, in page order
pub fn result_items(html: &str) -> Vec<String> {
    html.split(r#"<li class="list-group-item">"#)
        .skip(1)
        .map(|item| item.split("</li>").next().unwrap_or_default().to_string())
        .collect()
}
