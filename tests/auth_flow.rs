mod common;

use axum::http::StatusCode;
use common::{body_text, location, session_cookie, TestApp, EMAIL, PASSWORD};
use customer_directory::config::AppConfig;

#[tokio::test]
async fn test_sign_in_page() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/users/sign_in?return_to=%2Fcustomers", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    assert!(html.contains(r#"id="user_email""#));
    assert!(html.contains(r#"id="user_password""#));
    assert!(html.contains(r#"name="return_to" value="/customers""#));
    assert!(html.contains("Log in"));
}

#[tokio::test]
async fn test_wrong_password() {
    let app = TestApp::spawn().await;

    let response = app.submit_login(EMAIL, "not-the-password", "/").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());
    assert!(body_text(response).await.contains("Invalid email or password."));

    let response = app.submit_login("nobody@example.com", PASSWORD, "/").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_email_is_case_insensitive() {
    let app = TestApp::spawn().await;

    let response = app.submit_login("  BOB@Example.com ", PASSWORD, "/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(session_cookie(&response).is_some());
}

#[tokio::test]
async fn test_external_return_to_is_ignored() {
    let app = TestApp::spawn().await;

    let response = app
        .submit_login(EMAIL, PASSWORD, "https://evil.example.com/")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app.submit_login(EMAIL, PASSWORD, "//evil.example.com").await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_session_cookie_attributes() {
    let app = TestApp::spawn().await;

    let response = app.submit_login(EMAIL, PASSWORD, "/").await;
    let header = response
        .headers()
        .get(axum::http::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();

    assert!(header.starts_with("customer_directory_session="));
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("SameSite=Lax"));
    assert!(header.contains("Path=/"));
}

#[tokio::test]
async fn test_repeated_failures_lock_out() {
    let mut config = AppConfig::default();
    config.auth.max_failed_logins = 3;
    let app = TestApp::spawn_with(config).await;

    for _ in 0..3 {
        let response = app.submit_login(EMAIL, "wrong", "/").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // the right password is refused too while locked
    let response = app.submit_login(EMAIL, PASSWORD, "/").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(session_cookie(&response).is_none());
}

#[tokio::test]
async fn test_success_clears_failures() {
    let mut config = AppConfig::default();
    config.auth.max_failed_logins = 3;
    let app = TestApp::spawn_with(config).await;

    for _ in 0..2 {
        app.submit_login(EMAIL, "wrong", "/").await;
    }
    let response = app.submit_login(EMAIL, PASSWORD, "/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    for _ in 0..2 {
        app.submit_login(EMAIL, "wrong", "/").await;
    }
    let response = app.submit_login(EMAIL, PASSWORD, "/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_sign_out() {
    let app = TestApp::spawn().await;
    let cookie = app.login().await;

    let response = app.get("/customers", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post_form("/users/sign_out", String::new(), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/users/sign_in");

    // the old token no longer opens a session
    let response = app.get("/customers", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/users/sign_in"));
}

#[tokio::test]
async fn test_forged_cookie() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/customers", Some("customer_directory_session=not-a-real-token"))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_sign_out_ends_only_the_current_session() {
    let app = TestApp::spawn().await;
    let laptop = app.login().await;
    let phone = app.login().await;

    let response = app
        .post_form("/users/sign_out", String::new(), Some(&laptop))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.get("/customers", Some(&laptop)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.get("/customers", Some(&phone)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sign_out_without_session() {
    let app = TestApp::spawn().await;

    let response = app.post_form("/users/sign_out", String::new(), None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/users/sign_in");
}
