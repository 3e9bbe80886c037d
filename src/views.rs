//! Server-side HTML pages / 服务端渲染页面
//!
//! Every value taken from a request or the database goes through
//! [`escape_html`] before it lands in markup.

use std::fmt::Write;

use crate::auth::{CurrentUser, SIGN_IN_PATH};
use crate::models::Customer;
use crate::utils::escape_html;

fn layout(title: &str, user: Option<&CurrentUser>, body: &str) -> String {
    let nav = match user {
        Some(user) => format!(
            r#"<nav class="navbar">
  <a href="/">Dashboard</a>
  <a href="/customers">Customers</a>
  <span class="signed-in">Signed in as {}</span>
  <form method="post" action="/users/sign_out" class="sign-out">
    <button type="submit">Log out</button>
  </form>
</nav>"#,
            escape_html(&user.email)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{} | Customer Directory</title>
</head>
<body>
{}
<main class="container">
{}
</main>
</body>
</html>
"#,
        escape_html(title),
        nav,
        body
    )
}

/// Login form / 登录页面
pub fn login_page(return_to: &str, email: &str, alert: Option<&str>) -> String {
    let alert = alert
        .map(|msg| format!(r#"<p class="alert">{}</p>"#, escape_html(msg)))
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Log in</h1>
{alert}
<form method="post" action="{SIGN_IN_PATH}" class="sign-in">
  <input type="hidden" name="return_to" value="{}">
  <label for="user_email">Email</label>
  <input type="email" name="email" id="user_email" value="{}" autofocus>
  <label for="user_password">Password</label>
  <input type="password" name="password" id="user_password">
  <button type="submit">Log in</button>
</form>"#,
        escape_html(return_to),
        escape_html(email)
    );

    layout("Log in", None, &body)
}

pub fn dashboard_page(user: &CurrentUser, customer_count: i64) -> String {
    let body = format!(
        r#"<h1>Dashboard</h1>
<p>Welcome, {}.</p>
<p class="customer-count">{} customers on file.</p>
<p><a href="/customers">Search customers</a></p>"#,
        escape_html(&user.email),
        customer_count
    );

    layout("Dashboard", Some(user), &body)
}

/// Customer search page / 客户搜索页面
///
/// `results` is `None` when no keyword was given; the results section is then
/// left out entirely. An empty list still renders the section.
pub fn customers_page(user: &CurrentUser, keywords: &str, results: Option<&[Customer]>) -> String {
    let mut body = format!(
        r#"<section class="search-form">
  <h1>Customer Search</h1>
  <form method="get" action="/customers">
    <label for="keywords">Keywords</label>
    <input type="text" name="keywords" id="keywords" value="{}" placeholder="First Name, Last Name, or Email Address">
    <button type="submit">Find Customers</button>
  </form>
</section>"#,
        escape_html(keywords)
    );

    if let Some(customers) = results {
        let _ = write!(
            body,
            r#"
<section class="search-results">
  <header>
    <h2>Results</h2>
    <span class="result-count">{}</span>
  </header>
  <ol class="list-group">"#,
            result_count_label(customers.len())
        );

        for customer in customers {
            let _ = write!(
                body,
                r#"
    <li class="list-group-item">
      <h3>{} {}</h3>
      <small class="username">{}</small>
      <span class="email">{}</span>
    </li>"#,
                escape_html(&customer.first_name),
                escape_html(&customer.last_name),
                escape_html(&customer.username),
                escape_html(&customer.email)
            );
        }

        body.push_str("\n  </ol>\n</section>");
    }

    layout("Customers", Some(user), &body)
}

fn result_count_label(count: usize) -> String {
    match count {
        1 => "1 customer".to_string(),
        n => format!("{n} customers"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> CurrentUser {
        CurrentUser {
            email: "bob@example.com".to_string(),
            session_id: "s".to_string(),
        }
    }

    fn customer(first: &str, last: &str) -> Customer {
        Customer {
            id: 1,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: "x@example.com".to_string(),
            username: "x".to_string(),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_customers_page_without_keyword_has_no_results_section() {
        let html = customers_page(&user(), "", None);
        assert!(html.contains(r#"<section class="search-form">"#));
        assert!(!html.contains("search-results"));
    }

    #[test]
    fn test_customers_page_lists_results_in_order() {
        let customers = vec![customer("JR", "Bob"), customer("Bobby", "Dobbs")];
        let html = customers_page(&user(), "bob", Some(customers.as_slice()));

        assert!(html.contains("<h2>Results</h2>"));
        assert!(html.contains("2 customers"));
        assert_eq!(html.matches(r#"<li class="list-group-item">"#).count(), 2);
        assert!(html.find("JR Bob").unwrap() < html.find("Bobby Dobbs").unwrap());
        assert!(html.contains(r#"value="bob""#));
    }

    #[test]
    fn test_empty_results_still_render_section() {
        let html = customers_page(&user(), "zzz", Some(&[][..]));
        assert!(html.contains("search-results"));
        assert!(html.contains("0 customers"));
        assert!(!html.contains("list-group-item"));
    }

    #[test]
    fn test_values_are_escaped() {
        let customers = vec![customer("<b>Eve</b>", "O'Neil")];
        let html = customers_page(&user(), r#""><script>"#, Some(customers.as_slice()));

        assert!(!html.contains("<b>Eve</b>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;b&gt;Eve&lt;/b&gt; O&#39;Neil"));
    }

    #[test]
    fn test_login_page_has_form_fields() {
        let html = login_page("/customers", "", Some("Invalid email or password."));
        assert!(html.contains(r#"<label for="user_email">Email</label>"#));
        assert!(html.contains(r#"<label for="user_password">Password</label>"#));
        assert!(html.contains("Log in</button>"));
        assert!(html.contains(r#"value="/customers""#));
        assert!(html.contains("Invalid email or password."));
    }
}
