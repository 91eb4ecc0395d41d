//! Integration tests for the direct form-login strategy against a wiremock
//! portal and identity provider.

mod common;

use chrono::Utc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rsm_monitor::auth::{Authenticator, HttpLoginAuthenticator, INTERACTIVE_CAPTURE_MESSAGE};
use rsm_monitor::core::Credential;
use rsm_monitor::error::RsmError;
use rsm_monitor::test_utils::{make_test_config, make_test_jwt};

use common::logger::TestLogger;

const LOGIN_FORM: &str = r#"<html><body>
<form method="POST" action="/idp/login/submit">
  <input type="hidden" name="_csrf" value="csrf-123">
  <input type="hidden" name="state" value="st-9">
  <input type="email" id="email" name="username">
  <input type="password" name="password">
  <button type="submit">Log in</button>
</form></body></html>"#;

fn credential() -> Credential {
    Credential::new("parent@example.com", "pw")
}

fn authenticator(server: &MockServer) -> HttpLoginAuthenticator {
    HttpLoginAuthenticator::from_config(&make_test_config(&server.uri(), &[1]))
}

/// Portal root redirects to the IdP, which serves `form_html`.
async fn mount_login_page(server: &MockServer, form_html: &str) {
    Mock::given(method("GET"))
        .and(path("/parent-portal/"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/idp/login?state=st-9", server.uri()).as_str()),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/idp/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(form_html))
        .mount(server)
        .await;
}

/// Form POST redirects back to the portal splash page, which answers with
/// `splash`.
async fn mount_submit_to_portal(server: &MockServer, splash: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/idp/login/submit"))
        .and(body_string_contains("_csrf=csrf-123"))
        .and(body_string_contains("state=st-9"))
        .and(body_string_contains("username=parent%40example.com"))
        .and(body_string_contains("password=pw"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/parent-portal/splash", server.uri()).as_str()),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/parent-portal/splash"))
        .respond_with(splash)
        .mount(server)
        .await;
}

#[tokio::test]
async fn jwt_cookie_after_login_is_returned() {
    let log = TestLogger::new("jwt_cookie_after_login_is_returned");
    log.phase("setup");
    let server = MockServer::start().await;
    let jwt = make_test_jwt(Utc::now().timestamp() + 3600);
    mount_login_page(&server, LOGIN_FORM).await;
    mount_submit_to_portal(
        &server,
        ResponseTemplate::new(200)
            .insert_header("Set-Cookie", "SESSION=abc; Path=/")
            .append_header("Set-Cookie", format!("access_token={jwt}; Path=/").as_str()),
    )
    .await;

    log.phase("execute");
    let token = authenticator(&server).authenticate(&credential()).await.unwrap();

    log.phase("verify");
    assert_eq!(token.expose(), jwt);
    log.finish_ok();
}

#[tokio::test]
async fn login_link_in_portal_body_is_followed() {
    let server = MockServer::start().await;
    let jwt = make_test_jwt(Utc::now().timestamp() + 3600);
    Mock::given(method("GET"))
        .and(path("/parent-portal/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<a href="{}/idp/login?state=st-9&amp;x=1">Sign in</a>"#,
            server.uri()
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/idp/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_FORM))
        .mount(&server)
        .await;
    mount_submit_to_portal(
        &server,
        ResponseTemplate::new(200).insert_header("Set-Cookie", format!("t={jwt}; Path=/").as_str()),
    )
    .await;

    let token = authenticator(&server).authenticate(&credential()).await.unwrap();
    assert_eq!(token.expose(), jwt);
}

#[tokio::test]
async fn no_token_cookie_requires_interactive_capture() {
    let server = MockServer::start().await;
    mount_login_page(&server, LOGIN_FORM).await;
    mount_submit_to_portal(
        &server,
        ResponseTemplate::new(200).insert_header("Set-Cookie", "SESSION=opaque; Path=/"),
    )
    .await;

    let err = authenticator(&server).authenticate(&credential()).await.unwrap_err();

    assert!(matches!(err, RsmError::Auth { .. }));
    assert_eq!(err.to_string(), INTERACTIVE_CAPTURE_MESSAGE);
}

#[tokio::test]
async fn missing_csrf_is_auth_error() {
    let server = MockServer::start().await;
    mount_login_page(&server, r#"<form><input name="state" value="s"></form>"#).await;

    let err = authenticator(&server).authenticate(&credential()).await.unwrap_err();

    assert!(matches!(err, RsmError::Auth { .. }));
    assert!(err.to_string().contains("CSRF"), "{err}");
}

#[tokio::test]
async fn rejected_credentials_are_auth_error() {
    let server = MockServer::start().await;
    mount_login_page(&server, LOGIN_FORM).await;
    Mock::given(method("POST"))
        .and(path("/idp/login/submit"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = authenticator(&server).authenticate(&credential()).await.unwrap_err();

    assert_eq!(err.to_string(), "login rejected: HTTP 403");
}

#[tokio::test]
async fn staying_on_identity_provider_is_auth_error() {
    let server = MockServer::start().await;
    mount_login_page(&server, LOGIN_FORM).await;
    Mock::given(method("POST"))
        .and(path("/idp/login/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Wrong email or password"))
        .mount(&server)
        .await;

    let err = authenticator(&server).authenticate(&credential()).await.unwrap_err();

    assert!(err.to_string().contains("did not return to the portal"), "{err}");
}

#[tokio::test]
async fn expired_token_cookie_is_rejected() {
    let server = MockServer::start().await;
    let jwt = make_test_jwt(Utc::now().timestamp() - 60);
    mount_login_page(&server, LOGIN_FORM).await;
    mount_submit_to_portal(
        &server,
        ResponseTemplate::new(200).insert_header("Set-Cookie", format!("t={jwt}; Path=/").as_str()),
    )
    .await;

    let err = authenticator(&server).authenticate(&credential()).await.unwrap_err();

    assert!(err.to_string().contains("expired"), "{err}");
}
