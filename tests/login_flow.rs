mod common;

use std::collections::HashMap;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{
    Browser, CLIENT_ID, MockIdp, app, body_json, body_text, id_claims, location, mint_id_token,
    set_cookies, start_login,
};

async fn mount_token(idp: &MockIdp, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&idp.server)
        .await;
}

#[tokio::test]
async fn test_guarded_routes_redirect_to_login() {
    let idp = MockIdp::start().await;
    let app = app(idp.client().await);
    let mut browser = Browser::default();

    for uri in ["/", "/home"] {
        let response = browser.get(&app, uri).await;
        assert_eq!(location(&response), "/login", "{uri}");
    }
}

#[tokio::test]
async fn test_login_redirects_to_provider_with_markers() {
    let idp = MockIdp::start().await;
    let app = app(idp.client().await);
    let mut browser = Browser::default();

    let response = browser.get(&app, "/login").await;
    let target = location(&response);
    assert!(target.starts_with(&idp.url("/authorize?")));

    let cookies = set_cookies(&response);
    for name in ["oidc_state=", "oidc_nonce=", "oidc_pkce="] {
        let cookie = cookies.iter().find(|c| c.starts_with(name)).unwrap();
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=300"));
    }

    let url: url::Url = target.parse().unwrap();
    let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
    assert_eq!(params["client_id"], CLIENT_ID);
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["code_challenge_method"], "S256");
    assert!(params["scope"].starts_with("openid"));
    assert!(
        !cookies
            .iter()
            .any(|c| c.contains(&params["state"]) || c.contains(&params["nonce"])),
        "login markers must not be readable from the cookies"
    );
}

#[tokio::test]
async fn test_successful_login_establishes_session() {
    let idp = MockIdp::start().await;
    let app = app(idp.client().await);
    let mut browser = Browser::default();

    let login = start_login(&mut browser, &app).await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=auth-code-1"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(idp.token_body(&login.nonce)))
        .expect(1)
        .mount(&idp.server)
        .await;

    let response = browser
        .get(
            &app,
            &format!("/oauth/callback?code=auth-code-1&state={}", login.state),
        )
        .await;
    assert_eq!(location(&response), "/home");
    for name in ["session", "access_token", "refresh_token", "id_token"] {
        assert!(browser.has(name), "missing {name}");
    }
    for name in ["oidc_state", "oidc_nonce", "oidc_pkce"] {
        assert!(!browser.has(name), "{name} must be cleared");
    }
    assert!(
        !set_cookies(&response)
            .iter()
            .any(|c| c.contains("access-1") || c.contains("user-123")),
        "session cookies must be opaque"
    );

    let response = browser.get(&app, "/home").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[axum::http::header::CONTENT_TYPE],
        "application/json"
    );
    let claims = body_json(response).await;
    assert_eq!(claims["sub"], "user-123");
    assert_eq!(claims["name"], "Test User");
    assert_eq!(claims["preferred_username"], "tester");

    let response = browser.get(&app, "/").await;
    assert_eq!(location(&response), "/home");
}

#[tokio::test]
async fn test_state_mismatch_never_exchanges_code() {
    let idp = MockIdp::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&idp.server)
        .await;
    let app = app(idp.client().await);
    let mut browser = Browser::default();

    let _first = start_login(&mut browser, &app).await;
    let response = browser
        .get(&app, "/oauth/callback?code=auth-code-1&state=forged-state")
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!browser.has("session"));
    assert!(!browser.has("oidc_state"), "pending markers are single-use");
}

#[tokio::test]
async fn test_callback_without_login_is_rejected() {
    let idp = MockIdp::start().await;
    let app = app(idp.client().await);
    let mut browser = Browser::default();

    let response = browser
        .get(&app, "/oauth/callback?code=auth-code-1&state=anything")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!browser.has("session"));
}

#[tokio::test]
async fn test_replayed_code_is_rejected() {
    let idp = MockIdp::start().await;
    let app = app(idp.client().await);
    let mut browser = Browser::default();

    let first = start_login(&mut browser, &app).await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(idp.token_body(&first.nonce)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&idp.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
        })))
        .mount(&idp.server)
        .await;

    let response = browser
        .get(&app, &format!("/oauth/callback?code=C&state={}", first.state))
        .await;
    assert_eq!(location(&response), "/home");

    // A second browser replays the same code with its own valid state.
    let mut attacker = Browser::default();
    let second = start_login(&mut attacker, &app).await;
    let response = attacker
        .get(&app, &format!("/oauth/callback?code=C&state={}", second.state))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!attacker.has("session"));
}

#[tokio::test]
async fn test_nonce_mismatch_is_unauthorized() {
    let idp = MockIdp::start().await;
    let app = app(idp.client().await);
    let mut browser = Browser::default();

    let login = start_login(&mut browser, &app).await;
    mount_token(&idp, idp.token_body("nonce-of-another-login")).await;

    let response = browser
        .get(&app, &format!("/oauth/callback?code=C&state={}", login.state))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(!browser.has("session"));
}

#[tokio::test]
async fn test_token_from_wrong_issuer_is_unauthorized() {
    let idp = MockIdp::start().await;
    let app = app(idp.client().await);
    let mut browser = Browser::default();

    let login = start_login(&mut browser, &app).await;
    let id_token = mint_id_token(&id_claims("https://evil.test", &login.nonce));
    mount_token(
        &idp,
        json!({ "access_token": "access-1", "id_token": id_token }),
    )
    .await;

    let response = browser
        .get(&app, &format!("/oauth/callback?code=C&state={}", login.state))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_provider_error_is_bad_request() {
    let idp = MockIdp::start().await;
    let app = app(idp.client().await);
    let mut browser = Browser::default();

    let _login = start_login(&mut browser, &app).await;
    let response = browser
        .get(
            &app,
            "/oauth/callback?error=access_denied&error_description=user%20said%20no",
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_text(response).await;
    assert!(!body.contains("user said no"));
}

#[tokio::test]
async fn test_tampered_session_cookie_redirects_to_login() {
    let idp = MockIdp::start().await;
    let app = app(idp.client().await);
    let mut browser = Browser::default();

    browser.set_raw("session", "eyJzdWIiOiJhZG1pbiJ9");
    let response = browser.get(&app, "/home").await;
    assert_eq!(location(&response), "/login");
}

/// Log `browser` in; the provider issues `refresh-1`.
async fn log_in(idp: &MockIdp, app: &axum::Router, browser: &mut Browser) {
    let login = start_login(browser, app).await;
    mount_token(idp, idp.token_body(&login.nonce)).await;
    let response = browser
        .get(app, &format!("/oauth/callback?code=C&state={}", login.state))
        .await;
    assert_eq!(location(&response), "/home");
    assert!(browser.has("refresh_token"));
}

/// Revocation runs in a detached task; give it time to reach the provider.
async fn wait_for_revocation(idp: &MockIdp) {
    for _ in 0..50 {
        let requests = idp.server.received_requests().await.unwrap_or_default();
        if requests.iter().any(|r| r.url.path() == "/revoke") {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let idp = MockIdp::start().await;
    Mock::given(method("POST"))
        .and(path("/revoke"))
        .and(body_string_contains("token=refresh-1"))
        .and(body_string_contains("token_type_hint=refresh_token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&idp.server)
        .await;
    let app = app(idp.client().await);
    let mut browser = Browser::default();
    log_in(&idp, &app, &mut browser).await;

    let response = browser.get(&app, "/logout").await;
    assert_eq!(location(&response), "/");
    assert!(!browser.has("session"));

    wait_for_revocation(&idp).await;
}

#[tokio::test]
async fn test_logout_clears_session_even_when_revocation_fails() {
    let idp = MockIdp::start().await;
    Mock::given(method("POST"))
        .and(path("/revoke"))
        .and(body_string_contains("token=refresh-1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&idp.server)
        .await;
    let app = app(idp.client().await);
    let mut browser = Browser::default();
    log_in(&idp, &app, &mut browser).await;

    let response = browser.send(&app, Method::POST, "/logout").await;
    assert_eq!(location(&response), "/");
    for name in ["session", "access_token", "refresh_token", "id_token"] {
        assert!(!browser.has(name), "{name} must be cleared");
    }

    let response = browser.get(&app, "/home").await;
    assert_eq!(location(&response), "/login");

    wait_for_revocation(&idp).await;
}

#[tokio::test]
async fn test_logout_without_session_still_redirects() {
    let idp = MockIdp::start().await;
    Mock::given(method("POST"))
        .and(path("/revoke"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&idp.server)
        .await;
    let app = app(idp.client().await);
    let mut browser = Browser::default();

    let response = browser.get(&app, "/logout").await;
    assert_eq!(location(&response), "/");
    assert_eq!(set_cookies(&response).len(), 4);
}
