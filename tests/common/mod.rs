//! Shared fixtures: a fake provider on wiremock, ID token minting with a
//! fixed P-256 key, and a minimal cookie-keeping browser.
#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use p256::SecretKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::{EncodePrivateKey, LineEnding};
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oidc_cookie_auth::middleware::{AuthConfig, CookieKey, auth_routes};
use oidc_cookie_auth::{AuthClient, ClientConfig};

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";
pub const REDIRECT_URI: &str = "http://localhost:3000/oauth/callback";
pub const KEY_ID: &str = "test-key";

/// Provider signing key. Fixed so failures are reproducible.
pub fn signing_key() -> SecretKey {
    SecretKey::from_slice(&[7u8; 32]).unwrap()
}

/// A key the provider does not publish.
pub fn foreign_key() -> SecretKey {
    SecretKey::from_slice(&[9u8; 32]).unwrap()
}

pub fn public_jwk(key: &SecretKey, kid: &str) -> Value {
    let point = key.public_key().to_encoded_point(false);
    json!({
        "kty": "EC",
        "crv": "P-256",
        "x": URL_SAFE_NO_PAD.encode(point.x().unwrap()),
        "y": URL_SAFE_NO_PAD.encode(point.y().unwrap()),
        "kid": kid,
        "alg": "ES256",
        "use": "sig",
    })
}

/// RSA public key (RFC 7517 appendix A.1) published without `alg`.
pub fn rsa_jwk(kid: &str) -> Value {
    json!({
        "kty": "RSA",
        "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
        "e": "AQAB",
        "kid": kid,
    })
}

pub fn jwks() -> JwkSet {
    serde_json::from_value(json!({ "keys": [public_jwk(&signing_key(), KEY_ID)] })).unwrap()
}

pub fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Well-formed ID token claims for `nonce`, valid for five minutes.
pub fn id_claims(issuer: &str, nonce: &str) -> Value {
    let now = now();
    json!({
        "iss": issuer,
        "aud": CLIENT_ID,
        "sub": "user-123",
        "name": "Test User",
        "preferred_username": "tester",
        "nonce": nonce,
        "iat": now,
        "exp": now + 300,
    })
}

pub fn mint_with(key: &SecretKey, kid: Option<&str>, claims: &Value) -> String {
    let pem = key.to_pkcs8_pem(LineEnding::LF).unwrap();
    let encoding_key = EncodingKey::from_ec_pem(pem.as_bytes()).unwrap();
    let mut header = Header::new(Algorithm::ES256);
    header.kid = kid.map(String::from);
    jsonwebtoken::encode(&header, claims, &encoding_key).unwrap()
}

/// ID token signed by the provider's published key.
pub fn mint_id_token(claims: &Value) -> String {
    mint_with(&signing_key(), Some(KEY_ID), claims)
}

pub fn client_config(discovery_url: Url) -> ClientConfig {
    ClientConfig::new(
        CLIENT_ID,
        CLIENT_SECRET,
        REDIRECT_URI.parse().unwrap(),
        discovery_url,
    )
    .with_discovery_retry_delay(Duration::from_millis(10))
}

/// Identity provider served by wiremock.
pub struct MockIdp {
    pub server: MockServer,
}

impl MockIdp {
    /// Start a provider with discovery and JWKS mounted.
    pub async fn start() -> Self {
        let idp = Self::start_bare().await;
        idp.mount_discovery(idp.discovery_document()).await;
        idp.mount_jwks().await;
        idp
    }

    /// Start a provider with nothing mounted.
    pub async fn start_bare() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn issuer(&self) -> String {
        self.server.uri()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server.uri())
    }

    pub fn discovery_url(&self) -> Url {
        self.url("/.well-known/openid-configuration").parse().unwrap()
    }

    pub fn discovery_document(&self) -> Value {
        json!({
            "issuer": self.issuer(),
            "authorization_endpoint": self.url("/authorize"),
            "token_endpoint": self.url("/token"),
            "jwks_uri": self.url("/jwks"),
            "revocation_endpoint": self.url("/revoke"),
            "id_token_signing_alg_values_supported": ["ES256"],
        })
    }

    pub async fn mount_discovery(&self, document: Value) {
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(document))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_jwks(&self) {
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks()))
            .mount(&self.server)
            .await;
    }

    pub fn client_config(&self) -> ClientConfig {
        client_config(self.discovery_url())
    }

    pub async fn client(&self) -> AuthClient {
        AuthClient::discover(self.client_config()).await.unwrap()
    }

    /// Token endpoint response for a successful exchange.
    pub fn token_body(&self, nonce: &str) -> Value {
        json!({
            "access_token": "access-1",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-1",
            "id_token": mint_id_token(&id_claims(&self.issuer(), nonce)),
        })
    }
}

/// Router with a fixed cookie key and `Secure` cookies.
pub fn app(client: AuthClient) -> Router {
    auth_routes(AuthConfig::new(client).with_cookie_key(CookieKey::from(&[42u8; 64][..])))
}

/// Cookie store that replays `Set-Cookie` on the next request.
#[derive(Debug, Default)]
pub struct Browser {
    cookies: HashMap<String, String>,
}

impl Browser {
    pub async fn get(&mut self, app: &Router, uri: &str) -> Response<Body> {
        self.send(app, Method::GET, uri).await
    }

    pub async fn send(&mut self, app: &Router, method: Method, uri: &str) -> Response<Body> {
        let mut request = Request::builder().method(method).uri(uri);
        if !self.cookies.is_empty() {
            request = request.header(header::COOKIE, self.cookie_header());
        }
        let response = app
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        self.store(&response);
        response
    }

    pub fn has(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn set_raw(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn store(&mut self, response: &Response<Body>) {
        for raw in response.headers().get_all(header::SET_COOKIE) {
            let raw = raw.to_str().unwrap();
            let pair = raw.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            if raw.contains("Max-Age=0") {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
    }
}

pub fn location(response: &Response<Body>) -> String {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Authorization request parameters from a `/login` redirect.
pub struct LoginRedirect {
    pub url: Url,
    pub state: String,
    pub nonce: String,
}

pub async fn start_login(browser: &mut Browser, app: &Router) -> LoginRedirect {
    let response = browser.get(app, "/login").await;
    let url: Url = location(&response).parse().unwrap();
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .unwrap()
    };
    let state = param("state");
    let nonce = param("nonce");
    LoginRedirect { url, state, nonce }
}
