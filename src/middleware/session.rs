//! Stateless sessions carried in private cookies.
//!
//! The claims cookie is the session: no server-side record exists, and a
//! cookie that fails authentication is indistinguishable from a missing one.

use axum_extra::extract::PrivateCookieJar;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use super::config::AuthSettings;
use super::cookies::{
    self, ACCESS_TOKEN_COOKIE_NAME, ID_TOKEN_COOKIE_NAME, REFRESH_TOKEN_COOKIE_NAME,
    SESSION_COOKIE_NAME, SESSION_COOKIES,
};
use crate::types::{Session, TokenSet, UserClaims};

/// Write claims and raw tokens into the jar.
///
/// Any refresh token from an earlier session is expired when the new token
/// set has none.
#[must_use]
pub(crate) fn persist(
    jar: PrivateCookieJar,
    tokens: &TokenSet,
    settings: &AuthSettings,
) -> PrivateCookieJar {
    let ttl = settings.session_ttl_days;
    let secure = settings.secure_cookies;
    let cookie = |name, value| cookies::session_cookie(name, value, ttl, secure);

    let jar = jar
        .add(cookie(SESSION_COOKIE_NAME, encode_claims(&tokens.claims)))
        .add(cookie(ACCESS_TOKEN_COOKIE_NAME, tokens.access_token.clone()))
        .add(cookie(ID_TOKEN_COOKIE_NAME, tokens.id_token.clone()));

    match &tokens.refresh_token {
        Some(token) => jar.add(cookie(REFRESH_TOKEN_COOKIE_NAME, token.clone())),
        None => jar.add(cookies::removal_cookie(REFRESH_TOKEN_COOKIE_NAME)),
    }
}

/// Rebuild the session from the jar.
///
/// Returns `None` when the claims cookie is missing, fails authentication,
/// or does not decode. This is the normal "not logged in" signal, not an
/// error.
#[must_use]
pub fn load(jar: &PrivateCookieJar) -> Option<Session> {
    let cookie = jar.get(SESSION_COOKIE_NAME)?;
    let claims = match decode_claims(cookie.value()) {
        Some(claims) => claims,
        None => {
            tracing::debug!("Session cookie authenticated but undecodable");
            return None;
        }
    };
    let token = |name| jar.get(name).map(|c| c.value().to_string());

    Some(Session {
        claims,
        access_token: token(ACCESS_TOKEN_COOKIE_NAME),
        refresh_token: token(REFRESH_TOKEN_COOKIE_NAME),
        id_token: token(ID_TOKEN_COOKIE_NAME),
    })
}

/// Refresh token from the jar, whether or not the claims cookie survived.
#[must_use]
pub fn refresh_token(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(REFRESH_TOKEN_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Expire every session cookie unconditionally.
#[must_use]
pub fn clear(jar: PrivateCookieJar) -> PrivateCookieJar {
    SESSION_COOKIES
        .into_iter()
        .fold(jar, |jar, name| jar.add(cookies::removal_cookie(name)))
}

fn encode_claims(claims: &UserClaims) -> String {
    // Serializing a struct of strings cannot fail.
    let json = serde_json::to_vec(claims).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

fn decode_claims(value: &str) -> Option<UserClaims> {
    let json = URL_SAFE_NO_PAD.decode(value).ok()?;
    serde_json::from_slice(&json).ok()
}
