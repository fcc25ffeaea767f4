use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::types::PendingAuthRequest;

pub(super) const STATE_COOKIE_NAME: &str = "oidc_state";
pub(super) const NONCE_COOKIE_NAME: &str = "oidc_nonce";
pub(super) const PKCE_COOKIE_NAME: &str = "oidc_pkce";

pub(super) const SESSION_COOKIE_NAME: &str = "session";
pub(super) const ACCESS_TOKEN_COOKIE_NAME: &str = "access_token";
pub(super) const REFRESH_TOKEN_COOKIE_NAME: &str = "refresh_token";
pub(super) const ID_TOKEN_COOKIE_NAME: &str = "id_token";

const PENDING_COOKIES: [&str; 3] = [STATE_COOKIE_NAME, NONCE_COOKIE_NAME, PKCE_COOKIE_NAME];

pub(super) const SESSION_COOKIES: [&str; 4] = [
    SESSION_COOKIE_NAME,
    ACCESS_TOKEN_COOKIE_NAME,
    REFRESH_TOKEN_COOKIE_NAME,
    ID_TOKEN_COOKIE_NAME,
];

/// Short-lived cookie carrying one login marker.
fn pending_cookie(name: &'static str, value: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::minutes(5))
        .build()
}

/// Store the pending login request in the jar.
pub(super) fn add_pending(
    jar: PrivateCookieJar,
    pending: &PendingAuthRequest,
    secure: bool,
) -> PrivateCookieJar {
    let jar = jar
        .add(pending_cookie(STATE_COOKIE_NAME, &pending.state, secure))
        .add(pending_cookie(NONCE_COOKIE_NAME, &pending.nonce, secure));

    match &pending.code_verifier {
        Some(verifier) => jar.add(pending_cookie(PKCE_COOKIE_NAME, verifier, secure)),
        None => jar.add(removal_cookie(PKCE_COOKIE_NAME)),
    }
}

/// Read the pending login request. `None` unless both state and nonce
/// cookies are present and authentic.
pub(super) fn get_pending(jar: &PrivateCookieJar) -> Option<PendingAuthRequest> {
    let state = jar.get(STATE_COOKIE_NAME)?.value().to_string();
    let nonce = jar.get(NONCE_COOKIE_NAME)?.value().to_string();
    let code_verifier = jar.get(PKCE_COOKIE_NAME).map(|c| c.value().to_string());

    Some(PendingAuthRequest {
        state,
        nonce,
        code_verifier,
    })
}

/// Expire every pending-request cookie.
pub(super) fn clear_pending(jar: PrivateCookieJar) -> PrivateCookieJar {
    PENDING_COOKIES
        .into_iter()
        .fold(jar, |jar, name| jar.add(removal_cookie(name)))
}

/// Session-bearing cookie.
pub(super) fn session_cookie(
    name: &'static str,
    value: String,
    ttl_days: i64,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::days(ttl_days))
        .build()
}

/// Cookie that makes the browser drop `name`, whether or not the request
/// carried it.
pub(super) fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}
