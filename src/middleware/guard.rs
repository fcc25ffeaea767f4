use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::Key;

use super::session;
use crate::types::Session;

/// Outcome of a session check.
#[derive(Debug)]
pub enum Guard {
    /// The request carries an authentic session.
    Allow(Session),
    /// No usable session; send the client to the login route.
    Deny(Redirect),
}

/// Check the jar for a session, redirecting to `login_path` when there is none.
///
/// Expiry is not enforced beyond cookie authentication and max-age.
#[must_use]
pub fn require_session(jar: &PrivateCookieJar, login_path: &str) -> Guard {
    match session::load(jar) {
        Some(session) => Guard::Allow(session),
        None => Guard::Deny(Redirect::to(login_path)),
    }
}

/// What [`AuthSession`] needs from the router state.
///
/// [`auth_routes`](super::auth_routes) provides it for its own routes. To
/// guard routes of an application router, keep a clone from
/// [`AuthConfig::gate`](super::AuthConfig::gate) in the application state:
///
/// ```rust,ignore
/// #[derive(Clone)]
/// struct AppState {
///     gate: SessionGate,
/// }
///
/// impl FromRef<AppState> for SessionGate {
///     fn from_ref(state: &AppState) -> Self {
///         state.gate.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct SessionGate {
    pub(super) key: Key,
    pub(super) login_path: String,
}

/// Authenticated session extracted from the request cookies.
///
/// Rejects with a redirect to the login route when the session cookie is
/// missing or fails authentication.
///
/// ```rust,ignore
/// async fn dashboard(AuthSession(session): AuthSession) -> impl IntoResponse {
///     format!("Hello, {}", session.claims.sub)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthSession(pub Session);

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    SessionGate: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = SessionGate::from_ref(state);
        let jar = PrivateCookieJar::from_headers(&parts.headers, gate.key);

        match require_session(&jar, &gate.login_path) {
            Guard::Allow(session) => Ok(Self(session)),
            Guard::Deny(redirect) => {
                tracing::debug!(path = %parts.uri.path(), "No session; redirecting to login");
                Err(redirect)
            }
        }
    }
}
