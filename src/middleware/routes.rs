use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::{Json, Redirect};
use axum::routing::get;
use axum_extra::extract::PrivateCookieJar;

use super::config::{AuthConfig, CookieKeySource};
use super::cookies;
use super::guard::AuthSession;
use super::session;
use super::state::AuthState;
use crate::callback::{CallbackParams, verify_callback};
use crate::error::{CallbackError, RevocationFailure};
use crate::provider::IdentityProvider;
use crate::types::UserClaims;

/// Create the authentication router.
///
/// Mounts the entry, login, callback, logout and home routes at the paths
/// held by `config`.
pub fn auth_routes<P: IdentityProvider>(config: AuthConfig<P>) -> Router {
    let settings = config.settings;

    match settings.key_source {
        CookieKeySource::Configured => tracing::info!("Using configured cookie key"),
        CookieKeySource::Ephemeral => {
            tracing::warn!("Using ephemeral cookie key; sessions will not survive a restart")
        }
    }

    let router = Router::new()
        .route(&settings.entry_path, get(entry::<P>))
        .route(&settings.login_path, get(login::<P>))
        .route(&settings.callback_path, get(callback::<P>))
        .route(&settings.logout_path, get(logout::<P>).post(logout::<P>))
        .route(&settings.home_path, get(home));

    router.with_state(AuthState {
        provider: Arc::new(config.provider),
        settings,
    })
}

// ── Entry / Home ───────────────────────────────────────────────────

async fn entry<P: IdentityProvider>(
    State(state): State<AuthState<P>>,
    AuthSession(_): AuthSession,
) -> Redirect {
    Redirect::to(&state.settings.home_path)
}

/// Signed-in landing page. Returns the verified claims as JSON; rendering them
/// as a page is left to the embedding application.
async fn home(AuthSession(session): AuthSession) -> Json<UserClaims> {
    Json(session.claims)
}

// ── Login ──────────────────────────────────────────────────────────

async fn login<P: IdentityProvider>(
    State(state): State<AuthState<P>>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    let request = state.provider.begin_login();
    let jar = cookies::add_pending(jar, &request.pending, state.settings.secure_cookies);

    tracing::debug!("Redirecting to authorization endpoint");
    (jar, Redirect::to(request.url.as_str()))
}

// ── Callback ───────────────────────────────────────────────────────

async fn callback<P: IdentityProvider>(
    State(state): State<AuthState<P>>,
    jar: PrivateCookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(PrivateCookieJar, Redirect), (PrivateCookieJar, CallbackError)> {
    // Pending markers are single-use, whatever the outcome.
    let pending = cookies::get_pending(&jar);
    let jar = cookies::clear_pending(jar);

    match verify_callback(state.provider.as_ref(), params, pending).await {
        Ok(tokens) => {
            tracing::info!(sub = %tokens.claims.sub, "Login successful");
            let jar = session::persist(jar, &tokens, &state.settings);
            Ok((jar, Redirect::to(&state.settings.home_path)))
        }
        Err(e) => Err((jar, e)),
    }
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout<P: IdentityProvider>(
    State(state): State<AuthState<P>>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    if let Some(refresh_token) = session::refresh_token(&jar) {
        let provider = state.provider.clone();
        let timeout = state.settings.revocation_timeout;

        tokio::spawn(async move {
            match tokio::time::timeout(timeout, provider.revoke(&refresh_token)).await {
                Ok(Ok(())) => tracing::debug!("Refresh token revoked"),
                Ok(Err(RevocationFailure::Unsupported)) => {
                    tracing::debug!("Provider has no revocation endpoint; skipped")
                }
                Ok(Err(e)) => tracing::warn!(error = %e, "Refresh token revocation failed"),
                Err(_) => tracing::warn!(?timeout, "Refresh token revocation timed out"),
            }
        });
    }

    (session::clear(jar), Redirect::to(&state.settings.entry_path))
}
