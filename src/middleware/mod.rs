//! Axum routes, session cookies and the access guard.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use oidc_cookie_auth::middleware::{AuthConfig, AuthSession, auth_routes};
//!
//! let config = AuthConfig::from_env(client)?;
//! let gate = config.gate();
//!
//! let app = axum::Router::new()
//!     .route("/account", get(account))
//!     .with_state(AppState { gate })
//!     .merge(auth_routes(config));
//!
//! async fn account(AuthSession(session): AuthSession) -> String {
//!     session.claims.sub
//! }
//! ```

mod config;
mod cookies;
mod error;
mod guard;
mod routes;
mod session;
mod state;

pub use config::{AuthConfig, CookieKeySource};
pub use guard::{AuthSession, Guard, SessionGate, require_session};
pub use routes::auth_routes;
pub use session::{clear as clear_session, load as load_session, refresh_token};

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
