use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::AuthSettings;
use super::guard::SessionGate;
use crate::provider::IdentityProvider;

/// Shared state for auth route handlers. Written once at startup.
pub(super) struct AuthState<P> {
    pub(super) provider: Arc<P>,
    pub(super) settings: AuthSettings,
}

// Manual Clone: avoid derive adding a `P: Clone` bound.
impl<P> Clone for AuthState<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            settings: self.settings.clone(),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl<P: IdentityProvider> FromRef<AuthState<P>> for Key {
    fn from_ref(state: &AuthState<P>) -> Self {
        state.settings.cookie_key.clone()
    }
}

impl<P: IdentityProvider> FromRef<AuthState<P>> for SessionGate {
    fn from_ref(state: &AuthState<P>) -> Self {
        state.settings.gate()
    }
}
