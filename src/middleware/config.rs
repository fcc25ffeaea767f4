use std::time::Duration;

use axum_extra::extract::cookie::Key;

use super::guard::SessionGate;
use crate::error::ConfigError;
use crate::provider::IdentityProvider;

/// Where the cookie key came from.
///
/// An [`Ephemeral`](CookieKeySource::Ephemeral) key is generated at startup,
/// so every session issued by a previous process stops validating after a
/// restart. Supply a [`Configured`](CookieKeySource::Configured) key to keep
/// sessions across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieKeySource {
    Configured,
    Ephemeral,
}

/// Shared auth settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct AuthSettings {
    pub(crate) cookie_key: Key,
    pub(crate) key_source: CookieKeySource,
    pub(crate) secure_cookies: bool,
    pub(crate) session_ttl_days: i64,
    pub(crate) login_path: String,
    pub(crate) callback_path: String,
    pub(crate) logout_path: String,
    pub(crate) home_path: String,
    pub(crate) entry_path: String,
    pub(crate) revocation_timeout: Duration,
}

impl AuthSettings {
    pub(crate) fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            key_source: CookieKeySource::Ephemeral,
            secure_cookies: true,
            session_ttl_days: 30,
            login_path: "/login".into(),
            callback_path: "/oauth/callback".into(),
            logout_path: "/logout".into(),
            home_path: "/home".into(),
            entry_path: "/".into(),
            revocation_timeout: Duration::from_secs(10),
        }
    }

    pub(crate) fn gate(&self) -> SessionGate {
        SessionGate {
            key: self.cookie_key.clone(),
            login_path: self.login_path.clone(),
        }
    }
}

/// Authentication route configuration.
///
/// Required field (`provider`) is a constructor parameter. Use
/// [`from_env()`](AuthConfig::from_env) for convention-based setup, or
/// [`new()`](AuthConfig::new) with `with_*` methods for full control.
pub struct AuthConfig<P> {
    pub(super) provider: P,
    pub(super) settings: AuthSettings,
}

impl<P: IdentityProvider> AuthConfig<P> {
    /// Create config with an ephemeral cookie key and default routes.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            settings: AuthSettings::defaults(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `COOKIE_SECRET`: cookie key material, at least 64 bytes. When
    ///   unset, an ephemeral key is generated.
    /// - `COOKIE_INSECURE`: `"1"` or `"true"` drops the `Secure` attribute
    ///   (plain-HTTP local development only)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `COOKIE_SECRET` is set but too short.
    pub fn from_env(provider: P) -> Result<Self, ConfigError> {
        Self::from_lookup(provider, |name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(
        provider: P,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let insecure = matches!(lookup("COOKIE_INSECURE").as_deref(), Some("1" | "true"));
        let mut config = Self::new(provider).with_secure_cookies(!insecure);

        match lookup("COOKIE_SECRET") {
            Some(secret) => {
                let key = Key::try_from(secret.as_bytes()).map_err(|_| {
                    ConfigError::invalid(
                        "COOKIE_SECRET",
                        "must be at least 64 bytes; unset it to use an ephemeral key",
                    )
                })?;
                config = config.with_cookie_key(key);
            }
            None => tracing::warn!(
                "COOKIE_SECRET not set; using an ephemeral cookie key, sessions end on restart"
            ),
        }

        Ok(config)
    }

    /// Use a stable cookie key. Marks the key source as configured.
    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self.settings.key_source = CookieKeySource::Configured;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    /// Max-age of the session cookies (default: 30 days).
    #[must_use]
    pub fn with_session_ttl_days(mut self, days: i64) -> Self {
        self.settings.session_ttl_days = days;
        self
    }

    /// Where the guard sends unauthenticated requests (default: `/login`).
    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.settings.login_path = path.into();
        self
    }

    /// Path of the redirect URI route (default: `/oauth/callback`).
    ///
    /// Must match the path of the configured redirect URI.
    #[must_use]
    pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
        self.settings.callback_path = path.into();
        self
    }

    #[must_use]
    pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
        self.settings.logout_path = path.into();
        self
    }

    /// Landing page after login (default: `/home`).
    #[must_use]
    pub fn with_home_path(mut self, path: impl Into<String>) -> Self {
        self.settings.home_path = path.into();
        self
    }

    /// Landing page after logout (default: `/`).
    #[must_use]
    pub fn with_entry_path(mut self, path: impl Into<String>) -> Self {
        self.settings.entry_path = path.into();
        self
    }

    /// Upper bound for the background revocation call (default: 10 seconds).
    #[must_use]
    pub fn with_revocation_timeout(mut self, timeout: Duration) -> Self {
        self.settings.revocation_timeout = timeout;
        self
    }

    #[must_use]
    pub fn key_source(&self) -> CookieKeySource {
        self.settings.key_source
    }

    /// Cookie key and login path for guarding application routes with
    /// [`AuthSession`](super::AuthSession).
    #[must_use]
    pub fn gate(&self) -> SessionGate {
        self.settings.gate()
    }
}
