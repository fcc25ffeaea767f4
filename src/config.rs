use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

use crate::error::ConfigError;

/// Relying-party registration with the identity provider.
///
/// Required fields are constructor parameters; everything else has a default
/// and a `with_*` override. Immutable once handed to [`AuthClient`](crate::AuthClient).
///
/// ```rust,ignore
/// let config = ClientConfig::new(
///     "my-client",
///     "my-secret",
///     "https://app.example.com/oauth/callback".parse()?,
///     "https://idp.example.com/.well-known/openid-configuration".parse()?,
/// )
/// .with_clock_skew(Duration::from_secs(60));
/// ```
#[derive(Clone)]
#[non_exhaustive]
pub struct ClientConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) redirect_uri: Url,
    pub(crate) discovery_url: Url,
    pub(crate) scopes: Vec<String>,
    pub(crate) id_token_algorithm: Algorithm,
    pub(crate) clock_skew: Duration,
    pub(crate) http_timeout: Duration,
    pub(crate) discovery_attempts: u32,
    pub(crate) discovery_retry_delay: Duration,
    pub(crate) use_pkce: bool,
}

impl ClientConfig {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: Url,
        discovery_url: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri,
            discovery_url,
            scopes: vec!["openid".into(), "profile".into()],
            id_token_algorithm: Algorithm::ES256,
            clock_skew: Duration::from_secs(180),
            http_timeout: Duration::from_secs(10),
            discovery_attempts: 3,
            discovery_retry_delay: Duration::from_secs(2),
            use_pkce: true,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `OIDC_DISCOVERY_URL`: provider's `/.well-known/openid-configuration`
    /// - `OIDC_CLIENT_ID`, `OIDC_CLIENT_SECRET`
    /// - `OIDC_REDIRECT_URI`: absolute URL of the `/oauth/callback` route
    ///
    /// # Optional env vars
    /// - `OIDC_SCOPES`: comma-separated scopes
    /// - `OIDC_ID_TOKEN_ALG`: expected JWS algorithm (e.g. `ES256`, `RS256`)
    /// - `OIDC_CLOCK_SKEW_SECS`, `OIDC_HTTP_TIMEOUT_SECS`
    /// - `OIDC_DISCOVERY_RETRIES`: discovery attempts before giving up
    /// - `OIDC_PKCE`: `"0"` or `"false"` disables PKCE
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let required = |var: &'static str| lookup(var).ok_or(ConfigError::Missing(var));
        let url = |var: &'static str, value: String| {
            value
                .parse::<Url>()
                .map_err(|e| ConfigError::invalid(var, e))
        };
        let secs = |var: &'static str, value: String| {
            value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::invalid(var, e))
        };

        let discovery_url = url("OIDC_DISCOVERY_URL", required("OIDC_DISCOVERY_URL")?)?;
        let redirect_uri = url("OIDC_REDIRECT_URI", required("OIDC_REDIRECT_URI")?)?;
        let mut config = Self::new(
            required("OIDC_CLIENT_ID")?,
            required("OIDC_CLIENT_SECRET")?,
            redirect_uri,
            discovery_url,
        );

        if let Some(scopes) = lookup("OIDC_SCOPES") {
            config = config.with_scopes(
                scopes
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            );
        }
        if let Some(alg) = lookup("OIDC_ID_TOKEN_ALG") {
            let alg = Algorithm::from_str(alg.trim())
                .map_err(|e| ConfigError::invalid("OIDC_ID_TOKEN_ALG", e))?;
            config = config.with_id_token_algorithm(alg);
        }
        if let Some(value) = lookup("OIDC_CLOCK_SKEW_SECS") {
            config = config.with_clock_skew(secs("OIDC_CLOCK_SKEW_SECS", value)?);
        }
        if let Some(value) = lookup("OIDC_HTTP_TIMEOUT_SECS") {
            config = config.with_http_timeout(secs("OIDC_HTTP_TIMEOUT_SECS", value)?);
        }
        if let Some(value) = lookup("OIDC_DISCOVERY_RETRIES") {
            let attempts = value
                .trim()
                .parse::<u32>()
                .map_err(|e| ConfigError::invalid("OIDC_DISCOVERY_RETRIES", e))?;
            config = config.with_discovery_attempts(attempts);
        }
        if let Some(value) = lookup("OIDC_PKCE") {
            config = config.with_pkce(!matches!(value.trim(), "0" | "false"));
        }

        Ok(config)
    }

    /// Override the requested scopes (default: `["openid", "profile"]`).
    ///
    /// `openid` is always sent, even if missing here.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Override the expected ID token signing algorithm (default: `ES256`).
    #[must_use]
    pub fn with_id_token_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.id_token_algorithm = algorithm;
        self
    }

    /// Clock-skew tolerance for `exp`/`nbf` (default: 180 seconds).
    #[must_use]
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }

    /// Timeout for every request to the provider (default: 10 seconds).
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Discovery attempts before startup fails (default: 3, minimum 1).
    #[must_use]
    pub fn with_discovery_attempts(mut self, attempts: u32) -> Self {
        self.discovery_attempts = attempts.max(1);
        self
    }

    /// Delay between discovery attempts (default: 2 seconds).
    #[must_use]
    pub fn with_discovery_retry_delay(mut self, delay: Duration) -> Self {
        self.discovery_retry_delay = delay;
        self
    }

    /// Send a PKCE challenge with every login (default: on).
    #[must_use]
    pub fn with_pkce(mut self, enabled: bool) -> Self {
        self.use_pkce = enabled;
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    #[must_use]
    pub fn discovery_url(&self) -> &Url {
        &self.discovery_url
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    #[must_use]
    pub fn id_token_algorithm(&self) -> Algorithm {
        self.id_token_algorithm
    }

    #[must_use]
    pub fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    #[must_use]
    pub fn uses_pkce(&self) -> bool {
        self.use_pkce
    }

    /// Space-separated scope string, with `openid` guaranteed first.
    pub(crate) fn scope_param(&self) -> String {
        let mut scopes: Vec<&str> = vec!["openid"];
        scopes.extend(
            self.scopes
                .iter()
                .map(String::as_str)
                .filter(|s| *s != "openid"),
        );
        scopes.join(" ")
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri.as_str())
            .field("discovery_url", &self.discovery_url.as_str())
            .field("scopes", &self.scopes)
            .field("id_token_algorithm", &self.id_token_algorithm)
            .field("clock_skew", &self.clock_skew)
            .field("http_timeout", &self.http_timeout)
            .field("discovery_attempts", &self.discovery_attempts)
            .field("use_pkce", &self.use_pkce)
            .finish()
    }
}
