use jsonwebtoken::Algorithm;
use url::Url;

/// Top-level error for the crate's fallible entry points.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Callback(#[from] CallbackError),
}

/// Missing or invalid configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(var: &'static str, reason: impl ToString) -> Self {
        Self::Invalid {
            var,
            reason: reason.to_string(),
        }
    }
}

/// Provider metadata could not be loaded. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Network {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: Url, status: u16 },

    #[error("malformed document from {url}: {reason}")]
    Malformed { url: Url, reason: String },

    #[error("provider does not advertise {algorithm:?} for ID tokens")]
    UnsupportedAlgorithm { algorithm: Algorithm },

    #[error("JWKS has no usable {algorithm:?} signing key")]
    NoSigningKeys { algorithm: Algorithm },
}

/// Authorization code exchange failed at the token endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// The code is unknown, expired, or already redeemed.
    #[error("authorization code rejected (invalid_grant)")]
    InvalidGrant,

    /// Any other OAuth error reported by the token endpoint.
    #[error("token endpoint rejected the request: {error} {description}")]
    Rejected { error: String, description: String },

    #[error("token endpoint unreachable: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("malformed token response: {0}")]
    MalformedResponse(String),
}

/// ID token failed verification. Every variant is a hard rejection.
#[derive(Debug, thiserror::Error)]
pub enum TokenVerificationError {
    #[error("ID token is malformed: {0}")]
    Malformed(String),

    #[error("ID token signed with {actual:?}, expected {expected:?}")]
    UnexpectedAlgorithm {
        expected: Algorithm,
        actual: Algorithm,
    },

    #[error("no provider key matches the ID token (kid: {kid:?})")]
    UnknownKey { kid: Option<String> },

    #[error("ID token signature is invalid")]
    BadSignature,

    #[error("ID token issuer does not match the provider")]
    IssuerMismatch,

    #[error("ID token audience does not include this client")]
    AudienceMismatch,

    #[error("ID token has expired")]
    Expired,

    #[error("ID token is not yet valid")]
    NotYetValid,

    #[error("ID token nonce does not match the login request")]
    NonceMismatch,
}

/// Token revocation failed. Logged, never surfaced to the user.
#[derive(Debug, thiserror::Error)]
pub enum RevocationFailure {
    #[error("provider has no revocation endpoint")]
    Unsupported,

    #[error("revocation endpoint unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("revocation endpoint returned HTTP {0}")]
    Status(u16),
}

/// Rejected authorization callback. No session is created for any variant.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    /// The provider redirected back with an `error` parameter.
    #[error("provider returned {error}: {description}")]
    Provider { error: String, description: String },

    /// Returned `state` does not match a pending login request.
    #[error("state does not match a pending login request")]
    CsrfMismatch,

    #[error("callback is missing the authorization code")]
    MissingCode,

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Verification(#[from] TokenVerificationError),
}
