use serde::{Deserialize, Serialize};
use url::Url;

/// Markers for one login attempt, held by the browser until the callback.
///
/// Created by [`AuthClient::begin_login`](crate::AuthClient::begin_login),
/// consumed exactly once by [`verify_callback`](crate::callback::verify_callback).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthRequest {
    /// CSRF correlation value round-tripped through the provider.
    pub state: String,
    /// Replay-protection value the provider embeds in the ID token.
    pub nonce: String,
    /// PKCE verifier, when PKCE is enabled.
    pub code_verifier: Option<String>,
}

/// Authorization redirect plus the markers the caller must persist first.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub url: Url,
    pub pending: PendingAuthRequest,
}

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub id_token: String,
}

impl TokenResponse {
    /// Create a response carrying only the tokens the login flow needs.
    #[must_use]
    pub fn new(access_token: impl Into<String>, id_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: Some("Bearer".into()),
            expires_in: None,
            refresh_token: None,
            id_token: id_token.into(),
        }
    }

    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }
}

/// Identity claims taken from a verified ID token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserClaims {
    /// Subject identifier, stable per user at this provider.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl UserClaims {
    #[must_use]
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            name: None,
            nickname: None,
            preferred_username: None,
            profile: None,
            picture: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_preferred_username(mut self, username: impl Into<String>) -> Self {
        self.preferred_username = Some(username.into());
        self
    }
}

/// Result of a successful login: raw tokens plus verified claims.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: String,
    pub claims: UserClaims,
}

impl TokenSet {
    pub(crate) fn from_response(response: TokenResponse, claims: UserClaims) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            id_token: response.id_token,
            claims,
        }
    }
}

/// Authenticated identity as seen by protected routes.
///
/// Reconstructed from cookies on every request; only the claims cookie is
/// mandatory.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Session {
    pub claims: UserClaims,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
}
