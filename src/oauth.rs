use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::{DiscoveryError, ExchangeError, RevocationFailure, TokenVerificationError};
use crate::id_token;
use crate::metadata::{self, ProviderMetadata};
use crate::provider::IdentityProvider;
use crate::random;
use crate::types::{AuthorizationRequest, PendingAuthRequest, TokenResponse, UserClaims};

/// OpenID Connect client bound to one provider.
///
/// Holds the immutable client registration, the provider metadata loaded at
/// startup, and an HTTP client whose timeout bounds every provider call.
pub struct AuthClient {
    config: ClientConfig,
    metadata: ProviderMetadata,
    http: reqwest::Client,
}

/// OAuth error body (RFC 6749 section 5.2).
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl AuthClient {
    /// Create a client from already-known metadata.
    #[must_use]
    pub fn new(config: ClientConfig, metadata: ProviderMetadata, http: reqwest::Client) -> Self {
        Self {
            config,
            metadata,
            http,
        }
    }

    /// Run provider discovery and create a client.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError`] if the discovery document or JWKS cannot be
    /// loaded after the configured number of attempts.
    pub async fn discover(config: ClientConfig) -> Result<Self, DiscoveryError> {
        let http = Self::http_client(&config).map_err(DiscoveryError::Client)?;
        let metadata = metadata::discover(&http, &config).await?;
        Ok(Self::new(config, metadata, http))
    }

    /// HTTP client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn http_client(config: &ClientConfig) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    /// Generate fresh login markers and the matching authorization URL.
    #[must_use]
    pub fn begin_login(&self) -> AuthorizationRequest {
        let state = random::generate_state();
        let nonce = random::generate_nonce();
        let code_verifier = self
            .config
            .use_pkce
            .then(random::generate_code_verifier);

        let mut url = self.metadata.authorization_endpoint().clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", self.config.redirect_uri.as_str())
                .append_pair("scope", &self.config.scope_param())
                .append_pair("state", &state)
                .append_pair("nonce", &nonce);
            if let Some(verifier) = &code_verifier {
                query
                    .append_pair("code_challenge", &random::generate_code_challenge(verifier))
                    .append_pair("code_challenge_method", "S256");
            }
        }

        AuthorizationRequest {
            url,
            pending: PendingAuthRequest {
                state,
                nonce,
                code_verifier,
            },
        }
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// - [`ExchangeError::InvalidGrant`] if the code is unknown or already used
    /// - [`ExchangeError::Rejected`] for any other OAuth error
    /// - [`ExchangeError::NetworkFailure`] on transport failure or timeout
    /// - [`ExchangeError::MalformedResponse`] if the body is not a token response
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<TokenResponse, ExchangeError> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        if let Some(verifier) = code_verifier {
            params.push(("code_verifier", verifier));
        }

        tracing::debug!(endpoint = %self.metadata.token_endpoint(), "Exchanging authorization code");

        let response = self
            .http
            .post(self.metadata.token_endpoint().clone())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<OAuthErrorResponse>(&body) {
                Ok(err) if err.error == "invalid_grant" => {
                    tracing::debug!(
                        description = err.error_description.as_deref().unwrap_or_default(),
                        "Token endpoint returned invalid_grant"
                    );
                    ExchangeError::InvalidGrant
                }
                Ok(err) => ExchangeError::Rejected {
                    error: err.error,
                    description: err.error_description.unwrap_or_default(),
                },
                Err(_) => ExchangeError::MalformedResponse(format!("HTTP {status}")),
            });
        }

        serde_json::from_slice::<TokenResponse>(&body)
            .map_err(|e| ExchangeError::MalformedResponse(e.to_string()))
    }

    /// Verify an ID token issued to this client.
    ///
    /// # Errors
    ///
    /// See [`id_token::verify_id_token`].
    pub fn verify_id_token(
        &self,
        id_token: &str,
        expected_nonce: &str,
    ) -> Result<UserClaims, TokenVerificationError> {
        id_token::verify_id_token(&self.metadata, &self.config, id_token, expected_nonce)
    }

    /// Revoke a refresh token (RFC 7009).
    ///
    /// # Errors
    ///
    /// Returns [`RevocationFailure`] if the provider has no revocation
    /// endpoint, is unreachable, or answers with a non-success status.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), RevocationFailure> {
        let endpoint = self
            .metadata
            .revocation_endpoint()
            .ok_or(RevocationFailure::Unsupported)?;

        let params = [
            ("token", refresh_token),
            ("token_type_hint", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self.http.post(endpoint.clone()).form(&params).send().await?;
        if !response.status().is_success() {
            return Err(RevocationFailure::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

impl IdentityProvider for AuthClient {
    fn begin_login(&self) -> AuthorizationRequest {
        AuthClient::begin_login(self)
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<TokenResponse, ExchangeError> {
        AuthClient::exchange_code(self, code, code_verifier).await
    }

    fn verify_id_token(
        &self,
        id_token: &str,
        expected_nonce: &str,
    ) -> Result<UserClaims, TokenVerificationError> {
        AuthClient::verify_id_token(self, id_token, expected_nonce)
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), RevocationFailure> {
        AuthClient::revoke(self, refresh_token).await
    }
}
