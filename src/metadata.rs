//! Provider discovery and signing keys.
//!
//! [`discover`] loads the OpenID discovery document and the JWKS it points
//! to. The result is cached for the process lifetime; keys are never
//! refreshed.

use jsonwebtoken::jwk::{
    AlgorithmParameters, EllipticCurve, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse,
};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{DiscoveryError, TokenVerificationError};

/// Subset of the OpenID Provider discovery document this crate relies on.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct DiscoveryDocument {
    pub issuer: String,
    pub authorization_endpoint: Url,
    pub token_endpoint: Url,
    pub jwks_uri: Url,
    #[serde(default)]
    pub revocation_endpoint: Option<Url>,
    #[serde(default)]
    pub id_token_signing_alg_values_supported: Vec<String>,
}

/// Provider endpoints and keys, fetched once at startup and read-only after.
#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    issuer: String,
    authorization_endpoint: Url,
    token_endpoint: Url,
    revocation_endpoint: Option<Url>,
    jwks: JwkSet,
}

impl ProviderMetadata {
    /// Assemble metadata without discovery (static configuration or tests).
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        authorization_endpoint: Url,
        token_endpoint: Url,
        revocation_endpoint: Option<Url>,
        jwks: JwkSet,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            authorization_endpoint,
            token_endpoint,
            revocation_endpoint,
            jwks,
        }
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn authorization_endpoint(&self) -> &Url {
        &self.authorization_endpoint
    }

    #[must_use]
    pub fn token_endpoint(&self) -> &Url {
        &self.token_endpoint
    }

    #[must_use]
    pub fn revocation_endpoint(&self) -> Option<&Url> {
        self.revocation_endpoint.as_ref()
    }

    #[must_use]
    pub fn jwks(&self) -> &JwkSet {
        &self.jwks
    }

    /// Keys that may have signed a token with header `kid` and `alg`.
    ///
    /// With a `kid`, at most one key is returned. Without one, every
    /// signing key compatible with `alg` is a candidate.
    pub(crate) fn signing_keys(
        &self,
        kid: Option<&str>,
        alg: Algorithm,
    ) -> Result<Vec<DecodingKey>, TokenVerificationError> {
        let keys: Vec<DecodingKey> = self
            .jwks
            .keys
            .iter()
            .filter(|jwk| is_signing_key_for(jwk, alg))
            .filter(|jwk| kid.is_none() || jwk.common.key_id.as_deref() == kid)
            .filter_map(|jwk| DecodingKey::from_jwk(jwk).ok())
            .collect();

        if keys.is_empty() {
            return Err(TokenVerificationError::UnknownKey {
                kid: kid.map(String::from),
            });
        }
        Ok(keys)
    }
}

/// Fetch the discovery document and JWKS, retrying a bounded number of times.
///
/// # Errors
///
/// Returns the last [`DiscoveryError`] once every attempt has failed.
pub async fn discover(
    http: &reqwest::Client,
    config: &ClientConfig,
) -> Result<ProviderMetadata, DiscoveryError> {
    let attempts = config.discovery_attempts.max(1);
    let mut attempt = 1;

    loop {
        match fetch_metadata(http, config).await {
            Ok(metadata) => {
                tracing::info!(
                    issuer = %metadata.issuer,
                    keys = metadata.jwks.keys.len(),
                    "Provider metadata loaded"
                );
                return Ok(metadata);
            }
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    attempts,
                    "Provider discovery failed, retrying"
                );
                tokio::time::sleep(config.discovery_retry_delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(error = %e, attempts, "Provider discovery failed");
                return Err(e);
            }
        }
    }
}

async fn fetch_metadata(
    http: &reqwest::Client,
    config: &ClientConfig,
) -> Result<ProviderMetadata, DiscoveryError> {
    let alg = config.id_token_algorithm;
    let document: DiscoveryDocument = fetch_json(http, &config.discovery_url).await?;

    let advertised = &document.id_token_signing_alg_values_supported;
    if !advertised.is_empty() && !advertised.iter().any(|a| *a == algorithm_name(alg)) {
        return Err(DiscoveryError::UnsupportedAlgorithm { algorithm: alg });
    }
    if document.revocation_endpoint.is_none() {
        tracing::warn!("Provider has no revocation endpoint; logout will not revoke tokens");
    }

    let jwks: JwkSet = fetch_json(http, &document.jwks_uri).await?;
    let metadata = ProviderMetadata::new(
        document.issuer,
        document.authorization_endpoint,
        document.token_endpoint,
        document.revocation_endpoint,
        jwks,
    );

    if metadata.signing_keys(None, alg).is_err() {
        return Err(DiscoveryError::NoSigningKeys { algorithm: alg });
    }
    Ok(metadata)
}

async fn fetch_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &Url,
) -> Result<T, DiscoveryError> {
    tracing::debug!(url = %url, "Fetching provider document");

    let network = |source| DiscoveryError::Network {
        url: url.clone(),
        source,
    };
    let response = http
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(network)?;

    if !response.status().is_success() {
        return Err(DiscoveryError::Status {
            url: url.clone(),
            status: response.status().as_u16(),
        });
    }

    let body = response.bytes().await.map_err(network)?;
    serde_json::from_slice(&body).map_err(|e| DiscoveryError::Malformed {
        url: url.clone(),
        reason: e.to_string(),
    })
}

fn is_signing_key_for(jwk: &Jwk, alg: Algorithm) -> bool {
    if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
        return false;
    }
    if !key_family_fits(jwk, alg) {
        return false;
    }
    match jwk_algorithm(jwk) {
        Some(key_alg) => key_alg == alg,
        None => jwk.common.key_algorithm.is_none(),
    }
}

/// Key type and curve must suit `alg`, whether or not the key names one.
fn key_family_fits(jwk: &Jwk, alg: Algorithm) -> bool {
    use Algorithm::*;

    match &jwk.algorithm {
        AlgorithmParameters::EllipticCurve(params) => matches!(
            (alg, &params.curve),
            (ES256, EllipticCurve::P256) | (ES384, EllipticCurve::P384)
        ),
        AlgorithmParameters::RSA(_) => {
            matches!(alg, RS256 | RS384 | RS512 | PS256 | PS384 | PS512)
        }
        AlgorithmParameters::OctetKeyPair(params) => {
            alg == EdDSA && matches!(params.curve, EllipticCurve::Ed25519)
        }
        _ => false,
    }
}

fn jwk_algorithm(jwk: &Jwk) -> Option<Algorithm> {
    jwk.common.key_algorithm.as_ref().and_then(|alg| match alg {
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    })
}

/// JOSE name of `alg` (`"ES256"`, `"RS256"`, ...).
fn algorithm_name(alg: Algorithm) -> String {
    format!("{alg:?}")
}
