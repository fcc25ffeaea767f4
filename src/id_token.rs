use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Validation, decode, decode_header};
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::TokenVerificationError;
use crate::metadata::ProviderMetadata;
use crate::types::UserClaims;

/// Claims read from the ID token payload. `iss`, `aud`, `exp` and `nbf` are
/// checked by [`Validation`] and not kept.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    #[serde(default)]
    nonce: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    profile: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<IdTokenClaims> for UserClaims {
    fn from(c: IdTokenClaims) -> Self {
        Self {
            sub: c.sub,
            name: c.name,
            nickname: c.nickname,
            preferred_username: c.preferred_username,
            profile: c.profile,
            picture: c.picture,
        }
    }
}

/// Verifies an OpenID Connect ID token and returns its identity claims.
///
/// Checks, in order: header algorithm against the configured one, signature
/// against the provider's JWKS, `iss`, `aud`, `exp` and `nbf` (with the
/// configured clock skew), then `nonce` against the pending login.
///
/// # Errors
///
/// Returns a [`TokenVerificationError`] on the first failed check. There is
/// no partial success.
pub fn verify_id_token(
    metadata: &ProviderMetadata,
    config: &ClientConfig,
    id_token: &str,
    expected_nonce: &str,
) -> Result<UserClaims, TokenVerificationError> {
    let expected_alg = config.id_token_algorithm;
    let header =
        decode_header(id_token).map_err(|e| TokenVerificationError::Malformed(e.to_string()))?;
    if header.alg != expected_alg {
        return Err(TokenVerificationError::UnexpectedAlgorithm {
            expected: expected_alg,
            actual: header.alg,
        });
    }

    let keys = metadata.signing_keys(header.kid.as_deref(), expected_alg)?;

    let mut validation = Validation::new(expected_alg);
    validation.set_issuer(&[metadata.issuer()]);
    validation.set_audience(&[config.client_id()]);
    validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
    validation.validate_nbf = true;
    validation.leeway = config.clock_skew.as_secs();

    // Keys are only ambiguous when the header has no `kid`; a candidate that
    // does not verify or does not fit the token moves on to the next.
    let mut result = Err(TokenVerificationError::BadSignature);
    for key in &keys {
        match decode::<IdTokenClaims>(id_token, key, &validation) {
            Ok(data) => {
                result = Ok(data.claims);
                break;
            }
            Err(e) if is_key_mismatch(&e) => continue,
            Err(e) => {
                result = Err(map_jwt_error(&e));
                break;
            }
        }
    }
    let claims = result?;

    if claims.nonce.as_deref() != Some(expected_nonce) {
        return Err(TokenVerificationError::NonceMismatch);
    }

    tracing::debug!(sub = %claims.sub, "ID token verified");
    Ok(claims.into())
}

fn is_key_mismatch(e: &jsonwebtoken::errors::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::InvalidSignature
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidEcdsaKey
    )
}

fn map_jwt_error(e: &jsonwebtoken::errors::Error) -> TokenVerificationError {
    match e.kind() {
        ErrorKind::InvalidSignature => TokenVerificationError::BadSignature,
        ErrorKind::ExpiredSignature => TokenVerificationError::Expired,
        ErrorKind::ImmatureSignature => TokenVerificationError::NotYetValid,
        ErrorKind::InvalidIssuer => TokenVerificationError::IssuerMismatch,
        ErrorKind::InvalidAudience => TokenVerificationError::AudienceMismatch,
        _ => TokenVerificationError::Malformed(e.to_string()),
    }
}
