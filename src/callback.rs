//! Authorization callback verification.
//!
//! A single forward pass: provider error check, `state` correlation, code
//! exchange, ID token verification. The first failure ends the pass and no
//! [`TokenSet`] is produced.

use serde::Deserialize;

use crate::error::CallbackError;
use crate::provider::IdentityProvider;
use crate::types::{PendingAuthRequest, TokenSet};

/// Query parameters of the redirect back from the provider.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Verify a callback against the caller's pending login request.
///
/// `pending` is whatever the caller still holds; `None` means the markers
/// expired or were never issued. The caller must discard `pending` after
/// this returns, whatever the outcome.
///
/// # Errors
///
/// - [`CallbackError::Provider`] if the provider reported an error
/// - [`CallbackError::CsrfMismatch`] if `state` is missing or does not match;
///   the code is not exchanged
/// - [`CallbackError::MissingCode`] if there is no `code` parameter
/// - [`CallbackError::Exchange`] if the token endpoint rejects the code
/// - [`CallbackError::Verification`] if the ID token fails any check
pub async fn verify_callback<P: IdentityProvider>(
    provider: &P,
    params: CallbackParams,
    pending: Option<PendingAuthRequest>,
) -> Result<TokenSet, CallbackError> {
    if let Some(error) = params.error {
        let description = params.error_description.unwrap_or_default();
        tracing::warn!(error = %error, description = %description, "Provider returned an error");
        return Err(CallbackError::Provider { error, description });
    }

    let pending = match (pending, params.state) {
        (Some(pending), Some(returned)) if pending.state == returned => pending,
        (pending, returned) => {
            tracing::warn!(
                pending = pending.is_some(),
                returned = returned.is_some(),
                "OAuth state mismatch"
            );
            return Err(CallbackError::CsrfMismatch);
        }
    };

    let code = params.code.ok_or(CallbackError::MissingCode)?;

    let response = provider
        .exchange_code(&code, pending.code_verifier.as_deref())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Token exchange failed"))?;

    let claims = provider
        .verify_id_token(&response.id_token, &pending.nonce)
        .inspect_err(|e| tracing::error!(error = %e, "ID token rejected"))?;

    Ok(TokenSet::from_response(response, claims))
}
