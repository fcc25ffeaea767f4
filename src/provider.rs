use std::future::Future;

use crate::error::{ExchangeError, RevocationFailure, TokenVerificationError};
use crate::types::{AuthorizationRequest, TokenResponse, UserClaims};

/// Operations the login flow needs from an OpenID provider.
///
/// [`AuthClient`](crate::AuthClient) is the production implementation. The
/// routes and [`verify_callback`](crate::callback::verify_callback) are
/// generic over this trait so the flow can run against a fake provider.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Build the authorization redirect with fresh `state` and `nonce`.
    fn begin_login(&self) -> AuthorizationRequest;

    /// Redeem an authorization code at the token endpoint. Never retried.
    fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> impl Future<Output = Result<TokenResponse, ExchangeError>> + Send;

    /// Verify an ID token against the provider's keys and the expected nonce.
    fn verify_id_token(
        &self,
        id_token: &str,
        expected_nonce: &str,
    ) -> Result<UserClaims, TokenVerificationError>;

    /// Revoke a refresh token. Best effort; callers only log failures.
    fn revoke(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<(), RevocationFailure>> + Send;
}
