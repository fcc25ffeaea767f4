use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Generates the `state` parameter that correlates a callback with its login.
///
/// 32 random bytes, base64url encoded (43 characters).
#[must_use]
pub fn generate_state() -> String {
    random_token::<32>()
}

/// Generates the OpenID Connect `nonce` bound into the ID token.
///
/// 32 random bytes, base64url encoded (43 characters).
#[must_use]
pub fn generate_nonce() -> String {
    random_token::<32>()
}

/// Generates a PKCE code verifier (RFC 7636, 43-128 chars).
#[must_use]
pub fn generate_code_verifier() -> String {
    random_token::<48>()
}

/// `challenge = BASE64URL(SHA256(verifier))`
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

fn random_token<const N: usize>() -> String {
    let bytes: [u8; N] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}
