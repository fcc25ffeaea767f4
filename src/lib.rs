#![doc = include_str!("../README.md")]

pub mod callback;
pub mod config;
pub mod error;
pub mod id_token;
pub mod metadata;
pub mod middleware;
pub mod oauth;
pub mod provider;
pub mod random;
pub mod types;

// Re-exports for convenient access
pub use callback::{CallbackParams, verify_callback};
pub use config::ClientConfig;
pub use error::{
    CallbackError, ConfigError, DiscoveryError, Error, ExchangeError, RevocationFailure,
    TokenVerificationError,
};
pub use metadata::ProviderMetadata;
pub use oauth::AuthClient;
pub use provider::IdentityProvider;
pub use types::{
    AuthorizationRequest, PendingAuthRequest, Session, TokenResponse, TokenSet, UserClaims,
};
