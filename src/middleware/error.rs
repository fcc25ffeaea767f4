use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::{CallbackError, ExchangeError};

impl CallbackError {
    /// HTTP status for a rejected callback.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Provider { .. } | Self::CsrfMismatch | Self::MissingCode => {
                StatusCode::BAD_REQUEST
            }
            Self::Exchange(ExchangeError::InvalidGrant | ExchangeError::Rejected { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Exchange(
                ExchangeError::NetworkFailure(_) | ExchangeError::MalformedResponse(_),
            ) => StatusCode::BAD_GATEWAY,
            Self::Verification(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Short, fixed message safe to show the user. Details stay in the log.
    fn public_message(&self) -> &'static str {
        match self {
            Self::Provider { .. } => "Login was not completed at the identity provider.",
            Self::CsrfMismatch => "Login request expired or was not started here.",
            Self::MissingCode => "Login response is missing the authorization code.",
            Self::Exchange(ExchangeError::InvalidGrant) => {
                "Authorization code is invalid or was already used."
            }
            Self::Exchange(ExchangeError::Rejected { .. }) => {
                "Identity provider rejected the login."
            }
            Self::Exchange(_) => "Identity provider is unavailable.",
            Self::Verification(_) => "Identity token could not be verified.",
        }
    }
}

impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        let body = format!("{} Please sign in again.", self.public_message());
        (self.status(), body).into_response()
    }
}
