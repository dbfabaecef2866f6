use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use sealbox_core::error::SealboxError;

/// HTTP-facing wrapper: every handler failure becomes a status code plus a
/// minimal `{"error": code}` body from the stable vocabulary.
#[derive(Debug)]
pub struct ApiError(pub SealboxError);

impl From<SealboxError> for ApiError {
    fn from(e: SealboxError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // One short line. Never the payload, the account, or the route.
            error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.code() }))).into_response()
    }
}

/// Authorization failures map to 404 alongside plain absence — a caller
/// probing another account's rows learns nothing from the status code.
fn status_for(e: &SealboxError) -> StatusCode {
    match e {
        SealboxError::MissingFields
        | SealboxError::InvalidKeyLength { .. }
        | SealboxError::InvalidSignedPrekeySignature
        | SealboxError::TooManyPrekeys { .. } => StatusCode::BAD_REQUEST,

        SealboxError::Unauthorized
        | SealboxError::InvalidToken
        | SealboxError::InvalidOrExpiredChallenge
        | SealboxError::InvalidSignature => StatusCode::UNAUTHORIZED,

        SealboxError::AccountNotFound
        | SealboxError::RecipientNotFound
        | SealboxError::MessageNotFound
        | SealboxError::NoSignedPrekey => StatusCode::NOT_FOUND,

        SealboxError::AlreadyRegistered => StatusCode::CONFLICT,

        SealboxError::MessageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,

        SealboxError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,

        SealboxError::Storage(_) | SealboxError::Cache(_) | SealboxError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_contract() {
        assert_eq!(status_for(&SealboxError::MissingFields), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&SealboxError::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(&SealboxError::MessageNotFound),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&SealboxError::AlreadyRegistered),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&SealboxError::MessageTooLarge { max: 1 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_for(&SealboxError::RateLimitExceeded),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_for(&SealboxError::Storage("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn cross_account_access_is_never_a_403() {
        // Authorization failures are indistinguishable from absence.
        assert_ne!(
            status_for(&SealboxError::MessageNotFound),
            StatusCode::FORBIDDEN
        );
        assert_ne!(
            status_for(&SealboxError::AccountNotFound),
            StatusCode::FORBIDDEN
        );
    }
}
