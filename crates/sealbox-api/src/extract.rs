use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use serde::de::DeserializeOwned;

use sealbox_core::error::SealboxError;
use sealbox_core::types::AccountId;

use crate::error::ApiError;
use crate::router::ApiState;

/// JSON body extractor whose rejection speaks the stable error vocabulary:
/// a missing, non-JSON, or wrongly-typed body is `missing_fields`, not an
/// axum-internal message.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|_| ApiError(SealboxError::MissingFields))?;
        Ok(ApiJson(value))
    }
}

/// Bearer middleware: validates the token, consults the revocation set, and
/// yields the opaque account handle. Handlers receive a plain parameter —
/// no request-scoped ambient state.
pub struct AuthedAccount(pub AccountId);

impl FromRequestParts<ApiState> for AuthedAccount {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError(SealboxError::Unauthorized))?;

        let account = state.auth.authenticate(bearer.token()).await?;
        Ok(AuthedAccount(account))
    }
}
