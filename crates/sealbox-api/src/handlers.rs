use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use sealbox_core::error::SealboxError;
use sealbox_core::types::{AccountId, MessageId, MessageKind};

use crate::error::ApiError;
use crate::extract::{ApiJson, AuthedAccount};
use crate::router::ApiState;
use crate::types::*;

// ── Health ───────────────────────────────────────────────────────────────────

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ── Accounts ─────────────────────────────────────────────────────────────────

pub async fn register(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let public_key = required_identity_key(req.public_key.as_deref())?;
    let registration_id = req.registration_id.ok_or(SealboxError::MissingFields)?;
    let signed_prekey = req
        .signed_prekey
        .ok_or(SealboxError::MissingFields)?
        .into_record()?;
    let one_time_prekeys = req
        .one_time_prekeys
        .ok_or(SealboxError::MissingFields)?
        .into_iter()
        .map(OneTimePrekeyBody::into_record)
        .collect::<Result<Vec<_>, _>>()?;

    let account_id = state
        .auth
        .register(
            public_key,
            i64::from(registration_id),
            signed_prekey,
            one_time_prekeys,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            account_id: account_id.to_string(),
        }),
    ))
}

pub async fn challenge(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<ChallengeRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let public_key = required_identity_key(req.public_key.as_deref())?;
    let nonce = state.auth.challenge(&public_key).await?;
    Ok(Json(ChallengeResponse {
        nonce: hex::encode(nonce),
    }))
}

pub async fn verify(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let public_key = required_identity_key(req.public_key.as_deref())?;
    let signature = sealbox_core::types::DetachedSig::from_hex(
        req.signature.as_deref().ok_or(SealboxError::MissingFields)?,
    )?;

    let (minted, account_id) = state.auth.verify(&public_key, &signature).await?;
    Ok(Json(VerifyResponse {
        token: minted.token,
        account_id: account_id.to_string(),
    }))
}

// ── Keys ─────────────────────────────────────────────────────────────────────

pub async fn fetch_bundle(
    State(state): State<ApiState>,
    AuthedAccount(_caller): AuthedAccount,
    Path(account_id): Path<String>,
) -> Result<Json<BundleResponse>, ApiError> {
    // An unparseable id is indistinguishable from an unknown account.
    let target =
        AccountId::parse(&account_id).map_err(|_| SealboxError::AccountNotFound)?;
    let bundle = state.keys.fetch_bundle(target).await?;
    Ok(Json(bundle.into()))
}

pub async fn upload_prekeys(
    State(state): State<ApiState>,
    AuthedAccount(account): AuthedAccount,
    ApiJson(req): ApiJson<PrekeyUploadRequest>,
) -> Result<Json<PrekeyUploadResponse>, ApiError> {
    let prekeys = req
        .one_time_prekeys
        .ok_or(SealboxError::MissingFields)?
        .into_iter()
        .map(OneTimePrekeyBody::into_record)
        .collect::<Result<Vec<_>, _>>()?;

    let (uploaded, total) = state.keys.replenish(account, prekeys).await?;
    Ok(Json(PrekeyUploadResponse { uploaded, total }))
}

pub async fn rotate_signed_prekey(
    State(state): State<ApiState>,
    AuthedAccount(account): AuthedAccount,
    ApiJson(req): ApiJson<RotatePrekeyRequest>,
) -> Result<Json<RotatePrekeyResponse>, ApiError> {
    let prekey = SignedPrekeyBody {
        key_id: req.key_id,
        public_key: req.public_key,
        signature: req.signature,
    }
    .into_record()?;

    state.keys.rotate_signed_prekey(account, prekey).await?;
    Ok(Json(RotatePrekeyResponse { updated: true }))
}

// ── Messages ─────────────────────────────────────────────────────────────────

pub async fn send_message(
    State(state): State<ApiState>,
    AuthedAccount(_sender): AuthedAccount,
    ApiJson(req): ApiJson<SendRequest>,
) -> Result<(StatusCode, Json<SendResponse>), ApiError> {
    let recipient = AccountId::parse(
        req.recipient_id
            .as_deref()
            .ok_or(SealboxError::MissingFields)?,
    )
    .map_err(|_| SealboxError::RecipientNotFound)?;

    let ciphertext = hex::decode(
        req.ciphertext
            .as_deref()
            .ok_or(SealboxError::MissingFields)?,
    )
    .map_err(|_| SealboxError::MissingFields)?;

    let kind = MessageKind::from_tag(req.message_type.unwrap_or(1))?;

    // `_sender` stops here: the relay has no parameter to pass it to.
    let message_id = state.relay.send(recipient, ciphertext, kind).await?;

    Ok((
        StatusCode::CREATED,
        Json(SendResponse {
            message_id: message_id.to_string(),
        }),
    ))
}

pub async fn receive_messages(
    State(state): State<ApiState>,
    AuthedAccount(account): AuthedAccount,
) -> Result<Json<ReceiveResponse>, ApiError> {
    let messages = state.relay.drain(account).await?;
    Ok(Json(ReceiveResponse {
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}

pub async fn delete_message(
    State(state): State<ApiState>,
    AuthedAccount(account): AuthedAccount,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = MessageId::parse(&id).map_err(|_| SealboxError::MessageNotFound)?;
    state.relay.delete(account, id).await?;
    Ok(Json(DeleteResponse { deleted: true }))
}
