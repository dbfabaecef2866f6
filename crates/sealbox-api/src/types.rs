//! Typed request and response bodies. Binary fields travel as lowercase
//! hex; every request field is optional at the serde layer so absence maps
//! to `missing_fields` instead of an opaque deserialization error.

use serde::{Deserialize, Serialize};

use sealbox_core::error::SealboxError;
use sealbox_core::records::{OneTimePrekey, PrekeyBundle, QueuedMessage, SignedPrekey};
use sealbox_core::types::{DetachedSig, IdentityKey, PrekeyPublic};

// ── Auth ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub public_key: Option<String>,
    pub registration_id: Option<u32>,
    pub signed_prekey: Option<SignedPrekeyBody>,
    pub one_time_prekeys: Option<Vec<OneTimePrekeyBody>>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub account_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    pub public_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub nonce: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub public_key: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub token: String,
    pub account_id: String,
}

// ── Keys ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignedPrekeyBody {
    pub key_id: Option<u32>,
    pub public_key: Option<String>,
    pub signature: Option<String>,
}

impl SignedPrekeyBody {
    pub fn into_record(self) -> Result<SignedPrekey, SealboxError> {
        let key_id = self.key_id.ok_or(SealboxError::MissingFields)?;
        let public_key =
            PrekeyPublic::from_hex(self.public_key.as_deref().ok_or(SealboxError::MissingFields)?)?;
        let signature =
            DetachedSig::from_hex(self.signature.as_deref().ok_or(SealboxError::MissingFields)?)?;
        Ok(SignedPrekey {
            key_id: i64::from(key_id),
            public_key,
            signature,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct OneTimePrekeyBody {
    pub key_id: Option<u32>,
    pub public_key: Option<String>,
}

impl OneTimePrekeyBody {
    pub fn into_record(self) -> Result<OneTimePrekey, SealboxError> {
        let key_id = self.key_id.ok_or(SealboxError::MissingFields)?;
        let public_key =
            PrekeyPublic::from_hex(self.public_key.as_deref().ok_or(SealboxError::MissingFields)?)?;
        Ok(OneTimePrekey {
            key_id: i64::from(key_id),
            public_key,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct BundleResponse {
    pub bundle: BundleBody,
    pub prekey_count: i64,
    pub needs_prekey_refresh: bool,
}

#[derive(Debug, Serialize)]
pub struct BundleBody {
    pub identity_key: String,
    pub registration_id: i64,
    pub signed_prekey: SignedPrekeyView,
    pub one_time_prekey: Option<OneTimePrekeyView>,
}

#[derive(Debug, Serialize)]
pub struct SignedPrekeyView {
    pub key_id: i64,
    pub public_key: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct OneTimePrekeyView {
    pub key_id: i64,
    pub public_key: String,
}

impl From<PrekeyBundle> for BundleResponse {
    fn from(b: PrekeyBundle) -> Self {
        Self {
            bundle: BundleBody {
                identity_key: b.identity_key.to_hex(),
                registration_id: b.registration_id,
                signed_prekey: SignedPrekeyView {
                    key_id: b.signed_prekey.key_id,
                    public_key: b.signed_prekey.public_key.to_hex(),
                    signature: b.signed_prekey.signature.to_hex(),
                },
                one_time_prekey: b.one_time_prekey.map(|p| OneTimePrekeyView {
                    key_id: p.key_id,
                    public_key: p.public_key.to_hex(),
                }),
            },
            prekey_count: b.prekey_count,
            needs_prekey_refresh: b.needs_refresh,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PrekeyUploadRequest {
    pub one_time_prekeys: Option<Vec<OneTimePrekeyBody>>,
}

#[derive(Debug, Serialize)]
pub struct PrekeyUploadResponse {
    pub uploaded: u64,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct RotatePrekeyRequest {
    pub key_id: Option<u32>,
    pub public_key: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RotatePrekeyResponse {
    pub updated: bool,
}

// ── Messages ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub recipient_id: Option<String>,
    pub ciphertext: Option<String>,
    pub message_type: Option<i16>,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub message_id: String,
}

#[derive(Debug, Serialize)]
pub struct ReceiveResponse {
    pub messages: Vec<MessageView>,
}

/// A drained queue entry: id, payload, tag. Nothing else exists to return.
#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: String,
    pub ciphertext: String,
    pub message_type: i16,
}

impl From<QueuedMessage> for MessageView {
    fn from(m: QueuedMessage) -> Self {
        Self {
            id: m.id.to_string(),
            ciphertext: hex::encode(&m.ciphertext),
            message_type: m.kind.as_tag(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

// ── Health ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Parse a required hex identity key field.
pub fn required_identity_key(field: Option<&str>) -> Result<IdentityKey, SealboxError> {
    IdentityKey::from_hex(field.ok_or(SealboxError::MissingFields)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealbox_core::types::{MessageId, MessageKind};

    #[test]
    fn register_request_accepts_the_wire_shape() {
        let body = r#"{
            "public_key": "0101010101010101010101010101010101010101010101010101010101010101",
            "registration_id": 42,
            "signed_prekey": {"key_id": 1, "public_key": "0202020202020202020202020202020202020202020202020202020202020202", "signature": "03030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303030303"},
            "one_time_prekeys": [{"key_id": 1, "public_key": "0404040404040404040404040404040404040404040404040404040404040404"}]
        }"#;
        let req: RegisterRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.registration_id, Some(42));
        assert_eq!(req.one_time_prekeys.unwrap().len(), 1);
    }

    #[test]
    fn missing_signed_prekey_fields_map_to_missing_fields() {
        let body = SignedPrekeyBody {
            key_id: Some(1),
            public_key: None,
            signature: None,
        };
        assert!(matches!(
            body.into_record(),
            Err(SealboxError::MissingFields)
        ));
    }

    #[test]
    fn message_view_exposes_only_id_ciphertext_and_tag() {
        let view = MessageView::from(QueuedMessage {
            id: MessageId::new(),
            ciphertext: vec![0xde, 0xad, 0xbe, 0xef],
            kind: MessageKind::X3dhInit,
        });
        let value = serde_json::to_value(&view).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["id", "ciphertext", "message_type"]);
        assert_eq!(value["ciphertext"], "deadbeef");
        assert_eq!(value["message_type"], 1);
    }
}
