use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::SealboxError;

// ── AccountId ────────────────────────────────────────────────────────────────

/// Opaque 128-bit account identifier. Random (UUID v4), never derived from
/// key material, and the only handle other parties ever see.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, SealboxError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| SealboxError::MissingFields)
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({}…)", &self.0.simple().to_string()[..8])
    }
}

// ── MessageId ────────────────────────────────────────────────────────────────

/// Queued-ciphertext identifier. UUID v7: the timestamp prefix makes ids
/// monotonically comparable, which is what gives drain its stable order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn parse(s: &str) -> Result<Self, SealboxError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| SealboxError::MissingFields)
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({}…)", &self.0.simple().to_string()[..8])
    }
}

// ── TokenId ──────────────────────────────────────────────────────────────────

/// 128-bit bearer-token identifier (the `jti` claim). Minted fresh per token;
/// its only durable appearance is in the revocation set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct TokenId(pub Uuid);

impl TokenId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, SealboxError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| SealboxError::InvalidToken)
    }
}

impl Default for TokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── IdentityKey ──────────────────────────────────────────────────────────────

/// 32-byte Ed25519 identity public key — the account's durable identity.
/// Immutable for the account's lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityKey(pub [u8; 32]);

impl IdentityKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from lowercase hex, rejecting anything that is not exactly
    /// 32 bytes before the value reaches cryptographic code.
    pub fn from_hex(s: &str) -> Result<Self, SealboxError> {
        bytes32_from_hex(s).map(Self)
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityKey({}…)", &self.to_hex()[..8])
    }
}

// ── PrekeyPublic ─────────────────────────────────────────────────────────────

/// 32-byte prekey public key (signed or one-time). The server stores and
/// serves these bytes; it never interprets them.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PrekeyPublic(pub [u8; 32]);

impl PrekeyPublic {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, SealboxError> {
        bytes32_from_hex(s).map(Self)
    }
}

impl fmt::Debug for PrekeyPublic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrekeyPublic({}…)", &self.to_hex()[..8])
    }
}

// ── DetachedSig ──────────────────────────────────────────────────────────────

/// 64-byte detached Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DetachedSig(pub [u8; 64]);

impl DetachedSig {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, SealboxError> {
        let bytes = hex::decode(s).map_err(|_| SealboxError::InvalidKeyLength {
            expected: 64,
            got: 0,
        })?;
        let got = bytes.len();
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| SealboxError::InvalidKeyLength { expected: 64, got })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for DetachedSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DetachedSig(64b)")
    }
}

// ── MessageKind ──────────────────────────────────────────────────────────────

/// Single-byte classification tag on queued ciphertext. The only content
/// metadata the server holds.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MessageKind {
    /// Initial X3DH envelope establishing a session.
    X3dhInit,
    /// Envelope within an established session.
    Session,
}

impl MessageKind {
    pub fn as_tag(self) -> i16 {
        match self {
            MessageKind::X3dhInit => 1,
            MessageKind::Session => 2,
        }
    }

    pub fn from_tag(tag: i16) -> Result<Self, SealboxError> {
        match tag {
            1 => Ok(MessageKind::X3dhInit),
            2 => Ok(MessageKind::Session),
            _ => Err(SealboxError::MissingFields),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn bytes32_from_hex(s: &str) -> Result<[u8; 32], SealboxError> {
    let bytes = hex::decode(s).map_err(|_| SealboxError::InvalidKeyLength {
        expected: 32,
        got: 0,
    })?;
    let got = bytes.len();
    bytes
        .try_into()
        .map_err(|_| SealboxError::InvalidKeyLength { expected: 32, got })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_are_monotonically_comparable() {
        let a = MessageId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = MessageId::new();
        assert!(a < b, "later id must compare greater");
    }

    #[test]
    fn identity_key_hex_round_trip() {
        let key = IdentityKey([7u8; 32]);
        let parsed = IdentityKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn identity_key_rejects_wrong_length() {
        let err = IdentityKey::from_hex("0102").unwrap_err();
        assert!(matches!(
            err,
            SealboxError::InvalidKeyLength { expected: 32, got: 2 }
        ));
    }

    #[test]
    fn detached_sig_rejects_wrong_length() {
        assert!(DetachedSig::from_hex("aabb").is_err());
    }

    #[test]
    fn message_kind_tags() {
        assert_eq!(MessageKind::X3dhInit.as_tag(), 1);
        assert_eq!(MessageKind::Session.as_tag(), 2);
        assert_eq!(MessageKind::from_tag(2).unwrap(), MessageKind::Session);
        assert!(MessageKind::from_tag(3).is_err());
    }
}
