use crate::types::{IdentityKey, MessageId, MessageKind, PrekeyPublic};

/// The single per-account medium-term prekey. Rotation replaces it in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignedPrekey {
    /// Client-assigned key identifier.
    pub key_id: i64,
    pub public_key: PrekeyPublic,
    /// Detached signature over `public_key`, verifiable under the account's
    /// identity key.
    pub signature: crate::types::DetachedSig,
}

/// A short-term prekey, consumed exactly once by a bundle fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OneTimePrekey {
    /// Client-assigned key identifier, unique per account.
    pub key_id: i64,
    pub public_key: PrekeyPublic,
}

/// Everything a client needs to initiate an X3DH session with an account.
///
/// `one_time_prekey` is `None` when the pool is empty; the session then
/// starts from the signed prekey alone (lower forward-secrecy tier).
#[derive(Clone, Debug)]
pub struct PrekeyBundle {
    pub identity_key: IdentityKey,
    pub registration_id: i64,
    pub signed_prekey: SignedPrekey,
    pub one_time_prekey: Option<OneTimePrekey>,
    /// One-time prekeys remaining after this fetch.
    pub prekey_count: i64,
    /// True when `prekey_count` has dropped below the refill threshold.
    pub needs_refresh: bool,
}

/// A queued ciphertext as handed back by drain. Carries no sender, no
/// timestamps — only what the recipient needs to decrypt and acknowledge.
#[derive(Clone, Debug)]
pub struct QueuedMessage {
    pub id: MessageId,
    pub ciphertext: Vec<u8>,
    pub kind: MessageKind,
}
