//! sealbox-core
//!
//! Shared vocabulary of the sealbox relay: opaque identifiers, fixed-size
//! key/signature newtypes with hex codecs, the ciphertext classification
//! tag, protocol constants, and the error enum whose `code()` values form
//! the stable wire vocabulary.

pub mod constants;
pub mod error;
pub mod records;
pub mod types;

pub use error::SealboxError;
pub use records::{OneTimePrekey, PrekeyBundle, QueuedMessage, SignedPrekey};
pub use types::{
    AccountId, DetachedSig, IdentityKey, MessageId, MessageKind, PrekeyPublic, TokenId,
};
