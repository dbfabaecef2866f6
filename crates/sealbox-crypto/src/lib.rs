//! sealbox-crypto
//!
//! The relay's entire cryptographic surface: strict Ed25519 detached
//! signature verification, challenge-nonce generation, and the SHA-256
//! credential fingerprint used by the rate limiter. The server performs no
//! encryption and no key agreement — those live on clients.

pub mod ed25519;
pub mod hash;
pub mod keypair;
pub mod nonce;

pub use ed25519::{verify_signature, SignatureError};
pub use hash::{credential_hash, sha256_hex};
pub use keypair::KeyPair;
pub use nonce::challenge_nonce;
