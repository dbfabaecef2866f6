//! sealbox-auth
//!
//! The auth gate (component C3): anonymous registration, single-use
//! challenge–response over Ed25519 identities, HS256 bearer tokens, and
//! the revocation write path. Token validation never correlates identity —
//! the only thing a validated token yields is the opaque account handle.

pub mod gate;
pub mod token;

pub use gate::AuthGate;
pub use token::{BearerClaims, MintedToken, TokenSigner};
