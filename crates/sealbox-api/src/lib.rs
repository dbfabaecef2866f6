//! sealbox-api
//!
//! The HTTP boundary of the relay. Routes (JSON bodies, hex-encoded binary):
//!
//!   GET    /health                     — liveness, rate-limit exempt
//!   POST   /api/v1/accounts/register   — anonymous account creation
//!   POST   /api/v1/accounts/challenge  — challenge nonce issuance
//!   POST   /api/v1/accounts/verify     — challenge verification → bearer token
//!   GET    /api/v1/keys/{account_id}   — prekey bundle fetch (consumes one OTP)
//!   PUT    /api/v1/keys/prekeys        — one-time prekey replenish
//!   PUT    /api/v1/keys/signed         — signed prekey rotation
//!   POST   /api/v1/messages/send       — sealed ciphertext enqueue
//!   GET    /api/v1/messages/receive    — queue drain
//!   DELETE /api/v1/messages/{id}       — post-drain delete
//!   GET    /ws                         — notification socket upgrade
//!
//! Cross-cutting: credential-hash rate limiting, a request body cap, CORS,
//! and error mapping onto the stable `{"error": code}` vocabulary.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod ratelimit;
pub mod router;
pub mod types;
pub mod ws;

pub use error::ApiError;
pub use router::{build_router, ApiConfig, ApiState};
