//! ─── Sealbox Protocol Constants ─────────────────────────────────────────────
//!
//! Hard limits and defaults of the relay. Request-level limits are enforced
//! at the API boundary; storage-level limits are mirrored in the schema.

// ── Key material sizes ───────────────────────────────────────────────────────

/// Ed25519 identity public key length in bytes.
pub const IDENTITY_KEY_BYTES: usize = 32;

/// Prekey public key length in bytes (signed and one-time).
pub const PREKEY_BYTES: usize = 32;

/// Detached Ed25519 signature length in bytes.
pub const SIGNATURE_BYTES: usize = 64;

/// Challenge nonce length in bytes.
pub const NONCE_BYTES: usize = 32;

// ── Queue limits ─────────────────────────────────────────────────────────────

/// Maximum ciphertext payload per queued message (256 KiB, decoded bytes).
pub const MAX_CIPHERTEXT_BYTES: usize = 262_144;

/// Maximum HTTP request body: a full-size hex ciphertext (2× the decoded
/// limit) plus headroom for JSON framing.
pub const MAX_BODY_BYTES: usize = 2 * MAX_CIPHERTEXT_BYTES + 8_192;

/// Maximum queue rows returned by a single drain.
pub const DRAIN_BATCH_LIMIT: i64 = 100;

/// Default queue retention in days.
pub const DEFAULT_MESSAGE_TTL_DAYS: u32 = 30;

// ── Prekeys ──────────────────────────────────────────────────────────────────

/// Maximum one-time prekeys accepted in a single upload.
pub const MAX_PREKEY_BATCH: usize = 200;

/// Pool low-water mark: below this, bundle responses ask for a refill.
pub const DEFAULT_PREKEY_REFILL_THRESHOLD: u32 = 10;

// ── Authentication ───────────────────────────────────────────────────────────

/// Challenge nonce lifetime in the ephemeral store.
pub const CHALLENGE_TTL_SECS: u64 = 120;

/// Default bearer-token lifetime (24 hours).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 86_400;

// ── Rate limiting ────────────────────────────────────────────────────────────

/// Sliding-window length for the request limiter.
pub const RATE_WINDOW_SECS: u64 = 60;

/// Default requests allowed per window per credential hash.
pub const DEFAULT_RATE_LIMIT_PER_WINDOW: u32 = 60;

// ── Durable store ────────────────────────────────────────────────────────────

/// Worker connection pool ceiling.
pub const DB_MAX_CONNECTIONS: u32 = 20;

/// Idle database connections are reaped after this many seconds.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 30;

/// Interval between TTL reaps.
pub const REAP_INTERVAL_SECS: u64 = 3_600;

// ── Socket close codes ───────────────────────────────────────────────────────

/// Close code sent when the first frame is not an auth frame.
pub const WS_CLOSE_AUTH_REQUIRED: u16 = 4001;

/// Close code sent when the auth frame carries an invalid token.
pub const WS_CLOSE_INVALID_TOKEN: u16 = 4002;
