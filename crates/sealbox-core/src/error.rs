use thiserror::Error;

/// Every failure the relay can surface. The wire never sees these messages —
/// handlers translate via [`SealboxError::code`] into the stable machine
/// vocabulary, and everything not in that vocabulary collapses to
/// `internal_error`.
#[derive(Debug, Error)]
pub enum SealboxError {
    // ── Request shape ────────────────────────────────────────────────────────
    #[error("required field missing or malformed")]
    MissingFields,

    #[error("invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("signed prekey signature does not verify under the identity key")]
    InvalidSignedPrekeySignature,

    // ── Authentication ───────────────────────────────────────────────────────
    #[error("missing or malformed bearer credential")]
    Unauthorized,

    #[error("invalid or expired bearer token")]
    InvalidToken,

    #[error("invalid or expired challenge")]
    InvalidOrExpiredChallenge,

    #[error("signature does not verify")]
    InvalidSignature,

    // ── Lookup ───────────────────────────────────────────────────────────────
    #[error("account not found")]
    AccountNotFound,

    #[error("recipient not found")]
    RecipientNotFound,

    #[error("message not found")]
    MessageNotFound,

    #[error("account has no signed prekey")]
    NoSignedPrekey,

    // ── Conflict / limits ────────────────────────────────────────────────────
    #[error("identity key already registered")]
    AlreadyRegistered,

    #[error("ciphertext exceeds maximum of {max} bytes")]
    MessageTooLarge { max: usize },

    #[error("prekey batch exceeds maximum of {max} entries")]
    TooManyPrekeys { max: usize },

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    // ── Backends ─────────────────────────────────────────────────────────────
    #[error("storage error: {0}")]
    Storage(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SealboxError {
    /// Stable machine code carried in every error response body.
    pub fn code(&self) -> &'static str {
        match self {
            SealboxError::MissingFields => "missing_fields",
            SealboxError::InvalidKeyLength { .. } => "invalid_key_length",
            SealboxError::InvalidSignedPrekeySignature => "invalid_signed_prekey_signature",
            SealboxError::Unauthorized => "unauthorized",
            SealboxError::InvalidToken => "invalid_token",
            SealboxError::InvalidOrExpiredChallenge => "invalid_or_expired_challenge",
            SealboxError::InvalidSignature => "invalid_signature",
            SealboxError::AccountNotFound => "account_not_found",
            SealboxError::RecipientNotFound => "recipient_not_found",
            SealboxError::MessageNotFound => "message_not_found",
            SealboxError::NoSignedPrekey => "no_signed_prekey",
            SealboxError::AlreadyRegistered => "key_already_registered",
            SealboxError::MessageTooLarge { .. } => "message_too_large",
            SealboxError::TooManyPrekeys { .. } => "too_many_prekeys",
            SealboxError::RateLimitExceeded => "rate_limit_exceeded",
            SealboxError::Storage(_) | SealboxError::Cache(_) | SealboxError::Internal(_) => {
                "internal_error"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_collapse_to_internal() {
        assert_eq!(SealboxError::Storage("boom".into()).code(), "internal_error");
        assert_eq!(SealboxError::Cache("boom".into()).code(), "internal_error");
        assert_eq!(
            SealboxError::Internal("boom".into()).code(),
            "internal_error"
        );
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(SealboxError::MissingFields.code(), "missing_fields");
        assert_eq!(SealboxError::AlreadyRegistered.code(), "key_already_registered");
        assert_eq!(
            SealboxError::InvalidOrExpiredChallenge.code(),
            "invalid_or_expired_challenge"
        );
        assert_eq!(
            SealboxError::MessageTooLarge { max: 1 }.code(),
            "message_too_large"
        );
    }
}
