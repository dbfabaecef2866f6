use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use sealbox_core::constants::RATE_WINDOW_SECS;
use sealbox_core::error::SealboxError;
use sealbox_crypto::credential_hash;

use crate::error::ApiError;
use crate::router::ApiState;

/// Privacy-preserving request limiter.
///
/// Counting is keyed on a SHA-256 fingerprint of the bearer credential —
/// never the connection's address, never an account id. Unauthenticated
/// requests share one `anonymous` bucket. The health path is exempt so
/// liveness probes cannot starve real traffic.
pub async fn rate_limit(
    State(state): State<ApiState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if req.uri().path() == "/health" {
        return Ok(next.run(req).await);
    }

    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let key = limiter_key(authorization);

    let count = state.cache.incr_with_window(&key, RATE_WINDOW_SECS).await?;
    if count > u64::from(state.config.max_requests_per_minute) {
        return Err(ApiError(SealboxError::RateLimitExceeded));
    }

    Ok(next.run(req).await)
}

fn limiter_key(authorization: Option<&str>) -> String {
    match authorization.and_then(bearer_credential) {
        Some(credential) => format!("rate:{}", credential_hash(credential)),
        None => "rate:anonymous".to_string(),
    }
}

fn bearer_credential(value: &str) -> Option<&str> {
    let (scheme, rest) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_credential_same_bucket_regardless_of_connection() {
        let a = limiter_key(Some("Bearer tok123"));
        let b = limiter_key(Some("Bearer tok123"));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_credentials_get_distinct_buckets() {
        assert_ne!(limiter_key(Some("Bearer a")), limiter_key(Some("Bearer b")));
    }

    #[test]
    fn missing_or_malformed_credentials_share_the_anonymous_bucket() {
        assert_eq!(limiter_key(None), "rate:anonymous");
        assert_eq!(limiter_key(Some("Basic xyz")), "rate:anonymous");
        assert_eq!(limiter_key(Some("Bearer ")), "rate:anonymous");
    }

    #[test]
    fn key_never_contains_the_raw_credential() {
        let key = limiter_key(Some("Bearer super-secret-token"));
        assert!(!key.contains("super-secret-token"));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(
            limiter_key(Some("bearer tok")),
            limiter_key(Some("Bearer tok"))
        );
    }
}
