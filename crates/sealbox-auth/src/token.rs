use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use sealbox_core::error::SealboxError;
use sealbox_core::types::{AccountId, TokenId};

/// Bearer-token claims. `sub` is the opaque account identifier, `jti` the
/// 128-bit token identifier checked against the revocation set.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    jti: String,
    iat: u64,
    exp: u64,
}

/// A freshly minted bearer token plus the metadata revocation needs.
#[derive(Debug)]
pub struct MintedToken {
    pub token: String,
    pub token_id: TokenId,
    /// Expiry as Unix seconds.
    pub expires_at: u64,
}

/// Validated claims of an inbound bearer token.
#[derive(Debug)]
pub struct BearerClaims {
    pub account_id: AccountId,
    pub token_id: TokenId,
    /// Expiry as Unix seconds.
    pub expires_at: u64,
}

/// HS256 signer/verifier for bearer tokens. Rotating the secret invalidates
/// every outstanding token.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    /// Mint a token for `account` with a fresh token identifier.
    pub fn mint(&self, account: AccountId) -> Result<MintedToken, SealboxError> {
        let token_id = TokenId::new();
        let iat = unix_now()?;
        let exp = iat + self.ttl_secs;
        let claims = Claims {
            sub: account.to_string(),
            jti: token_id.to_string(),
            iat,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SealboxError::Internal(e.to_string()))?;
        Ok(MintedToken {
            token,
            token_id,
            expires_at: exp,
        })
    }

    /// Check signature and expiry, then surface the claims. Anything wrong
    /// with the token collapses to a single error — callers never learn why.
    pub fn validate(&self, token: &str) -> Result<BearerClaims, SealboxError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| SealboxError::InvalidToken)?;

        let account_id =
            AccountId::parse(&data.claims.sub).map_err(|_| SealboxError::InvalidToken)?;
        let token_id = TokenId::parse(&data.claims.jti)?;

        Ok(BearerClaims {
            account_id,
            token_id,
            expires_at: data.claims.exp,
        })
    }
}

fn unix_now() -> Result<u64, SealboxError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| SealboxError::Internal("system clock before epoch".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    fn random_secret() -> [u8; 32] {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        secret
    }

    #[test]
    fn mint_validate_round_trip() {
        let signer = TokenSigner::new(&random_secret(), 3600);
        let account = AccountId::new();
        let minted = signer.mint(account).unwrap();

        let claims = signer.validate(&minted.token).unwrap();
        assert_eq!(claims.account_id, account);
        assert_eq!(claims.token_id, minted.token_id);
        assert_eq!(claims.expires_at, minted.expires_at);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let signer = TokenSigner::new(&random_secret(), 3600);
        let other = TokenSigner::new(&random_secret(), 3600);
        let minted = signer.mint(AccountId::new()).unwrap();
        assert!(matches!(
            other.validate(&minted.token),
            Err(SealboxError::InvalidToken)
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let signer = TokenSigner::new(&random_secret(), 3600);
        let mut token = signer.mint(AccountId::new()).unwrap().token;
        token.pop();
        token.push('A');
        assert!(signer.validate(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let secret = random_secret();
        let signer = TokenSigner::new(&secret, 3600);

        // Hand-craft claims already past expiry.
        let claims = Claims {
            sub: AccountId::new().to_string(),
            jti: TokenId::new().to_string(),
            iat: 1_000_000,
            exp: 1_000_060,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&secret),
        )
        .unwrap();

        assert!(matches!(
            signer.validate(&token),
            Err(SealboxError::InvalidToken)
        ));
    }
}
