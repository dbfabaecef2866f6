use chrono::{DateTime, Utc};
use tracing::debug;

use sealbox_cache::Cache;
use sealbox_core::constants::{CHALLENGE_TTL_SECS, MAX_PREKEY_BATCH, NONCE_BYTES};
use sealbox_core::error::SealboxError;
use sealbox_core::records::{OneTimePrekey, SignedPrekey};
use sealbox_core::types::{AccountId, DetachedSig, IdentityKey};
use sealbox_crypto::{challenge_nonce, verify_signature};
use sealbox_store::Store;

use crate::token::{MintedToken, TokenSigner};

/// Ephemeral-store key prefix for pending challenges.
const CHALLENGE_PREFIX: &str = "challenge:";

/// The auth gate (component C3): stateless challenge–response over an
/// Ed25519 identity, producing bearer tokens that never expose which
/// account they belong to beyond the opaque identifier.
pub struct AuthGate {
    store: Store,
    cache: Cache,
    tokens: TokenSigner,
}

impl AuthGate {
    pub fn new(store: Store, cache: Cache, tokens: TokenSigner) -> Self {
        Self {
            store,
            cache,
            tokens,
        }
    }

    /// Register an anonymous account from its identity key and initial key
    /// material. The signed prekey's signature must verify under the
    /// identity key before anything touches the durable store.
    pub async fn register(
        &self,
        public_key: IdentityKey,
        registration_id: i64,
        signed_prekey: SignedPrekey,
        one_time_prekeys: Vec<OneTimePrekey>,
    ) -> Result<AccountId, SealboxError> {
        if one_time_prekeys.len() > MAX_PREKEY_BATCH {
            return Err(SealboxError::TooManyPrekeys {
                max: MAX_PREKEY_BATCH,
            });
        }

        verify_signature(
            &public_key,
            signed_prekey.public_key.as_bytes(),
            &signed_prekey.signature,
        )
        .map_err(|_| SealboxError::InvalidSignedPrekeySignature)?;

        let account_id = self
            .store
            .register_account(&public_key, registration_id, &signed_prekey, &one_time_prekeys)
            .await?;

        debug!("account registered");
        Ok(account_id)
    }

    /// Issue a challenge nonce for `public_key`.
    ///
    /// The nonce is returned whether or not the account exists, and only
    /// stored when it does — an adversary probing for account existence
    /// sees identical responses either way.
    pub async fn challenge(
        &self,
        public_key: &IdentityKey,
    ) -> Result<[u8; NONCE_BYTES], SealboxError> {
        let nonce = challenge_nonce();

        if self
            .store
            .find_account_by_public_key(public_key)
            .await?
            .is_some()
        {
            self.cache
                .set_with_ttl(&challenge_key(public_key), &nonce, CHALLENGE_TTL_SECS)
                .await?;
        }

        Ok(nonce)
    }

    /// Consume the pending challenge for `public_key` and mint a bearer
    /// token if `signature` signs the nonce.
    ///
    /// The get-and-delete is atomic: a nonce accepted here can never be
    /// accepted again, and a nonce past its TTL is simply absent.
    pub async fn verify(
        &self,
        public_key: &IdentityKey,
        signature: &DetachedSig,
    ) -> Result<(MintedToken, AccountId), SealboxError> {
        let nonce = self
            .cache
            .get_and_delete(&challenge_key(public_key))
            .await?
            .ok_or(SealboxError::InvalidOrExpiredChallenge)?;

        verify_signature(public_key, &nonce, signature)
            .map_err(|_| SealboxError::InvalidSignature)?;

        let account_id = self
            .store
            .find_account_by_public_key(public_key)
            .await?
            .ok_or(SealboxError::InvalidOrExpiredChallenge)?;

        let minted = self.tokens.mint(account_id)?;
        Ok((minted, account_id))
    }

    /// Validate a bearer token and resolve it to the opaque account handle.
    /// Consults the revocation set on every call.
    pub async fn authenticate(&self, token: &str) -> Result<AccountId, SealboxError> {
        let claims = self.tokens.validate(token)?;
        if self.store.is_token_revoked(claims.token_id).await? {
            return Err(SealboxError::InvalidToken);
        }
        Ok(claims.account_id)
    }

    /// Revoke a still-valid token until its natural expiry. No HTTP route
    /// triggers this; when to revoke (logout, compromise response) is a
    /// product-layer decision.
    pub async fn revoke(&self, token: &str) -> Result<(), SealboxError> {
        let claims = self.tokens.validate(token)?;
        let expires_at: DateTime<Utc> = DateTime::from_timestamp(claims.expires_at as i64, 0)
            .ok_or_else(|| SealboxError::Internal("token expiry out of range".into()))?;
        self.store.revoke_token(claims.token_id, expires_at).await
    }
}

fn challenge_key(public_key: &IdentityKey) -> String {
    format!("{CHALLENGE_PREFIX}{}", public_key.to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_keys_are_per_identity() {
        let a = IdentityKey([1u8; 32]);
        let b = IdentityKey([2u8; 32]);
        assert_ne!(challenge_key(&a), challenge_key(&b));
        assert!(challenge_key(&a).starts_with("challenge:"));
        assert!(challenge_key(&a).ends_with(&a.to_hex()));
    }
}
