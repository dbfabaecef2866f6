//! sealbox-keys
//!
//! The key service (component C4): publishes prekey bundles for session
//! establishment, consumes one-time prekeys exactly once under concurrent
//! fetches, replenishes the pool idempotently, and rotates signed prekeys
//! after verifying them against the caller's identity key.

use sealbox_core::constants::MAX_PREKEY_BATCH;
use sealbox_core::error::SealboxError;
use sealbox_core::records::{OneTimePrekey, PrekeyBundle, SignedPrekey};
use sealbox_core::types::AccountId;
use sealbox_crypto::verify_signature;
use sealbox_store::Store;

pub struct KeyService {
    store: Store,
    refill_threshold: u32,
}

impl KeyService {
    pub fn new(store: Store, refill_threshold: u32) -> Self {
        Self {
            store,
            refill_threshold,
        }
    }

    /// Assemble a prekey bundle for `target`, consuming at most one
    /// one-time prekey.
    ///
    /// Concurrent fetches against the same account each receive a distinct
    /// one-time prekey; a fetch that loses the race for the last one gets
    /// `one_time_prekey: None` and the client falls back to signed-prekey
    /// session establishment.
    pub async fn fetch_bundle(&self, target: AccountId) -> Result<PrekeyBundle, SealboxError> {
        let (identity_key, registration_id) = self
            .store
            .fetch_identity(target)
            .await?
            .ok_or(SealboxError::AccountNotFound)?;

        // Absent only on an account whose registration never completed.
        let signed_prekey = self
            .store
            .fetch_signed_prekey(target)
            .await?
            .ok_or(SealboxError::NoSignedPrekey)?;

        let one_time_prekey = self.store.consume_one_time_prekey(target).await?;
        let prekey_count = self.store.count_one_time_prekeys(target).await?;

        Ok(PrekeyBundle {
            identity_key,
            registration_id,
            signed_prekey,
            one_time_prekey,
            prekey_count,
            needs_refresh: needs_refresh(prekey_count, self.refill_threshold),
        })
    }

    /// Upload a batch of one-time prekeys (1..=200). Entries colliding with
    /// an existing (account, key id) are silent no-ops, so retrying an
    /// upload is harmless. Returns (rows written, new pool total).
    pub async fn replenish(
        &self,
        account: AccountId,
        prekeys: Vec<OneTimePrekey>,
    ) -> Result<(u64, i64), SealboxError> {
        if prekeys.is_empty() {
            return Err(SealboxError::MissingFields);
        }
        if prekeys.len() > MAX_PREKEY_BATCH {
            return Err(SealboxError::TooManyPrekeys {
                max: MAX_PREKEY_BATCH,
            });
        }

        let uploaded = self
            .store
            .insert_one_time_prekeys(account, &prekeys)
            .await?;
        let total = self.store.count_one_time_prekeys(account).await?;
        Ok((uploaded, total))
    }

    /// Replace the account's signed prekey. The new key's signature must
    /// verify under the caller's own identity key.
    pub async fn rotate_signed_prekey(
        &self,
        account: AccountId,
        prekey: SignedPrekey,
    ) -> Result<(), SealboxError> {
        let (identity_key, _) = self
            .store
            .fetch_identity(account)
            .await?
            .ok_or(SealboxError::AccountNotFound)?;

        verify_signature(&identity_key, prekey.public_key.as_bytes(), &prekey.signature)
            .map_err(|_| SealboxError::InvalidSignedPrekeySignature)?;

        self.store.upsert_signed_prekey(account, &prekey).await
    }
}

/// Below the threshold the bundle response asks the owner to upload more.
fn needs_refresh(count: i64, threshold: u32) -> bool {
    count < i64::from(threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_threshold_is_exclusive() {
        assert!(needs_refresh(9, 10));
        assert!(!needs_refresh(10, 10));
        assert!(!needs_refresh(11, 10));
        assert!(needs_refresh(0, 10));
    }
}
