use sealbox_core::constants::MAX_CIPHERTEXT_BYTES;
use sealbox_core::error::SealboxError;
use sealbox_core::records::QueuedMessage;
use sealbox_core::types::{AccountId, MessageId, MessageKind};
use sealbox_store::Store;

use crate::fabric::Fabric;
use crate::protocol::ServerFrame;

/// The message relay (component C5): append-only sealed queues with
/// server-enforced TTL, drained and deleted on recipient demand.
pub struct Relay {
    store: Store,
    fabric: Fabric,
    message_ttl_days: u32,
}

impl Relay {
    pub fn new(store: Store, fabric: Fabric, message_ttl_days: u32) -> Self {
        Self {
            store,
            fabric,
            message_ttl_days,
        }
    }

    pub fn fabric(&self) -> &Fabric {
        &self.fabric
    }

    /// Queue sealed ciphertext for `recipient` and wake their open sockets.
    ///
    /// There is no sender parameter at this layer and no sender column
    /// below it. The notification carries the new row's id only.
    pub async fn send(
        &self,
        recipient: AccountId,
        ciphertext: Vec<u8>,
        kind: MessageKind,
    ) -> Result<MessageId, SealboxError> {
        if ciphertext.is_empty() {
            return Err(SealboxError::MissingFields);
        }
        if ciphertext.len() > MAX_CIPHERTEXT_BYTES {
            return Err(SealboxError::MessageTooLarge {
                max: MAX_CIPHERTEXT_BYTES,
            });
        }

        let message_id = self
            .store
            .enqueue_message(recipient, &ciphertext, kind, self.message_ttl_days)
            .await?;

        // Only after the row is committed; sockets that are gone are ignored.
        self.fabric
            .notify(recipient, &ServerFrame::NewMessage { message_id });

        Ok(message_id)
    }

    /// Return up to 100 queued messages for the authenticated account in
    /// stable (ascending id) order. Rows remain queued until deleted.
    pub async fn drain(&self, account: AccountId) -> Result<Vec<QueuedMessage>, SealboxError> {
        self.store.fetch_queued(account).await
    }

    /// Delete one drained message. Succeeds only when `id` is addressed to
    /// `account`; anything else is indistinguishable from absence.
    pub async fn delete(&self, account: AccountId, id: MessageId) -> Result<(), SealboxError> {
        if self.store.delete_message(account, id).await? {
            Ok(())
        } else {
            Err(SealboxError::MessageNotFound)
        }
    }
}
