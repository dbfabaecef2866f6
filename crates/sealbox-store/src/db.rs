use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use uuid::Uuid;

use sealbox_core::constants::{DB_IDLE_TIMEOUT_SECS, DB_MAX_CONNECTIONS, DRAIN_BATCH_LIMIT};
use sealbox_core::error::SealboxError;
use sealbox_core::records::{OneTimePrekey, QueuedMessage, SignedPrekey};
use sealbox_core::types::{AccountId, IdentityKey, MessageId, MessageKind, PrekeyPublic, TokenId};

/// Connection parameters for the durable store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    pub ssl: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            database: "sealbox".into(),
            user: "sealbox".into(),
            password: None,
            ssl: false,
        }
    }
}

/// The durable store: every persistent entity lives behind this handle.
///
/// Tables:
///   accounts          — identity key (unique), registration id, creation instant
///   signed_prekeys    — exactly one per account, replaced in place on rotation
///   one_time_prekeys  — pool consumed one row per bundle fetch
///   message_queue     — sealed ciphertext; recipient + expiry only
///   revoked_tokens    — token ids rejected until their natural expiry
///
/// All handlers share one bounded pool; idle connections are reaped after
/// 30 seconds.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

fn storage_err(e: sqlx::Error) -> SealboxError {
    SealboxError::Storage(e.to_string())
}

fn key32(bytes: Vec<u8>) -> Result<[u8; 32], SealboxError> {
    bytes
        .try_into()
        .map_err(|_| SealboxError::Internal("stored key has wrong length".into()))
}

impl Store {
    /// Connect the worker pool.
    pub async fn connect(config: &StoreConfig) -> Result<Self, SealboxError> {
        let mut opts = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .ssl_mode(if config.ssl {
                PgSslMode::Require
            } else {
                PgSslMode::Prefer
            });
        if let Some(password) = &config.password {
            opts = opts.password(password);
        }

        let pool = PgPoolOptions::new()
            .max_connections(DB_MAX_CONNECTIONS)
            .idle_timeout(Duration::from_secs(DB_IDLE_TIMEOUT_SECS))
            .connect_with(opts)
            .await
            .map_err(storage_err)?;

        Ok(Self { pool })
    }

    /// Apply embedded schema migrations. Run once at startup, before binding.
    pub async fn migrate(&self) -> Result<(), SealboxError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SealboxError::Storage(e.to_string()))
    }

    /// Drain the pool. Called on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ── Accounts ─────────────────────────────────────────────────────────────

    /// Create an account together with its initial key material, atomically.
    ///
    /// A unique violation on the identity key surfaces as
    /// [`SealboxError::AlreadyRegistered`]; nothing is persisted in that case.
    pub async fn register_account(
        &self,
        public_key: &IdentityKey,
        registration_id: i64,
        signed_prekey: &SignedPrekey,
        one_time_prekeys: &[OneTimePrekey],
    ) -> Result<AccountId, SealboxError> {
        let account_id = AccountId::new();
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        sqlx::query("INSERT INTO accounts (id, public_key, registration_id) VALUES ($1, $2, $3)")
            .bind(account_id.0)
            .bind(public_key.as_bytes().as_slice())
            .bind(registration_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    SealboxError::AlreadyRegistered
                }
                _ => storage_err(e),
            })?;

        sqlx::query(
            "INSERT INTO signed_prekeys (account_id, key_id, public_key, signature) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(account_id.0)
        .bind(signed_prekey.key_id)
        .bind(signed_prekey.public_key.as_bytes().as_slice())
        .bind(signed_prekey.signature.as_bytes().as_slice())
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        let (key_ids, public_keys) = columns(one_time_prekeys);
        sqlx::query(
            "INSERT INTO one_time_prekeys (account_id, key_id, public_key) \
             SELECT $1, k, p FROM UNNEST($2::bigint[], $3::bytea[]) AS t(k, p) \
             ON CONFLICT DO NOTHING",
        )
        .bind(account_id.0)
        .bind(&key_ids)
        .bind(&public_keys)
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;
        Ok(account_id)
    }

    /// Resolve an identity public key to its account, if registered.
    pub async fn find_account_by_public_key(
        &self,
        public_key: &IdentityKey,
    ) -> Result<Option<AccountId>, SealboxError> {
        let id: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM accounts WHERE public_key = $1")
                .bind(public_key.as_bytes().as_slice())
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_err)?;
        Ok(id.map(AccountId))
    }

    /// Fetch an account's identity key and registration id.
    pub async fn fetch_identity(
        &self,
        account: AccountId,
    ) -> Result<Option<(IdentityKey, i64)>, SealboxError> {
        let row: Option<(Vec<u8>, i64)> =
            sqlx::query_as("SELECT public_key, registration_id FROM accounts WHERE id = $1")
                .bind(account.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_err)?;
        match row {
            Some((bytes, registration_id)) => {
                Ok(Some((IdentityKey(key32(bytes)?), registration_id)))
            }
            None => Ok(None),
        }
    }

    // ── Signed prekeys ───────────────────────────────────────────────────────

    /// Replace the account's signed prekey in place, refreshing its creation
    /// instant.
    pub async fn upsert_signed_prekey(
        &self,
        account: AccountId,
        prekey: &SignedPrekey,
    ) -> Result<(), SealboxError> {
        sqlx::query(
            "INSERT INTO signed_prekeys (account_id, key_id, public_key, signature) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (account_id) DO UPDATE \
             SET key_id = EXCLUDED.key_id, public_key = EXCLUDED.public_key, \
                 signature = EXCLUDED.signature, created_at = now()",
        )
        .bind(account.0)
        .bind(prekey.key_id)
        .bind(prekey.public_key.as_bytes().as_slice())
        .bind(prekey.signature.as_bytes().as_slice())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    pub async fn fetch_signed_prekey(
        &self,
        account: AccountId,
    ) -> Result<Option<SignedPrekey>, SealboxError> {
        let row: Option<(i64, Vec<u8>, Vec<u8>)> = sqlx::query_as(
            "SELECT key_id, public_key, signature FROM signed_prekeys WHERE account_id = $1",
        )
        .bind(account.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        match row {
            Some((key_id, public_key, signature)) => Ok(Some(SignedPrekey {
                key_id,
                public_key: PrekeyPublic(key32(public_key)?),
                signature: sealbox_core::types::DetachedSig(
                    signature
                        .try_into()
                        .map_err(|_| {
                            SealboxError::Internal("stored signature has wrong length".into())
                        })?,
                ),
            })),
            None => Ok(None),
        }
    }

    // ── One-time prekeys ─────────────────────────────────────────────────────

    /// Insert a batch of one-time prekeys. Collisions on (account, key id)
    /// are silent no-ops; the returned count covers rows actually written.
    pub async fn insert_one_time_prekeys(
        &self,
        account: AccountId,
        prekeys: &[OneTimePrekey],
    ) -> Result<u64, SealboxError> {
        let (key_ids, public_keys) = columns(prekeys);
        let result = sqlx::query(
            "INSERT INTO one_time_prekeys (account_id, key_id, public_key) \
             SELECT $1, k, p FROM UNNEST($2::bigint[], $3::bytea[]) AS t(k, p) \
             ON CONFLICT DO NOTHING",
        )
        .bind(account.0)
        .bind(&key_ids)
        .bind(&public_keys)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(result.rows_affected())
    }

    pub async fn count_one_time_prekeys(&self, account: AccountId) -> Result<i64, SealboxError> {
        sqlx::query_scalar("SELECT count(*) FROM one_time_prekeys WHERE account_id = $1")
            .bind(account.0)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)
    }

    /// Take exactly one one-time prekey off the pool, oldest first.
    ///
    /// `FOR UPDATE SKIP LOCKED` makes concurrent fetches land on distinct
    /// rows: a fetch that finds every candidate row locked reports an empty
    /// pool instead of blocking, and the delete happens inside the same
    /// transaction as the select.
    pub async fn consume_one_time_prekey(
        &self,
        account: AccountId,
    ) -> Result<Option<OneTimePrekey>, SealboxError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let row: Option<(i64, Vec<u8>)> = sqlx::query_as(
            "SELECT key_id, public_key FROM one_time_prekeys \
             WHERE account_id = $1 \
             ORDER BY created_at, key_id \
             LIMIT 1 \
             FOR UPDATE SKIP LOCKED",
        )
        .bind(account.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?;

        let Some((key_id, public_key)) = row else {
            tx.rollback().await.map_err(storage_err)?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM one_time_prekeys WHERE account_id = $1 AND key_id = $2")
            .bind(account.0)
            .bind(key_id)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;
        Ok(Some(OneTimePrekey {
            key_id,
            public_key: PrekeyPublic(key32(public_key)?),
        }))
    }

    // ── Message queue ────────────────────────────────────────────────────────

    /// Append sealed ciphertext to the recipient's queue.
    ///
    /// The row carries no sender attribute; a foreign-key violation (unknown
    /// recipient) surfaces as [`SealboxError::RecipientNotFound`].
    pub async fn enqueue_message(
        &self,
        recipient: AccountId,
        ciphertext: &[u8],
        kind: MessageKind,
        ttl_days: u32,
    ) -> Result<MessageId, SealboxError> {
        let id = MessageId::new();
        let expires_at = Utc::now() + chrono::Duration::days(i64::from(ttl_days));

        sqlx::query(
            "INSERT INTO message_queue (id, recipient_id, ciphertext, message_type, expires_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id.0)
        .bind(recipient.0)
        .bind(ciphertext)
        .bind(kind.as_tag())
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                SealboxError::RecipientNotFound
            }
            _ => storage_err(e),
        })?;

        Ok(id)
    }

    /// Read up to 100 queued messages in ascending id order. Rows stay queued
    /// until the recipient deletes them.
    pub async fn fetch_queued(
        &self,
        recipient: AccountId,
    ) -> Result<Vec<QueuedMessage>, SealboxError> {
        let rows: Vec<(Uuid, Vec<u8>, i16)> = sqlx::query_as(
            "SELECT id, ciphertext, message_type FROM message_queue \
             WHERE recipient_id = $1 AND expires_at > now() \
             ORDER BY id ASC \
             LIMIT $2",
        )
        .bind(recipient.0)
        .bind(DRAIN_BATCH_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.into_iter()
            .map(|(id, ciphertext, tag)| {
                Ok(QueuedMessage {
                    id: MessageId(id),
                    ciphertext,
                    kind: MessageKind::from_tag(tag)
                        .map_err(|_| SealboxError::Internal("invalid stored tag".into()))?,
                })
            })
            .collect()
    }

    /// Delete a queue row, but only if it belongs to `recipient`. The dual
    /// predicate is the sole cross-account isolation on the queue.
    pub async fn delete_message(
        &self,
        recipient: AccountId,
        id: MessageId,
    ) -> Result<bool, SealboxError> {
        let result =
            sqlx::query("DELETE FROM message_queue WHERE id = $1 AND recipient_id = $2")
                .bind(id.0)
                .bind(recipient.0)
                .execute(&self.pool)
                .await
                .map_err(storage_err)?;
        Ok(result.rows_affected() > 0)
    }

    // ── Token revocation ─────────────────────────────────────────────────────

    /// Record a token id as revoked until its natural expiry.
    pub async fn revoke_token(
        &self,
        token: TokenId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SealboxError> {
        sqlx::query(
            "INSERT INTO revoked_tokens (token_id, expires_at) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(token.0)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    /// Presence in the revocation set means the token is rejected.
    pub async fn is_token_revoked(&self, token: TokenId) -> Result<bool, SealboxError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE token_id = $1)")
            .bind(token.0)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)
    }

    // ── Reaping ──────────────────────────────────────────────────────────────

    /// Delete every queue row and revocation record whose expiry precedes
    /// `now`. Idempotent; safe on any schedule.
    pub async fn reap_expired(&self, now: DateTime<Utc>) -> Result<(u64, u64), SealboxError> {
        let messages = sqlx::query("DELETE FROM message_queue WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?
            .rows_affected();

        let tokens = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?
            .rows_affected();

        Ok((messages, tokens))
    }
}

/// Split a prekey batch into the parallel arrays UNNEST expects.
fn columns(prekeys: &[OneTimePrekey]) -> (Vec<i64>, Vec<Vec<u8>>) {
    let key_ids = prekeys.iter().map(|p| p.key_id).collect();
    let public_keys = prekeys
        .iter()
        .map(|p| p.public_key.as_bytes().to_vec())
        .collect();
    (key_ids, public_keys)
}
