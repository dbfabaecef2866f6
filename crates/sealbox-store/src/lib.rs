//! sealbox-store
//!
//! PostgreSQL persistence for the relay (component C1). Owns every table,
//! every SQL statement, and the transactional contracts the services rely
//! on: atomic registration, single-use one-time-prekey consumption via
//! `FOR UPDATE SKIP LOCKED`, recipient-scoped queue deletion, and the TTL
//! reap. Schema lives in `migrations/` and is applied at startup.

pub mod db;

pub use db::{Store, StoreConfig};
