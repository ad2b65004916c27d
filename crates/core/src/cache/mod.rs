//! SQLite-backed storage for versioned named caches.
//!
//! This module provides a persistent request/response store partitioned by
//! cache name, using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named caches created on demand and deleted as a whole
//! - Entries keyed by a SHA-256 digest of the request identity
//! - The active registration per origin
//! - Automatic schema migrations

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod registration;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{NamedCache, RequestIdentity, StoredResponse};
pub use registration::Registration;
pub use storage::CacheInfo;
