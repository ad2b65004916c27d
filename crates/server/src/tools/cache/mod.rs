//! Cache inspection MCP tools.
//!
//! Read-only views over the named caches in the SQLite store.

pub mod keys;
pub mod lookup;

pub use keys::{CacheKeysParams, keys_impl};
pub use lookup::{CacheMatchParams, match_impl};
