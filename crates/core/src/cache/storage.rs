//! Named cache enumeration and management.
//!
//! Mirrors the storage-level operations of a browser cache store: open
//! (creating on demand), enumerate in creation order, delete as a whole, and
//! match across every cache.

use super::connection::CacheDb;
use super::entries::{NamedCache, RequestIdentity, StoredResponse, select_entry};
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Summary of one named cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheInfo {
    pub name: String,
    pub created_at: String,
    pub entries: u64,
}

impl CacheDb {
    /// Open the named cache, creating it if it does not exist yet.
    pub async fn open_cache(&self, name: &str) -> Result<NamedCache, Error> {
        let owned = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![owned, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(NamedCache::new(self.clone(), name.to_string()))
    }

    /// Handle onto a named cache without creating it.
    ///
    /// Reads through a handle to a missing cache miss; writes fail.
    pub fn cache(&self, name: &str) -> NamedCache {
        NamedCache::new(self.clone(), name.to_string())
    }

    /// Check whether a named cache exists.
    pub async fn has_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM caches WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of every cache, in creation order.
    pub async fn cache_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a named cache and all of its entries.
    ///
    /// Returns whether the cache existed.
    pub async fn delete_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Look `identity` up in every cache, oldest cache first.
    ///
    /// Returns the name of the cache that held the entry alongside it.
    pub async fn match_any(&self, identity: &RequestIdentity) -> Result<Option<(String, StoredResponse)>, Error> {
        let key = identity.key();
        self.conn
            .call(move |conn| -> Result<Option<(String, StoredResponse)>, Error> {
                let names = {
                    let mut stmt = conn.prepare(
                        "SELECT c.name FROM caches c
                         JOIN entries e ON e.cache_name = c.name
                         WHERE e.key_hash = ?1 ORDER BY c.rowid",
                    )?;
                    stmt.query_map(params![key], |row| row.get::<_, String>(0))?
                        .collect::<Result<Vec<_>, _>>()?
                };

                for name in names {
                    if let Some(response) = select_entry(conn, &name, &key)? {
                        return Ok(Some((name, response)));
                    }
                }
                Ok(None)
            })
            .await
            .map_err(Error::from)
    }

    /// Every cache with its entry count, in creation order.
    pub async fn cache_info(&self) -> Result<Vec<CacheInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<CacheInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT c.name, c.created_at, COUNT(e.key_hash)
                     FROM caches c LEFT JOIN entries e ON e.cache_name = c.name
                     GROUP BY c.name ORDER BY c.rowid",
                )?;
                let info = stmt
                    .query_map([], |row| {
                        Ok(CacheInfo { name: row.get(0)?, created_at: row.get(1)?, entries: row.get::<_, i64>(2)? as u64 })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(info)
            })
            .await
            .map_err(Error::from)
    }
}
