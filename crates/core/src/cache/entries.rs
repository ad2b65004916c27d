//! Request/response entries inside a named cache.
//!
//! A [`NamedCache`] is a handle onto one partition of the store. Entries are
//! keyed by [`RequestIdentity`]; writing the same identity twice replaces the
//! earlier response (last write wins).

use super::connection::CacheDb;
use super::hash::compute_request_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_rusqlite::{params, rusqlite};

/// The (method, URL) pair used as the cache lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RequestIdentity {
    pub method: String,
    pub url: String,
}

impl RequestIdentity {
    /// Build an identity; the method is normalized to upper case.
    pub fn new(method: impl AsRef<str>, url: impl Into<String>) -> Self {
        Self { method: method.as_ref().to_ascii_uppercase(), url: url.into() }
    }

    /// Identity of a GET request for `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Storage key for this identity.
    pub fn key(&self) -> String {
        compute_request_key(&self.method, &self.url)
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Immutable snapshot of a response held by a named cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoredResponse {
    /// URL the response was served from (after redirects).
    pub url: String,
    pub status: u16,
    /// Header name/value pairs in received order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// RFC 3339 timestamp of the write.
    pub stored_at: String,
}

impl StoredResponse {
    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

/// Handle onto one named cache.
#[derive(Clone, Debug)]
pub struct NamedCache {
    db: CacheDb,
    name: String,
}

impl NamedCache {
    pub(crate) fn new(db: CacheDb, name: String) -> Self {
        Self { db, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a response under `identity`, replacing any previous entry.
    ///
    /// Fails if the cache was deleted after this handle was opened.
    pub async fn put(&self, identity: &RequestIdentity, response: &StoredResponse) -> Result<(), Error> {
        self.put_all(vec![(identity.clone(), response.clone())]).await
    }

    /// Store several entries in one transaction; either all or none are written.
    pub async fn put_all(&self, entries: Vec<(RequestIdentity, StoredResponse)>) -> Result<(), Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO entries (
                            cache_name, key_hash, method, url, response_url,
                            status_code, headers_json, body, stored_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                        ON CONFLICT(cache_name, key_hash) DO UPDATE SET
                            response_url = excluded.response_url,
                            status_code = excluded.status_code,
                            headers_json = excluded.headers_json,
                            body = excluded.body,
                            stored_at = excluded.stored_at",
                    )?;
                    for (identity, response) in &entries {
                        let headers_json = serde_json::to_string(&response.headers)?;
                        stmt.execute(params![
                            &name,
                            identity.key(),
                            &identity.method,
                            &identity.url,
                            &response.url,
                            response.status,
                            headers_json,
                            &response.body,
                            &response.stored_at,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the response stored for `identity`.
    ///
    /// Returns None on a miss.
    pub async fn match_request(&self, identity: &RequestIdentity) -> Result<Option<StoredResponse>, Error> {
        let name = self.name.clone();
        let key = identity.key();
        self.db
            .conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> { select_entry(conn, &name, &key) })
            .await
            .map_err(Error::from)
    }

    /// Request identities stored in this cache, in insertion order.
    pub async fn keys(&self) -> Result<Vec<RequestIdentity>, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<RequestIdentity>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE cache_name = ?1 ORDER BY rowid")?;
                let keys = stmt
                    .query_map(params![name], |row| Ok(RequestIdentity { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}

/// Read one entry inside a running connection call.
pub(crate) fn select_entry(
    conn: &rusqlite::Connection, cache_name: &str, key_hash: &str,
) -> Result<Option<StoredResponse>, Error> {
    let mut stmt = conn.prepare(
        "SELECT response_url, status_code, headers_json, body, stored_at
         FROM entries WHERE cache_name = ?1 AND key_hash = ?2",
    )?;

    let result = stmt.query_row(params![cache_name, key_hash], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, u16>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Vec<u8>>(3)?,
            row.get::<_, String>(4)?,
        ))
    });

    match result {
        Ok((url, status, headers_json, body, stored_at)) => {
            let headers = serde_json::from_str(&headers_json)?;
            Ok(Some(StoredResponse { url, status, headers, body, stored_at }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
