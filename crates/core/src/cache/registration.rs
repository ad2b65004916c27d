//! Active worker registration per origin.
//!
//! The registration names the cache of the most recently activated version so
//! that a restarted process keeps serving it without reinstalling.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};

/// The activated version for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Registration {
    /// Serving origin, e.g. `https://blog.example.com`.
    pub scope: String,
    pub active_cache: String,
    pub activated_at: String,
}

impl CacheDb {
    /// Get the registration for a scope.
    pub async fn registration(&self, scope: &str) -> Result<Option<Registration>, Error> {
        let scope = scope.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Registration>, Error> {
                let result = conn.query_row(
                    "SELECT scope, active_cache, activated_at FROM registrations WHERE scope = ?1",
                    params![scope],
                    |row| Ok(Registration { scope: row.get(0)?, active_cache: row.get(1)?, activated_at: row.get(2)? }),
                );

                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Record `active_cache` as the activated version for a scope.
    pub async fn set_registration(&self, scope: &str, active_cache: &str) -> Result<Registration, Error> {
        let registration = Registration {
            scope: scope.to_string(),
            active_cache: active_cache.to_string(),
            activated_at: chrono::Utc::now().to_rfc3339(),
        };
        let row = registration.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO registrations (scope, active_cache, activated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(scope) DO UPDATE SET
                        active_cache = excluded.active_cache,
                        activated_at = excluded.activated_at",
                    params![row.scope, row.active_cache, row.activated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(registration)
    }
}
