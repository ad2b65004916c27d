//! Core types and shared functionality for stowaway.
//!
//! This crate provides:
//! - Versioned named caches with a SQLite backend
//! - Unified error types
//! - Worker configuration

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheInfo, NamedCache, Registration, RequestIdentity, StoredResponse};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
