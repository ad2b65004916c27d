//! Worker logic for stowaway.
//!
//! This crate provides the network fetch pipeline, the network-first and
//! cache-first strategies, request routing, the control channel and the
//! worker lifecycle built on top of them.

pub mod control;
pub mod fetch;
pub mod router;
pub mod strategy;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use control::Command;
pub use fetch::{CacheMode, Destination, FetchClient, FetchConfig, FetchResponse, Network, Request};
pub use router::{Route, route};
pub use strategy::{ResponseSource, Served};
pub use worker::{ClientRegistry, Event, EventKind, EventOutcome, Worker, WorkerState, WorkerStatus};
