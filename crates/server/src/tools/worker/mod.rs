//! Worker MCP tools: one event per tool call.

pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod status;

pub use fetch::{WorkerFetchParams, fetch_impl};
pub use lifecycle::{ClientCloseParams, activate_impl, client_close_impl, install_impl};
pub use message::{WorkerMessageParams, message_impl};
pub use status::status_impl;
