//! Control channel: commands posted to the worker by the pages it serves.

use serde_json::Value;

/// A recognized control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Leave `Waiting` and activate now, even with older clients attached.
    SkipWaiting,
}

impl Command {
    /// Parse a posted message. Only an object whose `type` field is exactly
    /// `"SKIP_WAITING"` is recognized; anything else yields None.
    pub fn parse(data: &Value) -> Option<Self> {
        match data.get("type")?.as_str()? {
            "SKIP_WAITING" => Some(Command::SkipWaiting),
            _ => None,
        }
    }
}
