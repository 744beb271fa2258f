//! Domain types shared by event sources, the notifier and the dispatcher.

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// Event kind emitted by the host when the monitored session goes idle.
pub const SESSION_IDLE: &str = "session.idle";

/// A lifecycle event record delivered by the host runtime.
///
/// Only the `type` discriminator is consumed. Everything else the host sends
/// is kept as opaque properties so `--print-events` can show it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEvent {
    /// Event kind, e.g. `session.idle` or `session.start`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Event payload (unused).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub properties: serde_json::Value,
}

impl HostEvent {
    /// Create an event of the given kind with no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            properties: serde_json::Value::Null,
        }
    }

    /// Returns true if this event has the given kind.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

/// A fully resolved notification, ready to hand to a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub icon: Option<PathBuf>,
    /// Sound to play alongside the popup. `None` means silent.
    pub sound: Option<PathBuf>,
    pub volume: u32,
}
