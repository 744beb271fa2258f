//! idle-notifyd - turns host "session idle" events into desktop notifications.
//!
//! Events arrive as JSON lines on stdin or a Unix socket. Each idle event
//! outside the cooldown window raises a popup via `notify-send` and plays a
//! sound via `paplay`.

pub mod config;
pub mod desktop;
pub mod domain;
pub mod notifier;
pub mod picker;
pub mod source;
pub mod throttle;
