//! Host event sources.
//!
//! The host writes one JSON object per line, e.g. `{"type":"session.idle"}`.
//! Sources parse those lines into `HostEvent`s and skip anything unreadable.

mod socket;
mod stream;

use async_trait::async_trait;
pub use socket::SocketSource;
pub use stream::StreamSource;
use thiserror::Error;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tracing::debug;
use tracing::trace;

use crate::domain::HostEvent;

/// Trait for host event sources.
#[async_trait]
pub trait EventSource: Send {
    /// Get the next event.
    ///
    /// Waits until an event arrives. Reconnecting sources handle dropped
    /// connections internally; `Closed` means no more events will come.
    async fn next_event(&mut self) -> Result<HostEvent, SourceError>;
}

/// Errors that can occur while reading host events.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Socket connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Socket path not found: {0}")]
    SocketNotFound(String),

    #[error("Event stream closed")]
    Closed,

    #[error("Failed to read event stream: {0}")]
    Read(#[from] std::io::Error),
}

/// Parse a single line from the event stream.
///
/// Returns `None` for blank or malformed lines, including lines that are
/// not valid UTF-8.
fn parse_event_line(line: &[u8]) -> Option<HostEvent> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_slice::<HostEvent>(line) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!(
                "Ignoring malformed event line ({}): {}",
                e,
                String::from_utf8_lossy(line)
            );
            None
        }
    }
}

/// Read lines until one parses as an event. `None` means EOF.
async fn read_event<R>(reader: &mut R) -> std::io::Result<Option<HostEvent>>
where
    R: AsyncBufRead + Unpin + Send,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(None);
        }

        trace!("Received line: {}", String::from_utf8_lossy(line.trim_ascii_end()));
        if let Some(event) = parse_event_line(&line) {
            return Ok(Some(event));
        }
    }
}
