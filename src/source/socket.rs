//! Unix socket event source.
//!
//! Connects to a socket the host publishes events on. The connection is
//! re-established with exponential backoff whenever it drops, so the daemon
//! survives host restarts.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::BufReader;
use tokio::net::UnixStream;
use tracing::info;
use tracing::warn;

use super::EventSource;
use super::SourceError;
use super::read_event;
use crate::domain::HostEvent;

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Host event socket source.
pub struct SocketSource {
    path: PathBuf,
    reader: Option<BufReader<UnixStream>>,
    backoff: Duration,
}

impl SocketSource {
    /// Connect to the event socket at `path`.
    pub async fn connect(path: &Path) -> Result<Self, SourceError> {
        info!("Connecting to event socket: {}", path.display());
        let stream = open(path).await?;
        info!("Connected to event socket");

        Ok(Self {
            path: path.to_path_buf(),
            reader: Some(BufReader::new(stream)),
            backoff: INITIAL_BACKOFF,
        })
    }

    /// Wait, then try once to reconnect.
    async fn reconnect(&mut self) -> Result<(), SourceError> {
        warn!(
            "Event socket connection lost. Retrying in {:?}...",
            self.backoff
        );

        tokio::time::sleep(self.backoff).await;
        self.backoff = std::cmp::min(self.backoff * 2, MAX_BACKOFF);

        let stream = open(&self.path).await?;

        info!("Reconnected to event socket");
        self.reader = Some(BufReader::new(stream));
        self.backoff = INITIAL_BACKOFF;

        Ok(())
    }
}

#[async_trait]
impl EventSource for SocketSource {
    async fn next_event(&mut self) -> Result<HostEvent, SourceError> {
        loop {
            let Some(reader) = self.reader.as_mut() else {
                if let Err(e) = self.reconnect().await {
                    warn!("Reconnect failed: {}", e);
                }
                continue;
            };

            match read_event(reader).await {
                Ok(Some(event)) => return Ok(event),
                Ok(None) => {
                    warn!("Event socket closed by host (EOF)");
                    self.reader = None;
                }
                Err(e) => {
                    warn!("Read error: {}", e);
                    self.reader = None;
                }
            }
        }
    }
}

async fn open(path: &Path) -> Result<UnixStream, SourceError> {
    if !path.exists() {
        return Err(SourceError::SocketNotFound(path.display().to_string()));
    }

    UnixStream::connect(path)
        .await
        .map_err(|e| SourceError::ConnectionFailed(e.to_string()))
}
