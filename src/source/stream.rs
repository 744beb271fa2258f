//! Event source over any byte stream, normally stdin.

use async_trait::async_trait;
use tokio::io::AsyncBufRead;
use tokio::io::BufReader;
use tokio::io::Stdin;
use tracing::info;

use super::EventSource;
use super::SourceError;
use super::read_event;
use crate::domain::HostEvent;

/// Reads newline-delimited events until EOF.
pub struct StreamSource<R> {
    reader: R,
}

impl StreamSource<BufReader<Stdin>> {
    /// Read events piped into stdin.
    pub fn stdin() -> Self {
        info!("Reading host events from stdin");
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> StreamSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<R> EventSource for StreamSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_event(&mut self) -> Result<HostEvent, SourceError> {
        read_event(&mut self.reader)
            .await?
            .ok_or(SourceError::Closed)
    }
}
