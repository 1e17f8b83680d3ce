//! Container log consumption
//!
//! One following log stream, two consumption modes: scan chunks until a
//! readiness pattern matches, or forward everything until the stream ends.
//! Either way every chunk is surfaced through tracing as it arrives.

use crate::engine::{Engine, LogStream};
use crate::error::{Result, WharfError};
use futures::StreamExt;
use regex::Regex;

/// Consumer over one container's following log stream
pub struct LogFollower {
    stream: LogStream,
    label: String,
}

impl LogFollower {
    pub fn new(stream: LogStream, label: impl Into<String>) -> Self {
        Self {
            stream,
            label: label.into(),
        }
    }

    /// Open a following stream for the given container
    pub async fn open(engine: &dyn Engine, id: &str, label: &str) -> Result<Self> {
        Ok(Self::new(engine.follow_logs(id).await?, label))
    }

    /// Block until a chunk matches the readiness pattern.
    ///
    /// Chunks received before the match are forwarded at debug level,
    /// prefixed with the container label. The stream ending without a match
    /// is a readiness failure. No timeout is applied here.
    pub async fn await_match(mut self, pattern: &Regex) -> Result<()> {
        while let Some(chunk) = self.stream.next().await {
            let chunk = chunk?;
            tracing::debug!("[{}] {}", self.label, chunk.payload.trim_end_matches('\n'));
            if pattern.is_match(&chunk.payload) {
                tracing::info!("Container is ready");
                return Ok(());
            }
        }
        Err(WharfError::NotReady(self.label))
    }

    /// Forward every chunk until the stream ends.
    ///
    /// Stream errors are logged and end the forwarding; they never fail the
    /// surrounding run.
    pub async fn forward_all(mut self) {
        while let Some(chunk) = self.stream.next().await {
            match chunk {
                Ok(chunk) => tracing::info!("{}", chunk.payload.trim_end_matches('\n')),
                Err(e) => {
                    tracing::warn!("Log stream for {} interrupted: {}", self.label, e);
                    break;
                }
            }
        }
    }
}
