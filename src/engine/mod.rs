//! Remote container engine abstraction
//!
//! The engine is an external collaborator reached over RPC. Everything the
//! lifecycle tasks need from it is captured by the [`Engine`] trait so the
//! tasks stay independent of the transport; [`docker::DockerEngine`] is the
//! Docker Engine API implementation.

pub mod docker;
#[cfg(test)]
pub(crate) mod fake;

use crate::command::CreateRequest;
use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

pub use docker::DockerEngine;

/// Stream of raw log chunks pushed by the engine connection
pub type LogStream = Pin<Box<dyn Stream<Item = Result<LogChunk>> + Send>>;

/// Observed state of a container matched by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerHandle {
    /// Opaque engine-assigned id
    pub id: String,
    /// Container name, without any leading slash
    pub name: String,
    /// Whether the container's main process is currently running
    pub running: bool,
}

impl ContainerHandle {
    /// Name for log messages, falling back to the id for unnamed containers
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// One chunk of combined stdout/stderr output
#[derive(Debug, Clone)]
pub struct LogChunk {
    /// Id of the container the chunk came from
    pub container_id: String,
    /// Raw chunk payload, usually one line including its newline
    pub payload: String,
}

/// Operations consumed from the remote container engine.
///
/// Not-found conditions are part of the signatures (`inspect_container`
/// returns `None`); every other remote failure surfaces as
/// [`crate::WharfError::Engine`].
#[async_trait]
pub trait Engine: Send + Sync {
    /// Fetch an image from its registry
    async fn pull_image(&self, reference: &str) -> Result<()>;

    /// Resolve an image reference to its immutable id.
    ///
    /// Fails with [`crate::WharfError::ImageNotFound`] when the image is not
    /// present locally.
    async fn inspect_image(&self, reference: &str) -> Result<String>;

    /// Look up a container by name; `None` when no such container exists
    async fn inspect_container(&self, name: &str) -> Result<Option<ContainerHandle>>;

    /// Create a container and return its id
    async fn create_container(&self, request: &CreateRequest) -> Result<String>;

    /// Start a created container
    async fn start_container(&self, id: &str) -> Result<()>;

    /// Hard-stop a running container
    async fn kill_container(&self, id: &str) -> Result<()>;

    /// Remove a container
    async fn remove_container(&self, id: &str) -> Result<()>;

    /// Open a following log stream (stdout+stderr, from container start)
    async fn follow_logs(&self, id: &str) -> Result<LogStream>;

    /// Block until the container exits and return its exit status
    async fn wait_container(&self, id: &str) -> Result<i64>;
}
