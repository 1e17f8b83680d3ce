//! Scripted in-memory engine for lifecycle tests

use super::{ContainerHandle, Engine, LogChunk, LogStream};
use crate::command::CreateRequest;
use crate::error::{Result, WharfError};
use async_trait::async_trait;
use futures::stream;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory [`Engine`] that records every call in order and plays back
/// scripted log output and exit statuses.
#[derive(Default)]
pub struct FakeEngine {
    calls: Mutex<Vec<String>>,
    images: Mutex<HashMap<String, String>>,
    containers: Mutex<HashMap<String, ContainerHandle>>,
    created: Mutex<Vec<CreateRequest>>,
    log_script: Mutex<Vec<String>>,
    wait_status: Mutex<i64>,
    next_id: Mutex<u32>,
    fail_inspect: Mutex<bool>,
    fail_remove: Mutex<bool>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a locally available image
    pub fn with_image(self, reference: &str, id: &str) -> Self {
        self.images
            .lock()
            .unwrap()
            .insert(reference.to_string(), id.to_string());
        self
    }

    /// Seed a pre-existing container
    pub fn with_container(self, name: &str, id: &str, running: bool) -> Self {
        self.containers.lock().unwrap().insert(
            name.to_string(),
            ContainerHandle {
                id: id.to_string(),
                name: name.to_string(),
                running,
            },
        );
        self
    }

    /// Script the chunks every log stream will emit before closing
    pub fn with_log_script(self, chunks: &[&str]) -> Self {
        *self.log_script.lock().unwrap() = chunks.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Script the exit status reported by `wait_container`
    pub fn with_wait_status(self, status: i64) -> Self {
        *self.wait_status.lock().unwrap() = status;
        self
    }

    /// Make `inspect_container` fail with an engine error
    pub fn with_failing_inspect(self) -> Self {
        *self.fail_inspect.lock().unwrap() = true;
        self
    }

    /// Make `remove_container` fail with an engine error
    pub fn with_failing_remove(self) -> Self {
        *self.fail_remove.lock().unwrap() = true;
        self
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Create requests received so far, in order
    pub fn created_requests(&self) -> Vec<CreateRequest> {
        self.created.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn fresh_id(&self) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("c{}", *next)
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn pull_image(&self, reference: &str) -> Result<()> {
        self.record(format!("pull {}", reference));
        let id = format!("sha256:{}", reference.replace([':', '/'], "-"));
        self.images
            .lock()
            .unwrap()
            .insert(reference.to_string(), id);
        Ok(())
    }

    async fn inspect_image(&self, reference: &str) -> Result<String> {
        self.record(format!("inspect-image {}", reference));
        self.images
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| WharfError::ImageNotFound(reference.to_string()))
    }

    async fn inspect_container(&self, name: &str) -> Result<Option<ContainerHandle>> {
        self.record(format!("inspect-container {}", name));
        if *self.fail_inspect.lock().unwrap() {
            return Err(WharfError::Engine("inspect failed".to_string()));
        }
        Ok(self.containers.lock().unwrap().get(name).cloned())
    }

    async fn create_container(&self, request: &CreateRequest) -> Result<String> {
        let id = self.fresh_id();
        self.record(format!(
            "create {}",
            request.name.as_deref().unwrap_or(&id)
        ));
        let name = request.name.clone().unwrap_or_default();
        let key = if name.is_empty() { id.clone() } else { name.clone() };
        self.containers.lock().unwrap().insert(
            key,
            ContainerHandle {
                id: id.clone(),
                name,
                running: false,
            },
        );
        self.created.lock().unwrap().push(request.clone());
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.record(format!("start {}", id));
        for handle in self.containers.lock().unwrap().values_mut() {
            if handle.id == id {
                handle.running = true;
            }
        }
        Ok(())
    }

    async fn kill_container(&self, id: &str) -> Result<()> {
        self.record(format!("kill {}", id));
        for handle in self.containers.lock().unwrap().values_mut() {
            if handle.id == id {
                handle.running = false;
            }
        }
        Ok(())
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        self.record(format!("remove {}", id));
        if *self.fail_remove.lock().unwrap() {
            return Err(WharfError::Engine("remove failed".to_string()));
        }
        self.containers
            .lock()
            .unwrap()
            .retain(|_, handle| handle.id != id);
        Ok(())
    }

    async fn follow_logs(&self, id: &str) -> Result<LogStream> {
        self.record(format!("logs {}", id));
        let container_id = id.to_string();
        let chunks: Vec<Result<LogChunk>> = self
            .log_script
            .lock()
            .unwrap()
            .iter()
            .map(|payload| {
                Ok(LogChunk {
                    container_id: container_id.clone(),
                    payload: payload.clone(),
                })
            })
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn wait_container(&self, id: &str) -> Result<i64> {
        self.record(format!("wait {}", id));
        Ok(*self.wait_status.lock().unwrap())
    }
}
