//! Persistent container reconciliation
//!
//! A start task converges one named container slot onto its desired
//! configuration. Any same-named container is killed (if running) and
//! removed before a fresh one is created, started, and optionally awaited
//! for readiness; no configuration diffing is attempted. The id of the
//! created container is persisted so the next invocation can tell whether
//! the currently running container is still the one this task made.

use crate::command;
use crate::engine::Engine;
use crate::error::{Result, WharfError};
use crate::logs::LogFollower;
use crate::spec::ContainerSpec;
use crate::task::pull::pull_if_requested;
use crate::task::state::StateFile;
use regex::Regex;
use tracing::info;

/// Reconciliation task for one named, long-lived container
pub struct StartTask {
    spec: ContainerSpec,
    name: String,
    state_file: StateFile,
    wait_for_log: Option<Regex>,
}

/// Result of a successful reconciliation
#[derive(Debug, Clone)]
pub struct StartOutcome {
    /// Id of the container that is now running
    pub container_id: String,
}

impl StartTask {
    /// Create a start task; the spec must carry a container name
    pub fn new(spec: ContainerSpec, state_file: StateFile) -> Result<Self> {
        let name = spec.name.clone().ok_or_else(|| {
            WharfError::InvalidConfig("a start task requires a container name".to_string())
        })?;
        Ok(Self {
            spec,
            name,
            state_file,
            wait_for_log: None,
        })
    }

    /// Block after start until a log line matches this pattern.
    ///
    /// Without a pattern the task returns as soon as the container started.
    pub fn wait_for_log(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            WharfError::InvalidConfig(format!("invalid readiness pattern '{}': {}", pattern, e))
        })?;
        self.wait_for_log = Some(regex);
        Ok(self)
    }

    /// The container name this task manages
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the previously created container is still the one running.
    ///
    /// True only when a container with the task's name is currently running
    /// and its id equals the persisted id from the prior invocation. A
    /// missing state file (first run) reports false. This is the only
    /// freshness signal for start tasks; they are never cacheable by
    /// content.
    pub async fn is_up_to_date(&self, engine: &dyn Engine) -> Result<bool> {
        is_up_to_date(engine, &self.name, &self.state_file).await
    }

    /// Converge the container slot onto the desired configuration
    pub async fn execute(&self, engine: &dyn Engine) -> Result<StartOutcome> {
        pull_if_requested(engine, &self.spec).await?;

        let existing = engine.inspect_container(&self.name).await?;
        if let Some(existing) = &existing {
            if existing.running {
                info!("Stopping outdated container {}", existing.display_name());
                engine.kill_container(&existing.id).await?;
            }
            info!("Removing outdated container {}", existing.display_name());
            engine.remove_container(&existing.id).await?;
        }

        let request = command::build(engine, &self.spec).await?;
        let container_id = engine.create_container(&request).await?;
        info!(
            "Created new container {}",
            request.name.as_deref().unwrap_or(&container_id)
        );
        self.state_file.store(&container_id)?;

        engine.start_container(&container_id).await?;
        info!("Starting container");

        if let Some(pattern) = &self.wait_for_log {
            info!("Waiting for container to be ready ...");
            LogFollower::open(engine, &container_id, &self.name)
                .await?
                .await_match(pattern)
                .await?;
        }

        Ok(StartOutcome { container_id })
    }
}

/// Up-to-date predicate for a named container slot, usable without building
/// the full task (the driver polls this before deciding to execute).
pub async fn is_up_to_date(
    engine: &dyn Engine,
    name: &str,
    state_file: &StateFile,
) -> Result<bool> {
    let previous = state_file.load()?;
    let current = engine.inspect_container(name).await?;
    Ok(match (current, previous) {
        (Some(current), Some(previous)) => current.running && current.id == previous,
        _ => false,
    })
}
