//! Run-to-completion coordinator
//!
//! Drives one ephemeral container through create, start, log forwarding and
//! exit, then removes it. Removal runs on every path out of the lifecycle,
//! including after a failed wait, and its own failure is only logged so it
//! never masks the run's real outcome.

use crate::command;
use crate::engine::Engine;
use crate::error::{Result, WharfError};
use crate::logs::LogFollower;
use crate::spec::ContainerSpec;
use crate::task::pull::pull_if_requested;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One-shot foreground run of a container
pub struct RunTask {
    spec: ContainerSpec,
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Id of the container that ran (it has been removed by now)
    pub container_id: String,
    /// The container's exit status, always zero on the success path
    pub status_code: i64,
}

impl RunTask {
    /// Ephemeral runs need no name; same-named reuse is not reconciled here
    pub fn new(spec: ContainerSpec) -> Self {
        Self { spec }
    }

    /// Run the container to completion and remove it.
    ///
    /// The start→wait→remove sequence runs on a spawned task, so if the
    /// caller's future is dropped mid-run the removal still happens.
    pub async fn execute(&self, engine: Arc<dyn Engine>) -> Result<RunOutcome> {
        pull_if_requested(engine.as_ref(), &self.spec).await?;

        let request = command::build(engine.as_ref(), &self.spec).await?;
        let container_id = engine.create_container(&request).await?;
        info!(
            "Created new container {}",
            request.name.as_deref().unwrap_or(&container_id)
        );

        let lifecycle = tokio::spawn(drive(engine, container_id.clone()));
        match lifecycle.await {
            Ok(result) => result.map(|status_code| RunOutcome {
                container_id,
                status_code,
            }),
            Err(e) => Err(WharfError::Engine(format!(
                "run lifecycle for container {} did not complete: {}",
                container_id, e
            ))),
        }
    }
}

async fn drive(engine: Arc<dyn Engine>, container_id: String) -> Result<i64> {
    let result = start_and_await(engine.as_ref(), &container_id).await;

    debug!("Removing residual container {}", container_id);
    if let Err(e) = engine.remove_container(&container_id).await {
        warn!("Failed to remove container {}: {}", container_id, e);
    }

    result
}

async fn start_and_await(engine: &dyn Engine, container_id: &str) -> Result<i64> {
    engine.start_container(container_id).await?;
    debug!("Starting container");

    // Forward output concurrently with the wait; the follow stream is a
    // push source, the run itself just blocks on the exit signal.
    let follower = LogFollower::open(engine, container_id, container_id).await?;
    let forwarding = tokio::spawn(follower.forward_all());

    let status = engine.wait_container(container_id).await;
    forwarding.abort();
    let status = status?;

    if status != 0 {
        return Err(WharfError::ContainerFailed {
            id: container_id.to_string(),
            status_code: status,
        });
    }
    debug!("Container {} finished", container_id);
    Ok(status)
}
