//! Conditional image pull step

use crate::engine::Engine;
use crate::error::Result;
use crate::spec::ContainerSpec;

/// Pull the spec's image when the pull flag is set.
///
/// Runs before creation as a prerequisite of both task kinds; returns
/// whether a pull happened.
pub async fn pull_if_requested(engine: &dyn Engine, spec: &ContainerSpec) -> Result<bool> {
    if !spec.pull_image {
        return Ok(false);
    }
    tracing::info!("Pulling image {}", spec.image);
    engine.pull_image(&spec.image).await?;
    Ok(true)
}
