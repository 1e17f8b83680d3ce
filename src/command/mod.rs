//! Create-request construction
//!
//! Turns a [`ContainerSpec`] into the complete create call for the remote
//! engine. The image reference is resolved to its immutable id first, so a
//! missing image fails the task before anything is created, and lazy bind
//! paths are read at this point.

use crate::engine::Engine;
use crate::error::Result;
use crate::spec::ContainerSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Complete payload for a create-container call.
///
/// Fields that were absent from the spec stay `None`/empty and are never
/// sent, so engine defaults are preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    /// Literal image reference, as declared
    pub image: String,
    /// Immutable image id the reference resolved to
    pub image_id: String,
    pub name: Option<String>,
    pub hostname: Option<String>,
    /// `KEY=VALUE` entries in declaration order
    pub env: Vec<String>,
    /// Anonymous volume container paths
    pub volumes: Vec<String>,
    /// `host-path:container-path` bind strings with absolute host paths
    pub binds: Vec<String>,
    /// Binding strings passed through to the engine's own grammar
    pub port_bindings: Vec<String>,
    pub labels: HashMap<String, Option<String>>,
    pub network_aliases: Vec<String>,
    pub entrypoint: Vec<String>,
    pub cmd: Vec<String>,
    pub network_mode: Option<String>,
}

/// Build the create request for a spec.
///
/// Performs the one remote call needed for image id resolution; everything
/// else is a pure transform.
pub async fn build(engine: &dyn Engine, spec: &ContainerSpec) -> Result<CreateRequest> {
    let image_id = engine.inspect_image(&spec.image).await?;

    let mut binds = Vec::with_capacity(spec.bind_mounts().len());
    for bind in spec.bind_mounts() {
        let host = bind.host_path.resolve()?;
        binds.push(format!("{}:{}", host.display(), bind.container_path));
    }

    Ok(CreateRequest {
        image: spec.image.clone(),
        image_id,
        name: spec.name.clone(),
        hostname: spec.hostname.clone().or_else(|| spec.name.clone()),
        env: spec
            .env_vars()
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect(),
        volumes: spec.volumes.clone(),
        binds,
        port_bindings: spec.port_bindings.clone(),
        labels: spec.labels.clone(),
        network_aliases: spec.network_aliases.clone(),
        entrypoint: spec.entrypoint.clone(),
        cmd: spec.cmd.clone(),
        network_mode: spec.network.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::FakeEngine;
    use crate::error::WharfError;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_omitted_fields_stay_unset() {
        let engine = FakeEngine::new().with_image("nginx", "sha256:abc");
        let spec = ContainerSpec::new("nginx");

        let request = build(&engine, &spec).await.unwrap();

        assert_eq!(request.image, "nginx");
        assert_eq!(request.image_id, "sha256:abc");
        assert_eq!(request.name, None);
        assert_eq!(request.hostname, None);
        assert!(request.env.is_empty());
        assert!(request.volumes.is_empty());
        assert!(request.binds.is_empty());
        assert!(request.port_bindings.is_empty());
        assert!(request.labels.is_empty());
        assert!(request.entrypoint.is_empty());
        assert!(request.cmd.is_empty());
        assert_eq!(request.network_mode, None);
    }

    #[tokio::test]
    async fn test_hostname_defaults_to_name() {
        let engine = FakeEngine::new().with_image("nginx", "sha256:abc");

        let named = build(&engine, &ContainerSpec::new("nginx").name("web"))
            .await
            .unwrap();
        assert_eq!(named.hostname.as_deref(), Some("web"));

        let explicit = build(
            &engine,
            &ContainerSpec::new("nginx").name("web").hostname("edge"),
        )
        .await
        .unwrap();
        assert_eq!(explicit.hostname.as_deref(), Some("edge"));
    }

    #[tokio::test]
    async fn test_env_serialized_in_declaration_order() {
        let engine = FakeEngine::new().with_image("mysql:8.0", "sha256:abc");
        let spec = ContainerSpec::new("mysql:8.0")
            .env("MYSQL_ROOT_PASSWORD", "secret")
            .env("MYSQL_DATABASE", "app");

        let request = build(&engine, &spec).await.unwrap();
        assert_eq!(
            request.env,
            vec!["MYSQL_ROOT_PASSWORD=secret", "MYSQL_DATABASE=app"]
        );
    }

    #[tokio::test]
    async fn test_missing_image_fails_resolution() {
        let engine = FakeEngine::new();
        let result = build(&engine, &ContainerSpec::new("mysql:8.0")).await;
        assert!(matches!(result, Err(WharfError::ImageNotFound(_))));
    }

    #[tokio::test]
    async fn test_binds_use_absolute_host_paths() {
        let temp = tempdir().unwrap();
        let engine = FakeEngine::new().with_image("mysql:8.0", "sha256:abc");
        let spec = ContainerSpec::new("mysql:8.0")
            .bind(temp.path(), "/var/lib/mysql")
            .unwrap();

        let request = build(&engine, &spec).await.unwrap();
        assert_eq!(
            request.binds,
            vec![format!(
                "{}:/var/lib/mysql",
                temp.path().canonicalize().unwrap().display()
            )]
        );
    }

    #[tokio::test]
    async fn test_deferred_bind_resolved_at_build_time() {
        let temp = tempdir().unwrap();
        let engine = FakeEngine::new().with_image("mysql:8.0", "sha256:abc");
        let late = temp.path().join("late");
        let provider_path = late.clone();
        let spec =
            ContainerSpec::new("mysql:8.0").deferred_bind(move || provider_path.clone(), "/data");

        // The path does not exist yet when the bind is registered; it only
        // has to exist once the request is built.
        std::fs::create_dir(&late).unwrap();

        let request = build(&engine, &spec).await.unwrap();
        assert_eq!(
            request.binds,
            vec![format!("{}:/data", late.canonicalize().unwrap().display())]
        );
    }
}
