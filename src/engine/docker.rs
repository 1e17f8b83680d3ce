//! Docker Engine API client
//!
//! Implements [`Engine`] over the Docker daemon socket via bollard. Podman's
//! Docker-compatible endpoint works as well.

use super::{ContainerHandle, Engine, LogChunk, LogStream};
use crate::command::CreateRequest;
use crate::error::{Result, WharfError};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, KillContainerOptions, LogsOptions,
    NetworkingConfig, RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::image::CreateImageOptions;
use bollard::models::{EndpointSettings, HostConfig, PortBinding};
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;

/// Engine client backed by the local Docker daemon
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Wrap an existing bollard client
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Connect using the platform's default daemon socket
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| WharfError::Engine(format!("failed to connect to Docker: {}", e)))?;
        Ok(Self::new(docker))
    }
}

#[async_trait]
impl Engine for DockerEngine {
    async fn pull_image(&self, reference: &str) -> Result<()> {
        let options = CreateImageOptions::<String> {
            from_image: reference.to_string(),
            ..Default::default()
        };

        // The pull endpoint reports progress as a stream; drain it so the
        // call does not return before the image is present.
        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(progress) = stream.next().await {
            progress?;
        }
        Ok(())
    }

    async fn inspect_image(&self, reference: &str) -> Result<String> {
        match self.docker.inspect_image(reference).await {
            Ok(image) => image.id.ok_or_else(|| {
                WharfError::Engine(format!("engine returned no id for image '{}'", reference))
            }),
            Err(DockerError::DockerResponseServerError {
                status_code: 404, ..
            }) => Err(WharfError::ImageNotFound(reference.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn inspect_container(&self, name: &str) -> Result<Option<ContainerHandle>> {
        match self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(details) => {
                let id = details.id.ok_or_else(|| {
                    WharfError::Engine(format!("engine returned no id for container '{}'", name))
                })?;
                Ok(Some(ContainerHandle {
                    id,
                    name: details
                        .name
                        .unwrap_or_default()
                        .trim_start_matches('/')
                        .to_string(),
                    running: details
                        .state
                        .and_then(|state| state.running)
                        .unwrap_or(false),
                }))
            }
            Err(DockerError::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_container(&self, request: &CreateRequest) -> Result<String> {
        let mut host_config = HostConfig::default();

        if !request.binds.is_empty() {
            host_config.binds = Some(request.binds.clone());
        }

        let mut exposed_ports: HashMap<String, HashMap<(), ()>> = HashMap::new();
        if !request.port_bindings.is_empty() {
            let mut bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
            for serialized in &request.port_bindings {
                let (port_key, binding) = parse_port_binding(serialized)?;
                exposed_ports.insert(port_key.clone(), HashMap::new());
                bindings
                    .entry(port_key)
                    .or_insert_with(|| Some(Vec::new()))
                    .get_or_insert_with(Vec::new)
                    .push(binding);
            }
            host_config.port_bindings = Some(bindings);
        }

        if let Some(network) = &request.network_mode {
            host_config.network_mode = Some(network.clone());
        }

        // Aliases attach to an endpoint, so they only apply when the
        // network mode names a network to attach to.
        let networking_config = match (&request.network_mode, &request.network_aliases) {
            (Some(network), aliases) if !aliases.is_empty() => {
                let mut endpoints = HashMap::new();
                endpoints.insert(
                    network.clone(),
                    EndpointSettings {
                        aliases: Some(aliases.clone()),
                        ..Default::default()
                    },
                );
                Some(NetworkingConfig {
                    endpoints_config: endpoints,
                })
            }
            _ => None,
        };

        let config = Config {
            // The literal reference, not the resolved id, for engine
            // bookkeeping (`docker ps` shows the tag the task declared).
            image: Some(request.image.clone()),
            hostname: request.hostname.clone(),
            env: some_unless_empty(request.env.clone()),
            cmd: some_unless_empty(request.cmd.clone()),
            entrypoint: some_unless_empty(request.entrypoint.clone()),
            labels: if request.labels.is_empty() {
                None
            } else {
                Some(
                    request
                        .labels
                        .iter()
                        .map(|(key, value)| (key.clone(), value.clone().unwrap_or_default()))
                        .collect(),
                )
            },
            volumes: if request.volumes.is_empty() {
                None
            } else {
                Some(
                    request
                        .volumes
                        .iter()
                        .map(|path| (path.clone(), HashMap::new()))
                        .collect(),
                )
            },
            exposed_ports: if exposed_ports.is_empty() {
                None
            } else {
                Some(exposed_ports)
            },
            host_config: Some(host_config),
            networking_config,
            ..Default::default()
        };

        let options = request.name.as_ref().map(|name| CreateContainerOptions {
            name: name.clone(),
            platform: None,
        });

        let response = self.docker.create_container(options, config).await?;
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn kill_container(&self, id: &str) -> Result<()> {
        self.docker
            .kill_container(id, None::<KillContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        self.docker
            .remove_container(id, None::<RemoveContainerOptions>)
            .await?;
        Ok(())
    }

    async fn follow_logs(&self, id: &str) -> Result<LogStream> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            follow: true,
            since: 0,
            ..Default::default()
        };

        let container_id = id.to_string();
        let stream = self.docker.logs(id, Some(options)).map(move |item| {
            item.map(|output| LogChunk {
                container_id: container_id.clone(),
                payload: output.to_string(),
            })
            .map_err(WharfError::from)
        });

        Ok(Box::pin(stream))
    }

    async fn wait_container(&self, id: &str) -> Result<i64> {
        let mut stream = self
            .docker
            .wait_container(id, None::<WaitContainerOptions<String>>);

        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // bollard reports a non-zero exit as an error; the status code
            // is still a normal wait outcome for us.
            Some(Err(DockerError::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(e.into()),
            None => Err(WharfError::Engine(format!(
                "wait stream for container {} closed without a status",
                id
            ))),
        }
    }
}

/// Parse a `host-port:container-port[/protocol]` binding string.
///
/// Returns the engine's exposed-port key and the host-side binding. This is
/// the engine client's own grammar; the command builder passes binding
/// strings through untouched.
fn parse_port_binding(serialized: &str) -> Result<(String, PortBinding)> {
    let (ports, protocol) = match serialized.rsplit_once('/') {
        Some((ports, protocol)) => (ports, protocol),
        None => (serialized, "tcp"),
    };
    let (host_port, container_port) = ports.split_once(':').ok_or_else(|| {
        WharfError::Engine(format!(
            "invalid port binding '{}', expected 'host-port:container-port[/protocol]'",
            serialized
        ))
    })?;

    Ok((
        format!("{}/{}", container_port, protocol),
        PortBinding {
            host_ip: None,
            host_port: Some(host_port.to_string()),
        },
    ))
}

fn some_unless_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}
