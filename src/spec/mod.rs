//! Declarative container configuration
//!
//! A `ContainerSpec` describes the desired container: which image to run,
//! how it is named and wired, and whether the image is pulled first. It is
//! built once per task invocation and read-only afterwards.

pub mod binds;

use crate::error::Result;
use std::collections::HashMap;
use std::path::PathBuf;

pub use binds::{parse_bind_tuple, HostPath, VolumeBind};

/// Desired-state description of a single container.
///
/// All fields except the image reference are optional; absent fields are
/// never sent to the engine, so engine defaults stay in effect.
#[derive(Debug, Default)]
pub struct ContainerSpec {
    /// Container name (required for persistent tasks, optional for runs)
    pub name: Option<String>,
    /// Image reference (tag or digest)
    pub image: String,
    /// Hostname inside the container; defaults to the name when absent
    pub hostname: Option<String>,
    /// Port bindings in `host-port:container-port[/protocol]` form
    pub port_bindings: Vec<String>,
    /// Environment variables, insertion order preserved
    env: Vec<(String, String)>,
    /// Container labels; values may be absent
    pub labels: HashMap<String, Option<String>>,
    /// Network-scoped DNS aliases
    pub network_aliases: Vec<String>,
    /// Entrypoint override
    pub entrypoint: Vec<String>,
    /// Command override
    pub cmd: Vec<String>,
    /// Anonymous volume container paths
    pub volumes: Vec<String>,
    /// Host-path bind mounts, keyed by container path
    binds: Vec<VolumeBind>,
    /// Network mode (network name, "bridge", "host", ...)
    pub network: Option<String>,
    /// Pull the image before creating the container
    pub pull_image: bool,
}

impl ContainerSpec {
    /// Create a new spec for the given image reference
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    /// Set the container name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the hostname
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Add a port binding string, passed to the engine verbatim
    pub fn port_binding(mut self, binding: impl Into<String>) -> Self {
        self.port_bindings.push(binding.into());
        self
    }

    /// Set an environment variable.
    ///
    /// Re-setting an existing key updates the value but keeps the key's
    /// original position, so the serialized `KEY=VALUE` order matches the
    /// order keys were first declared in.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.env.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.env.push((key, value)),
        }
        self
    }

    /// Environment variables in declaration order
    pub fn env_vars(&self) -> &[(String, String)] {
        &self.env
    }

    /// Add a label; the value may be absent
    pub fn label(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.labels.insert(key.into(), value);
        self
    }

    /// Add a network alias
    pub fn network_alias(mut self, alias: impl Into<String>) -> Self {
        self.network_aliases.push(alias.into());
        self
    }

    /// Override the image entrypoint
    pub fn entrypoint(mut self, entrypoint: Vec<String>) -> Self {
        self.entrypoint = entrypoint;
        self
    }

    /// Override the image command
    pub fn cmd(mut self, cmd: Vec<String>) -> Self {
        self.cmd = cmd;
        self
    }

    /// Declare an anonymous volume at a container path
    pub fn volume(mut self, container_path: impl Into<String>) -> Self {
        self.volumes.push(container_path.into());
        self
    }

    /// Bind-mount a host path into the container.
    ///
    /// The host path is resolved immediately; it must exist. Binding the
    /// same container path again replaces the earlier host path.
    pub fn bind(
        mut self,
        host_path: impl Into<PathBuf>,
        container_path: impl Into<String>,
    ) -> Result<Self> {
        let bind = VolumeBind::new(HostPath::literal(host_path)?, container_path);
        self.put_bind(bind);
        Ok(self)
    }

    /// Bind-mount from a `host-path:container-path` tuple string
    pub fn bind_tuple(self, tuple: &str) -> Result<Self> {
        let (host_path, container_path) = parse_bind_tuple(tuple)?;
        self.bind(host_path, container_path)
    }

    /// Bind-mount a host path supplied lazily.
    ///
    /// The provider is invoked once, when the create request is built, and
    /// the result is memoized.
    pub fn deferred_bind(
        mut self,
        provider: impl Fn() -> PathBuf + Send + Sync + 'static,
        container_path: impl Into<String>,
    ) -> Self {
        let bind = VolumeBind::new(HostPath::deferred(provider), container_path);
        self.put_bind(bind);
        self
    }

    /// Bind mounts in declaration order
    pub fn bind_mounts(&self) -> &[VolumeBind] {
        &self.binds
    }

    /// Set the network mode
    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    /// Pull the image before creation
    pub fn pull_image(mut self, pull: bool) -> Self {
        self.pull_image = pull;
        self
    }

    fn put_bind(&mut self, bind: VolumeBind) {
        match self
            .binds
            .iter_mut()
            .find(|b| b.container_path == bind.container_path)
        {
            Some(existing) => *existing = bind,
            None => self.binds.push(bind),
        }
    }
}
