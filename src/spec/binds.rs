//! Bind-mount host path handling
//!
//! Host paths arrive either as literal paths, as `host-path:container-path`
//! tuple strings, or as lazy providers whose value is not known until the
//! create request is built. Literal paths are resolved when the bind is
//! registered; lazy paths are resolved once, memoized, on first read.
//! Resolution canonicalizes the path, which also enforces that the mounted
//! file or directory exists.

use crate::error::{Result, WharfError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// One bind mount: a host path mounted at a container path
pub struct VolumeBind {
    /// Absolute path inside the container
    pub container_path: String,
    /// Host side of the mount
    pub host_path: HostPath,
}

impl VolumeBind {
    pub fn new(host_path: HostPath, container_path: impl Into<String>) -> Self {
        Self {
            container_path: container_path.into(),
            host_path,
        }
    }
}

impl fmt::Debug for VolumeBind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VolumeBind")
            .field("container_path", &self.container_path)
            .field("host_path", &self.host_path)
            .finish()
    }
}

/// A host path that is either already resolved or produced on demand
pub struct HostPath {
    source: Source,
    resolved: OnceLock<PathBuf>,
}

enum Source {
    Literal(PathBuf),
    Deferred(Box<dyn Fn() -> PathBuf + Send + Sync>),
}

impl HostPath {
    /// Resolve a literal host path now; fails if it does not exist
    pub fn literal(path: impl Into<PathBuf>) -> Result<Self> {
        let resolved = resolve_host_path(&path.into())?;
        let cell = OnceLock::new();
        let _ = cell.set(resolved.clone());
        Ok(Self {
            source: Source::Literal(resolved),
            resolved: cell,
        })
    }

    /// Defer resolution to the given provider, invoked once on first read
    pub fn deferred(provider: impl Fn() -> PathBuf + Send + Sync + 'static) -> Self {
        Self {
            source: Source::Deferred(Box::new(provider)),
            resolved: OnceLock::new(),
        }
    }

    /// The absolute host path; resolves and memoizes deferred values
    pub fn resolve(&self) -> Result<&Path> {
        if let Some(path) = self.resolved.get() {
            return Ok(path);
        }
        let raw = match &self.source {
            Source::Literal(path) => path.clone(),
            Source::Deferred(provider) => provider(),
        };
        let resolved = resolve_host_path(&raw)?;
        Ok(self.resolved.get_or_init(|| resolved))
    }
}

impl fmt::Debug for HostPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved.get() {
            Some(path) => write!(f, "HostPath({})", path.display()),
            None => write!(f, "HostPath(<deferred>)"),
        }
    }
}

/// Split a `host-path:container-path` tuple string.
///
/// The string must split into exactly two parts; anything else is a
/// configuration error.
pub fn parse_bind_tuple(tuple: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = tuple.split(':').collect();
    match parts.as_slice() {
        [host, container] => Ok((host.to_string(), container.to_string())),
        _ => Err(WharfError::InvalidConfig(format!(
            "Volume bind path '{}' is not supported, expected format is 'host-path:container-path'",
            tuple
        ))),
    }
}

fn resolve_host_path(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|e| {
        WharfError::InvalidConfig(format!(
            "Bind mount host path '{}' cannot be resolved: {}",
            path.display(),
            e
        ))
    })
}
