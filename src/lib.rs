//! Wharf - container lifecycle steps for build pipelines
//!
//! Wharf drives externally managed containers as steps of a larger build:
//!
//! - Declarative container configuration with conditional image pulls
//! - Reconciliation of a named container against its desired state, with an
//!   incremental up-to-date signal so an unchanged running container is not
//!   restarted
//! - Run-to-completion containers with log forwarding and guaranteed cleanup
//! - Log-pattern readiness detection for service containers

pub mod command;
pub mod engine;
pub mod error;
pub mod logs;
pub mod spec;
pub mod task;

pub use error::{Result, WharfError};
