//! Build-pipeline container tasks
//!
//! Two task kinds drive the container lifecycle: [`StartTask`] reconciles a
//! named, long-lived container against its desired configuration and keeps
//! an up-to-date signal for incremental execution, and [`RunTask`] drives an
//! ephemeral container to completion with guaranteed cleanup.

pub mod pull;
pub mod run;
pub mod start;
pub mod state;

pub use run::{RunOutcome, RunTask};
pub use start::{StartOutcome, StartTask};
pub use state::StateFile;
