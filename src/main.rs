//! Wharf - container lifecycle steps for build pipelines
//!
//! This is the CLI driver around the start/run tasks.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wharf::engine::{DockerEngine, Engine};
use wharf::error::WharfError;
use wharf::spec::ContainerSpec;
use wharf::task::{start, RunTask, StartTask, StateFile};

/// Wharf - run containers as build steps
#[derive(Parser)]
#[command(name = "wharf")]
#[command(version)]
#[command(about = "Container lifecycle steps for build pipelines", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Container configuration shared by start and run
#[derive(Args)]
struct ContainerArgs {
    /// Image to run
    #[arg(long)]
    image: String,

    /// Container name
    #[arg(long)]
    name: Option<String>,

    /// Hostname inside the container (defaults to the name)
    #[arg(long)]
    hostname: Option<String>,

    /// Port binding (host-port:container-port[/protocol])
    #[arg(short, long = "publish")]
    publish: Vec<String>,

    /// Environment variable (KEY=VALUE)
    #[arg(short, long)]
    env: Vec<String>,

    /// Container label (KEY or KEY=VALUE)
    #[arg(short, long)]
    label: Vec<String>,

    /// Anonymous volume container path
    #[arg(long = "volume")]
    volume: Vec<String>,

    /// Bind mount (host-path:container-path)
    #[arg(long = "volume-bind")]
    volume_bind: Vec<String>,

    /// Entrypoint override
    #[arg(long)]
    entrypoint: Vec<String>,

    /// Command override
    #[arg(long)]
    cmd: Vec<String>,

    /// Network mode
    #[arg(long)]
    network: Option<String>,

    /// Network alias
    #[arg(long = "alias")]
    alias: Vec<String>,

    /// Pull the image before creating the container
    #[arg(long)]
    pull: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start (or replace) a named service container
    Start {
        #[command(flatten)]
        container: ContainerArgs,

        /// Readiness pattern searched for in each log line
        #[arg(long = "wait-for-log")]
        wait_for_log: Option<String>,

        /// Directory holding per-task container-id state
        #[arg(long, default_value = ".wharf")]
        state_dir: PathBuf,
    },

    /// Run a container to completion and remove it
    Run {
        #[command(flatten)]
        container: ContainerArgs,
    },

    /// Report whether a started container is still current
    Status {
        /// Container name
        #[arg(long)]
        name: String,

        /// Directory holding per-task container-id state
        #[arg(long, default_value = ".wharf")]
        state_dir: PathBuf,

        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },
}

impl ContainerArgs {
    fn into_spec(self) -> wharf::Result<ContainerSpec> {
        let mut spec = ContainerSpec::new(self.image).pull_image(self.pull);

        if let Some(name) = self.name {
            spec = spec.name(name);
        }
        if let Some(hostname) = self.hostname {
            spec = spec.hostname(hostname);
        }
        for binding in self.publish {
            spec = spec.port_binding(binding);
        }
        for entry in self.env {
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                WharfError::InvalidConfig(format!(
                    "environment variable '{}' is not in KEY=VALUE form",
                    entry
                ))
            })?;
            spec = spec.env(key, value);
        }
        for entry in self.label {
            spec = match entry.split_once('=') {
                Some((key, value)) => spec.label(key, Some(value.to_string())),
                None => spec.label(entry, None),
            };
        }
        for path in self.volume {
            spec = spec.volume(path);
        }
        for tuple in self.volume_bind {
            spec = spec.bind_tuple(&tuple)?;
        }
        if !self.entrypoint.is_empty() {
            spec = spec.entrypoint(self.entrypoint);
        }
        if !self.cmd.is_empty() {
            spec = spec.cmd(self.cmd);
        }
        if let Some(network) = self.network {
            spec = spec.network(network);
        }
        for alias in self.alias {
            spec = spec.network_alias(alias);
        }

        Ok(spec)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let engine: Arc<dyn Engine> = Arc::new(DockerEngine::connect()?);

    match cli.command {
        Commands::Start {
            container,
            wait_for_log,
            state_dir,
        } => {
            let spec = container.into_spec()?;
            let name = spec.name.clone().ok_or_else(|| {
                WharfError::InvalidConfig("start requires --name".to_string())
            })?;
            let state_file = StateFile::for_task(&state_dir, &name);

            let mut task = StartTask::new(spec, state_file)?;
            if let Some(pattern) = wait_for_log {
                task = task.wait_for_log(&pattern)?;
            }

            if task.is_up_to_date(engine.as_ref()).await? {
                tracing::info!("Container '{}' is already running and current", task.name());
                return Ok(());
            }

            let outcome = task.execute(engine.as_ref()).await?;
            println!("{}", outcome.container_id);
        }

        Commands::Run { container } => {
            let spec = container.into_spec()?;
            let outcome = RunTask::new(spec).execute(engine).await?;
            println!("{}", outcome.container_id);
        }

        Commands::Status {
            name,
            state_dir,
            json,
        } => {
            let state_file = StateFile::for_task(&state_dir, &name);
            let current = start::is_up_to_date(engine.as_ref(), &name, &state_file).await?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "name": name, "upToDate": current })
                );
            } else {
                println!("{}", if current { "up-to-date" } else { "stale" });
            }
        }
    }

    Ok(())
}
