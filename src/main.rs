//! stevedore - discover, exec into and health-check deployments
//!
//! Drives the local container engine and Kubernetes through their CLIs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stevedore::cli::{
    ConfigSubcommand, display_version, handle_check_logs, handle_config_command, handle_discover,
    handle_exec, handle_wait, init_logging,
};
use stevedore::config::ConfigLoader;
use stevedore::discovery::Pick;
use stevedore::models::Environment;
use stevedore::services::DeploymentService;

/// stevedore - discover, exec into and health-check deployments
#[derive(Parser, Debug)]
#[command(name = "stevedore")]
#[command(about = "Discover, exec into and health-check containerized deployments", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Additional configuration file, applied over the root and project files
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    /// List workloads in an environment
    Discover {
        /// `local`, a Kubernetes namespace, `all`, or `kubernetes/<namespace>`
        #[arg(long, short = 'e')]
        env: Environment,
    },
    /// Run a command inside a workload
    Exec {
        #[arg(long, short = 'e')]
        env: Environment,

        /// Choose among several matching workloads (currently the first is used)
        #[arg(long)]
        pick: bool,

        /// Command and arguments to run
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
    /// Wait for a deployment to report completion in its logs
    Wait {
        #[arg(long, short = 'e')]
        env: Environment,
    },
    /// Scan workload logs for error lines
    CheckLogs {
        #[arg(long, short = 'e')]
        env: Environment,

        /// Print findings but exit successfully
        #[arg(long)]
        ignore_errors: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_file = init_logging(args.debug)?;
    if let Some(ref log_path) = log_file {
        eprintln!(
            "Debug logging enabled. Logs written to: {}",
            log_path.display()
        );
    }

    let explicit = args.config.as_deref();
    let command = match args.command {
        Command::Version => {
            display_version();
            return Ok(());
        }
        Command::Config { subcommand } => {
            return handle_config_command(subcommand, explicit).await;
        }
        command => command,
    };

    let config = ConfigLoader::load(explicit).context("Failed to load configuration")?;
    tracing::debug!(
        "Configuration loaded: {} local service(s), {} deployment(s)",
        config.local.services.len(),
        config.kubernetes.deployments.len()
    );
    let service = DeploymentService::new(config);

    match command {
        Command::Discover { env } => handle_discover(&service, &env).await,
        Command::Exec { env, pick, command } => {
            let pick = if pick { Pick::Interactive } else { Pick::First };
            let code = handle_exec(&service, &env, pick, &command).await?;
            if code != 0 {
                tracing::debug!("Command exited with status {}", code);
                std::process::exit(code);
            }
            Ok(())
        }
        Command::Wait { env } => handle_wait(&service, &env).await,
        Command::CheckLogs { env, ignore_errors } => {
            handle_check_logs(&service, &env, ignore_errors).await
        }
        Command::Config { .. } | Command::Version => Ok(()),
    }
}
