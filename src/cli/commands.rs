//! CLI command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::Path;

use crate::config::{ConfigLoader, paths, sample_config};

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Get configuration value
    Get {
        /// Configuration key (e.g., "dockerBinary", "readiness.maxCycles")
        key: Option<String>,
    },
    /// Set configuration value in the root config file
    Set {
        /// Configuration key (e.g., "dockerBinary", "readiness.maxCycles")
        key: String,
        /// Configuration value
        value: String,
    },
    /// List all configuration
    List,
    /// Show configuration file path
    Path,
    /// Validate configuration and compile its patterns
    Validate,
    /// Write a starter root config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Handle configuration subcommands
///
/// `explicit` is the `--config` file given on the command line, if any.
pub async fn handle_config_command(cmd: ConfigSubcommand, explicit: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigSubcommand::Get { key } => {
            let config = ConfigLoader::load(explicit).context("Failed to load configuration")?;

            if let Some(key) = key {
                // Get specific key
                let value = crate::config::get_config_value(&config, &key)?;
                println!("{}", value.trim_end());
            } else {
                // Print all config as YAML
                let yaml =
                    serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
                print!("{}", yaml);
            }
        }
        ConfigSubcommand::Set { key, value } => {
            // Only the root file is written; layered values stay where they are
            let root = paths::root_config_path();
            let mut config = if root.exists() {
                ConfigLoader::load_file(&root)?
            } else {
                ConfigLoader::load_defaults()
            };

            crate::config::set_config_value(&mut config, &key, &value)
                .with_context(|| format!("Failed to set {} = {}", key, value))?;

            ConfigLoader::save_root(&config).context("Failed to save configuration")?;
            println!("Configuration saved to {}", root.display());
        }
        ConfigSubcommand::List => {
            let config = ConfigLoader::load(explicit).context("Failed to load configuration")?;

            let yaml =
                serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
            print!("{}", yaml);
        }
        ConfigSubcommand::Path => {
            println!("{}", paths::root_config_path().display());
            let project = paths::project_config_path();
            if project.exists() {
                println!("{}", project.display());
            }
            if let Some(path) = explicit {
                println!("{}", path.display());
            }
        }
        ConfigSubcommand::Validate => match ConfigLoader::validate(explicit) {
            Ok(_) => {
                println!("Configuration is valid");
            }
            Err(e) => {
                eprintln!("Configuration validation failed: {:#}", e);
                std::process::exit(1);
            }
        },
        ConfigSubcommand::Init { force } => {
            let root = paths::root_config_path();
            if root.exists() && !force {
                return Err(anyhow::anyhow!(
                    "{} already exists (use --force to overwrite)",
                    root.display()
                ));
            }
            ConfigLoader::save_root(&sample_config()).context("Failed to write configuration")?;
            println!("Configuration written to {}", root.display());
        }
    }

    Ok(())
}
