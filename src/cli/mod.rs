//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod commands;
mod logging;
mod version;
mod workloads;

pub use commands::{ConfigSubcommand, handle_config_command};
pub use logging::*;
pub use version::display_version;
pub use workloads::{ConsoleReadiness, handle_check_logs, handle_discover, handle_exec, handle_wait};
