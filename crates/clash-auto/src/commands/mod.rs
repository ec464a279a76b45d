//! Subcommand handlers.

pub mod config_cmd;
pub mod generate;

use std::path::PathBuf;

use crate::cli::GlobalOpts;

/// The settings file in use: `--config`, else the default lookup.
pub fn settings_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(clash_auto_config::default_config_path)
}
