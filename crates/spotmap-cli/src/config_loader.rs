//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use spotmap_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

const DEFAULT_CONFIG_FILE: &str = "spotmap.toml";

/// Config file to read: the explicit one, else ./spotmap.toml if it exists
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}

/// Load layered configuration: defaults, file, environment, then CLI flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_path(cli.config.as_deref()) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    let mut config = config.load_from_env();
    config.update_from_cli(overrides(cli));
    Ok(config)
}

fn overrides(cli: &Cli) -> CliConfigOverrides {
    CliConfigOverrides {
        page_size: cli.page_size,
        debounce_ms: cli.debounce_ms,
        srid: cli.srid,
        fingerprint_pass: cli.keep_content_duplicates.then_some(false),
    }
}
