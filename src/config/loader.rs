//! Configuration loading from flags and disk.

use std::fs;
use std::path::Path;

use crate::config::cli::Cli;
use crate::config::schema::{ProxyConfig, RawConfig};
use crate::config::validation::{validate_config, ConfigError};

/// Read raw settings from a TOML file.
pub fn load_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_raw(&content)
}

/// Parse raw settings from TOML text.
pub fn parse_raw(content: &str) -> Result<RawConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Build the validated configuration from parsed command-line flags.
pub fn load_config(cli: Cli) -> Result<ProxyConfig, ConfigError> {
    let base = match &cli.config {
        Some(path) => load_file(path)?,
        None => RawConfig::default(),
    };
    validate_config(cli.merge_into(base))
}
