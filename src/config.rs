//! Configuration loading.
//!
//! Settings are layered with `figment`: built-in defaults, then a TOML file,
//! then `FEEDMERGE_*` environment variables, then command-line flags.
//!
//! The TOML file is `FEEDMERGE_CONFIG_PATH` when set, otherwise
//! `.feedmerge.toml` in the working directory, otherwise
//! `feedmerge/config.toml` in the XDG configuration directories.

use std::env;
use std::path::PathBuf;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::cli_args::ImportArgs;
use crate::error::ImportError;
use crate::merge::MergeMode;

/// Target used when neither flags nor configuration name one.
pub const DEFAULT_TARGET: &str = "data/feed.json";
/// Prefix for environment overrides, e.g. `FEEDMERGE_TARGET`.
pub const ENV_PREFIX: &str = "FEEDMERGE_";
/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "FEEDMERGE_CONFIG_PATH";
/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".feedmerge.toml";

/// Effective settings for one import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub target: PathBuf,
    pub replace: bool,
    pub dry_run: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            target: PathBuf::from(DEFAULT_TARGET),
            replace: false,
            dry_run: false,
        }
    }
}

impl ImportConfig {
    #[must_use]
    pub fn mode(&self) -> MergeMode {
        MergeMode::from_replace_flag(self.replace)
    }
}

#[cfg(unix)]
fn xdg_config_file() -> Option<PathBuf> {
    xdg::BaseDirectories::with_prefix("feedmerge").find_config_file("config.toml")
}

#[cfg(not(unix))]
fn xdg_config_file() -> Option<PathBuf> {
    None
}

/// Locate the configuration file, if any.
fn config_file() -> Result<Option<PathBuf>, ImportError> {
    if let Some(explicit) = env::var_os(CONFIG_PATH_ENV) {
        let path = PathBuf::from(explicit);
        if !path.is_file() {
            return Err(ImportError::ConfigNotFound(path));
        }
        return Ok(Some(path));
    }
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Ok(Some(local));
    }
    Ok(xdg_config_file())
}

/// Resolve the effective configuration for `args`.
///
/// # Errors
///
/// Returns [`ImportError::ConfigNotFound`] when `FEEDMERGE_CONFIG_PATH` points
/// at a missing file and [`ImportError::Config`] when a layer cannot be
/// parsed or holds a value of the wrong type.
pub fn load_config(args: &ImportArgs) -> Result<ImportConfig, ImportError> {
    let mut figment = Figment::from(Serialized::defaults(ImportConfig::default()));
    if let Some(path) = config_file()? {
        debug!("loading configuration from {}", path.display());
        figment = figment.merge(Toml::file(path));
    }
    let config = figment
        .merge(Env::prefixed(ENV_PREFIX))
        .merge(Serialized::defaults(args))
        .extract()?;
    Ok(config)
}
