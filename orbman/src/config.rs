use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tokio::fs::read_to_string;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Optional settings from `orbman.toml`. Every key has a sensible
/// default, and no config file at all is fine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Path to the orb binary, overriding PATH discovery.
    pub orb: Option<PathBuf>,
    pub default_distro: Option<String>,
    pub default_arch: Option<String>,
    /// Accept all post-create action prompts without asking.
    #[serde(default)]
    pub accept: bool,
}

impl Config {
    /// Load from the explicit path, `ORBMAN_CONFIG`, or `orbman.toml` in
    /// the current directory, in that order. No file found means
    /// defaults.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = Self::discover_path(explicit) else {
            return Ok(Self::default());
        };
        let string = read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        toml::from_str(&string).map_err(|source| ConfigError::Parse { path, source })
    }

    fn discover_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_owned());
        }
        if let Ok(path) = env::var("ORBMAN_CONFIG") {
            return Some(PathBuf::from(path));
        }
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let path = cwd.join("orbman.toml");
        path.exists().then_some(path)
    }
}
