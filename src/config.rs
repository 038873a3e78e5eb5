use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::common::paths;

/// Optional defaults read from `config.toml`.
///
/// Every key mirrors a command line flag; flags given on the command line win.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub wallpaper: Option<String>,
    pub palette_size: Option<usize>,
    pub led_count: Option<usize>,
    pub zone_index: Option<u32>,
    pub sudo: Option<bool>,
    pub tool_path: Option<String>,
    /// Poll interval in seconds
    pub watch: Option<f64>,
    /// Seconds to wait for framework_tool before killing it
    pub tool_timeout: Option<f64>,
}

impl SyncConfig {
    /// Load the config from `explicit` or from the default location.
    ///
    /// A missing file at the default location is not an error, an explicitly
    /// requested one is.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let cfg_path = paths::default_config_file()?;
        if !cfg_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&cfg_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&s).with_context(|| format!("parsing config toml {}", path.display()))
    }
}
