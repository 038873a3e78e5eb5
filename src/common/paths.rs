use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "argb-wallpaper-sync";

/// Omarchy keeps the active theme's wallpapers here, relative to the user's home.
pub const OMARCHY_BACKGROUNDS_SUBPATH: &str = ".config/omarchy/current/theme/backgrounds";

/// Get the directory holding our config file
pub fn app_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join(APP_DIR_NAME))
}

/// Default location of `config.toml`
pub fn default_config_file() -> Result<PathBuf> {
    Ok(app_config_dir()?.join("config.toml"))
}

/// Omarchy background directory below the given home directory
pub fn omarchy_backgrounds_dir(home: &Path) -> PathBuf {
    home.join(OMARCHY_BACKGROUNDS_SUBPATH)
}

/// Expand a leading `~` the way a shell would.
pub fn expand_tilde(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}
