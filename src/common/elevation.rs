//! Privilege context of the running process
//!
//! When started through `sudo`, the wallpaper still belongs to the user who
//! invoked sudo, so their home directory wins over root's.

use nix::unistd::User;
use std::path::PathBuf;
use sudo::RunningAs;

/// Environment variable sudo sets to the invoking user's name
pub const SUDO_USER_ENV: &str = "SUDO_USER";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElevationContext {
    /// User that elevated to the current process, if any
    pub origin_user: Option<String>,
    /// Home directory of `origin_user`, when it could be looked up
    pub origin_home: Option<PathBuf>,
    /// Whether we already run as root
    pub privileged: bool,
}

impl ElevationContext {
    /// Inspect the environment and effective uid of the current process
    pub fn detect() -> Self {
        let origin_user = std::env::var(SUDO_USER_ENV)
            .ok()
            .filter(|name| !name.trim().is_empty());
        let origin_home = origin_user.as_deref().and_then(lookup_home);

        Self {
            origin_user,
            origin_home,
            privileged: matches!(sudo::check(), RunningAs::Root),
        }
    }

    /// Home directory wallpapers should be looked up in
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.origin_home.clone().or_else(dirs::home_dir)
    }

    /// Prefixing with sudo is pointless when we already are root
    pub fn needs_sudo(&self, requested: bool) -> bool {
        requested && !self.privileged
    }
}

fn lookup_home(name: &str) -> Option<PathBuf> {
    match User::from_name(name) {
        Ok(Some(user)) => Some(user.dir),
        _ => None,
    }
}
