//! Wallpaper lookup
//!
//! Resolves an explicit file, a directory of wallpapers, or the Omarchy theme
//! background directory to a single image path.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

use crate::common::elevation::ElevationContext;
use crate::common::paths;

pub const SUPPORTED_WALLPAPER_EXTENSIONS: [&str; 3] = ["jpeg", "jpg", "png"];

#[derive(Debug, Error)]
pub enum WallpaperLookupError {
    #[error("Wallpaper not found at {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Wallpaper directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("{} is not a supported wallpaper (expected {})", .0.display(), supported_list())]
    UnsupportedFile(PathBuf),

    #[error("No supported image files ({}) found in {}", supported_list(), .0.display())]
    NoWallpapers(PathBuf),

    #[error("Could not determine a home directory for the default wallpaper location")]
    NoHomeDirectory,

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn supported_list() -> String {
    SUPPORTED_WALLPAPER_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check the file extension against the supported image types (case-insensitive)
pub fn is_supported_wallpaper(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_WALLPAPER_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Default Omarchy background directory, honouring the sudo-invoking user
pub fn default_wallpaper_dir(ctx: &ElevationContext) -> Result<PathBuf, WallpaperLookupError> {
    let home = ctx.home_dir().ok_or(WallpaperLookupError::NoHomeDirectory)?;
    Ok(paths::omarchy_backgrounds_dir(&home))
}

/// Resolve the wallpaper image to sample colors from.
///
/// `target` may be an image file or a directory holding wallpapers. Without a
/// target the Omarchy theme background directory is used. For directories
/// with several images the most recently modified one wins; equal
/// modification times fall back to the greatest file name.
pub fn resolve_wallpaper_path(
    target: Option<&Path>,
    ctx: &ElevationContext,
) -> Result<PathBuf, WallpaperLookupError> {
    let candidate = match target {
        Some(path) => path.to_path_buf(),
        None => default_wallpaper_dir(ctx)?,
    };

    if !candidate.exists() {
        if is_supported_wallpaper(&candidate) {
            return Err(WallpaperLookupError::FileNotFound(candidate));
        }
        return Err(WallpaperLookupError::DirectoryNotFound(candidate));
    }

    if candidate.is_dir() {
        return latest_wallpaper_in(&candidate);
    }

    if is_supported_wallpaper(&candidate) {
        Ok(candidate)
    } else {
        Err(WallpaperLookupError::UnsupportedFile(candidate))
    }
}

fn latest_wallpaper_in(dir: &Path) -> Result<PathBuf, WallpaperLookupError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| WallpaperLookupError::Io { path, source }
    };

    let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err(dir))? {
        let path = entry.map_err(io_err(dir))?.path();
        if !is_supported_wallpaper(&path) {
            continue;
        }
        // Follow symlinks, themes usually link their backgrounds
        let metadata = fs::metadata(&path).map_err(io_err(&path))?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().map_err(io_err(&path))?;
        candidates.push((modified, path));
    }

    if candidates.len() == 1 {
        return Ok(candidates.remove(0).1);
    }

    candidates
        .into_iter()
        .max_by(|(a_time, a_path), (b_time, b_path)| {
            a_time
                .cmp(b_time)
                .then_with(|| a_path.file_name().cmp(&b_path.file_name()))
        })
        .map(|(_, path)| path)
        .ok_or_else(|| WallpaperLookupError::NoWallpapers(dir.to_path_buf()))
}
