use anyhow::Result;
use image::{Rgb, RgbImage};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const RAINBOW: [[u8; 3]; 8] = [
    [255, 0, 0],
    [255, 128, 0],
    [255, 255, 0],
    [0, 255, 0],
    [0, 255, 255],
    [0, 0, 255],
    [128, 0, 255],
    [255, 0, 255],
];

/// Scratch directory acting as HOME, config dir and tool location
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn home(&self) -> PathBuf {
        self.path().join("home")
    }

    pub fn config_home(&self) -> PathBuf {
        self.path().join("xdg-config")
    }

    /// Where the fake framework_tool records its arguments
    pub fn call_log(&self) -> PathBuf {
        self.path().join("calls.log")
    }

    /// Write a 4x2 wallpaper holding the eight rainbow colors
    pub fn rainbow_wallpaper(&self, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut image = RgbImage::new(4, 2);
        for (i, pixel) in image.pixels_mut().enumerate() {
            *pixel = Rgb(RAINBOW[i]);
        }
        image.save(path)?;
        Ok(path.to_path_buf())
    }

    /// Install a fake framework_tool that logs its arguments and runs `extra`
    pub fn fake_tool(&self, extra: &str) -> Result<PathBuf> {
        let path = self.path().join("framework_tool");
        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$*\" >> '{}'\n{}\n",
            self.call_log().display(),
            extra
        );
        fs::write(&path, script)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    pub fn write_config(&self, contents: &str) -> Result<PathBuf> {
        let dir = self.config_home().join("argb-wallpaper-sync");
        fs::create_dir_all(&dir)?;
        let path = dir.join("config.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Lines the fake tool logged, one per invocation
    pub fn tool_calls(&self) -> Vec<String> {
        fs::read_to_string(self.call_log())
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
