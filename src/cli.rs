use anyhow::{Result, bail};
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::elevation::ElevationContext;
use crate::common::paths;
use crate::config::SyncConfig;
use crate::framework_tool::{ApplyOptions, DEFAULT_TOOL};
use crate::sync::{DEFAULT_LED_COUNT, DEFAULT_PALETTE_SIZE, SyncOptions};
use crate::ui::OutputFormat;

/// Sync Framework RGB keyboard/fan colors to the dominant colors of the current wallpaper
#[derive(Parser, Debug)]
#[command(name = "argb-wallpaper-sync", author, version, about, long_about = None)]
pub struct Cli {
    /// Wallpaper image or directory (default: Omarchy wallpapers in ~/.config/omarchy/current/theme/backgrounds)
    #[arg(long, value_name = "PATH")]
    pub wallpaper: Option<String>,

    /// Number of colors to sample from the wallpaper before fitting to LEDs [default: 8]
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub palette_size: Option<u64>,

    /// Number of LED zones to fill [default: 8 for framework_tool --rgbkbd]
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub led_count: Option<u64>,

    /// framework_tool zone index to target [default: 0]
    #[arg(long, value_name = "N")]
    pub zone_index: Option<u32>,

    /// Invoke framework_tool via sudo (default unless already root)
    #[arg(long, overrides_with = "no_sudo")]
    pub sudo: bool,

    /// Invoke framework_tool directly
    #[arg(long, overrides_with = "sudo")]
    pub no_sudo: bool,

    /// Path to the framework_tool executable [default: framework_tool]
    #[arg(long, value_name = "PATH")]
    pub tool_path: Option<String>,

    /// Print the framework_tool command without executing it
    #[arg(long)]
    pub dry_run: bool,

    /// Poll the wallpaper every SECONDS and reapply when it changes
    #[arg(long, value_name = "SECONDS", value_parser = parse_positive_seconds)]
    pub watch: Option<f64>,

    /// Kill framework_tool if it has not finished after SECONDS
    #[arg(long, value_name = "SECONDS", value_parser = parse_positive_seconds)]
    pub tool_timeout: Option<f64>,

    /// Config file [default: ~/.config/argb-wallpaper-sync/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Show debug output
    #[arg(short, long)]
    pub debug: bool,
}

fn parse_positive_seconds(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a number of seconds"))?;
    check_positive_seconds(value)?;
    Ok(value)
}

fn check_positive_seconds(value: f64) -> Result<Duration, String> {
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("{value} must be a positive number of seconds"));
    }
    match Duration::try_from_secs_f64(value) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        _ => Err(format!("{value} seconds is out of range")),
    }
}

/// Fully resolved run configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub sync: SyncOptions,
    pub watch: Option<Duration>,
    pub tool_timeout: Option<Duration>,
}

impl Cli {
    fn sudo_flag(&self) -> Option<bool> {
        match (self.sudo, self.no_sudo) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Merge flags over the config file and validate the result.
    pub fn settings(&self, config: &SyncConfig, ctx: &ElevationContext) -> Result<Settings> {
        let palette_size = non_zero(
            "palette_size",
            self.palette_size
                .map(|n| n as usize)
                .or(config.palette_size)
                .unwrap_or(DEFAULT_PALETTE_SIZE.get()),
        )?;
        let led_count = non_zero(
            "led_count",
            self.led_count
                .map(|n| n as usize)
                .or(config.led_count)
                .unwrap_or(DEFAULT_LED_COUNT.get()),
        )?;

        let watch = seconds("watch", self.watch.or(config.watch))?;
        let tool_timeout = seconds("tool_timeout", self.tool_timeout.or(config.tool_timeout))?;

        let wallpaper = self
            .wallpaper
            .as_deref()
            .or(config.wallpaper.as_deref())
            .map(paths::expand_tilde);

        let requested_sudo = self.sudo_flag().or(config.sudo).unwrap_or(true);

        Ok(Settings {
            sync: SyncOptions {
                wallpaper,
                palette_size,
                led_count,
                apply: ApplyOptions {
                    zone_index: self.zone_index.or(config.zone_index).unwrap_or(0),
                    tool_path: self
                        .tool_path
                        .clone()
                        .or_else(|| config.tool_path.clone())
                        .unwrap_or_else(|| DEFAULT_TOOL.to_string()),
                    use_sudo: ctx.needs_sudo(requested_sudo),
                    dry_run: self.dry_run,
                },
            },
            watch,
            tool_timeout,
        })
    }
}

fn non_zero(key: &str, value: usize) -> Result<NonZeroUsize> {
    match NonZeroUsize::new(value) {
        Some(n) => Ok(n),
        None => bail!("{key} must be positive"),
    }
}

fn seconds(key: &str, value: Option<f64>) -> Result<Option<Duration>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match check_positive_seconds(value) {
        Ok(duration) => Ok(Some(duration)),
        Err(e) => bail!("{key}: {e}"),
    }
}
