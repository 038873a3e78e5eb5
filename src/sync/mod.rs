//! Wallpaper → LED pipeline
//!
//! One pass resolves the wallpaper, extracts its palette, fits it onto the
//! keyboard zones and hands the colors to framework_tool. Watch mode repeats
//! the pass and skips it while nothing changed.

mod watch;

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::common::elevation::ElevationContext;
use crate::framework_tool::{
    self, ApplyOptions, ApplyOutcome, FrameworkToolError, ProcessRunner,
};
use crate::palette::{self, LedColors, PaletteError};
use crate::ui::prelude::*;
use crate::wallpaper::{self, WallpaperLookupError};

pub use watch::{Watcher, watch};

pub const DEFAULT_PALETTE_SIZE: NonZeroUsize = NonZeroUsize::new(8).unwrap();
pub const DEFAULT_LED_COUNT: NonZeroUsize = NonZeroUsize::new(8).unwrap();

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Error locating wallpaper: {0}")]
    Lookup(#[from] WallpaperLookupError),

    #[error("Error accessing wallpaper metadata for {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error extracting palette from {}: {source}", path.display())]
    Extraction {
        path: PathBuf,
        #[source]
        source: PaletteError,
    },

    #[error("Error applying colors: {0}")]
    Apply(#[from] FrameworkToolError),
}

impl SyncError {
    /// Stable event code for output
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::Lookup(_) => "wallpaper.lookup_failed",
            SyncError::Metadata { .. } => "wallpaper.metadata_failed",
            SyncError::Extraction { .. } => "palette.extraction_failed",
            SyncError::Apply(FrameworkToolError::ToolNotFound(_)) => "tool.not_found",
            SyncError::Apply(_) => "tool.apply_failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Explicit wallpaper file or directory, Omarchy default otherwise
    pub wallpaper: Option<PathBuf>,
    pub palette_size: NonZeroUsize,
    pub led_count: NonZeroUsize,
    pub apply: ApplyOptions,
}

impl SyncOptions {
    /// Colors to sample, never fewer than there are LEDs to fill
    pub fn sample_size(&self) -> usize {
        self.palette_size.max(self.led_count).get()
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            wallpaper: None,
            palette_size: DEFAULT_PALETTE_SIZE,
            led_count: DEFAULT_LED_COUNT,
            apply: ApplyOptions::default(),
        }
    }
}

/// What a successful pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub wallpaper: PathBuf,
    pub colors: LedColors,
    pub outcome: ApplyOutcome,
}

pub fn resolve(options: &SyncOptions, ctx: &ElevationContext) -> Result<PathBuf, SyncError> {
    Ok(wallpaper::resolve_wallpaper_path(
        options.wallpaper.as_deref(),
        ctx,
    )?)
}

/// Extract and fit the LED colors for `wallpaper`
pub fn led_colors_for(wallpaper: &Path, options: &SyncOptions) -> Result<LedColors, SyncError> {
    let extraction = |source| SyncError::Extraction {
        path: wallpaper.to_path_buf(),
        source,
    };
    let sampled = palette::extract_palette(wallpaper, options.sample_size()).map_err(extraction)?;
    palette::fit_colors(&sampled, options.led_count).map_err(extraction)
}

pub fn apply(
    wallpaper: PathBuf,
    colors: LedColors,
    options: &SyncOptions,
    runner: &dyn ProcessRunner,
) -> Result<ApplyReport, SyncError> {
    let outcome = framework_tool::apply_rgb_palette(colors.as_slice(), &options.apply, runner)?;
    Ok(ApplyReport {
        wallpaper,
        colors,
        outcome,
    })
}

/// Run the whole pipeline once
pub fn run_once(
    options: &SyncOptions,
    ctx: &ElevationContext,
    runner: &dyn ProcessRunner,
) -> Result<ApplyReport, SyncError> {
    let wallpaper = resolve(options, ctx)?;
    emit(
        Level::Debug,
        "wallpaper.resolved",
        &format!("Using wallpaper {}", wallpaper.display()),
        None,
    );
    let colors = led_colors_for(&wallpaper, options)?;
    apply(wallpaper, colors, options, runner)
}

pub fn report_applied(report: &ApplyReport) {
    let data = serde_json::json!({
        "wallpaper": report.wallpaper.display().to_string(),
        "colors": report.colors.to_hex_strings(),
        "command": report.outcome.command().argv(),
    });
    match &report.outcome {
        ApplyOutcome::DryRun(command) => emit(
            Level::Info,
            "sync.dry_run",
            &format!("Dry run command: {command}"),
            Some(data),
        ),
        ApplyOutcome::Applied { output, .. } => {
            let stdout = output.stdout.trim();
            if !stdout.is_empty() {
                emit(Level::Debug, "tool.output", stdout, None);
            }
            emit(
                Level::Success,
                "sync.applied",
                &format!("Applied palette from {}", report.wallpaper.display()),
                Some(data),
            )
        }
    }
}

pub fn report_error(err: &SyncError) {
    emit(Level::Error, err.code(), &err.to_string(), None);
}
