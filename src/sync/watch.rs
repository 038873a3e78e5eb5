use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use super::{ApplyReport, SyncError, SyncOptions, report_applied, report_error};
use crate::common::elevation::ElevationContext;
use crate::framework_tool::ProcessRunner;
use crate::palette::LedColors;
use crate::ui::prelude::*;

/// Everything that decides whether the keyboard needs new colors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSignature {
    pub wallpaper: PathBuf,
    pub modified: SystemTime,
    pub colors: LedColors,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Same wallpaper, same colors as the last successful apply
    Unchanged,
    Applied(ApplyReport),
}

/// Pipeline state carried between polls
pub struct Watcher<R> {
    options: SyncOptions,
    ctx: ElevationContext,
    runner: R,
    last_signature: Option<ChangeSignature>,
}

impl<R: ProcessRunner> Watcher<R> {
    pub fn new(options: SyncOptions, ctx: ElevationContext, runner: R) -> Self {
        Self {
            options,
            ctx,
            runner,
            last_signature: None,
        }
    }

    #[cfg(test)]
    pub fn last_signature(&self) -> Option<&ChangeSignature> {
        self.last_signature.as_ref()
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// One watch iteration.
    ///
    /// The signature is only remembered after framework_tool succeeded, so a
    /// failed apply is retried on the next poll.
    pub fn poll(&mut self) -> Result<PollOutcome, SyncError> {
        let wallpaper = super::resolve(&self.options, &self.ctx)?;
        let modified = fs::metadata(&wallpaper)
            .and_then(|metadata| metadata.modified())
            .map_err(|source| SyncError::Metadata {
                path: wallpaper.clone(),
                source,
            })?;
        let colors = super::led_colors_for(&wallpaper, &self.options)?;

        let signature = ChangeSignature {
            wallpaper: wallpaper.clone(),
            modified,
            colors: colors.clone(),
        };
        if self.last_signature.as_ref() == Some(&signature) {
            return Ok(PollOutcome::Unchanged);
        }

        let report = super::apply(wallpaper, colors, &self.options, &self.runner)?;
        self.last_signature = Some(signature);
        Ok(PollOutcome::Applied(report))
    }
}

/// Poll forever, one iteration at a time.
///
/// Errors are reported and never end the loop, not even a panicking poll; the
/// caller stops it by dropping the future (Ctrl+C).
pub async fn watch<R>(watcher: Watcher<R>, interval: Duration) -> Result<()>
where
    R: ProcessRunner + Send + 'static,
{
    emit(
        Level::Info,
        "watch.started",
        &format!(
            "Watching for wallpaper changes every {}s",
            interval.as_secs_f64()
        ),
        None,
    );

    // A panic mid-poll leaves the last signature untouched, so the state is
    // still usable after the lock is poisoned
    let watcher = Arc::new(Mutex::new(watcher));
    loop {
        let shared = Arc::clone(&watcher);
        let result = tokio::task::spawn_blocking(move || {
            shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .poll()
        })
        .await;

        match result {
            Ok(Ok(PollOutcome::Applied(report))) => report_applied(&report),
            Ok(Ok(PollOutcome::Unchanged)) => emit(
                Level::Debug,
                "watch.unchanged",
                "Wallpaper unchanged, nothing to apply",
                None,
            ),
            Ok(Err(err)) => report_error(&err),
            Err(join_err) => emit(
                Level::Error,
                "watch.poll_failed",
                &format!("Wallpaper poll failed: {join_err}"),
                None,
            ),
        }

        tokio::time::sleep(interval).await;
    }
}
