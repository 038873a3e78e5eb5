mod cli;
mod common;
mod config;
mod framework_tool;
mod palette;
mod sync;
mod ui;
mod wallpaper;

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};

use crate::cli::{Cli, Settings};
use crate::common::elevation::ElevationContext;
use crate::config::SyncConfig;
use crate::framework_tool::DuctRunner;
use crate::sync::Watcher;
use crate::ui::prelude::*;

/// Exit code for invalid configuration, matching clap's usage errors
const USAGE_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    ui::init(cli.output, !cli.no_color);
    ui::set_debug_mode(cli.debug);

    let ctx = ElevationContext::detect();
    if let Some(user) = &ctx.origin_user {
        if ctx.origin_home.is_some() {
            emit(
                Level::Debug,
                "elevation.origin_user",
                &format!("Running via sudo for user {user}"),
                None,
            );
        } else {
            emit(
                Level::Warn,
                "elevation.unknown_user",
                &format!("Could not look up home directory of {user}, using our own"),
                None,
            );
        }
    }

    let settings = match load_settings(&cli, &ctx) {
        Ok(settings) => settings,
        Err(e) => {
            emit(Level::Error, "config.invalid", &format!("{e:#}"), None);
            return ExitCode::from(USAGE_ERROR);
        }
    };

    let runner = DuctRunner::new(settings.tool_timeout);
    match settings.watch {
        None => match sync::run_once(&settings.sync, &ctx, &runner) {
            Ok(report) => {
                sync::report_applied(&report);
                ExitCode::SUCCESS
            }
            Err(err) => {
                sync::report_error(&err);
                ExitCode::FAILURE
            }
        },
        Some(interval) => match run_watch(settings, ctx, runner, interval) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                emit(Level::Error, "watch.failed", &format!("{e:#}"), None);
                ExitCode::FAILURE
            }
        },
    }
}

fn load_settings(cli: &Cli, ctx: &ElevationContext) -> Result<Settings> {
    let config = SyncConfig::load(cli.config.as_deref())?;
    cli.settings(&config, ctx)
}

fn run_watch(
    settings: Settings,
    ctx: ElevationContext,
    runner: DuctRunner,
    interval: Duration,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    let watcher = Watcher::new(settings.sync, ctx, runner);
    let result: Result<()> = runtime.block_on(async {
        let mut sigint = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
        let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;

        let signal_name = tokio::select! {
            result = sync::watch(watcher, interval) => return result,
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        emit(
            Level::Info,
            "watch.stopped",
            "Stopped watching for wallpaper changes",
            Some(serde_json::json!({ "signal": signal_name })),
        );
        Ok(())
    });

    // A poll may still be blocked on framework_tool; don't wait for it forever
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}
