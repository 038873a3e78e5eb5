//! Driving `framework_tool --rgbkbd`
//!
//! Command construction is kept separate from execution so dry runs and tests
//! never touch the hardware.

mod runner;

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::common::shell::join_command;
use crate::palette::Color;

pub use runner::{DuctRunner, ProcessOutput, ProcessRunner};

pub const DEFAULT_TOOL: &str = "framework_tool";

/// `--rgbkbd` always takes one color per keyboard zone
pub const RGBKBD_COLOR_COUNT: usize = 8;

const ELEVATION_TOKEN: &str = "sudo";

#[derive(Debug, Error)]
pub enum FrameworkToolError {
    #[error("framework_tool expects exactly {expected} colors for --rgbkbd, got {actual}")]
    ColorCount { expected: usize, actual: usize },

    #[error("framework_tool executable '{0}' was not found in PATH")]
    ToolNotFound(String),

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {:.1}s and was killed", timeout.as_secs_f64())]
    TimedOut { program: String, timeout: Duration },

    #[error("{message}")]
    Execution { status: Option<i32>, message: String },
}

/// A fully built framework_tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbCommand {
    argv: Vec<String>,
}

impl RgbCommand {
    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl fmt::Display for RgbCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_command(&self.argv))
    }
}

/// Build `[sudo] <tool> --rgbkbd <zone> 0xRRGGBB...`
///
/// Fails unless exactly [`RGBKBD_COLOR_COUNT`] colors are given and the tool
/// can be found on `PATH` (or at the given path).
pub fn build_rgb_command(
    colors: &[Color],
    zone_index: u32,
    tool_path: &str,
    use_sudo: bool,
) -> Result<RgbCommand, FrameworkToolError> {
    if colors.len() != RGBKBD_COLOR_COUNT {
        return Err(FrameworkToolError::ColorCount {
            expected: RGBKBD_COLOR_COUNT,
            actual: colors.len(),
        });
    }

    if which::which(tool_path).is_err() {
        return Err(FrameworkToolError::ToolNotFound(tool_path.to_string()));
    }

    let mut argv = Vec::with_capacity(colors.len() + 4);
    if use_sudo {
        argv.push(ELEVATION_TOKEN.to_string());
    }
    argv.push(tool_path.to_string());
    argv.push("--rgbkbd".to_string());
    argv.push(zone_index.to_string());
    argv.extend(colors.iter().map(|color| format!("0x{color}")));

    Ok(RgbCommand { argv })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOptions {
    pub zone_index: u32,
    pub tool_path: String,
    pub use_sudo: bool,
    pub dry_run: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            zone_index: 0,
            tool_path: DEFAULT_TOOL.to_string(),
            use_sudo: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The command that would have run
    DryRun(RgbCommand),
    /// The command ran and exited successfully
    Applied {
        command: RgbCommand,
        output: ProcessOutput,
    },
}

impl ApplyOutcome {
    pub fn command(&self) -> &RgbCommand {
        match self {
            ApplyOutcome::DryRun(command) => command,
            ApplyOutcome::Applied { command, .. } => command,
        }
    }
}

/// Build the command and, unless this is a dry run, execute it via `runner`.
pub fn apply_rgb_palette(
    colors: &[Color],
    options: &ApplyOptions,
    runner: &dyn ProcessRunner,
) -> Result<ApplyOutcome, FrameworkToolError> {
    let command = build_rgb_command(
        colors,
        options.zone_index,
        &options.tool_path,
        options.use_sudo,
    )?;

    if options.dry_run {
        return Ok(ApplyOutcome::DryRun(command));
    }

    let output = runner.run(command.argv())?;
    if !output.success() {
        let stderr = output.stderr.trim();
        let message = if stderr.is_empty() {
            match output.status {
                Some(code) => format!("{} exited with status {code}", options.tool_path),
                None => format!("{} was terminated by a signal", options.tool_path),
            }
        } else {
            stderr.to_string()
        };
        return Err(FrameworkToolError::Execution {
            status: output.status,
            message,
        });
    }

    Ok(ApplyOutcome::Applied { command, output })
}
