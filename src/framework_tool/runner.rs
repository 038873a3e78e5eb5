use std::thread;
use std::time::{Duration, Instant};

use duct::cmd;

use super::FrameworkToolError;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

impl From<&std::process::Output> for ProcessOutput {
    fn from(output: &std::process::Output) -> Self {
        Self {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Runs an argument vector to completion
pub trait ProcessRunner {
    fn run(&self, argv: &[String]) -> Result<ProcessOutput, FrameworkToolError>;
}

/// Spawns real processes through duct, optionally with a bounded wait
#[derive(Debug, Clone, Default)]
pub struct DuctRunner {
    pub timeout: Option<Duration>,
}

impl DuctRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl ProcessRunner for DuctRunner {
    fn run(&self, argv: &[String]) -> Result<ProcessOutput, FrameworkToolError> {
        let Some((program, args)) = argv.split_first() else {
            return Err(FrameworkToolError::Spawn {
                program: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };
        let spawn_err = |source| FrameworkToolError::Spawn {
            program: program.clone(),
            source,
        };

        let expression = cmd(program, args)
            .stdout_capture()
            .stderr_capture()
            .unchecked();

        let Some(timeout) = self.timeout else {
            let output = expression.run().map_err(spawn_err)?;
            return Ok(ProcessOutput::from(&output));
        };

        let handle = expression.start().map_err(spawn_err)?;
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(output) = handle.try_wait().map_err(spawn_err)? {
                return Ok(ProcessOutput::from(output));
            }
            if Instant::now() >= deadline {
                handle.kill().map_err(spawn_err)?;
                return Err(FrameworkToolError::TimedOut {
                    program: program.clone(),
                    timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    #[test]
    fn test_captures_output_and_status() {
        let runner = DuctRunner::default();
        let output = runner.run(&sh("echo out; echo err >&2; exit 4")).unwrap();

        assert_eq!(output.status, Some(4));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let runner = DuctRunner::default();
        let err = runner
            .run(&["argb-sync-no-such-program-xyz".to_string()])
            .unwrap_err();
        assert!(matches!(err, FrameworkToolError::Spawn { .. }));
    }

    #[test]
    fn test_timeout_kills_hung_tool() {
        let runner = DuctRunner::new(Some(Duration::from_millis(200)));
        let started = Instant::now();
        let err = runner.run(&sh("exec sleep 5")).unwrap_err();

        assert!(matches!(err, FrameworkToolError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_timeout_not_hit_by_fast_tool() {
        let runner = DuctRunner::new(Some(Duration::from_secs(5)));
        let output = runner.run(&sh("exit 0")).unwrap();
        assert!(output.success());
    }
}
