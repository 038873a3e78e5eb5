use anyhow::Result;
use std::process::{Child, Command, Stdio};

use super::common::TestEnvironment;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Command for the built binary, isolated from the real user's HOME and config
pub fn sync_command(env: &TestEnvironment, args: &[&str]) -> Command {
    let mut cmd = colored_sync_command(env, args);
    cmd.arg("--no-color");
    cmd
}

/// Like [`sync_command`] but leaves color detection to the binary
pub fn colored_sync_command(env: &TestEnvironment, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_argb-wallpaper-sync"));
    cmd.args(args)
        .env_remove("CLICOLOR_FORCE")
        .env_remove("NO_COLOR")
        .env("HOME", env.home())
        .env("XDG_CONFIG_HOME", env.config_home())
        .env_remove("SUDO_USER")
        .current_dir(env.path());
    cmd
}

pub fn run_sync_command(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let output = sync_command(env, args).output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

pub fn spawn_sync_command(env: &TestEnvironment, args: &[&str]) -> Result<Child> {
    Ok(sync_command(env, args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?)
}

pub fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}
