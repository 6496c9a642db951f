//! Shell execution and working-directory changes.
//!
//! Command lines are passed to the platform shell verbatim (`sh -c` on Unix,
//! `cmd.exe /C` on Windows). There is no allow-list and no escaping: whatever
//! the model writes after `cmd ` runs with the user's privileges.

use crate::error::{self, Error, Result};
use crate::fs::resolve;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Platform shell used to run command lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub command: String,
    pub args: Vec<String>,
}

#[cfg(unix)]
impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            command: "sh".to_string(),
            args: vec!["-c".to_string()],
        }
    }
}

#[cfg(windows)]
impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            command: "cmd.exe".to_string(),
            args: vec!["/C".to_string()],
        }
    }
}

/// Captured result of one command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl ShellConfig {
    /// Run `command_line` in `cwd` and capture its output. A non-zero exit is
    /// data, not an error; only spawn/wait failures are errors.
    pub async fn run(&self, command_line: &str, cwd: &Path) -> Result<CommandOutput> {
        let output = Command::new(&self.command)
            .args(&self.args)
            .arg(command_line)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                Error::command_failed(command_line, e.to_string())
                    .with_operation("shell::run")
                    .with_context("cwd", cwd.display().to_string())
                    .set_source(e)
            })?;

        let output = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(command = command_line, exit_code = ?output.exit_code, "command finished");
        Ok(output)
    }
}

/// Validate a `cd` target relative to `cwd` and return the new directory.
/// `cwd` itself is never modified.
pub fn change_directory(cwd: &Path, target: &str) -> Result<PathBuf> {
    if target.is_empty() {
        return Err(error::directory_change_failed(target, "не указан путь"));
    }

    let candidate = resolve(cwd, target);
    let canonical = std::fs::canonicalize(&candidate).map_err(|e| {
        error::directory_change_failed(target, e.to_string()).set_source(e)
    })?;

    if !canonical.is_dir() {
        return Err(error::directory_change_failed(
            target,
            format!("{} не является директорией", canonical.display()),
        ));
    }

    Ok(canonical)
}
