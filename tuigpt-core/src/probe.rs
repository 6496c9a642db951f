//! Environment probe: is a program on `PATH`, and which version is it?
//!
//! Probing is advisory. Every failure folds into "not installed" and is
//! only visible in debug logs.

use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

/// How long a `--version` call may take before the tool counts as missing
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of probing one program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolInfo {
    pub installed: bool,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

impl ToolInfo {
    pub fn missing() -> Self {
        Self::default()
    }
}

/// A tool checked at startup and advertised to the model
#[derive(Debug, Clone, Copy)]
pub struct KnownTool {
    pub program: &'static str,
    pub display_name: &'static str,
    pub install_url: &'static str,
}

pub const KNOWN_TOOLS: &[KnownTool] = &[
    KnownTool {
        program: "git",
        display_name: "Git",
        install_url: "https://git-scm.com/downloads",
    },
    KnownTool {
        program: "gh",
        display_name: "GitHub CLI",
        install_url: "https://cli.github.com/",
    },
    KnownTool {
        program: "docker",
        display_name: "Docker",
        install_url: "https://www.docker.com/products/docker-desktop",
    },
    KnownTool {
        program: "python",
        display_name: "Python",
        install_url: "https://www.python.org/downloads/",
    },
];

/// Probe `program`: on `PATH` and `program --version` exits zero.
pub async fn detect(program: &str) -> ToolInfo {
    let Some(path) = which::which(program).ok() else {
        tracing::debug!(program, "not found on PATH");
        return ToolInfo::missing();
    };

    let output = Command::new(&path)
        .arg("--version")
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(PROBE_TIMEOUT, output).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            tracing::debug!(program, error = %e, "version query failed to spawn");
            return ToolInfo::missing();
        }
        Err(_) => {
            tracing::debug!(program, "version query timed out");
            return ToolInfo::missing();
        }
    };

    if !output.status.success() {
        tracing::debug!(program, status = ?output.status.code(), "version query exited non-zero");
        return ToolInfo::missing();
    }

    let version = first_line(&output.stdout).or_else(|| first_line(&output.stderr));
    tracing::debug!(program, ?version, path = %path.display(), "probed");

    ToolInfo {
        installed: true,
        version,
        path: Some(path),
    }
}

fn first_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
