//! tuigpt-core error types
//!
//! Re-exports tuigpt-error and provides core-specific conveniences.

pub use tuigpt_error::{Error, ErrorKind, ErrorStatus, Result};

// =============================================================================
// Core-specific error constructors
// =============================================================================

/// Create an IoFailed error
pub fn io_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::IoFailed, message)
}

/// Wrap an io::Error raised while touching `path`
pub fn path_io(operation: &'static str, path: &std::path::Path, err: std::io::Error) -> Error {
    Error::from(err)
        .with_operation(operation)
        .with_context("path", path.display().to_string())
}

/// Create a CommandFailed error for a non-zero exit
pub fn command_exit(command: impl Into<String>, code: Option<i32>, stderr: &str) -> Error {
    let stderr = stderr.trim();
    let reason = match (stderr.is_empty(), code) {
        (false, _) => stderr.to_string(),
        (true, Some(code)) => format!("код завершения {}", code),
        (true, None) => "процесс завершён сигналом".to_string(),
    };
    let err = Error::command_failed(command, reason).with_operation("shell::run");
    match code {
        Some(code) => err.with_context("exit_code", code.to_string()),
        None => err,
    }
}

/// Create a DirectoryChangeFailed error
pub fn directory_change_failed(target: impl Into<String>, reason: impl Into<String>) -> Error {
    Error::directory_change_failed(target, reason).with_operation("shell::change_directory")
}
