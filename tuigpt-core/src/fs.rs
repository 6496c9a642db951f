//! Filesystem accessor
//!
//! Directory listings and guarded file reads that never fail past their own
//! boundary: every outcome renders as a message that can be printed or
//! embedded in a prompt.

use crate::error::{self, Error, ErrorKind, Result};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Files at or above this size are refused without being read (5 MiB)
pub const MAX_READ_BYTES: u64 = 5 * 1024 * 1024;

/// Resolve `path` against `cwd` unless it is already absolute
pub fn resolve(cwd: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

// =============================================================================
// Directory listing
// =============================================================================

/// Immediate children of a directory, directories first, each group sorted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

impl DirectorySnapshot {
    pub fn capture(path: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(path)
            .map_err(|e| error::path_io("fs::list_directory", path, e))?;

        let mut snapshot = Self::default();
        for entry in entries {
            let entry = entry.map_err(|e| error::path_io("fs::list_directory", path, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follows symlinks, so a link to a directory lists as a directory.
            if entry.path().is_dir() {
                snapshot.dirs.push(name);
            } else {
                snapshot.files.push(name);
            }
        }
        snapshot.dirs.sort();
        snapshot.files.sort();
        Ok(snapshot)
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }
}

impl fmt::Display for DirectorySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Текущая директория пуста");
        }
        write!(f, "Файлы и папки в текущей директории:")?;
        for dir in &self.dirs {
            write!(f, "\n[DIR]  {}", dir)?;
        }
        for file in &self.files {
            write!(f, "\n[FILE] {}", file)?;
        }
        Ok(())
    }
}

/// Human-readable listing of `path`; failures become the report itself.
pub fn list_directory(path: &Path) -> String {
    match DirectorySnapshot::capture(path) {
        Ok(snapshot) => snapshot.to_string(),
        Err(e) => format!("Не удалось прочитать содержимое директории: {}", e.message()),
    }
}

// =============================================================================
// Guarded file read
// =============================================================================

/// Outcome of [`read_file`]. `Display` is the user-facing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRead {
    Text(String),
    NotFound { path: String },
    IsDirectory { path: String },
    TooLarge { path: String, size: u64 },
    Binary { path: String },
    Failed { path: String, message: String },
}

impl FileRead {
    /// The failure as an [`Error`] whose message is the user-facing text;
    /// `None` for [`FileRead::Text`].
    pub fn error(&self) -> Option<Error> {
        let (kind, path) = match self {
            FileRead::Text(_) => return None,
            FileRead::NotFound { path } => (ErrorKind::FileNotFound, path),
            FileRead::IsDirectory { path } => (ErrorKind::IsDirectory, path),
            FileRead::TooLarge { path, .. } => (ErrorKind::FileTooLarge, path),
            FileRead::Binary { path } => (ErrorKind::BinaryContent, path),
            FileRead::Failed { path, .. } => (ErrorKind::IoFailed, path),
        };
        let err = Error::new(kind, self.to_string())
            .with_operation("fs::read_file")
            .with_context("path", path.as_str());
        Some(match self {
            FileRead::TooLarge { size, .. } => err.with_context("size", size.to_string()),
            _ => err,
        })
    }
}

impl fmt::Display for FileRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileRead::Text(text) => write!(f, "{}", text),
            FileRead::NotFound { path } => write!(f, "Файл не найден: {}", path),
            FileRead::IsDirectory { path } => write!(f, "Это директория, а не файл: {}", path),
            FileRead::TooLarge { size, .. } => write!(
                f,
                "Файл слишком большой для анализа ({} байт). Максимальный размер: 5MB",
                size
            ),
            FileRead::Binary { .. } => {
                write!(f, "Файл содержит бинарные данные и не может быть прочитан как текст")
            }
            FileRead::Failed { path, message } => {
                write!(f, "Ошибка при чтении файла {}: {}", path, message)
            }
        }
    }
}

/// Read `path` (relative to `cwd`) as UTF-8 text, refusing missing paths,
/// directories, files of [`MAX_READ_BYTES`] or more and non-text content.
pub fn read_file(cwd: &Path, path: &str) -> FileRead {
    let resolved = resolve(cwd, path);
    let display = path.to_string();

    let metadata = match std::fs::metadata(&resolved) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return FileRead::NotFound { path: display };
        }
        Err(e) => {
            return FileRead::Failed {
                path: display,
                message: e.to_string(),
            };
        }
    };

    if metadata.is_dir() {
        return FileRead::IsDirectory { path: display };
    }

    let size = metadata.len();
    if size >= MAX_READ_BYTES {
        return FileRead::TooLarge { path: display, size };
    }

    match std::fs::read(&resolved) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => FileRead::Text(text),
            Err(_) => FileRead::Binary { path: display },
        },
        Err(e) => FileRead::Failed {
            path: display,
            message: e.to_string(),
        },
    }
}

// =============================================================================
// Append-only writes
// =============================================================================

/// Append `line` plus a newline to `path` (relative to `cwd`), creating the
/// file and any missing parent directories.
pub fn append_line(cwd: &Path, path: &str, line: &str) -> Result<PathBuf> {
    let resolved = resolve(cwd, path);

    if let Some(parent) = resolved.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| error::path_io("fs::append_line", parent, e))?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&resolved)
        .map_err(|e| error::path_io("fs::append_line", &resolved, e))?;

    file.write_all(line.as_bytes())
        .and_then(|_| file.write_all(b"\n"))
        .and_then(|_| file.flush())
        .map_err(|e| error::path_io("fs::append_line", &resolved, e))?;

    Ok(resolved)
}
