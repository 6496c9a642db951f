use std::fmt;

/// What went wrong, independent of where.
///
/// Directive failures (files, shell, directory change) are reported and the
/// reply keeps running. Completion failures are retried during the
/// handshake only when the kind says so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Bad flags, environment or provider settings
    ConfigInvalid,
    /// Ctrl-C won a race against the operation
    Interrupted,
    /// A bounded retry loop gave up; the last failure is the source
    RetriesExhausted,

    FileNotFound,
    /// A file was expected but the path is a directory
    IsDirectory,
    /// At or above the read size limit
    FileTooLarge,
    /// Bytes are not valid UTF-8
    BinaryContent,
    PermissionDenied,
    IoFailed,

    /// Spawn failure or non-zero exit
    CommandFailed,
    DirectoryChangeFailed,

    /// The provider answered but the answer was unusable
    InferenceFailed,
    /// 5xx from the completion endpoint
    ProviderUnavailable,
    RateLimited,
    NetworkFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        use ErrorKind::*;

        match self {
            ConfigInvalid => "ConfigInvalid",
            Interrupted => "Interrupted",
            RetriesExhausted => "RetriesExhausted",
            FileNotFound => "FileNotFound",
            IsDirectory => "IsDirectory",
            FileTooLarge => "FileTooLarge",
            BinaryContent => "BinaryContent",
            PermissionDenied => "PermissionDenied",
            IoFailed => "IoFailed",
            CommandFailed => "CommandFailed",
            DirectoryChangeFailed => "DirectoryChangeFailed",
            InferenceFailed => "InferenceFailed",
            ProviderUnavailable => "ProviderUnavailable",
            RateLimited => "RateLimited",
            NetworkFailed => "NetworkFailed",
        }
    }

    /// Completion-side kinds may succeed on a second attempt; nothing on
    /// the local machine does.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InferenceFailed | Self::ProviderUnavailable | Self::RateLimited | Self::NetworkFailed
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
