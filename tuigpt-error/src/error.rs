use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// A failed tuigpt operation.
///
/// The status starts out as whatever [`ErrorKind::is_retryable`] says and
/// only changes through [`Error::persist`].
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let status = match kind.is_retryable() {
            true => ErrorStatus::Temporary,
            false => ErrorStatus::Permanent,
        };
        Self {
            kind,
            message: message.into(),
            status,
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// User-facing text, without kind or context
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }

    /// Name the operation that failed. A name set earlier is pushed into
    /// the context under `called`, innermost first.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        let previous = std::mem::replace(&mut self.operation, operation);
        if !previous.is_empty() {
            self.context.push(("called", previous.to_string()));
        }
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Attach the underlying cause. Only one source is kept; setting a
    /// second one is a bug and trips a debug assertion.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source already set on {}", self.kind);
        self.source = Some(source.into());
        self
    }

    /// Called once retries are spent: a temporary error stops being retryable.
    pub fn persist(mut self) -> Self {
        self.status = self.status.persist();
        self
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    pub fn interrupted(operation: &'static str) -> Self {
        Self::new(ErrorKind::Interrupted, "прервано пользователем").with_operation(operation)
    }

    /// Wrap the last failure of a bounded retry loop.
    pub fn retries_exhausted(attempts: usize, last: Error) -> Self {
        Self::new(ErrorKind::RetriesExhausted, "Превышено количество попыток")
            .with_context("attempts", attempts.to_string())
            .with_context("last_kind", last.kind.as_str())
            .set_source(last)
    }

    pub fn command_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::CommandFailed, reason).with_context("command", command)
    }

    pub fn directory_change_failed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::DirectoryChangeFailed, reason).with_context("target", target)
    }
}

/// One line: `[Kind/status] operation: message (key=value, ...)`
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}]", self.kind, self.status)?;
        if !self.operation.is_empty() {
            write!(f, " {}:", self.operation)?;
        }
        write!(f, " {}", self.message)?;

        let mut pairs = self.context.iter();
        if let Some((key, value)) = pairs.next() {
            write!(f, " ({}={}", key, value)?;
            for (key, value) in pairs {
                write!(f, ", {}={}", key, value)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Error");
        out.field("kind", &self.kind)
            .field("status", &self.status)
            .field("operation", &self.operation)
            .field("message", &self.message);
        if !self.context.is_empty() {
            out.field("context", &self.context);
        }
        if let Some(source) = &self.source {
            out.field("source", &format_args!("{:#}", source));
        }
        out.finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}

/// The only implicit conversion: io failures keep their not-found and
/// permission flavours, everything else is `IoFailed`.
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind as Io;

        let kind = match err.kind() {
            Io::NotFound => ErrorKind::FileNotFound,
            Io::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Self::new(kind, err.to_string()).with_operation("io").set_source(err)
    }
}
