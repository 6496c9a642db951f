//! Per-session state shared between the session loop and the interpreter.

use crate::error::{self, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Box-drawing character that opens the next `You:` prompt line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptGlyph {
    /// `├` continues the frame of the previous exchange
    #[default]
    Continue,
    /// `╭` starts a fresh frame after directive output
    Open,
}

impl PromptGlyph {
    pub fn as_char(self) -> char {
        match self {
            PromptGlyph::Continue => '├',
            PromptGlyph::Open => '╭',
        }
    }
}

impl fmt::Display for PromptGlyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Working directory and prompt glyph of one session.
///
/// The process-wide current directory is never touched; `cmd cd` only
/// updates `cwd` here, and every command, read and write resolves against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub cwd: PathBuf,
    pub glyph: PromptGlyph,
}

impl SessionContext {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            glyph: PromptGlyph::default(),
        }
    }

    /// Context rooted at the directory the process was started in
    pub fn from_current_dir() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| error::io_error(e.to_string()).with_operation("context::current_dir").set_source(e))?;
        Ok(Self::new(cwd))
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyphs() {
        assert_eq!(PromptGlyph::Continue.to_string(), "├");
        assert_eq!(PromptGlyph::Open.to_string(), "╭");
        assert_eq!(PromptGlyph::default(), PromptGlyph::Continue);
    }

    #[test]
    fn test_new_context_starts_continuing() {
        let ctx = SessionContext::new("/tmp");
        assert_eq!(ctx.cwd(), Path::new("/tmp"));
        assert_eq!(ctx.glyph, PromptGlyph::Continue);
    }

    #[test]
    fn test_from_current_dir() {
        let ctx = SessionContext::from_current_dir().unwrap();
        assert_eq!(ctx.cwd, std::env::current_dir().unwrap());
    }
}
