//! # tuigpt agent
//!
//! The session loop around the reply interpreter:
//! 1. Probe installed tools and build the system prompt
//! 2. Handshake: first completion call, bounded retry, interruptible
//! 3. Each turn: fresh directory listing + user query -> reply
//! 4. The reply's directives run against the session's working directory
//!
//! The transcript is append-only and lives as long as the session.

pub mod prompt;
pub mod retry;
mod session;

pub use retry::{retry, RetryError, RetryPolicy};
pub use session::{is_exit, ExitReason, Session, SessionConfig, Step};
