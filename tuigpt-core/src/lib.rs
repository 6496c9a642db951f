//! # tuigpt core
//!
//! Turns an assistant reply into actions on the local machine.
//!
//! ## Core Concepts
//! - **Directives**: line prefixes in a reply (`cmd`, `file` + `^^^`, `readfile`, `analyze`)
//! - **Interpreter**: runs the directives of one reply in line order
//! - **SessionContext**: working directory and prompt glyph, passed explicitly
//! - **Probe**: advisory check for installed tools
//! - **Provider**: trait-based LLM communication (OpenAI-compatible, Anthropic)

pub mod console;
pub mod context;
pub mod directive;
pub mod error;
pub mod fs;
pub mod interpreter;
pub mod probe;
pub mod provider;
pub mod shell;

pub use console::Console;
pub use context::{PromptGlyph, SessionContext};
pub use directive::{CaptureStage, Directive, DirectiveParser};
pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use fs::{DirectorySnapshot, FileRead};
pub use interpreter::{Interpreter, Outcome};
pub use probe::{KnownTool, ToolInfo, KNOWN_TOOLS};
pub use provider::{
    AnthropicProvider, ChatMessage, CompletionRequest, CompletionResponse, ConfiguredProvider,
    FinishReason, LlmProvider, OpenAIProvider, ProviderConfig, ProviderError, ProviderType, Role,
    Usage,
};
#[cfg(any(test, feature = "scripted"))]
pub use provider::ScriptedProvider;
pub use shell::{CommandOutput, ShellConfig};
