//! Session loop - transcript, handshake and per-turn flow

use crate::prompt::{self, HANDSHAKE_PROMPT};
use crate::retry::{retry, RetryPolicy};
use colored::Color;
use std::future::Future;
use std::io::{Stdout, Write};
use tuigpt_core::console::{Console, RULE_WIDTH};
use tuigpt_core::probe::{self, KnownTool, ToolInfo, KNOWN_TOOLS};
use tuigpt_core::{
    fs, ChatMessage, Error, ErrorKind, Interpreter, LlmProvider, Outcome, SessionContext, ShellConfig,
};
use tuigpt_error::Result;

/// Configuration for a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Retry policy for the first completion call
    pub handshake: RetryPolicy,
    /// First user turn after the system prompt
    pub handshake_prompt: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake: RetryPolicy::default(),
            handshake_prompt: HANDSHAKE_PROMPT.to_string(),
        }
    }
}

/// Why the process stops, and with which status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// `exit` typed or end of input
    Normal,
    /// Interrupt at the prompt or during a request
    Interrupted,
    /// Interrupt before the handshake completed
    HandshakeInterrupted,
    /// Handshake failed on every attempt
    RetriesExhausted,
    /// Could not build a provider or session
    ConfigError,
}

impl ExitReason {
    pub fn code(self) -> i32 {
        match self {
            ExitReason::Normal => 0,
            ExitReason::Interrupted => 130,
            ExitReason::HandshakeInterrupted => 1,
            ExitReason::RetriesExhausted => 2,
            ExitReason::ConfigError => 1,
        }
    }
}

/// What the loop should do after one line of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Exit,
    /// The turn ran; `None` when the completion call failed
    Continue(Option<Outcome>),
}

/// `exit`, case-insensitive, surrounding whitespace ignored
pub fn is_exit(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("exit")
}

/// One conversation: provider, console, transcript and working directory.
pub struct Session<P: LlmProvider, W: Write = Stdout> {
    provider: P,
    console: Console<W>,
    transcript: Vec<ChatMessage>,
    ctx: SessionContext,
    config: SessionConfig,
    shell: ShellConfig,
}

impl<P: LlmProvider, W: Write> Session<P, W> {
    pub fn new(provider: P, console: Console<W>, ctx: SessionContext, config: SessionConfig) -> Self {
        Self {
            provider,
            console,
            transcript: Vec::new(),
            ctx,
            config,
            shell: ShellConfig::default(),
        }
    }

    pub fn with_shell(mut self, shell: ShellConfig) -> Self {
        self.shell = shell;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn console_mut(&mut self) -> &mut Console<W> {
        &mut self.console
    }

    pub fn into_console(self) -> Console<W> {
        self.console
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Probe [`KNOWN_TOOLS`] and print one block per tool.
    pub async fn probe_tools(&mut self) -> Vec<(KnownTool, ToolInfo)> {
        let mut results = Vec::with_capacity(KNOWN_TOOLS.len());
        for tool in KNOWN_TOOLS {
            let info = probe::detect(tool.program).await;
            self.report_tool(tool, &info);
            results.push((*tool, info));
        }
        results
    }

    fn report_tool(&mut self, tool: &KnownTool, info: &ToolInfo) {
        let console = &mut self.console;
        if info.installed {
            let installed = console.paint(format!("{} установлен.", tool.display_name), Color::Green);
            console.line(installed);
            if let Some(version) = &info.version {
                let version = console.paint(format!("Версия: {}", version), Color::Cyan);
                console.line(version);
            }
            let rule = console.paint(format!("─{}", "─".repeat(RULE_WIDTH)), Color::BrightBlack);
            console.line(rule);
        } else {
            let missing = console.paint(
                format!("Для работы с {} необходимо его установить.", tool.display_name),
                Color::Red,
            );
            console.line(missing);
            let url = console.paint(tool.install_url, Color::Cyan);
            console.line(url);
        }
    }

    /// Seed the transcript with the system prompt and the handshake turn.
    pub fn prime(&mut self, tools: &[(KnownTool, ToolInfo)]) {
        let listing = fs::list_directory(&self.ctx.cwd);
        let system = prompt::system_prompt(&prompt::os_description(), &self.ctx.cwd, &listing, tools);

        self.transcript.clear();
        self.transcript.push(ChatMessage::system(system));
        self.transcript.push(ChatMessage::user(self.config.handshake_prompt.clone()));
    }

    /// First completion call, retried per [`SessionConfig::handshake`].
    /// On success the reply joins the transcript.
    pub async fn handshake<I>(&mut self, interrupt: I) -> std::result::Result<(), ExitReason>
    where
        I: Future<Output = ()>,
    {
        let provider = &self.provider;
        let transcript = &self.transcript;
        let console = &mut self.console;

        let result = retry(
            self.config.handshake,
            interrupt,
            || {
                let messages = transcript.clone();
                async move { provider.chat(messages).await.map_err(Error::from) }
            },
            |_, err| console.error(format!("Ошибка: {}", err.message())),
        )
        .await;

        match result {
            Ok(reply) => {
                let painted = self.console.paint(&reply, Color::Cyan);
                self.console.line(painted);
                self.transcript.push(ChatMessage::assistant(reply));

                let info = format!(
                    "{}{}",
                    self.console.paint("╭─ Info: ", Color::Cyan),
                    self.console.paint("Загрузка завершена.", Color::BrightBlack)
                );
                self.console.line(info);
                Ok(())
            }
            Err(failure) => {
                let err = failure.into_error("session::handshake");
                tracing::warn!(error = %err, "handshake failed");
                if err.kind() == ErrorKind::Interrupted {
                    return Err(ExitReason::HandshakeInterrupted);
                }
                self.console.error(err.message());
                Err(ExitReason::RetriesExhausted)
            }
        }
    }

    // =========================================================================
    // Turns
    // =========================================================================

    /// Print the input frame: current path and the `You:` line.
    pub fn show_prompt(&mut self) {
        let bar = self.console.paint("│\n│\n├─ ", Color::Cyan);
        let label = self.console.paint("Path: ", Color::BrightCyan);
        let path = self.console.paint(self.ctx.cwd.display(), Color::BrightGreen);
        let you = self.console.paint(format!("\n{}─ You:\n│ ", self.ctx.glyph), Color::Cyan);
        self.console.inline(format!("{}{}{}{}", bar, label, path, you));
    }

    /// Handle one line of user input.
    pub async fn handle_input(&mut self, input: &str) -> Step {
        self.console.bar(Color::Cyan);
        if is_exit(input) {
            return Step::Exit;
        }

        match self.turn(input).await {
            Ok(outcome) => Step::Continue(Some(outcome)),
            Err(err) => {
                tracing::warn!(error = %err, "turn failed");
                self.console.error(format!("Ошибка: {}", err.message()));
                Step::Continue(None)
            }
        }
    }

    /// One exchange: enhanced user turn, completion, interpretation.
    ///
    /// The user turn stays in the transcript even when the completion fails.
    pub async fn turn(&mut self, query: &str) -> Result<Outcome> {
        let listing = fs::list_directory(&self.ctx.cwd);
        self.transcript.push(ChatMessage::user(prompt::enhanced_query(&listing, query)));

        let reply = self
            .provider
            .chat(self.transcript.clone())
            .await
            .map_err(|e| Error::from(e).with_operation("session::turn"))?;
        self.transcript.push(ChatMessage::assistant(reply.clone()));

        let outcome = Interpreter::new(&self.provider, &mut self.console)
            .with_shell(self.shell.clone())
            .interpret(&mut self.ctx, &reply, query)
            .await;
        tracing::debug!(
            directives = outcome.directives,
            failures = outcome.failures,
            "reply interpreted"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use tuigpt_core::{PromptGlyph, ProviderError, Role, ScriptedProvider};

    fn session(dir: &TempDir, provider: ScriptedProvider) -> Session<ScriptedProvider, Vec<u8>> {
        let cwd = std::fs::canonicalize(dir.path()).unwrap();
        let config = SessionConfig {
            handshake: RetryPolicy::new(5).with_delay(Duration::ZERO),
            ..SessionConfig::default()
        };
        Session::new(provider, Console::plain(Vec::new()), SessionContext::new(cwd), config)
    }

    fn output(session: Session<ScriptedProvider, Vec<u8>>) -> String {
        String::from_utf8(session.into_console().into_inner()).unwrap()
    }

    fn network_error() -> ProviderError {
        ProviderError::Network("connection refused".into())
    }

    #[test]
    fn test_exit_detection() {
        assert!(is_exit("exit"));
        assert!(is_exit("  EXIT \n"));
        assert!(is_exit("Exit"));
        assert!(!is_exit("exit now"));
        assert!(!is_exit(""));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitReason::Normal.code(), 0);
        assert_eq!(ExitReason::Interrupted.code(), 130);
        assert_eq!(ExitReason::HandshakeInterrupted.code(), 1);
        assert_eq!(ExitReason::RetriesExhausted.code(), 2);
        assert_ne!(ExitReason::HandshakeInterrupted.code(), ExitReason::RetriesExhausted.code());
    }

    #[test]
    fn test_prime_seeds_transcript() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir, ScriptedProvider::new());

        session.prime(&[]);

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::System);
        assert!(transcript[0].content.contains("Текущая директория пуста"));
        assert_eq!(transcript[1], ChatMessage::user(HANDSHAKE_PROMPT));
    }

    #[tokio::test]
    async fn test_handshake_after_failures() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::new();
        provider.push_error(network_error());
        provider.push_error(network_error());
        provider.push_reply("Ок");
        let mut session = session(&dir, provider);
        session.prime(&[]);

        session.handshake(std::future::pending()).await.unwrap();

        assert_eq!(session.provider().request_count(), 3);
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.transcript()[2], ChatMessage::assistant("Ок"));

        let out = output(session);
        assert_eq!(out.matches("Ошибка: ").count(), 2);
        assert!(out.contains("Ок\n╭─ Info: Загрузка завершена.\n"));
    }

    #[tokio::test]
    async fn test_handshake_exhaustion() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::new();
        for _ in 0..10 {
            provider.push_error(network_error());
        }
        let mut session = session(&dir, provider);
        session.prime(&[]);

        let reason = session.handshake(std::future::pending()).await.unwrap_err();

        assert_eq!(reason, ExitReason::RetriesExhausted);
        assert_eq!(session.provider().request_count(), 6);
        assert_eq!(session.transcript().len(), 2);
        assert!(output(session).contains("Превышено количество попыток"));
    }

    #[tokio::test]
    async fn test_handshake_interrupted() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir, ScriptedProvider::with_replies(["Ок"]));
        session.prime(&[]);

        let reason = session.handshake(async {}).await.unwrap_err();

        assert_eq!(reason, ExitReason::HandshakeInterrupted);
        assert_eq!(session.provider().request_count(), 0);
    }

    #[tokio::test]
    async fn test_turn_grows_transcript_and_runs_directives() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("existing.txt"), "").unwrap();
        let provider = ScriptedProvider::with_replies(["Ок", "file hello.txt\n^^^\nпривет\n^^^"]);
        let mut session = session(&dir, provider);
        session.prime(&[]);
        session.handshake(std::future::pending()).await.unwrap();

        let step = session.handle_input("создай hello.txt").await;

        assert!(matches!(step, Step::Continue(Some(outcome)) if outcome.failures == 0));
        assert_eq!(session.transcript().len(), 5);
        assert_eq!(
            session.transcript()[3].content,
            "Содержимое текущей директории:\nФайлы и папки в текущей директории:\n[FILE] existing.txt\n\nЗапрос пользователя: создай hello.txt"
        );
        assert_eq!(session.transcript()[4].role, Role::Assistant);
        assert_eq!(session.context().glyph, PromptGlyph::Open);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("hello.txt")).unwrap(),
            "привет\n"
        );

        // The request carried the whole transcript up to the new user turn.
        let requests = session.provider().requests();
        assert_eq!(requests[1].len(), 4);
    }

    #[tokio::test]
    async fn test_cd_carries_into_next_turn_listing() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();
        std::fs::write(dir.path().join("subdir").join("inner.txt"), "").unwrap();
        std::fs::write(dir.path().join("outer.txt"), "").unwrap();
        let provider = ScriptedProvider::with_replies(["Ок", "cmd cd subdir", "cmd cd nope"]);
        let mut session = session(&dir, provider);
        session.prime(&[]);
        session.handshake(std::future::pending()).await.unwrap();

        let step = session.handle_input("перейди в subdir").await;
        assert!(matches!(step, Step::Continue(Some(outcome)) if outcome.failures == 0));
        assert!(session.context().cwd.ends_with("subdir"));

        let step = session.handle_input("что здесь?").await;
        assert!(matches!(step, Step::Continue(Some(outcome)) if outcome.failures == 1));

        let listing = &session.transcript()[5].content;
        assert!(listing.contains("[FILE] inner.txt"));
        assert!(!listing.contains("outer.txt"));
        assert!(session.context().cwd.ends_with("subdir"));
        assert!(output(session).contains("Ошибка при смене директории"));
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_user_message() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::with_replies(["Ок"]);
        provider.push_error(network_error());
        let mut session = session(&dir, provider);
        session.prime(&[]);
        session.handshake(std::future::pending()).await.unwrap();

        let step = session.handle_input("привет").await;

        assert_eq!(step, Step::Continue(None));
        assert_eq!(session.transcript().len(), 4);
        assert_eq!(session.transcript()[3].role, Role::User);
        assert!(output(session).contains("Ошибка: Network error: connection refused"));
    }

    #[tokio::test]
    async fn test_exit_input_skips_completion() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir, ScriptedProvider::new());

        assert_eq!(session.handle_input(" exit ").await, Step::Exit);
        assert_eq!(session.provider().request_count(), 0);
    }

    #[test]
    fn test_prompt_frame() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir, ScriptedProvider::new());
        let cwd = session.context().cwd.display().to_string();

        session.show_prompt();

        assert_eq!(
            output(session),
            format!("│\n│\n├─ Path: {}\n├─ You:\n│ ", cwd)
        );
    }
}
