//! # Response Interpreter
//!
//! Runs the directives of one assistant reply against the local machine.
//!
//! The reply is echoed once, then scanned line by line with a fresh
//! [`DirectiveParser`]. Each directive runs to completion before the next
//! line is looked at. Failures are reported on the console and counted;
//! they never stop the scan.

use crate::console::Console;
use crate::context::{PromptGlyph, SessionContext};
use crate::directive::{Directive, DirectiveParser};
use crate::error::{self, Error};
use crate::fs::{self, FileRead};
use crate::provider::{ChatMessage, LlmProvider};
use crate::shell::{self, ShellConfig};
use colored::Color;
use std::io::{Stdout, Write};

/// Summary of one interpreted reply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Directives recognized and executed, including fences and body lines
    pub directives: usize,
    /// Directives that reported a failure
    pub failures: usize,
}

impl Outcome {
    pub fn executed_any(&self) -> bool {
        self.directives > 0
    }
}

pub struct Interpreter<'a, P: LlmProvider, W: Write = Stdout> {
    provider: &'a P,
    console: &'a mut Console<W>,
    shell: ShellConfig,
}

impl<'a, P: LlmProvider, W: Write> Interpreter<'a, P, W> {
    pub fn new(provider: &'a P, console: &'a mut Console<W>) -> Self {
        Self {
            provider,
            console,
            shell: ShellConfig::default(),
        }
    }

    pub fn with_shell(mut self, shell: ShellConfig) -> Self {
        self.shell = shell;
        self
    }

    /// Echo `reply` and execute its directives in line order. `query` is the
    /// user's raw request, forwarded with `analyze` content.
    pub async fn interpret(&mut self, ctx: &mut SessionContext, reply: &str, query: &str) -> Outcome {
        self.console.assistant_reply(reply);

        let mut parser = DirectiveParser::new();
        let mut outcome = Outcome::default();
        let mut block_failed = false;

        for line in reply.lines() {
            let Some(directive) = parser.advance(line) else {
                continue;
            };
            tracing::debug!(directive = directive.name(), "dispatch");
            outcome.directives += 1;

            let ok = match directive {
                Directive::ChangeDir(target) => self.change_dir(ctx, &target),
                Directive::RunCommand(command) => self.run_command(ctx, &command).await,
                Directive::FileHeader(_) | Directive::OpenFence { .. } => {
                    block_failed = false;
                    true
                }
                Directive::AppendLine { path, line } => {
                    let ok = self.append(ctx, &path, &line);
                    block_failed |= !ok;
                    ok
                }
                Directive::CloseFence { path } => {
                    if !block_failed {
                        self.console.section(Color::Green, format!("Файл записан: {}", path));
                    }
                    true
                }
                Directive::ReadFile(path) => self.read_file(ctx, &path),
                Directive::Analyze(path) => self.analyze(ctx, &path, query).await,
            };

            if !ok {
                outcome.failures += 1;
            }
        }

        if let Some(path) = parser.stage().pending_file() {
            tracing::debug!(path, "reply ended inside a file block");
        }

        ctx.glyph = if outcome.executed_any() {
            PromptGlyph::Open
        } else {
            PromptGlyph::Continue
        };
        outcome
    }

    fn report(&mut self, prefix: &str, err: &Error) {
        tracing::warn!(error = %err, "directive failed");
        self.console.error(format!("{}: {}", prefix, err.message()));
    }

    fn change_dir(&mut self, ctx: &mut SessionContext, target: &str) -> bool {
        match shell::change_directory(&ctx.cwd, target) {
            Ok(next) => {
                tracing::debug!(cwd = %next.display(), "working directory changed");
                ctx.cwd = next;
                true
            }
            Err(err) => {
                self.report("Ошибка при смене директории", &err);
                false
            }
        }
    }

    async fn run_command(&mut self, ctx: &SessionContext, command: &str) -> bool {
        let output = match self.shell.run(command, &ctx.cwd).await {
            Ok(output) => output,
            Err(err) => {
                self.report("Ошибка при выполнении команды", &err);
                return false;
            }
        };

        self.console.section(Color::Cyan, format!("Команда: {}", command));
        for line in output.stdout.lines() {
            self.console.framed(Color::White, line);
        }
        for line in output.stderr.lines() {
            self.console.framed(Color::Yellow, line);
        }

        if output.success() {
            return true;
        }
        let err = error::command_exit(command, output.exit_code, &output.stderr);
        self.report("Ошибка при выполнении команды", &err);
        false
    }

    fn append(&mut self, ctx: &SessionContext, path: &str, line: &str) -> bool {
        match fs::append_line(&ctx.cwd, path, line) {
            Ok(_) => true,
            Err(err) => {
                self.report(&format!("Ошибка при записи в файл {}", path), &err);
                false
            }
        }
    }

    fn read_file(&mut self, ctx: &SessionContext, path: &str) -> bool {
        let read = fs::read_file(&ctx.cwd, path);

        self.console.section(Color::Yellow, format!("Запрос на чтение файла: {}", path));
        self.console.framed(Color::Yellow, format!("Содержимое файла {}:", path));
        self.console.bar(Color::Yellow);
        for line in read.to_string().split('\n') {
            self.console.framed(Color::Yellow, line);
        }
        self.console.bar(Color::Yellow);
        self.console.rule(Color::Yellow);

        match read.error() {
            Some(err) => {
                tracing::warn!(error = %err, "readfile failed");
                false
            }
            None => true,
        }
    }

    async fn analyze(&mut self, ctx: &SessionContext, path: &str, query: &str) -> bool {
        self.console.section(Color::BrightBlue, format!("Анализ файла: {}", path));
        let ok = match fs::read_file(&ctx.cwd, path) {
            FileRead::Text(content) => self.analyze_content(&content, query).await,
            failed => {
                if let Some(err) = failed.error() {
                    let err = err.with_operation("interpreter::analyze");
                    tracing::warn!(error = %err, "analyze skipped");
                }
                self.console.framed(Color::Red, &failed);
                false
            }
        };
        self.console.rule(Color::BrightBlue);
        ok
    }

    async fn analyze_content(&mut self, content: &str, query: &str) -> bool {
        self.console.framed(Color::BrightBlue, "Содержимое файла:");
        self.console.rule(Color::BrightBlue);
        self.console.bar(Color::Cyan);
        for (number, line) in content.split('\n').enumerate() {
            let numbered = self.console.paint(format!("│{:4}: {}", number + 1, line), Color::Cyan);
            self.console.line(numbered);
        }
        self.console.framed(Color::BrightBlue, "Анализ файла:");

        let request = vec![ChatMessage::user(format!("{}\n\n\n{}", content, query))];
        let ok = match self.provider.chat(request).await {
            Ok(analysis) => {
                for line in analysis.split('\n') {
                    self.console.framed_two_tone(Color::Cyan, Color::BrightGreen, line);
                }
                true
            }
            Err(e) => {
                let err = Error::from(e).with_operation("interpreter::analyze");
                self.report("Ошибка при анализе кода", &err);
                false
            }
        };
        self.console.bar(Color::Cyan);
        ok
    }
}
