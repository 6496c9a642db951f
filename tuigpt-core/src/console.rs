//! Framed, colored console output.
//!
//! Everything the user sees goes through [`Console`]: assistant replies,
//! directive results and failures. Lines are framed with box-drawing
//! prefixes (`│`, `├─`, `╭─`). Write errors are ignored since there is
//! nowhere left to report them.

use colored::{Color, Colorize};
use std::fmt::Display;
use std::io::{self, Stdout, Write};

/// Width of the horizontal rule closing a section
pub const RULE_WIDTH: usize = 50;

pub struct Console<W: Write = Stdout> {
    out: W,
    colored: bool,
}

impl Console<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out, colored: true }
    }

    /// Console that never emits ANSI escapes
    pub fn plain(out: W) -> Self {
        Self {
            out,
            colored: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn paint(&self, text: impl Display, color: Color) -> String {
        if self.colored {
            text.to_string().color(color).to_string()
        } else {
            text.to_string()
        }
    }

    /// Write a line as-is
    pub fn line(&mut self, text: impl Display) {
        let _ = writeln!(self.out, "{}", text);
        let _ = self.out.flush();
    }

    /// Write without a trailing newline (prompts)
    pub fn inline(&mut self, text: impl Display) {
        let _ = write!(self.out, "{}", text);
        let _ = self.out.flush();
    }

    /// `│ text` in a single color
    pub fn framed(&mut self, color: Color, text: impl Display) {
        let line = self.paint(format!("│ {}", text), color);
        self.line(line);
    }

    /// `│ text` with the bar and the text in different colors
    pub fn framed_two_tone(&mut self, bar: Color, body: Color, text: impl Display) {
        let line = format!("{}{}", self.paint("│ ", bar), self.paint(text, body));
        self.line(line);
    }

    /// An empty `│` spacer
    pub fn bar(&mut self, color: Color) {
        let line = self.paint("│", color);
        self.line(line);
    }

    /// `├─ title`
    pub fn section(&mut self, color: Color, title: impl Display) {
        let line = self.paint(format!("├─ {}", title), color);
        self.line(line);
    }

    /// `├─────...`
    pub fn rule(&mut self, color: Color) {
        let line = self.paint(format!("├─{}", "─".repeat(RULE_WIDTH)), color);
        self.line(line);
    }

    pub fn error(&mut self, text: impl Display) {
        let line = self.paint(text, Color::Red);
        self.line(line);
    }

    /// Echo an assistant reply inside its frame
    pub fn assistant_reply(&mut self, reply: &str) {
        self.section(Color::Green, "GPT:");
        for line in reply.split('\n') {
            self.framed_two_tone(Color::Green, Color::BrightGreen, line);
        }
        self.rule(Color::BrightBlack);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(console: Console<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_plain_console_has_no_escapes() {
        let mut console = Console::plain(Vec::new());
        console.framed(Color::Yellow, "hello");
        console.section(Color::Cyan, "Info");
        console.bar(Color::Cyan);

        assert_eq!(rendered(console), "│ hello\n├─ Info\n│\n");
    }

    #[test]
    fn test_rule_width() {
        let mut console = Console::plain(Vec::new());
        console.rule(Color::BrightBlack);

        let out = rendered(console);
        assert_eq!(out.trim_end().chars().count(), RULE_WIDTH + 2);
    }

    #[test]
    fn test_assistant_reply_frames_every_line() {
        let mut console = Console::plain(Vec::new());
        console.assistant_reply("Привет\ncmd ls");

        let out = rendered(console);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "├─ GPT:");
        assert_eq!(lines[1], "│ Привет");
        assert_eq!(lines[2], "│ cmd ls");
        assert!(lines[3].starts_with("├──"));
    }
}
