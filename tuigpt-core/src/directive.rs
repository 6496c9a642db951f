//! # Directive parsing
//!
//! An assistant reply is scanned line by line. Recognized prefixes become
//! [`Directive`]s; everything else is prose and is ignored here.
//!
//! ```text
//! cmd <command line>       run through the shell (`cmd cd <dir>` changes directory)
//! file <path>              start a file capture
//! ^^^                      open the file body / close it again
//! readfile <path>          echo a file
//! analyze <path>           echo a file with line numbers and ask the model about it
//! ```
//!
//! File capture is the only state carried between lines:
//!
//! ```text
//!   Idle --file p--> HeaderSeen{p} --^^^--> InBody{p} --^^^--> Idle
//!                        |                     |
//!                        +--file q--> HeaderSeen{q}
//!                                              +-- any other line: append to p
//! ```
//!
//! While `InBody`, only a bare `^^^` is special; every other line, including
//! ones that look like directives, is file content.

pub const CMD_PREFIX: &str = "cmd ";
pub const FILE_PREFIX: &str = "file ";
pub const READFILE_PREFIX: &str = "readfile ";
pub const ANALYZE_PREFIX: &str = "analyze ";
pub const FENCE: &str = "^^^";

/// Where the parser is with respect to a `file` block. The pending file
/// name exists exactly when the stage is not `Idle`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CaptureStage {
    #[default]
    Idle,
    /// `file <path>` seen, waiting for the opening fence
    HeaderSeen { path: String },
    /// Between the fences; lines are appended to `path`
    InBody { path: String },
}

impl CaptureStage {
    pub fn pending_file(&self) -> Option<&str> {
        match self {
            CaptureStage::Idle => None,
            CaptureStage::HeaderSeen { path } | CaptureStage::InBody { path } => Some(path),
        }
    }
}

/// One recognized line of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `cmd cd <target>`
    ChangeDir(String),
    /// `cmd <command line>`
    RunCommand(String),
    /// `file <path>`
    FileHeader(String),
    /// Opening `^^^` after a header
    OpenFence { path: String },
    /// Closing `^^^`
    CloseFence { path: String },
    /// A body line to append to `path`
    AppendLine { path: String, line: String },
    /// `readfile <path>`
    ReadFile(String),
    /// `analyze <path>`
    Analyze(String),
}

impl Directive {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Directive::ChangeDir(_) => "cd",
            Directive::RunCommand(_) => "cmd",
            Directive::FileHeader(_) => "file",
            Directive::OpenFence { .. } => "open_fence",
            Directive::CloseFence { .. } => "close_fence",
            Directive::AppendLine { .. } => "append",
            Directive::ReadFile(_) => "readfile",
            Directive::Analyze(_) => "analyze",
        }
    }
}

/// Line-at-a-time directive recognizer. One parser per reply.
#[derive(Debug, Default)]
pub struct DirectiveParser {
    stage: CaptureStage,
}

impl DirectiveParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> &CaptureStage {
        &self.stage
    }

    /// Advance over one line (without its line terminator).
    pub fn advance(&mut self, line: &str) -> Option<Directive> {
        if let CaptureStage::InBody { path } = &self.stage {
            let path = path.clone();
            if line == FENCE {
                self.stage = CaptureStage::Idle;
                return Some(Directive::CloseFence { path });
            }
            return Some(Directive::AppendLine {
                path,
                line: line.to_string(),
            });
        }

        if let Some(rest) = line.strip_prefix(CMD_PREFIX) {
            return parse_command(rest);
        }

        if let Some(rest) = line.strip_prefix(FILE_PREFIX) {
            let path = rest.trim().to_string();
            self.stage = CaptureStage::HeaderSeen { path: path.clone() };
            return Some(Directive::FileHeader(path));
        }

        if line.starts_with(FENCE) {
            if let CaptureStage::HeaderSeen { path } = &self.stage {
                let path = path.clone();
                self.stage = CaptureStage::InBody { path: path.clone() };
                return Some(Directive::OpenFence { path });
            }
            return None;
        }

        if let Some(rest) = line.strip_prefix(READFILE_PREFIX) {
            return Some(Directive::ReadFile(rest.trim().to_string()));
        }

        if let Some(rest) = line.strip_prefix(ANALYZE_PREFIX) {
            return Some(Directive::Analyze(rest.trim().to_string()));
        }

        None
    }
}

/// Split a `cmd` remainder into a directory change or a shell command.
fn parse_command(rest: &str) -> Option<Directive> {
    if let Some(after) = rest.strip_prefix("cd") {
        if after.is_empty() || after.starts_with(char::is_whitespace) {
            return Some(Directive::ChangeDir(after.trim().to_string()));
        }
    }

    let command = rest.trim();
    if command.is_empty() {
        return None;
    }
    Some(Directive::RunCommand(command.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_reply(reply: &str) -> Vec<Directive> {
        let mut parser = DirectiveParser::new();
        reply.lines().filter_map(|line| parser.advance(line)).collect()
    }

    fn append(path: &str, line: &str) -> Directive {
        Directive::AppendLine {
            path: path.into(),
            line: line.into(),
        }
    }

    #[test]
    fn test_prose_is_inert() {
        let reply = "Привет! Чем могу помочь?\n\nЭто обычный текст.\ncommand line\nfiles are here";
        assert!(parse_reply(reply).is_empty());
    }

    #[test]
    fn test_file_block_round() {
        let directives = parse_reply("file a.txt\n^^^\nL1\nL2\n^^^");
        assert_eq!(
            directives,
            vec![
                Directive::FileHeader("a.txt".into()),
                Directive::OpenFence { path: "a.txt".into() },
                append("a.txt", "L1"),
                append("a.txt", "L2"),
                Directive::CloseFence { path: "a.txt".into() },
            ]
        );
    }

    #[test]
    fn test_stage_carries_pending_name() {
        let mut parser = DirectiveParser::new();
        assert_eq!(parser.stage().pending_file(), None);

        parser.advance("file  src/main.py  ");
        assert_eq!(
            parser.stage(),
            &CaptureStage::HeaderSeen { path: "src/main.py".into() }
        );

        parser.advance("^^^python");
        assert_eq!(parser.stage().pending_file(), Some("src/main.py"));

        parser.advance("^^^");
        assert_eq!(parser.stage(), &CaptureStage::Idle);
        assert_eq!(parser.stage().pending_file(), None);
    }

    #[test]
    fn test_header_without_fence_captures_nothing() {
        let mut parser = DirectiveParser::new();
        let directives: Vec<_> = ["file notes.md", "some text", "more text"]
            .iter()
            .filter_map(|l| parser.advance(l))
            .collect();

        assert_eq!(directives, vec![Directive::FileHeader("notes.md".into())]);
        assert_eq!(parser.stage(), &CaptureStage::HeaderSeen { path: "notes.md".into() });
    }

    #[test]
    fn test_orphan_fences_are_inert() {
        let mut parser = DirectiveParser::new();
        assert_eq!(parser.advance("^^^"), None);
        assert_eq!(parser.advance("body?"), None);
        assert_eq!(parser.advance("^^^"), None);
        assert_eq!(parser.stage(), &CaptureStage::Idle);
    }

    #[test]
    fn test_body_lines_are_verbatim() {
        let directives = parse_reply("file run.sh\n^^^\ncmd rm -rf /\n  indented\n^^^ not a fence\n\n^^^");
        assert_eq!(
            directives[2..],
            [
                append("run.sh", "cmd rm -rf /"),
                append("run.sh", "  indented"),
                append("run.sh", "^^^ not a fence"),
                append("run.sh", ""),
                Directive::CloseFence { path: "run.sh".into() },
            ]
        );
    }

    #[test]
    fn test_second_header_retargets_before_fence() {
        let directives = parse_reply("file a.txt\nfile b.txt\n^^^\nx\n^^^");
        assert_eq!(directives[2], Directive::OpenFence { path: "b.txt".into() });
        assert_eq!(directives[3], append("b.txt", "x"));
    }

    #[test]
    fn test_commands_and_cd() {
        assert_eq!(
            parse_reply("cmd git status"),
            vec![Directive::RunCommand("git status".into())]
        );
        assert_eq!(
            parse_reply("cmd cd  project/src "),
            vec![Directive::ChangeDir("project/src".into())]
        );
        assert_eq!(parse_reply("cmd cd"), vec![Directive::ChangeDir(String::new())]);
        assert_eq!(
            parse_reply("cmd cdk deploy"),
            vec![Directive::RunCommand("cdk deploy".into())]
        );
        assert!(parse_reply("cmd    ").is_empty());
        assert!(parse_reply("cmd").is_empty());
    }

    #[test]
    fn test_read_and_analyze() {
        assert_eq!(
            parse_reply("readfile  notes.txt\nanalyze calc.py "),
            vec![
                Directive::ReadFile("notes.txt".into()),
                Directive::Analyze("calc.py".into()),
            ]
        );
    }

    #[test]
    fn test_crlf_lines() {
        let directives = parse_reply("file a.txt\r\n^^^\r\nL1\r\n^^^\r\n");
        assert_eq!(directives.len(), 4);
        assert_eq!(directives[2], append("a.txt", "L1"));
        assert_eq!(directives[3], Directive::CloseFence { path: "a.txt".into() });
    }

    #[test]
    fn test_fresh_parser_per_reply() {
        let mut first = DirectiveParser::new();
        first.advance("file a.txt");
        first.advance("^^^");
        assert!(matches!(first.stage(), CaptureStage::InBody { .. }));

        // An unterminated body does not leak into the next reply.
        assert!(parse_reply("L1\n^^^").is_empty());
    }
}
