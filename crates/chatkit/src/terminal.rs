//! Terminal front-end: stdin input and colored output.

use std::io::{self, Write as _};

use chatkit_core::Error;
use chatkit_core::display::{DisplaySink, InputSource};
use chatkit_model::ToolResult;
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};

const BAR_CHAR: &str = "▎";
const MAX_RESULT_CHARS: usize = 200;

/// Reads user input from stdin, one line per turn.
pub struct StdinInput {
    reader: BufReader<Stdin>,
    prompt: &'static str,
}

impl StdinInput {
    /// Creates an input source that prints `> ` before each read.
    #[inline]
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            prompt: "> ",
        }
    }
}

impl Default for StdinInput {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl InputSource for StdinInput {
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        print!("{}", self.prompt);
        io::stdout().flush()?;

        let mut line = String::new();
        let count = self.reader.read_line(&mut line).await?;
        if count == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
    }
}

/// Prints the conversation to stdout with colors.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalSink;

impl DisplaySink for TerminalSink {
    fn show(&self, message: &str) {
        println!("{}", message.dimmed());
    }

    fn show_assistant_reply(&self, text: &str) {
        println!("{}🤖 {}", BAR_CHAR.bright_cyan(), text.bright_white());
    }

    fn show_tool_call(&self, name: &str, arguments: &str, result: &ToolResult) {
        let bar = BAR_CHAR.bright_yellow();
        println!("{bar}🔧 {}({})", name.bold(), arguments);
        let output = result.output.to_string();
        println!("{bar}{}", truncate(&output, MAX_RESULT_CHARS).dimmed());
    }

    fn show_error(&self, error: &Error) {
        eprintln!("{}❌ {}", BAR_CHAR.bright_red(), error.red());
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_owned(),
    }
}
