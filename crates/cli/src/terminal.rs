use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, BufRead, Write};

use ragline_ingest::pipeline::{DocumentStatus, IngestReport};

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const USER_PROMPT: Color = Color::Green;
    const ASSISTANT_TEXT: Color = Color::Cyan;
    const WARNING: Color = Color::Yellow;
    const OK: Color = Color::DarkGreen;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

/// Lines longer than this are cut when previewing chunks.
const PREVIEW_CHARS: usize = 200;

/// Terminal output for the `ragline` subcommands.
#[derive(Default)]
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Print the chat banner.
    pub fn print_banner(&self, model: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("ragline chat"),
            ResetColor,
            Print("\n"),
            SetForegroundColor(Colors::DIM),
            Print(format!("Model: {}\n", model)),
            Print("Type 'exit' or 'quit' to end.\n"),
            Print("---\n"),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Read a line of user input with prompt.
    /// Returns None at end of input or when the user wants to exit.
    pub fn read_input(&self, input: &mut impl BufRead) -> Result<Option<String>> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::USER_PROMPT),
            Print("you> "),
            ResetColor,
        )?;
        stdout.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(parse_input(&line))
    }

    /// Print one streamed piece of the assistant reply.
    pub fn print_delta(&self, text: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::ASSISTANT_TEXT),
            Print(text),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn end_reply(&self) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, Print("\n"))?;
        stdout.flush()?;
        Ok(())
    }

    /// Print every chunk of a file with its index and word count.
    pub fn print_chunks(&self, source: &str, strategy: &str, chunks: &[String]) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print(format!("{} ", source)),
            SetForegroundColor(Colors::DIM),
            Print(format!("{} chunks, {}\n", chunks.len(), strategy)),
            ResetColor,
        )?;
        for (i, chunk) in chunks.iter().enumerate() {
            execute!(
                stdout,
                SetForegroundColor(Colors::DIM),
                Print(format!("[{} | {} words] ", i, chunk.split_whitespace().count())),
                ResetColor,
                Print(format!("{}\n", preview(chunk))),
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Print one line per document followed by the summary line.
    pub fn print_report(&self, report: &IngestReport) -> Result<()> {
        let mut stdout = io::stdout();
        for doc in &report.documents {
            let color = match doc.status {
                DocumentStatus::Indexed => Colors::OK,
                DocumentStatus::Empty | DocumentStatus::Unrecognized => Colors::DIM,
                DocumentStatus::Skipped { .. } | DocumentStatus::Partial { .. } => Colors::WARNING,
            };
            execute!(
                stdout,
                SetForegroundColor(color),
                Print(format!("{:<14}", doc.status.to_string().split(' ').next().unwrap_or(""))),
                ResetColor,
                Print(format!(
                    " {} ({} chunks, {:.1}s)\n",
                    doc.source,
                    doc.chunks,
                    doc.elapsed.as_secs_f64()
                )),
            )?;
            if let DocumentStatus::Skipped { reason } = &doc.status {
                execute!(
                    stdout,
                    SetForegroundColor(Colors::DIM),
                    Print(format!("               {}\n", reason)),
                    ResetColor,
                )?;
            }
        }
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print(format!("{}\n", report)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_collections<'a>(&self, names: impl IntoIterator<Item = &'a String>) -> Result<()> {
        let mut stdout = io::stdout();
        let mut any = false;
        for name in names {
            any = true;
            execute!(stdout, Print(format!("{}\n", name)))?;
        }
        if !any {
            execute!(
                stdout,
                SetForegroundColor(Colors::DIM),
                Print("No collections found.\n"),
                ResetColor,
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Print an error message.
    pub fn print_error(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::ERROR),
            Print(format!("Error: {}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print an info message.
    pub fn print_info(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }
}

/// Trim a raw input line. `None` means the user asked to leave.
fn parse_input(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if matches!(trimmed, "exit" | "quit" | "/exit" | "/quit") {
        return None;
    }
    Some(trimmed.to_string())
}

/// First line of a chunk, cut to [`PREVIEW_CHARS`] characters.
fn preview(chunk: &str) -> String {
    let first_line = chunk.lines().next().unwrap_or("");
    let count = first_line.chars().count();
    if count > PREVIEW_CHARS || first_line.len() < chunk.trim_end().len() {
        let cut: String = first_line.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        first_line.to_string()
    }
}
