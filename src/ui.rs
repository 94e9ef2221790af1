//! Line-oriented terminal front end.
//!
//! Plain lines are appended to the text buffer, like typing into the text
//! area. Lines starting with `:` are commands:
//!
//! ```text
//! :text <text>          replace the text buffer
//! :clear                empty the text buffer
//! :set <field> <value>  edit an option (allowSwaps, mutationRate, seed, ...)
//! :options              show the live options
//! :mutate               submit the text
//! :found  (:f)          mark one mutation as found
//! :done   (:d)          give up / confirm the rest and reveal the mutations
//! :status               show the status line
//! :cancel               abort an in-flight request
//! :health               show the last backend health probe
//! :quit   (:q)
//! ```
//!
//! Input keeps being read while a request is in flight, so `:cancel`, edits
//! and `:status` work during the wait. `:found` and `:done` wait for the
//! pending response first.

use std::io::Write;

use colored::*;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;

use crate::error::Result;
use crate::models::{MutationResponse, Segment};
use crate::options::{FieldEdit, OptionField};
use crate::progress::{Status, StatusClass};
use crate::service::{MutatorApi, ServerStatus};
use crate::session::SessionController;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A plain line of text for the buffer.
    Append(String),
    SetText(String),
    Clear,
    Set(OptionField, String),
    Options,
    Mutate,
    Found,
    Done,
    Status,
    Cancel,
    Health,
    Quit,
}

impl Command {
    /// Parse one input line (without its trailing newline).
    ///
    /// # Errors
    /// A message naming the unknown command or missing argument.
    pub fn parse(line: &str) -> std::result::Result<Command, String> {
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Command::Append(line.to_string()));
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((n, a)) => (n, a.trim()),
            None => (rest.trim(), ""),
        };
        match name {
            "text" => Ok(Command::SetText(arg.to_string())),
            "clear" => Ok(Command::Clear),
            "set" => {
                let (field, value) = arg.split_once(char::is_whitespace).unwrap_or((arg, ""));
                if field.is_empty() {
                    return Err("usage: :set <field> <value>".to_string());
                }
                let field = field.parse::<OptionField>().map_err(|e| e.to_string())?;
                Ok(Command::Set(field, value.trim().to_string()))
            }
            "options" => Ok(Command::Options),
            "mutate" | "m" => Ok(Command::Mutate),
            "found" | "f" => Ok(Command::Found),
            "done" | "d" => Ok(Command::Done),
            "status" => Ok(Command::Status),
            "cancel" => Ok(Command::Cancel),
            "health" => Ok(Command::Health),
            "quit" | "q" => Ok(Command::Quit),
            other => Err(format!("unknown command ':{other}'")),
        }
    }
}

/// Render `response` with every mutation site highlighted.
pub fn reveal(response: &MutationResponse) -> String {
    response
        .segments()
        .into_iter()
        .map(|seg| match seg {
            Segment::Plain(s) => s.normal().to_string(),
            Segment::Mutated(s, kind) => {
                // Removed punctuation leaves a span that may be a lone space.
                let shown = if s.trim().is_empty() { "␣".to_string() } else { s.to_string() };
                format!("{}{}", shown.black().on_yellow(), format!("[{kind}]").dimmed())
            }
        })
        .collect()
}

fn render_status(status: &Status) -> ColoredString {
    let line = status.to_string();
    match (status, status.class()) {
        (Status::Failed(_), _) => line.bright_red(),
        (_, StatusClass::Complete) => line.bright_green(),
        _ => line.bright_yellow(),
    }
}

/// Print the settled active request: its mutated text, then the status.
fn show_settled<A: MutatorApi, W: Write>(session: &SessionController<A>, out: &mut W) -> Result<()> {
    if let Some(response) = session.displayed_response() {
        writeln!(out, "\n{}\n", response.mutated_text.bold())?;
    }
    writeln!(out, "{}", render_status(&session.status()))?;
    Ok(())
}

enum Next {
    Line(Option<String>),
    Settled,
}

/// Drive `session` from `input` until EOF or `:quit`, writing to `out`.
pub async fn run<A, R, W>(
    session: &mut SessionController<A>,
    input: R,
    out: &mut W,
    health: Option<watch::Receiver<ServerStatus>>,
) -> Result<()>
where
    A: MutatorApi,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{}", render_status(&session.status()))?;

    let mut lines = input.lines();
    let mut awaiting = false;
    loop {
        let next = if awaiting {
            tokio::select! {
                biased;
                _ = session.settle() => Next::Settled,
                line = lines.next_line() => Next::Line(line?),
            }
        } else {
            Next::Line(lines.next_line().await?)
        };
        let line = match next {
            Next::Settled => {
                awaiting = false;
                show_settled(session, out)?;
                continue;
            }
            Next::Line(Some(line)) => line,
            Next::Line(None) => break,
        };

        let command = match Command::parse(line.trim_end_matches('\r')) {
            Ok(c) => c,
            Err(e) => {
                writeln!(out, "{}", e.red())?;
                continue;
            }
        };

        if awaiting && matches!(command, Command::Found | Command::Done) {
            session.settle().await;
            awaiting = false;
            show_settled(session, out)?;
        }

        match command {
            Command::Append(text) => {
                let mut buffer = session.current_text().to_string();
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&text);
                session.on_text_changed(buffer);
            }
            Command::SetText(text) => session.on_text_changed(text),
            Command::Clear => session.on_text_changed(String::new()),
            Command::Set(field, value) => match session.on_option_edit(field, FieldEdit::Text(value)) {
                Ok(()) => writeln!(out, "{field} updated")?,
                Err(e) => writeln!(out, "{}", e.to_string().red())?,
            },
            Command::Options => {
                let json = serde_json::to_string_pretty(session.live_options())
                    .unwrap_or_else(|e| e.to_string());
                writeln!(out, "{json}")?;
            }
            Command::Mutate => match session.on_submit() {
                Ok(handle) if handle.state().is_settled() => show_settled(session, out)?,
                Ok(_) => {
                    writeln!(out, "{}", render_status(&session.status()))?;
                    awaiting = true;
                }
                Err(e) => writeln!(out, "{}", e.to_string().red())?,
            },
            Command::Found => match session.on_found() {
                Ok(_) => writeln!(out, "{}", render_status(&session.status()))?,
                Err(e) => writeln!(out, "{}", e.to_string().red())?,
            },
            Command::Done => match session.on_done() {
                Ok(()) => {
                    if let Some(response) = session.displayed_response() {
                        writeln!(out, "\n{}\n", reveal(&response))?;
                    }
                    writeln!(out, "{}", render_status(&session.status()))?;
                }
                Err(e) => writeln!(out, "{}", e.to_string().red())?,
            },
            Command::Status => writeln!(out, "{}", render_status(&session.status()))?,
            Command::Cancel => {
                let msg = if session.cancel() { "cancelled" } else { "nothing in flight" };
                writeln!(out, "{msg}")?;
            }
            Command::Health => {
                let status = health
                    .as_ref()
                    .map(|rx| rx.borrow().clone())
                    .unwrap_or(ServerStatus::Checking);
                writeln!(out, "{status}")?;
            }
            Command::Quit => return Ok(()),
        }
    }

    // Input ended mid-request: still show the answer.
    if awaiting {
        session.settle().await;
        show_settled(session, out)?;
    }
    Ok(())
}
