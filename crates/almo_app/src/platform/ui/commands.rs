use std::path::PathBuf;

use almo_core::{DocumentId, SessionId};

pub const HELP: &str = "\
Commands:
  /upload <path> [<path> ...]   upload files (quote paths containing spaces)
  /docs                         list documents and uploads
  /dismiss <document id>        remove a document from the list
  /discard                      clear the document list
  /new                          start a new chat session
  /sessions                     list chat sessions
  /select <session id>          switch to a session
  /help                         show this help
  /quit                         save sessions and exit
Anything else is sent to the assistant.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Upload(Vec<PathBuf>),
    Docs,
    Dismiss(DocumentId),
    Discard,
    NewSession,
    Sessions,
    Select(SessionId),
    Help,
    Quit,
    Chat(String),
    /// Input that looked like a command but could not be used.
    Invalid(String),
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Some(Command::Chat(trimmed.to_string()));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    let command = match name.to_ascii_lowercase().as_str() {
        "upload" | "u" => {
            let paths = split_args(args);
            if paths.is_empty() {
                Command::Invalid("usage: /upload <path> [<path> ...]".to_string())
            } else {
                Command::Upload(paths.into_iter().map(PathBuf::from).collect())
            }
        }
        "docs" | "d" => Command::Docs,
        "dismiss" => match args {
            "" => Command::Invalid("usage: /dismiss <document id>".to_string()),
            id => Command::Dismiss(DocumentId::new(id)),
        },
        "discard" => Command::Discard,
        "new" => Command::NewSession,
        "sessions" | "s" => Command::Sessions,
        "select" => match args.parse::<SessionId>() {
            Ok(id) => Command::Select(id),
            Err(_) => Command::Invalid("usage: /select <session id>".to_string()),
        },
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::Invalid(format!("unknown command '/{other}', try /help")),
    };
    Some(command)
}

/// Splits on whitespace; double quotes group a single argument.
fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token && !current.is_empty() {
        args.push(current);
    }
    args.retain(|arg| !arg.is_empty());
    args
}
