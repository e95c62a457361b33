//! Parsing of terminal input lines.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use tutor_core::{mime_for_filename, AppViewModel, ChatId, Msg};

const FALLBACK_MIME: &str = "application/octet-stream";

pub const HELP_TEXT: &str = "\
Type a question and press Enter to ask it.
  /upload <path>  upload a PDF, DOC, DOCX or TXT document (max 5 MB)
  /new            start a new conversation
  /history        list saved conversations
  /open <n>       reopen conversation number <n> from /history
  /clear          delete all saved conversations
  /status         check the backend connection
  /help           show this help
  /quit           exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Upload(PathBuf),
    NewChat,
    History,
    Open(usize),
    Clear,
    Status,
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> anyhow::Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Ask(line.to_string())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let command = match name {
        "upload" => {
            if arg.is_empty() {
                bail!("usage: /upload <path>");
            }
            Command::Upload(PathBuf::from(unquote(arg)))
        }
        "open" => {
            let index = arg
                .parse::<usize>()
                .ok()
                .filter(|index| *index > 0)
                .context("usage: /open <n>, where <n> is a number from /history")?;
            Command::Open(index)
        }
        "new" => Command::NewChat,
        "history" => Command::History,
        "clear" => Command::Clear,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command /{other}; type /help for the list"),
    };
    Ok(Some(command))
}

/// Reads size and type of a file picked for upload.
pub fn chosen_file(path: &Path) -> anyhow::Result<Msg> {
    let metadata =
        fs::metadata(path).with_context(|| format!("cannot open {}", path.display()))?;
    if !metadata.is_file() {
        bail!("{} is not a file", path.display());
    }
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let mime = mime_for_filename(&filename).unwrap_or(FALLBACK_MIME);

    Ok(Msg::FileChosen {
        path: path.display().to_string(),
        filename,
        mime: mime.to_string(),
        size: metadata.len(),
    })
}

/// Maps a 1-based `/history` position to the chat it lists.
pub fn history_entry(view: &AppViewModel, index: usize) -> Option<ChatId> {
    index
        .checked_sub(1)
        .and_then(|position| view.history.get(position))
        .map(|row| row.id)
}

fn unquote(arg: &str) -> &str {
    arg.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(arg)
}
