//! Line commands accepted on stdin.

use shared::{domain::NoteId, order::SortSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Order(SortSpec),
    Delete(NoteId),
    Restore,
    Toggle,
    Add { title: String, content: String },
    Show(NoteId),
    Help,
    Quit,
}

pub const HELP: &str = "commands: order <title|date|color>-<asc|desc>, delete <id>, restore, \
toggle, add <title> | <content>, show <id>, help, quit";

/// Parses one line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Input>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match word.to_ascii_lowercase().as_str() {
        "order" | "sort" => Input::Order(rest.parse().map_err(|err| format!("{err}"))?),
        "delete" | "rm" => Input::Delete(parse_id(rest)?),
        "restore" | "undo" => Input::Restore,
        "toggle" => Input::Toggle,
        "add" => {
            let (title, content) = rest
                .split_once('|')
                .ok_or_else(|| "usage: add <title> | <content>".to_string())?;
            Input::Add {
                title: title.trim().to_string(),
                content: content.trim().to_string(),
            }
        }
        "show" => Input::Show(parse_id(rest)?),
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(format!("unknown command '{other}' ({HELP})")),
    };
    Ok(Some(input))
}

fn parse_id(raw: &str) -> Result<NoteId, String> {
    raw.trim_start_matches('#')
        .parse::<i64>()
        .map(NoteId)
        .map_err(|_| format!("expected a note id, got '{raw}'"))
}
