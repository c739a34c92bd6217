use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use notes_core::{
    editor::{load_note, save_note},
    DurableNoteGateway, ListController, ListEvent, MemoryNoteGateway, NoteGateway,
};
use shared::{
    domain::{Note, NoteId, NOTE_COLORS},
    order::SortSpec,
    protocol::{ListCommand, ListState},
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod input;

use config::{load_settings, normalize_database_url};
use input::{parse_line, Input, HELP};

#[derive(Parser, Debug)]
#[command(about = "Sorted note list with single-step undo, driven from stdin")]
struct Args {
    /// SQLite database (url or plain path). Defaults to the configured one.
    #[arg(long)]
    database_url: Option<String>,
    /// Keep notes in memory, seeded with a few samples.
    #[arg(long, conflicts_with = "database_url")]
    in_memory: bool,
    /// Initial order, e.g. `date-desc` or `title-asc`.
    #[arg(long)]
    sort: Option<SortSpec>,
    /// Print each published list as a JSON line.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings();
    init_tracing(&settings.log_filter);

    let gateway: Arc<dyn NoteGateway> = if args.in_memory {
        Arc::new(MemoryNoteGateway::with_notes(sample_notes()))
    } else {
        let raw = args.database_url.as_deref().unwrap_or(&settings.database_url);
        let database_url = normalize_database_url(raw);
        info!(%database_url, "notes: opening store");
        DurableNoteGateway::open(&database_url).await?
    };

    let sort = args.sort.unwrap_or(settings.default_sort);
    let controller = ListController::with_initial_sort(Arc::clone(&gateway), sort);
    let printer = tokio::spawn(print_events(controller.subscribe(), args.json));
    eprintln!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_line(&line) {
            Ok(Some(Input::Quit)) => break,
            Ok(Some(input)) => {
                if let Err(err) = run_input(&controller, gateway.as_ref(), input).await {
                    eprintln!("error: {err:#}");
                }
            }
            Ok(None) => {}
            Err(message) => eprintln!("{message}"),
        }
    }

    controller.shutdown().await;
    drop(controller);
    printer.await.context("event printer failed")?;
    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_input(
    controller: &ListController,
    gateway: &dyn NoteGateway,
    input: Input,
) -> Result<()> {
    match input {
        Input::Order(sort) => controller.on_command(ListCommand::Reorder(sort)),
        Input::Delete(id) => {
            let note = find_note(controller, gateway, id).await?;
            controller.on_command(ListCommand::Delete(note));
        }
        Input::Restore => controller.on_command(ListCommand::Restore),
        Input::Toggle => controller.on_command(ListCommand::ToggleOrderPanel),
        Input::Add { title, content } => {
            let color = NOTE_COLORS[controller.state().notes.len() % NOTE_COLORS.len()];
            let id = save_note(gateway, Note::new(title, content, Utc::now(), color)).await?;
            println!("saved note #{}", id.0);
        }
        Input::Show(id) => {
            let note = load_note(gateway, id)
                .await?
                .with_context(|| format!("no note with id {}", id.0))?;
            println!("{}\n{}\n{}", note.title, note.timestamp.to_rfc3339(), note.content);
        }
        Input::Help => println!("{HELP}"),
        Input::Quit => {}
    }
    Ok(())
}

/// Prefers the copy shown in the list; falls back to storage for ids that are
/// not currently visible.
async fn find_note(controller: &ListController, gateway: &dyn NoteGateway, id: NoteId) -> Result<Note> {
    if let Some(note) = controller
        .state()
        .notes
        .iter()
        .find(|note| note.id == Some(id))
    {
        return Ok(note.clone());
    }
    load_note(gateway, id)
        .await?
        .with_context(|| format!("no note with id {}", id.0))
}

async fn print_events(mut events: broadcast::Receiver<ListEvent>, json: bool) {
    loop {
        match events.recv().await {
            Ok(ListEvent::StateChanged(state)) => {
                if json {
                    match serde_json::to_string(state.as_ref()) {
                        Ok(line) => println!("{line}"),
                        Err(err) => warn!(error = %err, "notes: failed to encode state"),
                    }
                } else {
                    print!("{}", render(&state));
                }
            }
            Ok(ListEvent::NoteDeleted(note)) => {
                eprintln!("deleted '{}' (type `restore` to undo)", note.title);
            }
            Ok(ListEvent::NoteRestored(note)) => eprintln!("restored '{}'", note.title),
            Ok(ListEvent::Failed(failure)) => eprintln!("error: {failure}"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "notes: printer fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn render(state: &ListState) -> String {
    let mut out = format!("== {} note(s), {}", state.notes.len(), state.active_sort);
    if state.order_panel_visible {
        out.push_str("  [order: title | date | color, asc | desc]");
    }
    out.push('\n');
    for note in &state.notes {
        let id = note.id.map(|id| id.0.to_string()).unwrap_or_else(|| "-".into());
        out.push_str(&format!(
            "  #{id:<4} {:08X}  {}  {}\n",
            note.color,
            note.timestamp.format("%Y-%m-%d %H:%M"),
            note.title
        ));
    }
    out
}

fn sample_notes() -> Vec<Note> {
    let now = Utc::now();
    [
        ("Groceries", "milk, eggs, coffee", 3),
        ("Books to read", "The Rust Programming Language", 30),
        ("apartment", "call the landlord about the heater", 120),
    ]
    .into_iter()
    .enumerate()
    .map(|(index, (title, content, minutes_ago))| {
        Note::new(title, content, now - Duration::minutes(minutes_ago), NOTE_COLORS[index])
            .with_id(NoteId(index as i64 + 1))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::SortDirection;

    #[test]
    fn render_lists_notes_and_panel() {
        let note = sample_notes().remove(0);
        let state = ListState::default()
            .with_view(vec![note], SortSpec::ByTitle(SortDirection::Ascending))
            .with_order_panel_toggled();

        let rendered = render(&state);
        assert!(rendered.starts_with("== 1 note(s), title-asc  [order:"));
        assert!(rendered.contains("#1"));
        assert!(rendered.contains("Groceries"));
    }

    #[tokio::test]
    async fn find_note_falls_back_to_storage() {
        let gateway = Arc::new(MemoryNoteGateway::with_notes(sample_notes()));
        let controller = ListController::new(gateway.clone());

        let note = find_note(&controller, gateway.as_ref(), NoteId(2))
            .await
            .expect("stored note");
        assert_eq!(note.title, "Books to read");
        assert!(find_note(&controller, gateway.as_ref(), NoteId(99))
            .await
            .is_err());
    }
}
