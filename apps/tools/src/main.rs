use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use notes_core::{editor::save_note, DurableNoteGateway};
use shared::{
    domain::{Note, NoteId, NOTE_COLORS},
    order::{sort_notes, SortSpec},
};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/notes.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Add {
        title: String,
        content: String,
        /// Index into the note palette.
        #[arg(long, default_value_t = 0)]
        color: usize,
    },
    Show {
        id: i64,
    },
    List {
        #[arg(long, default_value_t = SortSpec::default())]
        sort: SortSpec,
    },
    Delete {
        id: i64,
    },
    /// Inserts `count` numbered notes spread over the last few days.
    Seed {
        #[arg(default_value_t = 10)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url)
        .await
        .with_context(|| format!("failed to open '{}'", cli.database_url))?;

    match cli.command {
        Command::Add {
            title,
            content,
            color,
        } => {
            let color = *NOTE_COLORS
                .get(color)
                .with_context(|| format!("color index must be below {}", NOTE_COLORS.len()))?;
            let gateway = DurableNoteGateway::new(storage);
            let note_id = save_note(&gateway, Note::new(title, content, Utc::now(), color)).await?;
            println!("created note_id={}", note_id.0);
        }
        Command::Show { id } => {
            let note = storage
                .note_by_id(NoteId(id))
                .await?
                .with_context(|| format!("no note with id {id}"))?;
            println!("#{} {} ({:08X})", id, note.title, note.color);
            println!("{}", note.timestamp.to_rfc3339());
            println!("{}", note.content);
        }
        Command::List { sort } => {
            let notes = sort_notes(sort, storage.list_notes().await?);
            for note in &notes {
                println!(
                    "{:>5}  {}  {}",
                    note.id.map(|id| id.0).unwrap_or_default(),
                    note.timestamp.format("%Y-%m-%d %H:%M"),
                    note.title
                );
            }
            println!("{} note(s), {sort}", notes.len());
        }
        Command::Delete { id } => {
            if storage.delete_note(NoteId(id)).await? {
                println!("deleted note_id={id}");
            } else {
                println!("no note with id {id}");
            }
        }
        Command::Seed { count } => {
            let now = Utc::now();
            for index in 0..count {
                let note = Note::new(
                    format!("Note {}", index + 1),
                    format!("Seeded note number {}", index + 1),
                    now - Duration::hours(index as i64 * 7),
                    NOTE_COLORS[index % NOTE_COLORS.len()],
                );
                storage.upsert_note(&note).await?;
            }
            println!("seeded {count} note(s), {} total", storage.count_notes().await?);
        }
    }

    Ok(())
}
