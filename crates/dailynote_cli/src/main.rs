//! Daily notes CLI.
//!
//! # Responsibility
//! - Provide a small executable over `dailynote_core` for local vaults.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Commands:
//! - dailynote <vault> ping
//! - dailynote <vault> today
//! - dailynote <vault> page [--count N] [--cursor YYYY-MM-DD]
//! - dailynote <vault> read|delete <date>
//! - dailynote <vault> save <date> <text>

use clap::{Parser, Subcommand};
use dailynote_core::{
    core_version, default_log_level, init_logging, page_is_exhausted, ping, CalendarDate,
    DailyNoteSettings, DateDisplay, LocalFileStore, NoteService, PageMode,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "dailynote")]
#[command(about = "Browse and edit date-indexed daily notes")]
#[command(version)]
struct Cli {
    /// Vault root holding the storage directory and `daily-notes.toml`
    vault_root: PathBuf,

    /// Absolute directory for rotating log files
    #[arg(long, env = "DAILYNOTE_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core health and version
    Ping,

    /// Show today's note, creating it when missing
    Today,

    /// List notes on or before a date, newest first
    Page {
        /// Page size (defaults to `initial_page_size`)
        #[arg(long)]
        count: Option<usize>,

        /// Newest date to include (defaults to today)
        #[arg(long)]
        cursor: Option<CalendarDate>,
    },

    /// Print one note
    Read { date: String },

    /// Overwrite one note, creating it when missing
    Save { date: String, text: String },

    /// Delete one note
    Delete { date: String },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(default_log_level(), log_dir)?;
    }

    let settings = load_settings(&cli.vault_root)?;
    let mut service = NoteService::new(LocalFileStore::new(&cli.vault_root), settings);

    match cli.command {
        Commands::Ping => {
            println!("dailynote_core ping={}", ping());
            println!("dailynote_core version={}", core_version());
        }
        Commands::Today => {
            let record = service.get_or_create_today().map_err(|err| err.to_string())?;
            println!("# {}", record.date.to_display(DateDisplay::LongWithWeekday));
            println!("{}", record.body());
        }
        Commands::Page { count, cursor } => {
            let count = count.unwrap_or(service.settings().initial_page_size as usize);
            let cursor = cursor.unwrap_or_else(CalendarDate::today);
            let page = service.load_page(count, cursor, PageMode::Initial);
            for record in &page {
                let first_line = record.body().lines().next().unwrap_or("");
                println!("{}  {}", record.key, first_line);
            }
            if page_is_exhausted(page.len(), count) {
                println!("-- end of history --");
            }
        }
        Commands::Read { date } => match service.read(&date) {
            Some(content) => print!("{content}"),
            None => return Err(format!("no note for `{date}`")),
        },
        Commands::Save { date, text } => {
            service.save(&date, &text).map_err(|err| err.to_string())?;
            println!("saved {date}");
        }
        Commands::Delete { date } => {
            service.delete(&date).map_err(|err| err.to_string())?;
            println!("deleted {date}");
        }
    }
    Ok(())
}

fn load_settings(root: &Path) -> Result<DailyNoteSettings, String> {
    let path = root.join(DailyNoteSettings::filename());
    match std::fs::read_to_string(&path) {
        Ok(text) => DailyNoteSettings::from_toml(&text).map_err(|err| err.to_string()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(DailyNoteSettings::default()),
        Err(err) => Err(format!("failed to read {}: {err}", path.display())),
    }
}
