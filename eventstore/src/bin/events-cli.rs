//! Small inspection CLI over `events.db`, for the "purely observational...
//! makes debugging and post-hoc validation possible" use spec.md §4.5/§9
//! describe. Never part of the control path.

use clap::{Parser, Subcommand};
use eventstore::Store;

#[derive(Parser)]
#[command(name = "events-cli", about = "Inspect the session orchestration event log")]
struct Cli {
    /// Path to events.db (defaults to $STATE_ROOT/events.db)
    #[arg(long, env = "EVENTS_DB_PATH")]
    db: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the full trace for one correlation id, ordered by timestamp.
    Trace { correlation_id: String },
}

fn resolve_db_path(cli_db: Option<std::path::PathBuf>) -> anyhow::Result<std::path::PathBuf> {
    if let Some(p) = cli_db {
        return Ok(p);
    }
    let root = std::env::var("STATE_ROOT")
        .map_err(|_| anyhow::anyhow!("pass --db or set STATE_ROOT/EVENTS_DB_PATH"))?;
    Ok(std::path::PathBuf::from(root).join("events.db"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db)?;
    let store = Store::open(&db_path)?;

    match cli.command {
        Command::Trace { correlation_id } => {
            let events = store.trace(&correlation_id)?;
            if events.is_empty() {
                println!("no events for correlation_id={correlation_id}");
                return Ok(());
            }
            for e in events {
                println!(
                    "{}  {:<12} {:<28} session={:<26} workspace={:<10} {}",
                    e.timestamp,
                    e.component.as_str(),
                    e.event_type.to_string(),
                    e.session_id.unwrap_or_default(),
                    e.workspace_id.unwrap_or_default(),
                    e.metadata,
                );
            }
        }
    }
    Ok(())
}
