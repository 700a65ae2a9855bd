use clap::Subcommand;
use writinglab_core::{Database, SessionId};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List saved sessions, newest first
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one saved session document
    Show {
        /// Session ID
        id: String,
    },
}

pub fn run(action: SessionsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        SessionsAction::List { json } => {
            let sessions = db.list_sessions()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
            } else if sessions.is_empty() {
                println!("no saved sessions");
            } else {
                for s in sessions {
                    println!(
                        "{}  {}  {:>5} words  {:>4} events",
                        s.id,
                        s.started_at.format("%Y-%m-%d %H:%M"),
                        s.word_count,
                        s.event_count
                    );
                }
            }
        }
        SessionsAction::Show { id } => match db.load_session(&SessionId::new(id.as_str()))? {
            Some(record) => println!("{}", record.to_json_pretty()?),
            None => return Err(format!("session not found: {id}").into()),
        },
    }
    Ok(())
}
