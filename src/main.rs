use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use minutes::db::Database;
use minutes::models::{CreateRecordingInput, CreateUserInput};
use minutes::{api, auth};

#[derive(Parser)]
#[command(name = "minutes")]
#[command(about = "Meeting-knowledge portal: recordings, transcripts, and todos")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the portal server
    Serve {
        /// Port for the HTTP API
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
    /// Create a user account
    AddUser {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: Option<String>,
        /// "admin" unlocks destructive operations
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Import a meeting recording
    AddRecording {
        #[arg(long)]
        name: String,
        #[arg(long)]
        audio_url: Option<String>,
        /// Path to a transcript text file
        #[arg(long)]
        transcript: Option<std::path::PathBuf>,
        #[arg(long)]
        summary: Option<String>,
        /// Duration in seconds
        #[arg(long)]
        duration: Option<i64>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "minutes=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port }) => serve(port).await,
        Some(Commands::AddUser {
            first_name,
            last_name,
            role,
            email,
            password,
        }) => {
            let db = open_database()?;
            db.migrate()?;
            let user = db.create_user(CreateUserInput {
                first_name,
                last_name,
                role,
                email: Some(email),
                password_hash: Some(auth::hash_password(&password)?),
            })?;
            println!("created user {}", user.id);
            Ok(())
        }
        Some(Commands::AddRecording {
            name,
            audio_url,
            transcript,
            summary,
            duration,
            notes,
        }) => {
            let db = open_database()?;
            db.migrate()?;
            let transcript = transcript.map(std::fs::read_to_string).transpose()?;
            let recording = db.create_recording(CreateRecordingInput {
                name,
                audio_url,
                transcript,
                summary,
                duration,
                notes,
            })?;
            println!("created recording {}", recording.id);
            Ok(())
        }
        None => serve(8080).await,
    }
}

async fn serve(port: u16) -> anyhow::Result<()> {
    let db = open_database()?;
    db.migrate()?;

    let signer = auth::TokenSigner::from_env()?;
    let app = api::create_router(db, signer);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Minutes server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn open_database() -> anyhow::Result<Database> {
    match std::env::var("MINUTES_DB") {
        Ok(path) => Ok(Database::open(path)?),
        Err(_) => Database::open_default(),
    }
}
