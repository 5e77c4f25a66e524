use clap::{Parser, Subcommand};
use erk_client::{
    ClientConfig, CreateSessionRequest, EventKind, SendMessageRequest, SessionClient,
};
use std::io::Write;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "erk")]
#[command(about = "Client for the erk session API", long_about = None)]
#[command(version)]
struct Cli {
    /// Server root URL.
    #[arg(long, env = "ERK_BASE_URL", default_value = "http://localhost:8937", global = true)]
    base_url: String,

    /// Bearer token for authenticated servers.
    #[arg(long, env = "ERK_TOKEN", global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a session bound to a working directory.
    Create {
        #[arg(long, default_value = ".")]
        working_directory: String,

        #[arg(long)]
        external_id: Option<String>,
    },

    /// List all sessions.
    List,

    /// Show one session.
    Get { session_id: String },

    /// Delete a session.
    Delete { session_id: String },

    /// Send a message and stream the response. Ctrl-C cancels.
    Send {
        session_id: String,

        message: String,

        #[arg(long)]
        timeout_seconds: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = SessionClient::new(ClientConfig {
        base_url: cli.base_url,
        token: cli.token,
    });

    match cli.command {
        Commands::Create {
            working_directory,
            external_id,
        } => {
            let working_directory = std::fs::canonicalize(&working_directory)?
                .to_string_lossy()
                .into_owned();
            let session = client
                .create_session(&CreateSessionRequest {
                    working_directory,
                    external_id,
                })
                .await?;
            println!("{}", session.session_id);
        }

        Commands::List => {
            for session in client.list_sessions().await? {
                println!(
                    "{}  {:<10}  {}",
                    session.session_id,
                    format!("{:?}", session.status).to_lowercase(),
                    session.working_directory
                );
            }
        }

        Commands::Get { session_id } => {
            let session = client.get_session(&session_id).await?;
            println!("session_id:         {}", session.session_id);
            if let Some(external_id) = &session.external_id {
                println!("external_id:        {external_id}");
            }
            println!("working_directory:  {}", session.working_directory);
            println!("status:             {:?}", session.status);
            println!("created_at:         {}", session.created_at.to_rfc3339());
            println!("last_activity:      {}", session.last_activity.to_rfc3339());
            if let Some(count) = session.message_count {
                println!("message_count:      {count}");
            }
        }

        Commands::Delete { session_id } => {
            client.delete_session(&session_id).await?;
            println!("deleted {session_id}");
        }

        Commands::Send {
            session_id,
            message,
            timeout_seconds,
        } => {
            let request = SendMessageRequest {
                content: message,
                timeout_seconds,
            };

            let handle = client.send_message(&session_id, request, print_event);

            let cancel = handle.cancellation_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("\ncancelling...");
                    cancel.cancel();
                }
            });

            handle.wait().await;
            println!();
        }
    }

    Ok(())
}

fn print_event(event: erk_client::StreamEvent) {
    match event.kind {
        EventKind::Text => {
            if let Some(content) = event.text() {
                print!("{content}");
                let _ = std::io::stdout().flush();
            }
        }
        EventKind::ToolUse => {
            let name = event
                .data
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("?");
            eprintln!("[tool: {name}]");
        }
        EventKind::ToolResult => {}
        EventKind::Error => {
            let message = event.error_message().unwrap_or("unknown stream error");
            eprintln!("error: {message}");
        }
        EventKind::Done => {}
        EventKind::Unknown(_) => {}
    }
}
