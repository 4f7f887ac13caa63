use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use taskdesk_core::user::CreateUser;
use taskdesk_db::Db;
use taskdesk_server::auth;

#[derive(Parser)]
#[command(name = "taskdesk-server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a user and mint their first API token
    Useradd {
        username: String,
        /// Display name
        #[arg(long, default_value = "")]
        full_name: String,
    },
    /// Mint a new API token for an existing user
    Token { username: String },
    /// List all API tokens (metadata only, no secrets)
    ListTokens,
    /// Revoke (delete) an API token by id
    RevokeToken { id: i64 },
}

fn open_db() -> Result<Db> {
    match std::env::var_os("TASKDESK_DB") {
        Some(path) => Ok(Db::open(&PathBuf::from(path))?),
        None => Ok(Db::open_default()?),
    }
}

fn mint_token(db: &Db, user_id: i64) -> Result<()> {
    let raw = auth::generate_token();
    let token = db.insert_token(user_id, &auth::sha256_hex(&raw))?;
    eprintln!("Created API token (id: {})", token.id);
    // The raw token goes to stdout so it can be captured.
    println!("{raw}");
    eprintln!("\nSave this token — it cannot be retrieved again.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskdesk_server=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let db = open_db()?;

    match cli.command {
        Some(Commands::Useradd {
            username,
            full_name,
        }) => {
            let user = db.create_user(&CreateUser {
                username,
                full_name,
            })?;
            eprintln!("Created user {} (id: {})", user.username, user.id);
            mint_token(&db, user.id)?;
        }
        Some(Commands::Token { username }) => {
            let user = db.get_user_by_username(&username)?;
            mint_token(&db, user.id)?;
        }
        Some(Commands::ListTokens) => {
            let tokens = db.list_tokens()?;
            if tokens.is_empty() {
                eprintln!("No API tokens found.");
            } else {
                println!("{:<8} {:<8} {:<28} LAST USED", "ID", "USER", "CREATED");
                for token in tokens {
                    println!(
                        "{:<8} {:<8} {:<28} {}",
                        token.id,
                        token.user_id,
                        token.created_at,
                        token
                            .last_used_at
                            .map(|t| t.to_string())
                            .as_deref()
                            .unwrap_or("never"),
                    );
                }
            }
        }
        Some(Commands::RevokeToken { id }) => {
            db.delete_token(id)?;
            eprintln!("Revoked API token {id}");
        }
        None => {
            let bind = std::env::var("TASKDESK_BIND").unwrap_or_else(|_| "0.0.0.0".into());
            let port: u16 = std::env::var("TASKDESK_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3720);

            let addr = SocketAddr::new(bind.parse()?, port);
            let listener = TcpListener::bind(addr).await?;
            tracing::info!("taskdesk-server listening on http://{addr}");

            taskdesk_server::serve(listener, db).await?;
        }
    }

    Ok(())
}
