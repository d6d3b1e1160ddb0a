use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use botforge::config::{GitHubConfig, ServerConfig};
use botforge::github::GitHubClient;
use botforge::secrets::TokenCipher;
use botforge::server::{AppState, create_router};
use botforge::store::{SqliteStore, Store};
use botforge::types::Role;

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[derive(Parser)]
#[command(name = "botforge")]
#[command(about = "A chatbot repository provisioning server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database and the token-sealing key
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Promote a GitHub login to the admin role
    Promote {
        /// GitHub login of the identity to promote
        login: String,

        /// Data directory holding the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

/// Loads the token-sealing key, generating one on first run. The key never
/// leaves the data directory.
fn load_or_create_cipher(path: &Path) -> anyhow::Result<TokenCipher> {
    if path.exists() {
        let encoded = fs::read_to_string(path)?;
        return Ok(TokenCipher::from_hex(&encoded)?);
    }

    let cipher = TokenCipher::generate();
    fs::write(path, cipher.key_hex())?;

    #[cfg(unix)]
    set_restrictive_permissions(path);

    info!("Generated token-sealing key at {}", path.display());
    Ok(cipher)
}

fn run_promote(login: &str, data_dir: &str) -> anyhow::Result<()> {
    let db_path = Path::new(data_dir).join("botforge.db");
    if !db_path.exists() {
        bail!(
            "No database found at {}. Start the server first with 'botforge serve'.",
            db_path.display()
        );
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    let Some(identity) = store.get_identity_by_login(login)? else {
        bail!("No identity with login '{login}'. The user must log in once before promotion.");
    };

    // First-login default rows exist for anyone who has logged in, but make
    // sure before flipping the value.
    store.ensure_role(&identity.id)?;
    store.set_role(&identity.id, Role::Admin)?;

    println!("Promoted '{login}' to admin.");
    Ok(())
}

async fn run_serve(config: ServerConfig) -> anyhow::Result<()> {
    fs::create_dir_all(&config.data_dir)?;

    let github_config = GitHubConfig::from_env()?;
    let github = GitHubClient::new(github_config)?;

    let cipher = load_or_create_cipher(&config.token_key_path())?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let state = Arc::new(AppState::new(Arc::new(store), Arc::new(github), cipher));

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("botforge=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Promote { login, data_dir } => {
                run_promote(&login, &data_dir)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
            };
            run_serve(config).await?;
        }
    }

    Ok(())
}
