//! Activity Portal - role-gated activity management service

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod import;

use config::{Config, DEFAULT_MARKER_SECRET, LogFormat, LoggingConfig};
use portal_api::{AppState, create_router};
use portal_auth::{Argon2Hasher, Authenticator, MarkerMode, MemoryLockoutStore, RoleMarker};
use portal_db::{Database, NewUser, UserRole};

/// Activity Portal - role-gated activity management service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "PORTAL_CONFIG")]
    config: String,

    /// Bind address
    #[arg(long, env = "PORTAL_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "PORTAL_PORT")]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create or update users from a JSON file
    ImportUsers {
        /// JSON array of {username, password, role}
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    init_logging(&config.logging);

    info!("Starting Activity Portal v{}", env!("CARGO_PKG_VERSION"));

    let db = open_database(&config).await?;

    match args.command {
        Some(Command::ImportUsers { file }) => {
            let users = import::read_import_file(&file)?;
            let count = import::import_users(&db, &Argon2Hasher, users).await?;
            info!("Imported {} users from {}", count, file.display());
            Ok(())
        }
        Some(Command::Serve) | None => serve(config, db, args.bind, args.port).await,
    }
}

async fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = Path::new(&config.database.path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    Ok(Database::new(&config.database.url()).await?)
}

async fn serve(config: Config, db: Database, bind: Option<String>, port: Option<u16>) -> Result<()> {
    // Create default admin user if no users exist
    if !db.has_users().await? {
        let password_hash = portal_auth::hash_password("admin")?;
        db.insert_user(NewUser {
            username: "admin".to_string(),
            password_hash,
            role: UserRole::Admin,
        })
        .await?;
        warn!("Default admin user created (username: admin, password: admin); change it now");
    }

    if config.auth.marker == MarkerMode::Signed
        && config.auth.marker_secret == DEFAULT_MARKER_SECRET
    {
        warn!("Signed role markers use the sample secret; set auth.marker_secret");
    }
    if config.auth.marker == MarkerMode::Plain {
        warn!("Role markers are unsigned; any client can claim a role by setting the cookie");
    }

    let policy = config.auth.lockout.policy()?;
    let auth = Authenticator::new(
        Arc::new(db.clone()),
        Arc::new(MemoryLockoutStore::for_policy(&policy)),
        policy,
    );
    let marker = RoleMarker::new(config.auth.marker, &config.auth.marker_secret);

    let state = AppState::new(
        db,
        Arc::new(auth),
        marker,
        config.auth.cookie_secure,
        config.auth.trust_peer_address,
    );

    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = bind.unwrap_or(config.server.bind_address);
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
