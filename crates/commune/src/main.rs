mod app;
mod config;
mod handlers;
mod state;
mod storage;
#[cfg(all(test, feature = "inmemory"))]
mod test_support;
mod tunnel;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use commune_auth::{AuthConfig, AuthState, PasswordHasher};
use commune_core::community::{validate_user, User};
use commune_core::storage::UserRepository;
use listenfd::ListenFd;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    app::create_app,
    config::{Config, DatabaseEndpoint},
    state::AppState,
    tunnel::{TunnelConfig, TunnelStatus},
};

/// Commune - Community platform backend
#[derive(Parser, Debug)]
#[command(name = "commune")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a staff superuser with a usable password
    CreateSuperuser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long, env = "SUPERUSER_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let config = Config::from_env();
    let tunnel_config = TunnelConfig::from_env();

    let (tunnel, endpoint) =
        tunnel::open_or_direct(&tunnel_config, config.database.direct_endpoint()).await;
    let tunnel_status = tunnel
        .as_ref()
        .map(|guard| guard.status())
        .unwrap_or_default();

    let result = match cli.command {
        Some(Command::CreateSuperuser {
            username,
            email,
            password,
        }) => create_superuser(&config, &endpoint, username, email, password).await,
        None => serve(&cli.host, cli.port, config, &endpoint, tunnel_status).await,
    };

    if let Some(guard) = tunnel {
        guard.close().await;
    }

    result
}

/// Installs the tracing subscriber. `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "commune=debug,commune_auth=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn serve(
    host: &str,
    port: u16,
    config: Config,
    endpoint: &DatabaseEndpoint,
    tunnel: TunnelStatus,
) -> Result<()> {
    let auth_config = AuthConfig::from_env().context("invalid auth configuration")?;

    let repo = Arc::new(storage::open(&config.database, endpoint).await?);
    let auth = AuthState::new(repo.clone(), auth_config)?;

    let state = AppState::new(repo, auth, &config, tunnel);

    tracing::info!(
        storage = state.storage,
        prefix = %state.api_prefix,
        tunnel = state.tunnel.active,
        "Application state ready"
    );

    let app = create_app(state);

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{host}:{port}");
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn create_superuser(
    config: &Config,
    endpoint: &DatabaseEndpoint,
    username: String,
    email: Option<String>,
    password: String,
) -> Result<()> {
    require_persistent_storage(storage::BACKEND, storage::PERSISTENT)?;

    if password.is_empty() {
        bail!("password cannot be empty");
    }

    let hash = PasswordHasher::new()
        .hash(&password)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    let user = User::new(username, hash, chrono::Utc::now())
        .with_email(email.filter(|e| !e.trim().is_empty()))
        .as_superuser();
    validate_user(&user)?;

    let repo = storage::open(&config.database, endpoint).await?;
    repo.create_user(&user)
        .await
        .with_context(|| format!("could not create user {}", user.username))?;

    tracing::info!(user_id = %user.id, username = %user.username, "Superuser created");
    Ok(())
}

/// Refuses one-shot writes against a backend that forgets them on exit.
fn require_persistent_storage(backend: &str, persistent: bool) -> Result<()> {
    if !persistent {
        bail!(
            "create-superuser needs persistent storage, but this build uses the {backend} backend \
             (rebuild with --no-default-features --features postgres)"
        );
    }
    Ok(())
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superuser_requires_persistent_storage() {
        let err = require_persistent_storage("inmemory", false).unwrap_err();
        assert!(err.to_string().contains("inmemory"));

        assert!(require_persistent_storage("postgres", true).is_ok());
    }

    #[cfg(feature = "inmemory")]
    #[tokio::test]
    async fn create_superuser_fails_on_inmemory_build() {
        let config = Config::default();
        let endpoint = config.database.direct_endpoint();

        let result = create_superuser(
            &config,
            &endpoint,
            "admin".to_string(),
            None,
            "s3cret-pass".to_string(),
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("persistent storage"));
    }
}
