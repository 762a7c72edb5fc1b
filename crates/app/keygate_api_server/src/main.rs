//! Keygate API server binary.
//!
//! Serves registration, login and token-protected endpoints over HTTP,
//! backed by PostgreSQL when `--database-url` is given and by an in-memory
//! store otherwise.

use std::sync::Arc;

use clap::Parser;
use keygate_api::config::ApiConfig;
use keygate_core::auth::{MemoryUserStore, PgUserStore, UserStore};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "keygate_api_server", about = "Keygate API server")]
struct Args {
    /// Port to listen on (0 = ephemeral). Overrides the port in `BIND_ADDR`.
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind. Overrides the host in `BIND_ADDR`.
    #[arg(long)]
    host: Option<String>,

    /// PostgreSQL connection URL. Without it, accounts live in memory only.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Token lifetime in seconds.
    #[arg(long, env = "JWT_EXPIRATION_SECS", default_value_t = 86_400)]
    jwt_expiry_secs: i64,

    /// bcrypt cost for new password hashes.
    #[arg(long, env = "BCRYPT_COST", default_value_t = 10)]
    bcrypt_cost: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,keygate_api=debug,keygate_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    // Flags win over the environment; the signing secret only comes from env or file.
    let env = ApiConfig::from_env();
    let config = ApiConfig {
        bind_addr: bind_addr(&env.bind_addr, args.host.as_deref(), args.port),
        database_url: args.database_url.filter(|url| !url.is_empty()),
        jwt_expiry_secs: args.jwt_expiry_secs,
        bcrypt_cost: args.bcrypt_cost,
        ..env
    };

    info!(?config, "starting keygate_api_server");

    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => {
            info!(
                max_connections = args.max_connections,
                "configuring connection pool"
            );
            let pool = PgPoolOptions::new()
                .max_connections(args.max_connections)
                .acquire_timeout(std::time::Duration::from_secs(30))
                .connect(url)
                .await?;

            info!("running database migrations");
            keygate_core::migrate::migrate(&pool).await?;
            Arc::new(PgUserStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; accounts are kept in memory and lost on exit");
            Arc::new(MemoryUserStore::new())
        }
    };

    let state = keygate_api::AppState::new(store, &config)?;
    let app = keygate_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("ctrl-c received, shutting down");
                    shutdown.cancel();
                }
                Err(e) => warn!(error = %e, "could not listen for ctrl-c"),
            }
        }
    });

    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}

/// Apply `--host`/`--port` over the `BIND_ADDR` default, each replacing only
/// its own half.
fn bind_addr(default: &str, host: Option<&str>, port: Option<u16>) -> String {
    let (default_host, default_port) = default.rsplit_once(':').unwrap_or((default, "8080"));
    let host = host.unwrap_or(default_host);
    match port {
        Some(port) => format!("{host}:{port}"),
        None => format!("{host}:{default_port}"),
    }
}
