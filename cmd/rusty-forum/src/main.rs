//! # rusty-forum
//!
//! Assembles the forum server from configuration: picks the entity store,
//! builds the services and serves the axum router until a shutdown signal.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{http, AppState};
use configs::{LogSettings, Settings, StorageBackend};
use domains::Repositories;
use services::ReputationPolicy;
use storage_adapters::MemoryStore;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.log);
    settings.log_sources();

    let repos = open_store(&settings).await?;
    let policy = ReputationPolicy {
        vote_threshold: settings.reputation.vote_threshold,
        upvote_reward: settings.reputation.upvote_reward,
        downvote_penalty: settings.reputation.downvote_penalty,
    };
    info!(?policy, "reputation policy");

    let state = Arc::new(AppState::new(repos, policy));
    let app = http::router(state);

    let address = settings.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("Server shut down");
    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_store(settings: &Settings) -> anyhow::Result<Repositories> {
    match settings.database.backend {
        StorageBackend::Memory => {
            warn!("using the in-memory store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()).into_repositories())
        }
        #[cfg(feature = "db-postgres")]
        StorageBackend::Postgres => {
            let url = settings.database.url()?;
            let store =
                storage_adapters::PostgresStore::connect(url, settings.database.max_connections)
                    .await
                    .context("connecting to postgres")?;
            info!("connected to postgres");
            Ok(Arc::new(store).into_repositories())
        }
        #[cfg(not(feature = "db-postgres"))]
        StorageBackend::Postgres => {
            anyhow::bail!("postgres backend requested but the db-postgres feature is disabled")
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
