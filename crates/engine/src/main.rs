//! Accord engine daemon.
//!
//! Runs the engine over the in-memory store adapter: useful for local
//! development and as the reference wiring for embedders that bring
//! their own store. Reconciles vocabulary edges on a timer and flushes
//! pending coalesced writes on shutdown.

use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use accord_domain::UserId;
use accord_engine::infrastructure::identity::FixedIdentity;
use accord_engine::{App, EngineConfig};

const RECONCILE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "accord_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Accord Engine");

    let identity = match std::env::var("ACCORD_PRINCIPAL") {
        Ok(raw) => FixedIdentity::of(UserId::parse(raw)?),
        Err(_) => FixedIdentity::anonymous(),
    };
    let config = EngineConfig::from_env();
    tracing::info!(?config, "engine configuration");

    let (app, _store) = App::in_memory(identity, config);

    let mut reconcile = tokio::time::interval(RECONCILE_INTERVAL);
    loop {
        tokio::select! {
            _ = reconcile.tick() => {
                if let Err(err) = app.reconciler.reconcile_vocabulary().await {
                    tracing::error!(%err, "vocabulary reconciliation failed");
                }
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
        }
    }

    tracing::info!("Shutting down, flushing pending writes");
    app.coalescer.flush_all().await;
    Ok(())
}

fn load_dotenv() {
    for filename in [".env.local", ".env"] {
        if std::path::Path::new(filename).exists() {
            let _ = dotenvy::from_filename_override(filename);
        }
    }
}
