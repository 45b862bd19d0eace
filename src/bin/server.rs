//! activation-engine HTTP server binary.
//!
//! Wires configuration, persistence, randomness and the unit registry into
//! an activator and serves it over HTTP.
//!
//! # Environment Variables
//!
//! - `ACTIVATOR_CONFIG` - YAML engine configuration file
//! - `ACTIVATOR_TOPOLOGY` - YAML topology binding behaviour IDs to units
//! - `PORT` - HTTP port (default: 8080)
//! - `ACTIVATOR_STORE` - Storage backend: "memory" (default) or "sqlite"
//! - `ACTIVATOR_DB_PATH` - SQLite database path
//! - `ACTIVATOR_SEED` - Seed for deterministic candidate selection
//! - `ACTIVATOR_CACHE_POLICY` - "persistent", "revalidate" or "disabled"
//! - `RUST_LOG` - Tracing filter (default: "info")
//!
//! # Usage
//!
//! ```bash
//! ACTIVATOR_TOPOLOGY=topology.yaml cargo run --bin activation-server
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use activation_engine::activator::Activator;
use activation_engine::config::EngineConfig;
use activation_engine::dispatch::Dispatcher;
use activation_engine::random::{RandomService, SeededRandom, ThreadRandom};
use activation_engine::registry::{Topology, UnitRegistry};
use activation_engine::server::{app_router, AppState};
use activation_engine::storage::open_store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,activation_engine=debug".into()),
        )
        .init();

    let config = EngineConfig::from_env().context("loading engine configuration")?;

    let store = open_store(&config.storage, &config.retry).context("opening store")?;

    let random: Arc<dyn RandomService> = match config.random_seed {
        Some(seed) => {
            tracing::info!("Using seeded random source ({})", seed);
            Arc::new(SeededRandom::new(seed))
        }
        None => Arc::new(ThreadRandom),
    };

    let mut registry = UnitRegistry::with_builtins();
    match std::env::var("ACTIVATOR_TOPOLOGY") {
        Ok(path) => {
            let topology = Topology::from_file(Path::new(&path))
                .with_context(|| format!("loading topology {}", path))?;
            registry.apply_topology(&topology)?;
        }
        Err(_) => tracing::warn!("ACTIVATOR_TOPOLOGY not set, no behaviours bound"),
    }
    let registry = Arc::new(registry);

    let activator = Activator::new(store, random, registry.clone(), &config);
    tracing::info!("Cache policy: {:?}", activator.cache_policy());
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(activator), registry));

    let app = app_router(AppState::new(dispatcher));

    tracing::info!("activation-engine server starting on {}", config.server.bind);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health     - liveness probe");
    tracing::info!("  POST /signals    - deliver a signal");
    tracing::info!("  GET  /behaviours - list bound behaviours");

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
        .context("server failed")?;

    Ok(())
}
