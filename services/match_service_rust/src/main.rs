//! Match Service
//!
//! Bus-driven worker applying match lifecycle operations for the
//! intramural tournament backend.
//!
//! This service:
//! - Consumes lifecycle commands (start, score, swap, advance, stop) from Redis
//! - Applies them through the match lifecycle engine against Postgres
//! - Publishes per-operation outcomes back to the caller channel
//! - Emits FixtureResolved events when a fixture concludes

mod config;
mod listener;

use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;

use sportsmeet_rust_core::db::{
    create_pool, DbPoolConfig, PgAggregateStatsStore, PgFixtureStore, PgNominationStore,
};
use sportsmeet_rust_core::engine::{MatchLifecycleEngine, ResolutionHooks};
use sportsmeet_rust_core::knockout::KnockoutPropagator;
use sportsmeet_rust_core::redis::RedisBus;
use sportsmeet_rust_core::stats::TournamentFinalizer;

use config::{load_database_url, ServiceConfig};
use listener::CommandListener;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Match Service...");

    let service_config = ServiceConfig::from_env();
    let pool = create_pool(&load_database_url(), &DbPoolConfig::from_env()).await?;

    let fixtures = Arc::new(PgFixtureStore::new(pool.clone()));
    let nominations = Arc::new(PgNominationStore::new(pool.clone()));
    let stats = Arc::new(PgAggregateStatsStore::new(pool));

    let hooks = ResolutionHooks::new(
        KnockoutPropagator::new(fixtures.clone(), nominations.clone()),
        TournamentFinalizer::new(fixtures.clone(), nominations, stats),
    );
    let engine = Arc::new(MatchLifecycleEngine::new(fixtures, hooks));

    let bus = RedisBus::new().await?;
    let listener = CommandListener::new(engine, bus, service_config);

    listener.run().await
}
