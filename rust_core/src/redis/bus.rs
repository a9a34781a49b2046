use anyhow::{Context, Result};
use redis::{aio::Connection, AsyncCommands, Client};
use serde::Serialize;
use std::env;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Channel carrying lifecycle commands into the match service.
pub const COMMAND_CHANNEL: &str = "sportsmeet:commands";
/// Channel carrying FixtureResolved events out of the engine.
pub const RESOLVED_CHANNEL: &str = "sportsmeet:fixture_resolved";
/// Channel carrying per-operation outcomes back to callers.
pub const OUTCOME_CHANNEL: &str = "sportsmeet:outcomes";

#[derive(Clone)]
pub struct RedisBus {
    client: Client,
    // Subscriptions hand their connection off to a task, so they get a
    // fresh one each time; publishes share this one.
    connection: Arc<Mutex<Connection>>,
}

impl RedisBus {
    pub async fn new() -> Result<Self> {
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::with_url(&redis_url).await
    }

    pub async fn with_url(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let connection = client.get_async_connection().await?;
        Ok(Self {
            client,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    pub async fn publish<T: Serialize>(&self, channel: &str, message: &T) -> Result<()> {
        let payload = serde_json::to_string(message)?;
        let mut conn = self.connection.lock().await;
        conn.publish::<_, _, ()>(channel, payload)
            .await
            .context("Failed to publish message")?;
        Ok(())
    }

    pub async fn subscribe(&self, channel: &str) -> Result<redis::aio::PubSub> {
        let conn = self.client.get_async_connection().await?;
        let mut pubsub = conn.into_pubsub();
        pubsub.subscribe(channel).await?;
        Ok(pubsub)
    }

    pub async fn psubscribe(&self, pattern: &str) -> Result<redis::aio::PubSub> {
        let conn = self.client.get_async_connection().await?;
        let mut pubsub = conn.into_pubsub();
        pubsub.psubscribe(pattern).await?;
        Ok(pubsub)
    }
}
