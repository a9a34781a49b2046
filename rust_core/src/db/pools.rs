//! Postgres-backed round-robin pool groupings.
//!
//! ```sql
//! CREATE TABLE pools (
//!     sport TEXT NOT NULL,
//!     year  INT NOT NULL,
//!     doc   JSONB NOT NULL,
//!     PRIMARY KEY (sport, year)
//! );
//! ```

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::db::PoolStore;
use crate::error::{EngineError, EngineResult};
use crate::models::PoolDoc;
use crate::sport_config::Sport;

#[derive(Clone)]
pub struct PgPoolStore {
    pool: PgPool,
}

impl PgPoolStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PoolStore for PgPoolStore {
    async fn get(&self, sport: Sport, year: i32) -> EngineResult<Option<PoolDoc>> {
        let row = sqlx::query("SELECT doc FROM pools WHERE sport = $1 AND year = $2")
            .bind(sport.as_str())
            .bind(year)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let doc: serde_json::Value = row.try_get("doc").map_err(EngineError::from)?;
                Ok(Some(serde_json::from_value(doc)?))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, doc: &PoolDoc) -> EngineResult<()> {
        let value = serde_json::to_value(doc)?;
        sqlx::query(
            r#"
            INSERT INTO pools (sport, year, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (sport, year) DO UPDATE SET doc = EXCLUDED.doc
            "#,
        )
        .bind(doc.sport.as_str())
        .bind(doc.year)
        .bind(value)
        .execute(&self.pool)
        .await?;

        debug!(
            "Upserted pools for {} {} ({} + {} teams)",
            doc.sport.as_str(),
            doc.year,
            doc.pool_a.len(),
            doc.pool_b.len()
        );
        Ok(())
    }
}
