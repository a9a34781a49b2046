//! Postgres-backed nomination rosters and aggregate-stats ledger.
//!
//! ```sql
//! CREATE TABLE nominations (
//!     sport       TEXT NOT NULL,
//!     department  TEXT NOT NULL,
//!     year        INT NOT NULL,
//!     roster      JSONB NOT NULL,
//!     PRIMARY KEY (sport, department, year)
//! );
//!
//! CREATE TABLE aggregate_stats (
//!     sport       TEXT NOT NULL,
//!     year        INT NOT NULL,
//!     doc         JSONB NOT NULL,
//!     PRIMARY KEY (sport, year)
//! );
//! ```

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::db::{AggregateStatsStore, NominationStore};
use crate::error::{EngineError, EngineResult};
use crate::models::{AggregateStats, PlayerEntry, PlayerTotals};
use crate::sport_config::Sport;

#[derive(Clone)]
pub struct PgNominationStore {
    pool: PgPool,
}

impl PgNominationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NominationStore for PgNominationStore {
    async fn find_roster(
        &self,
        sport: Sport,
        department: &str,
        year: i32,
    ) -> EngineResult<Option<Vec<PlayerEntry>>> {
        let row = sqlx::query(
            "SELECT roster FROM nominations WHERE sport = $1 AND department = $2 AND year = $3",
        )
        .bind(sport.as_str())
        .bind(department)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let roster: serde_json::Value = row.try_get("roster").map_err(EngineError::from)?;
                Ok(Some(serde_json::from_value(roster)?))
            }
            None => Ok(None),
        }
    }

    async fn departments(&self, sport: Sport, year: i32) -> EngineResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT department FROM nominations WHERE sport = $1 AND year = $2 ORDER BY department",
        )
        .bind(sport.as_str())
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| r.try_get::<String, _>("department").map_err(EngineError::from))
            .collect()
    }
}

#[derive(Clone)]
pub struct PgAggregateStatsStore {
    pool: PgPool,
}

impl PgAggregateStatsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AggregateStatsStore for PgAggregateStatsStore {
    async fn upsert(&self, doc: &AggregateStats) -> EngineResult<()> {
        let value = serde_json::to_value(doc)?;
        sqlx::query(
            r#"
            INSERT INTO aggregate_stats (sport, year, doc)
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
            "Upserted aggregate stats for {} {} ({} players)",
            doc.sport.as_str(),
            doc.year,
            doc.players.len()
        );
        Ok(())
    }

    async fn get(&self, sport: Sport, year: i32) -> EngineResult<Option<AggregateStats>> {
        let row = sqlx::query("SELECT doc FROM aggregate_stats WHERE sport = $1 AND year = $2")
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

    async fn update_player_totals(
        &self,
        sport: Sport,
        year: i32,
        totals: &PlayerTotals,
    ) -> EngineResult<()> {
        // Read-modify-write of the whole document; the finalizer is the
        // only writer so there is no contention to guard against.
        let mut doc = self.get(sport, year).await?.ok_or_else(|| {
            EngineError::NotFound(format!(
                "no aggregate stats for {} {}",
                sport.as_str(),
                year
            ))
        })?;

        match doc.players.iter_mut().find(|p| p.reg_no == totals.reg_no) {
            Some(entry) => *entry = totals.clone(),
            None => doc.players.push(totals.clone()),
        }

        self.upsert(&doc).await
    }
}
