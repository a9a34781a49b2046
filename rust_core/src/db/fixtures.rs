//! Postgres-backed fixture store.
//!
//! Fixtures are stored one-per-row with the full document in a `jsonb`
//! column and the query axes (sport, year, stage, status) denormalized into
//! plain columns:
//!
//! ```sql
//! CREATE TABLE fixtures (
//!     id          UUID PRIMARY KEY,
//!     sport       TEXT NOT NULL,
//!     year        INT NOT NULL,
//!     stage       TEXT NOT NULL,
//!     status      TEXT NOT NULL,
//!     version     BIGINT NOT NULL,
//!     doc         JSONB NOT NULL,
//!     updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! `save` is a conditional update on `version`: the fixture is the unit of
//! isolation and at most one live mutation per fixture may win.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::db::{FixtureFilter, FixtureStore};
use crate::error::{EngineError, EngineResult};
use crate::models::Fixture;
use crate::sport_config::Sport;

#[derive(Clone)]
pub struct PgFixtureStore {
    pool: PgPool,
}

impl PgFixtureStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode_row(row: &sqlx::postgres::PgRow) -> EngineResult<Fixture> {
    let doc: serde_json::Value = row.try_get("doc").map_err(EngineError::from)?;
    Ok(serde_json::from_value(doc)?)
}

#[async_trait]
impl FixtureStore for PgFixtureStore {
    async fn get(&self, sport: Sport, id: Uuid) -> EngineResult<Fixture> {
        let row = sqlx::query("SELECT doc FROM fixtures WHERE sport = $1 AND id = $2")
            .bind(sport.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!("no {} fixture with id {}", sport.as_str(), id))
            })?;

        decode_row(&row)
    }

    async fn find(&self, sport: Sport, filter: &FixtureFilter) -> EngineResult<Vec<Fixture>> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM fixtures
            WHERE sport = $1
              AND ($2::int  IS NULL OR year = $2)
              AND ($3::text IS NULL OR stage = $3)
              AND ($4::text IS NULL OR status = $4)
            ORDER BY updated_at
            "#,
        )
        .bind(sport.as_str())
        .bind(filter.year)
        .bind(filter.stage.map(|s| s.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        let mut fixtures = Vec::with_capacity(rows.len());
        for row in &rows {
            let fixture = decode_row(row)?;
            // Team matching stays in one place instead of duplicating the
            // either-side OR in SQL.
            if filter.matches(&fixture) {
                fixtures.push(fixture);
            }
        }
        Ok(fixtures)
    }

    async fn insert(&self, fixture: &Fixture) -> EngineResult<()> {
        let doc = serde_json::to_value(fixture)?;
        sqlx::query(
            r#"
            INSERT INTO fixtures (id, sport, year, stage, status, version, doc, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            "#,
        )
        .bind(fixture.id)
        .bind(fixture.sport.as_str())
        .bind(fixture.year)
        .bind(fixture.stage.as_str())
        .bind(fixture.status.as_str())
        .bind(fixture.version)
        .bind(doc)
        .execute(&self.pool)
        .await?;

        debug!(
            "Inserted fixture {} ({} {} vs {})",
            fixture.id,
            fixture.sport.as_str(),
            fixture.team1,
            fixture.team2
        );
        Ok(())
    }

    async fn save(&self, fixture: &mut Fixture) -> EngineResult<()> {
        let expected = fixture.version;
        fixture.version += 1;
        fixture.updated_at = chrono::Utc::now();
        let doc = serde_json::to_value(&*fixture)?;

        let result = sqlx::query(
            r#"
            UPDATE fixtures
            SET doc = $1, status = $2, version = $3, updated_at = NOW()
            WHERE id = $4 AND version = $5
            "#,
        )
        .bind(doc)
        .bind(fixture.status.as_str())
        .bind(fixture.version)
        .bind(fixture.id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            fixture.version = expected;
            return Err(EngineError::Dependency(format!(
                "version conflict on fixture {}: concurrent writer won",
                fixture.id
            )));
        }
        Ok(())
    }
}
