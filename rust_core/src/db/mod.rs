//! Store interfaces and persistence for tournament documents.
//!
//! This module provides:
//! - Store traits for fixtures, nomination rosters, pools, and aggregate stats
//! - Postgres-backed implementations (jsonb documents)
//! - In-memory implementations for tests
//! - Connection pool configuration and a retry helper for transient failures
//!
//! Repositories are constructed once at startup and injected explicitly;
//! nothing here is looked up through ambient global state.

pub mod fixtures;
pub mod memory;
pub mod nominations;
pub mod pool;
pub mod pools;
pub mod retry;

pub use fixtures::PgFixtureStore;
pub use memory::{
    MemoryAggregateStatsStore, MemoryFixtureStore, MemoryNominationStore, MemoryPoolStore,
};
pub use nominations::{PgAggregateStatsStore, PgNominationStore};
pub use pool::{create_pool, DbPoolConfig};
pub use pools::PgPoolStore;
pub use retry::{execute_with_retry, execute_with_retry_custom};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    AggregateStats, Fixture, MatchStatus, PlayerEntry, PlayerTotals, PoolDoc, Stage,
};
use crate::sport_config::Sport;

/// Query filter for fixture lookups. An empty filter matches every fixture
/// of the sport.
#[derive(Debug, Clone, Default)]
pub struct FixtureFilter {
    pub year: Option<i32>,
    pub stage: Option<Stage>,
    pub status: Option<MatchStatus>,
    /// Matches fixtures where either side equals this team name (including
    /// the TBD sentinel).
    pub team: Option<String>,
}

impl FixtureFilter {
    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn status(mut self, status: MatchStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn team(mut self, team: &str) -> Self {
        self.team = Some(team.to_string());
        self
    }

    pub fn matches(&self, fixture: &Fixture) -> bool {
        self.year.map_or(true, |y| fixture.year == y)
            && self.stage.map_or(true, |s| fixture.stage == s)
            && self.status.map_or(true, |s| fixture.status == s)
            && self
                .team
                .as_ref()
                .map_or(true, |t| fixture.team1 == *t || fixture.team2 == *t)
    }
}

/// Per-sport collection of match documents.
#[async_trait]
pub trait FixtureStore: Send + Sync {
    async fn get(&self, sport: Sport, id: Uuid) -> EngineResult<Fixture>;

    async fn find(&self, sport: Sport, filter: &FixtureFilter) -> EngineResult<Vec<Fixture>>;

    async fn insert(&self, fixture: &Fixture) -> EngineResult<()>;

    /// Persist a mutated fixture. The update is conditional on the version
    /// the fixture was loaded with; a concurrent writer losing the race gets
    /// a retryable `Dependency` error instead of silently overwriting.
    /// Bumps `fixture.version` on success.
    async fn save(&self, fixture: &mut Fixture) -> EngineResult<()>;
}

/// Per-department, per-sport, per-year roster of eligible players.
#[async_trait]
pub trait NominationStore: Send + Sync {
    async fn find_roster(
        &self,
        sport: Sport,
        department: &str,
        year: i32,
    ) -> EngineResult<Option<Vec<PlayerEntry>>>;

    /// All departments with a nomination roster for this sport/year.
    async fn departments(&self, sport: Sport, year: i32) -> EngineResult<Vec<String>>;
}

/// Per-sport, per-year round-robin pool grouping. The lifecycle engine only
/// reads these; pool generation happens upstream of this service.
#[async_trait]
pub trait PoolStore: Send + Sync {
    async fn get(&self, sport: Sport, year: i32) -> EngineResult<Option<PoolDoc>>;

    async fn upsert(&self, doc: &PoolDoc) -> EngineResult<()>;
}

/// Per-sport, per-year best-player ledger, written only by the tournament
/// finalizer.
#[async_trait]
pub trait AggregateStatsStore: Send + Sync {
    async fn upsert(&self, doc: &AggregateStats) -> EngineResult<()>;

    async fn get(&self, sport: Sport, year: i32) -> EngineResult<Option<AggregateStats>>;

    async fn update_player_totals(
        &self,
        sport: Sport,
        year: i32,
        totals: &PlayerTotals,
    ) -> EngineResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matching() {
        let fx = Fixture::new(
            Sport::Football,
            2026,
            Stage::PlayOff,
            "CS",
            "EE",
            vec![],
            vec![],
        );

        assert!(FixtureFilter::default().matches(&fx));
        assert!(FixtureFilter::default()
            .year(2026)
            .stage(Stage::PlayOff)
            .matches(&fx));
        assert!(FixtureFilter::default().team("EE").matches(&fx));
        assert!(!FixtureFilter::default().year(2025).matches(&fx));
        assert!(!FixtureFilter::default()
            .status(MatchStatus::Live)
            .matches(&fx));
        assert!(!FixtureFilter::default().team("ME").matches(&fx));
    }
}
