//! In-memory store implementations.
//!
//! Used by unit and scenario tests; same contracts as the Postgres stores,
//! including the conditional-version save.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::{AggregateStatsStore, FixtureFilter, FixtureStore, NominationStore, PoolStore};
use crate::error::{EngineError, EngineResult};
use crate::models::{AggregateStats, Fixture, PlayerEntry, PlayerTotals, PoolDoc};
use crate::sport_config::Sport;

#[derive(Clone, Default)]
pub struct MemoryFixtureStore {
    fixtures: Arc<RwLock<HashMap<Uuid, Fixture>>>,
}

impl MemoryFixtureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FixtureStore for MemoryFixtureStore {
    async fn get(&self, sport: Sport, id: Uuid) -> EngineResult<Fixture> {
        self.fixtures
            .read()
            .await
            .get(&id)
            .filter(|f| f.sport == sport)
            .cloned()
            .ok_or_else(|| {
                EngineError::NotFound(format!("no {} fixture with id {}", sport.as_str(), id))
            })
    }

    async fn find(&self, sport: Sport, filter: &FixtureFilter) -> EngineResult<Vec<Fixture>> {
        let mut found: Vec<Fixture> = self
            .fixtures
            .read()
            .await
            .values()
            .filter(|f| f.sport == sport && filter.matches(f))
            .cloned()
            .collect();
        found.sort_by_key(|f| f.created_at);
        Ok(found)
    }

    async fn insert(&self, fixture: &Fixture) -> EngineResult<()> {
        self.fixtures
            .write()
            .await
            .insert(fixture.id, fixture.clone());
        Ok(())
    }

    async fn save(&self, fixture: &mut Fixture) -> EngineResult<()> {
        let mut fixtures = self.fixtures.write().await;
        let stored = fixtures.get_mut(&fixture.id).ok_or_else(|| {
            EngineError::NotFound(format!("no fixture with id {}", fixture.id))
        })?;
        if stored.version != fixture.version {
            return Err(EngineError::Dependency(format!(
                "version conflict on fixture {}: concurrent writer won",
                fixture.id
            )));
        }
        fixture.version += 1;
        fixture.updated_at = chrono::Utc::now();
        *stored = fixture.clone();
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryNominationStore {
    rosters: Arc<RwLock<HashMap<(Sport, String, i32), Vec<PlayerEntry>>>>,
}

impl MemoryNominationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_roster(
        &self,
        sport: Sport,
        department: &str,
        year: i32,
        roster: Vec<PlayerEntry>,
    ) {
        self.rosters
            .write()
            .await
            .insert((sport, department.to_string(), year), roster);
    }
}

#[async_trait]
impl NominationStore for MemoryNominationStore {
    async fn find_roster(
        &self,
        sport: Sport,
        department: &str,
        year: i32,
    ) -> EngineResult<Option<Vec<PlayerEntry>>> {
        Ok(self
            .rosters
            .read()
            .await
            .get(&(sport, department.to_string(), year))
            .cloned())
    }

    async fn departments(&self, sport: Sport, year: i32) -> EngineResult<Vec<String>> {
        let mut departments: Vec<String> = self
            .rosters
            .read()
            .await
            .keys()
            .filter(|(s, _, y)| *s == sport && *y == year)
            .map(|(_, d, _)| d.clone())
            .collect();
        departments.sort();
        Ok(departments)
    }
}

#[derive(Clone, Default)]
pub struct MemoryPoolStore {
    docs: Arc<RwLock<HashMap<(Sport, i32), PoolDoc>>>,
}

impl MemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PoolStore for MemoryPoolStore {
    async fn get(&self, sport: Sport, year: i32) -> EngineResult<Option<PoolDoc>> {
        Ok(self.docs.read().await.get(&(sport, year)).cloned())
    }

    async fn upsert(&self, doc: &PoolDoc) -> EngineResult<()> {
        self.docs
            .write()
            .await
            .insert((doc.sport, doc.year), doc.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryAggregateStatsStore {
    docs: Arc<RwLock<HashMap<(Sport, i32), AggregateStats>>>,
}

impl MemoryAggregateStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AggregateStatsStore for MemoryAggregateStatsStore {
    async fn upsert(&self, doc: &AggregateStats) -> EngineResult<()> {
        self.docs
            .write()
            .await
            .insert((doc.sport, doc.year), doc.clone());
        Ok(())
    }

    async fn get(&self, sport: Sport, year: i32) -> EngineResult<Option<AggregateStats>> {
        Ok(self.docs.read().await.get(&(sport, year)).cloned())
    }

    async fn update_player_totals(
        &self,
        sport: Sport,
        year: i32,
        totals: &PlayerTotals,
    ) -> EngineResult<()> {
        let mut docs = self.docs.write().await;
        let doc = docs.get_mut(&(sport, year)).ok_or_else(|| {
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
        Ok(())
    }
}
