//! Tournament finalization: the per-sport best-player ledger.
//!
//! Runs when a final concludes (and on demand for a re-run). Two phases:
//! seed a zeroed ledger entry for every nominated player of the sport/year,
//! then recompute each player's cumulative total and appearance count from
//! the concluded fixtures. Deterministic for a given store state, so a
//! re-run after a partial failure converges to the same ledger.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::db::{AggregateStatsStore, FixtureFilter, FixtureStore, NominationStore};
use crate::error::{EngineError, EngineResult};
use crate::models::{AggregateStats, Fixture, MatchStatus, PlayerTotals};
use crate::sport_config::Sport;

pub struct TournamentFinalizer {
    fixtures: Arc<dyn FixtureStore>,
    nominations: Arc<dyn NominationStore>,
    stats: Arc<dyn AggregateStatsStore>,
}

impl TournamentFinalizer {
    pub fn new(
        fixtures: Arc<dyn FixtureStore>,
        nominations: Arc<dyn NominationStore>,
        stats: Arc<dyn AggregateStatsStore>,
    ) -> Self {
        Self {
            fixtures,
            nominations,
            stats,
        }
    }

    /// Build (or rebuild) the aggregate ledger for a sport/year.
    pub async fn finalize(&self, sport: Sport, year: i32) -> EngineResult<AggregateStats> {
        if !sport.config().tracks_best_player {
            return Err(EngineError::InvalidInput(format!(
                "{} does not track a best-player ledger",
                sport.as_str()
            )));
        }

        let players = self.seed(sport, year).await?;
        let doc = AggregateStats {
            sport,
            year,
            players,
            generated_at: Utc::now(),
        };
        self.stats.upsert(&doc).await?;

        let concluded = self
            .fixtures
            .find(sport, &FixtureFilter::default().year(year).status(MatchStatus::Recent))
            .await?;
        debug!(
            "Recomputing {} {} ledger from {} concluded fixture(s)",
            sport.as_str(),
            year,
            concluded.len()
        );

        for seeded in &doc.players {
            let totals = recompute_player(seeded, sport, &concluded);
            self.stats.update_player_totals(sport, year, &totals).await?;
        }

        let finished = self
            .stats
            .get(sport, year)
            .await?
            .ok_or_else(|| EngineError::Dependency("ledger vanished during finalization".to_string()))?;
        info!(
            "Finalized {} {} ledger with {} player(s)",
            sport.as_str(),
            year,
            finished.players.len()
        );
        Ok(finished)
    }

    /// One zeroed entry per nominated player, ordered by department then
    /// roster position. Duplicate registrations keep their first occurrence.
    async fn seed(&self, sport: Sport, year: i32) -> EngineResult<Vec<PlayerTotals>> {
        let mut departments = self.nominations.departments(sport, year).await?;
        departments.sort();

        let mut seen = HashSet::new();
        let mut players = Vec::new();
        for dept in departments {
            let roster = self
                .nominations
                .find_roster(sport, &dept, year)
                .await?
                .unwrap_or_default();
            for entry in roster {
                if seen.insert(entry.reg_no.clone()) {
                    players.push(PlayerTotals {
                        reg_no: entry.reg_no,
                        name: entry.name,
                        department: dept.clone(),
                        total: 0,
                        matches_played: 0,
                    });
                }
            }
        }
        Ok(players)
    }
}

/// Sum a player's contributions across every concluded fixture they appear
/// in. Players absent from a fixture's rosters (or with short per-segment
/// arrays) simply contribute zero there.
fn recompute_player(seeded: &PlayerTotals, sport: Sport, concluded: &[Fixture]) -> PlayerTotals {
    let kind = sport.config().player_stat;
    let mut totals = seeded.clone();
    for fixture in concluded {
        let entry = fixture
            .nominations_t1
            .iter()
            .chain(fixture.nominations_t2.iter())
            .find(|p| p.reg_no == seeded.reg_no);
        if let Some(entry) = entry {
            totals.total += entry.stat_total(kind);
            totals.matches_played += 1;
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryAggregateStatsStore, MemoryFixtureStore, MemoryNominationStore};
    use crate::models::{PlayerEntry, Stage};

    fn player(reg: &str, goals: u16) -> PlayerEntry {
        let mut p = PlayerEntry::new(9, reg, &format!("Player {}", reg), "N-1", "A");
        p.goals = goals;
        p
    }

    async fn finalizer_with(
        fixtures: Vec<Fixture>,
    ) -> (TournamentFinalizer, Arc<MemoryAggregateStatsStore>) {
        let fixture_store = Arc::new(MemoryFixtureStore::new());
        for fx in &fixtures {
            fixture_store.insert(fx).await.unwrap();
        }
        let nominations = Arc::new(MemoryNominationStore::new());
        nominations
            .insert_roster(Sport::Football, "CS", 2026, vec![player("CS-9", 0)])
            .await;
        nominations
            .insert_roster(Sport::Football, "EE", 2026, vec![player("EE-4", 0)])
            .await;
        let stats = Arc::new(MemoryAggregateStatsStore::new());
        (
            TournamentFinalizer::new(fixture_store, nominations, stats.clone()),
            stats,
        )
    }

    fn concluded_fixture(goals_cs9: u16, goals_ee4: u16) -> Fixture {
        let mut fx = Fixture::new(
            Sport::Football,
            2026,
            Stage::PoolA,
            "CS",
            "EE",
            vec![player("CS-9", goals_cs9)],
            vec![player("EE-4", goals_ee4)],
        );
        fx.status = MatchStatus::Recent;
        fx
    }

    #[tokio::test]
    async fn test_ledger_totals_and_appearances() {
        let (finalizer, _) =
            finalizer_with(vec![concluded_fixture(2, 0), concluded_fixture(1, 3)]).await;

        let doc = finalizer.finalize(Sport::Football, 2026).await.unwrap();

        let cs9 = doc.players.iter().find(|p| p.reg_no == "CS-9").unwrap();
        assert_eq!(cs9.total, 3);
        assert_eq!(cs9.matches_played, 2);
        let ee4 = doc.players.iter().find(|p| p.reg_no == "EE-4").unwrap();
        assert_eq!(ee4.total, 3);
        assert_eq!(ee4.department, "EE");
    }

    #[tokio::test]
    async fn test_live_fixtures_are_ignored() {
        let mut live = concluded_fixture(5, 0);
        live.status = MatchStatus::Live;
        let (finalizer, _) = finalizer_with(vec![live]).await;

        let doc = finalizer.finalize(Sport::Football, 2026).await.unwrap();
        let cs9 = doc.players.iter().find(|p| p.reg_no == "CS-9").unwrap();
        assert_eq!(cs9.total, 0);
        assert_eq!(cs9.matches_played, 0);
    }

    #[tokio::test]
    async fn test_rerun_converges() {
        let (finalizer, _) = finalizer_with(vec![concluded_fixture(2, 1)]).await;

        let first = finalizer.finalize(Sport::Football, 2026).await.unwrap();
        let second = finalizer.finalize(Sport::Football, 2026).await.unwrap();
        assert_eq!(first.players, second.players);
    }

    #[tokio::test]
    async fn test_non_tracking_sport_is_rejected() {
        let (finalizer, _) = finalizer_with(vec![]).await;
        let err = finalizer.finalize(Sport::TugOfWar, 2026).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }
}
