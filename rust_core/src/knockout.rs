//! Knockout bracket propagation.
//!
//! Pool fixtures are scheduled with both teams known; knockout fixtures
//! further down the bracket carry the `TBD` placeholder until an earlier
//! round produces a winner. When a play-off resolves, the propagator
//! rewrites every placeholder slot for that sport/year with the winner and
//! backfills the slot's roster from the winner's nomination.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{execute_with_retry, FixtureFilter, FixtureStore, NominationStore};
use crate::error::{EngineError, EngineResult};
use crate::models::TBD;
use crate::sport_config::Sport;

const PROPAGATION_ATTEMPTS: u32 = 3;

#[derive(Debug, Default)]
pub struct PropagationOutcome {
    /// Fixtures whose placeholder slot was rewritten in this run.
    pub filled: u32,
    pub warnings: Vec<String>,
}

pub struct KnockoutPropagator {
    fixtures: Arc<dyn FixtureStore>,
    nominations: Arc<dyn NominationStore>,
}

impl KnockoutPropagator {
    pub fn new(fixtures: Arc<dyn FixtureStore>, nominations: Arc<dyn NominationStore>) -> Self {
        Self {
            fixtures,
            nominations,
        }
    }

    /// Resolve every `TBD` slot for this sport/year with the given winner.
    ///
    /// Idempotent: a fixture already naming the winner on either side is
    /// skipped, so re-running with the same winner makes no further change.
    /// A fixture with both slots open (a final awaiting two semis) gets only
    /// its first slot filled. No matching fixture is not an error.
    pub async fn propagate(
        &self,
        sport: Sport,
        year: i32,
        winner: &str,
    ) -> EngineResult<PropagationOutcome> {
        if winner == TBD {
            return Err(EngineError::InvalidInput(
                "cannot propagate the placeholder itself".to_string(),
            ));
        }

        let filter = FixtureFilter::default().year(year).team(TBD);
        let pending = self.fixtures.find(sport, &filter).await?;

        let mut outcome = PropagationOutcome::default();
        for fixture in &pending {
            let result = execute_with_retry(
                || self.fill_slot(sport, fixture.id, winner),
                PROPAGATION_ATTEMPTS,
            )
            .await;
            match result {
                Ok(true) => outcome.filled += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        "Failed to propagate {} into fixture {}: {}",
                        winner, fixture.id, e
                    );
                    outcome
                        .warnings
                        .push(format!("fixture {} not updated: {}", fixture.id, e));
                }
            }
        }

        if outcome.filled > 0 {
            info!(
                "Propagated {} into {} {} {} fixture(s)",
                winner,
                outcome.filled,
                sport.as_str(),
                year
            );
        }
        Ok(outcome)
    }

    /// Reload one fixture and rewrite its first open slot. Returns false
    /// when there is nothing to do (slot already taken, or the winner is
    /// already in the fixture).
    async fn fill_slot(&self, sport: Sport, id: Uuid, winner: &str) -> EngineResult<bool> {
        let mut fixture = self.fixtures.get(sport, id).await?;
        if fixture.side_of(winner).is_some() {
            return Ok(false);
        }

        let roster = self
            .nominations
            .find_roster(sport, winner, fixture.year)
            .await?
            .unwrap_or_default();
        if roster.is_empty() {
            warn!(
                "No nomination roster for {} ({} {}); filling slot without players",
                winner,
                sport.as_str(),
                fixture.year
            );
        }

        if fixture.team1 == TBD {
            fixture.team1 = winner.to_string();
            fixture.nominations_t1 = roster;
        } else if fixture.team2 == TBD {
            fixture.team2 = winner.to_string();
            fixture.nominations_t2 = roster;
        } else {
            return Ok(false);
        }

        self.fixtures.save(&mut fixture).await?;
        Ok(true)
    }
}
