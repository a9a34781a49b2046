//! Post-commit resolution event and its handlers.
//!
//! `FixtureResolved` is emitted after a stop has been persisted. Handlers
//! run best-effort: the fixture is already Recent, so a handler failure is
//! reported as a warning on the operation outcome (and retried out of band)
//! rather than rolling anything back.

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::knockout::KnockoutPropagator;
use crate::models::{MatchResult, Stage};
use crate::sport_config::Sport;
use crate::stats::TournamentFinalizer;

/// Published on the bus (and dispatched in-process) when a fixture reaches
/// Recent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureResolved {
    pub fixture_id: Uuid,
    pub sport: Sport,
    pub year: i32,
    pub stage: Stage,
    pub result: MatchResult,
}

/// The in-process subscribers to `FixtureResolved`.
pub struct ResolutionHooks {
    propagator: KnockoutPropagator,
    finalizer: TournamentFinalizer,
}

impl ResolutionHooks {
    pub fn new(propagator: KnockoutPropagator, finalizer: TournamentFinalizer) -> Self {
        Self {
            propagator,
            finalizer,
        }
    }

    /// Run every handler the event qualifies for, collecting failures as
    /// warning strings.
    ///
    /// A play-off winner is pushed into the bracket's placeholder slots; a
    /// concluded final triggers the best-player ledger for sports that keep
    /// one. A drawn play-off propagates nothing (the bracket stays open for
    /// a replay).
    pub async fn dispatch(&self, event: &FixtureResolved) -> Vec<String> {
        let mut warnings = Vec::new();

        if event.stage == Stage::PlayOff {
            if let MatchResult::Team(winner) = &event.result {
                match self
                    .propagator
                    .propagate(event.sport, event.year, winner)
                    .await
                {
                    Ok(outcome) => warnings.extend(outcome.warnings),
                    Err(e) => {
                        warn!("Knockout propagation failed for {}: {}", event.fixture_id, e);
                        warnings.push(format!("knockout propagation failed: {}", e));
                    }
                }
            }
        }

        if event.stage == Stage::Final && event.sport.config().tracks_best_player {
            if let Err(e) = self.finalizer.finalize(event.sport, event.year).await {
                warn!(
                    "Stats finalization failed for {} {}: {}",
                    event.sport.as_str(),
                    event.year,
                    e
                );
                warnings.push(format!("stats finalization failed: {}", e));
            }
        }

        warnings
    }
}
