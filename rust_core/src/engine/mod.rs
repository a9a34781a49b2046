//! Match lifecycle engine.
//!
//! This module provides:
//! - The status machine (upcoming -> live -> recent, never backwards)
//! - Segment progression with engine-held segment indices
//! - Scoring events that update player counters and the team score together
//! - Roster swaps (standard substitution, cricket dismissal)
//! - Stop-time winner determination via the sport rule table
//! - Post-commit resolution dispatch (knockout propagation, stats ledger)
//!
//! Every operation is one load-mutate-persist round against a single
//! fixture document; cross-fixture effects only happen in the post-commit
//! handlers.

pub mod cricket;
pub mod events;

pub use events::{FixtureResolved, ResolutionHooks};

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::db::FixtureStore;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuthContext, BallEvent, Fixture, MatchResult, MatchStatus, OpOutcome, PenaltyAttempt,
    PlayingStatus, TeamSide, TossDecision,
};
use crate::sport_config::{PlayerStatKind, ScoreShape, Sport, WinnerRule};

pub struct MatchLifecycleEngine {
    fixtures: Arc<dyn FixtureStore>,
    hooks: ResolutionHooks,
}

impl MatchLifecycleEngine {
    pub fn new(fixtures: Arc<dyn FixtureStore>, hooks: ResolutionHooks) -> Self {
        Self { fixtures, hooks }
    }

    /// Move a fixture from Upcoming to Live and open its first segment.
    ///
    /// A fixture still holding the TBD placeholder cannot start. Calling
    /// start on an already-live fixture is a tolerated no-op (double tap
    /// from the scoring desk); a concluded fixture can never come back.
    pub async fn start(&self, ctx: &AuthContext, sport: Sport, id: Uuid) -> EngineResult<Fixture> {
        let mut fixture = self.fixtures.get(sport, id).await?;
        match fixture.status {
            MatchStatus::Upcoming => {}
            MatchStatus::Live => {
                debug!("Fixture {} already live; start is a no-op", id);
                return Ok(fixture);
            }
            MatchStatus::Recent => {
                return Err(EngineError::InvalidState(format!(
                    "fixture {} has concluded and cannot restart",
                    id
                )))
            }
        }
        if fixture.has_placeholder_team() {
            return Err(EngineError::InvalidState(format!(
                "fixture {} still awaits an earlier round's winner",
                id
            )));
        }

        fixture.status = MatchStatus::Live;
        fixture.segment = 1;
        self.fixtures.save(&mut fixture).await?;
        info!(
            "Fixture {} ({} vs {}) started by {}",
            id, fixture.team1, fixture.team2, ctx.user_id
        );
        Ok(fixture)
    }

    /// Close the current segment and open the next.
    ///
    /// The engine owns the segment counter; callers never pass an absolute
    /// segment number. For segment-scored sports the closing segment's
    /// winner (or "Draw") is written to its slot, exactly once. Closing the
    /// last segment resets the counter to 0; the match then only awaits
    /// stop. Cricket's lone transition re-arms both rosters for the second
    /// innings.
    pub async fn advance_segment(
        &self,
        ctx: &AuthContext,
        sport: Sport,
        id: Uuid,
    ) -> EngineResult<Fixture> {
        let mut fixture = self.fixtures.get(sport, id).await?;
        require_live(&fixture)?;
        let cfg = sport.config();
        if fixture.segment == 0 {
            return Err(EngineError::InvalidState(format!(
                "fixture {} has no open {}",
                id, cfg.segment_label
            )));
        }

        let closing = fixture.segment;
        if sport == Sport::Cricket {
            if closing != 1 {
                return Err(EngineError::InvalidState(
                    "the second innings closes when the match stops".to_string(),
                ));
            }
            cricket::rearm_rosters(&mut fixture);
            fixture.segment = 2;
        } else {
            if cfg.score_shape == ScoreShape::PerSegment {
                let idx = (closing - 1) as usize;
                if fixture.segment_winners[idx].is_some() {
                    return Err(EngineError::InvalidState(format!(
                        "{} {} is already closed",
                        cfg.segment_label, closing
                    )));
                }
                let (a, b) = fixture.score.segment_pair(idx)?;
                let winner = if a > b {
                    fixture.team1.clone()
                } else if b > a {
                    fixture.team2.clone()
                } else {
                    "Draw".to_string()
                };
                fixture.segment_winners[idx] = Some(winner);
            }
            fixture.segment = if closing >= cfg.segment_count {
                0
            } else {
                closing + 1
            };
        }

        self.fixtures.save(&mut fixture).await?;
        debug!(
            "Fixture {} advanced past {} {} ({} by {})",
            id,
            cfg.segment_label,
            closing,
            sport.as_str(),
            ctx.user_id
        );
        Ok(fixture)
    }

    /// Record a scoring event for one player, mirroring it into the team
    /// score. For cricket this is a runs delivery against the named striker;
    /// `side` must be the side batting this innings, and extras go through
    /// [`Self::record_ball`].
    pub async fn record_scoring_event(
        &self,
        ctx: &AuthContext,
        sport: Sport,
        id: Uuid,
        side: TeamSide,
        reg_no: &str,
        amount: u16,
    ) -> EngineResult<Fixture> {
        let mut fixture = self.fixtures.get(sport, id).await?;
        require_live(&fixture)?;
        let cfg = sport.config();
        if fixture.segment == 0 {
            return Err(EngineError::InvalidState(format!(
                "fixture {} has no open {}",
                id, cfg.segment_label
            )));
        }

        match cfg.player_stat {
            PlayerStatKind::Goals => {
                let idx = playing_entry(&fixture, side, reg_no)?;
                let entry = &mut fixture.roster_mut(side)[idx];
                entry.goals = checked_bump(entry.goals, amount, reg_no)?;
                fixture.score.add(side, 0, amount)?;
            }
            PlayerStatKind::PointsBySegment => {
                let segment_idx = (fixture.segment - 1) as usize;
                let idx = playing_entry(&fixture, side, reg_no)?;
                let entry = &mut fixture.roster_mut(side)[idx];
                if entry.points_by_segment.len() < cfg.segment_count as usize {
                    entry.points_by_segment.resize(cfg.segment_count as usize, 0);
                }
                entry.points_by_segment[segment_idx] =
                    checked_bump(entry.points_by_segment[segment_idx], amount, reg_no)?;
                fixture.score.add(side, segment_idx, amount)?;
            }
            PlayerStatKind::Cricket => {
                let batting = cricket::innings_sides(&fixture)?.0;
                if side != batting {
                    return Err(EngineError::InvalidInput(format!(
                        "{} is not batting in this innings",
                        fixture.team_name(side)
                    )));
                }
                let amount = u8::try_from(amount).map_err(|_| {
                    EngineError::InvalidInput(format!("{} runs off one ball", amount))
                })?;
                cricket::record_ball(&mut fixture, reg_no, BallEvent::Runs(amount))?;
            }
        }

        self.fixtures.save(&mut fixture).await?;
        debug!(
            "Fixture {}: +{} for {} ({})",
            id, amount, reg_no, ctx.user_id
        );
        Ok(fixture)
    }

    /// Record a cricket delivery against the named striker (runs, wides,
    /// no-balls, byes). Dismissals go through [`Self::swap_roster`].
    pub async fn record_ball(
        &self,
        ctx: &AuthContext,
        sport: Sport,
        id: Uuid,
        striker: &str,
        event: BallEvent,
    ) -> EngineResult<Fixture> {
        let mut fixture = self.fixtures.get(sport, id).await?;
        require_live(&fixture)?;
        cricket::record_ball(&mut fixture, striker, event)?;
        self.fixtures.save(&mut fixture).await?;
        debug!(
            "Fixture {}: ball {} to {} ({})",
            id, event, striker, ctx.user_id
        );
        Ok(fixture)
    }

    /// Record the cricket toss.
    pub async fn record_toss(
        &self,
        ctx: &AuthContext,
        sport: Sport,
        id: Uuid,
        winner: &str,
        decision: TossDecision,
    ) -> EngineResult<Fixture> {
        let mut fixture = self.fixtures.get(sport, id).await?;
        require_live(&fixture)?;
        cricket::record_toss(&mut fixture, winner, decision)?;
        self.fixtures.save(&mut fixture).await?;
        debug!("Fixture {}: toss recorded by {}", id, ctx.user_id);
        Ok(fixture)
    }

    /// Assign the active batsmen and bowler for the current innings.
    pub async fn assign_active_roles(
        &self,
        ctx: &AuthContext,
        sport: Sport,
        id: Uuid,
        batsman1: &str,
        batsman2: &str,
        bowler: &str,
    ) -> EngineResult<Fixture> {
        let mut fixture = self.fixtures.get(sport, id).await?;
        require_live(&fixture)?;
        cricket::assign_active_roles(&mut fixture, batsman1, batsman2, bowler)?;
        self.fixtures.save(&mut fixture).await?;
        debug!("Fixture {}: active roles set by {}", id, ctx.user_id);
        Ok(fixture)
    }

    /// Hand the ball to a new bowler.
    pub async fn change_bowler(
        &self,
        ctx: &AuthContext,
        sport: Sport,
        id: Uuid,
        bowler: &str,
    ) -> EngineResult<Fixture> {
        let mut fixture = self.fixtures.get(sport, id).await?;
        require_live(&fixture)?;
        cricket::change_bowler(&mut fixture, bowler)?;
        self.fixtures.save(&mut fixture).await?;
        debug!("Fixture {}: bowler change by {}", id, ctx.user_id);
        Ok(fixture)
    }

    /// Swap two roster entries' playing statuses.
    ///
    /// For standard sports this is a substitution: the two players exchange
    /// Playing/Reserved, whichever rosters they sit on. For cricket it is a
    /// dismissal: the outgoing active batsman goes Out and the incoming
    /// player takes the crease.
    pub async fn swap_roster(
        &self,
        ctx: &AuthContext,
        sport: Sport,
        id: Uuid,
        outgoing: &str,
        incoming: &str,
    ) -> EngineResult<Fixture> {
        let mut fixture = self.fixtures.get(sport, id).await?;
        require_live(&fixture)?;

        if sport == Sport::Cricket {
            cricket::dismiss(&mut fixture, outgoing, incoming)?;
        } else {
            let (out_side, out_idx) = locate_either_side(&fixture, outgoing)?;
            let (in_side, in_idx) = locate_either_side(&fixture, incoming)?;
            let out_status = fixture.roster(out_side)[out_idx].status;
            let in_status = fixture.roster(in_side)[in_idx].status;
            if out_status == in_status {
                return Err(EngineError::InvalidState(format!(
                    "{} and {} are both {:?}; nothing to swap",
                    outgoing, incoming, out_status
                )));
            }
            fixture.roster_mut(out_side)[out_idx].status = in_status;
            fixture.roster_mut(in_side)[in_idx].status = out_status;
        }

        self.fixtures.save(&mut fixture).await?;
        debug!(
            "Fixture {}: swap {} <-> {} by {}",
            id, outgoing, incoming, ctx.user_id
        );
        Ok(fixture)
    }

    /// Record one penalty-shootout attempt (football/futsal knockouts only).
    pub async fn record_penalty(
        &self,
        ctx: &AuthContext,
        sport: Sport,
        id: Uuid,
        side: TeamSide,
        reg_no: &str,
        scored: bool,
    ) -> EngineResult<Fixture> {
        let cfg = sport.config();
        if !matches!(
            cfg.winner_rule,
            WinnerRule::Cumulative {
                penalty_shootout: true
            }
        ) {
            return Err(EngineError::InvalidInput(format!(
                "{} has no penalty shootout",
                sport.as_str()
            )));
        }

        let mut fixture = self.fixtures.get(sport, id).await?;
        require_live(&fixture)?;
        if !fixture.stage.is_knockout() {
            return Err(EngineError::InvalidState(
                "penalty shootouts only decide knockout fixtures".to_string(),
            ));
        }

        let idx = fixture
            .roster(side)
            .iter()
            .position(|p| p.reg_no == reg_no)
            .ok_or_else(|| {
                EngineError::NotFound(format!(
                    "player {} not in {}'s roster",
                    reg_no,
                    fixture.team_name(side)
                ))
            })?;
        let attempt = PenaltyAttempt {
            reg_no: reg_no.to_string(),
            name: fixture.roster(side)[idx].name.clone(),
            scored,
        };
        match side {
            TeamSide::Team1 => fixture.penalties_t1.push(attempt),
            TeamSide::Team2 => fixture.penalties_t2.push(attempt),
        }

        self.fixtures.save(&mut fixture).await?;
        debug!(
            "Fixture {}: penalty by {} {} ({})",
            id,
            reg_no,
            if scored { "scored" } else { "missed" },
            ctx.user_id
        );
        Ok(fixture)
    }

    /// Conclude a live fixture: compute the result via the sport's winner
    /// rule, persist Live -> Recent, then dispatch the resolution handlers.
    ///
    /// The handlers run after the commit; their failures come back as
    /// warnings on the outcome, never as a rollback.
    pub async fn stop(&self, ctx: &AuthContext, sport: Sport, id: Uuid) -> EngineResult<OpOutcome> {
        let mut fixture = self.fixtures.get(sport, id).await?;
        require_live(&fixture)?;

        let result = determine_result(&fixture);
        fixture.result = Some(result.clone());
        fixture.status = MatchStatus::Recent;
        fixture.segment = 0;
        self.fixtures.save(&mut fixture).await?;
        info!(
            "Fixture {} concluded: {} ({} by {})",
            id,
            String::from(result.clone()),
            sport.as_str(),
            ctx.user_id
        );

        let event = FixtureResolved {
            fixture_id: fixture.id,
            sport,
            year: fixture.year,
            stage: fixture.stage,
            result,
        };
        let warnings = self.hooks.dispatch(&event).await;

        let mut outcome = OpOutcome::ok("match concluded", fixture);
        outcome.warnings = warnings;
        Ok(outcome)
    }

    /// Re-run the resolution handlers for an already-concluded fixture.
    /// Used to retry a post-commit side effect that previously failed.
    pub async fn rerun_resolution(
        &self,
        ctx: &AuthContext,
        sport: Sport,
        id: Uuid,
    ) -> EngineResult<OpOutcome> {
        let fixture = self.fixtures.get(sport, id).await?;
        if fixture.status != MatchStatus::Recent {
            return Err(EngineError::InvalidState(format!(
                "fixture {} has not concluded",
                id
            )));
        }
        let result = fixture.result.clone().ok_or_else(|| {
            EngineError::InvalidState(format!("fixture {} has no recorded result", id))
        })?;

        let event = FixtureResolved {
            fixture_id: fixture.id,
            sport,
            year: fixture.year,
            stage: fixture.stage,
            result,
        };
        let warnings = self.hooks.dispatch(&event).await;
        info!("Fixture {}: resolution re-run by {}", id, ctx.user_id);

        let mut outcome = OpOutcome::ok("resolution re-run", fixture);
        outcome.warnings = warnings;
        Ok(outcome)
    }
}

fn require_live(fixture: &Fixture) -> EngineResult<()> {
    match fixture.status {
        MatchStatus::Live => Ok(()),
        MatchStatus::Upcoming => Err(EngineError::InvalidState(format!(
            "fixture {} has not started",
            fixture.id
        ))),
        MatchStatus::Recent => Err(EngineError::InvalidState(format!(
            "fixture {} has concluded",
            fixture.id
        ))),
    }
}

fn playing_entry(fixture: &Fixture, side: TeamSide, reg_no: &str) -> EngineResult<usize> {
    let idx = fixture
        .roster(side)
        .iter()
        .position(|p| p.reg_no == reg_no)
        .ok_or_else(|| {
            EngineError::NotFound(format!(
                "player {} not in {}'s roster",
                reg_no,
                fixture.team_name(side)
            ))
        })?;
    if fixture.roster(side)[idx].status != PlayingStatus::Playing {
        return Err(EngineError::InvalidState(format!(
            "player {} is not on the field",
            reg_no
        )));
    }
    Ok(idx)
}

fn checked_bump(counter: u16, amount: u16, reg_no: &str) -> EngineResult<u16> {
    counter.checked_add(amount).ok_or_else(|| {
        EngineError::InvalidInput(format!(
            "scoring counter overflow for player {}",
            reg_no
        ))
    })
}

fn locate_either_side(fixture: &Fixture, reg_no: &str) -> EngineResult<(TeamSide, usize)> {
    for side in [TeamSide::Team1, TeamSide::Team2] {
        if let Some(idx) = fixture.roster(side).iter().position(|p| p.reg_no == reg_no) {
            return Ok((side, idx));
        }
    }
    Err(EngineError::NotFound(format!(
        "player {} not in either roster",
        reg_no
    )))
}

/// Winner determination at stop time, entirely table-driven.
fn determine_result(fixture: &Fixture) -> MatchResult {
    let cfg = fixture.sport.config();
    match cfg.winner_rule {
        WinnerRule::Cumulative { penalty_shootout } => {
            let (t1, t2) = fixture.score.totals();
            if t1 > t2 {
                MatchResult::Team(fixture.team1.clone())
            } else if t2 > t1 {
                MatchResult::Team(fixture.team2.clone())
            } else if penalty_shootout && fixture.stage.is_knockout() {
                shootout_result(fixture)
            } else {
                MatchResult::Draw
            }
        }
        WinnerRule::SegmentMajority {
            point_total_tiebreak,
        } => {
            let mut wins1 = 0u8;
            let mut wins2 = 0u8;
            for slot in fixture.segment_winners.iter().flatten() {
                if *slot == fixture.team1 {
                    wins1 += 1;
                } else if *slot == fixture.team2 {
                    wins2 += 1;
                }
            }
            if wins1 > wins2 {
                MatchResult::Team(fixture.team1.clone())
            } else if wins2 > wins1 {
                MatchResult::Team(fixture.team2.clone())
            } else if point_total_tiebreak {
                let (t1, t2) = fixture.score.totals();
                if t1 > t2 {
                    MatchResult::Team(fixture.team1.clone())
                } else if t2 > t1 {
                    MatchResult::Team(fixture.team2.clone())
                } else {
                    MatchResult::Draw
                }
            } else {
                MatchResult::Draw
            }
        }
    }
}

fn shootout_result(fixture: &Fixture) -> MatchResult {
    let scored = |attempts: &[PenaltyAttempt]| attempts.iter().filter(|a| a.scored).count();
    let p1 = scored(&fixture.penalties_t1);
    let p2 = scored(&fixture.penalties_t2);
    if p1 > p2 {
        MatchResult::Team(fixture.team1.clone())
    } else if p2 > p1 {
        MatchResult::Team(fixture.team2.clone())
    } else {
        MatchResult::Draw
    }
}
