//! Cricket innings sub-engine.
//!
//! Cricket carries more live state than any other sport: a toss deciding
//! innings assignments, two active batsmen and one active bowler at a time,
//! a six-ball over counter, and a ball-by-ball log per innings. All
//! mutations here operate on an already-loaded fixture; persistence stays
//! with the lifecycle engine.

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    BallEvent, Fixture, PlayingStatus, TeamSide, TossDecision,
};
use crate::sport_config::Sport;

fn not_cricket(fixture: &Fixture) -> EngineError {
    EngineError::InvalidInput(format!("fixture {} is not a cricket fixture", fixture.id))
}

fn cricket_state(fixture: &Fixture) -> EngineResult<&crate::models::CricketState> {
    if fixture.sport != Sport::Cricket {
        return Err(not_cricket(fixture));
    }
    fixture.cricket.as_ref().ok_or_else(|| not_cricket(fixture))
}

fn cricket_state_mut(fixture: &mut Fixture) -> EngineResult<&mut crate::models::CricketState> {
    if fixture.sport != Sport::Cricket {
        return Err(not_cricket(fixture));
    }
    let err = not_cricket(fixture);
    fixture.cricket.as_mut().ok_or(err)
}

/// Record the toss. The winner's decision fixes both innings' batting and
/// bowling assignments; the second innings always swaps relative to the
/// first.
pub fn record_toss(fixture: &mut Fixture, winner: &str, decision: TossDecision) -> EngineResult<()> {
    let winner_side = fixture.side_of(winner).ok_or_else(|| {
        EngineError::InvalidInput(format!("{} is not playing in this fixture", winner))
    })?;
    let loser = fixture.team_name(winner_side.other()).to_string();
    let winner = winner.to_string();

    let (first_batting, first_bowling) = match decision {
        TossDecision::Bat => (winner.clone(), loser.clone()),
        TossDecision::Bowl => (loser.clone(), winner.clone()),
    };

    let fixture_id = fixture.id;
    let state = cricket_state_mut(fixture)?;
    state.toss_winner = Some(winner);
    state.toss_winner_decision = Some(decision);
    state.toss_loser = Some(loser);
    state.toss_loser_decision = Some(match decision {
        TossDecision::Bat => TossDecision::Bowl,
        TossDecision::Bowl => TossDecision::Bat,
    });
    state.first_inning_batting = Some(first_batting.clone());
    state.first_inning_bowling = Some(first_bowling.clone());
    state.second_inning_batting = Some(first_bowling);
    state.second_inning_bowling = Some(first_batting);

    debug!(
        "Toss recorded for fixture {}: {:?} chose to {:?}",
        fixture_id, state.toss_winner, decision
    );
    Ok(())
}

/// Batting and bowling sides for the current innings. Requires the toss to
/// have been recorded and an innings to be open.
pub fn innings_sides(fixture: &Fixture) -> EngineResult<(TeamSide, TeamSide)> {
    let state = cricket_state(fixture)?;
    let batting_team = match fixture.segment {
        1 => state.first_inning_batting.as_ref(),
        2 => state.second_inning_batting.as_ref(),
        _ => {
            return Err(EngineError::InvalidState(format!(
                "no innings open on fixture {}",
                fixture.id
            )))
        }
    }
    .ok_or_else(|| {
        EngineError::InvalidState("toss has not been recorded".to_string())
    })?;

    let batting = fixture.side_of(batting_team).ok_or_else(|| {
        EngineError::InvalidInput(format!("batting team {} is not in this fixture", batting_team))
    })?;
    Ok((batting, batting.other()))
}

fn entry_index(fixture: &Fixture, side: TeamSide, reg_no: &str) -> EngineResult<usize> {
    fixture
        .roster(side)
        .iter()
        .position(|p| p.reg_no == reg_no)
        .ok_or_else(|| {
            EngineError::NotFound(format!(
                "player {} not in {}'s roster",
                reg_no,
                fixture.team_name(side)
            ))
        })
}

fn clear_status(fixture: &mut Fixture, side: TeamSide, status: PlayingStatus) {
    for entry in fixture.roster_mut(side).iter_mut() {
        if entry.status == status {
            entry.status = PlayingStatus::Playing;
        }
    }
}

/// Assign the two active batsmen and the active bowler for the current
/// innings.
///
/// Membership is validated against the correct side's roster, and current
/// status is checked as well: a player already `Out` can never be
/// re-activated. Calling this again replaces the previous assignment
/// (earlier active players revert to Playing).
pub fn assign_active_roles(
    fixture: &mut Fixture,
    batsman1: &str,
    batsman2: &str,
    bowler: &str,
) -> EngineResult<()> {
    let (batting, bowling) = innings_sides(fixture)?;

    if batsman1 == batsman2 {
        return Err(EngineError::InvalidInput(
            "the two batsmen must be distinct players".to_string(),
        ));
    }

    let b1 = entry_index(fixture, batting, batsman1)?;
    let b2 = entry_index(fixture, batting, batsman2)?;
    let bw = entry_index(fixture, bowling, bowler)?;

    for (side, idx, reg) in [
        (batting, b1, batsman1),
        (batting, b2, batsman2),
        (bowling, bw, bowler),
    ] {
        if fixture.roster(side)[idx].status == PlayingStatus::Out {
            return Err(EngineError::InvalidState(format!(
                "player {} is out and cannot be re-activated",
                reg
            )));
        }
    }

    clear_status(fixture, batting, PlayingStatus::ActiveBatsman);
    clear_status(fixture, bowling, PlayingStatus::ActiveBowler);

    fixture.roster_mut(batting)[b1].status = PlayingStatus::ActiveBatsman;
    fixture.roster_mut(batting)[b2].status = PlayingStatus::ActiveBatsman;
    fixture.roster_mut(bowling)[bw].status = PlayingStatus::ActiveBowler;
    Ok(())
}

fn active_bowler_index(fixture: &Fixture, bowling: TeamSide) -> EngineResult<usize> {
    fixture
        .roster(bowling)
        .iter()
        .position(|p| p.status == PlayingStatus::ActiveBowler)
        .ok_or_else(|| {
            EngineError::InvalidState("no active bowler assigned".to_string())
        })
}

fn push_innings_event(fixture: &mut Fixture, event: BallEvent) -> EngineResult<()> {
    let innings = fixture.segment;
    let state = cricket_state_mut(fixture)?;
    let log = if innings == 1 {
        &mut state.log_inning1
    } else {
        &mut state.log_inning2
    };
    log.push(event);
    if event.is_legal_delivery() {
        let overs = if innings == 1 {
            &mut state.overs_inning1
        } else {
            &mut state.overs_inning2
        };
        overs.advance();
    }
    Ok(())
}

/// Record one delivery against the named striker.
///
/// Runs go to the striker and the batting side; byes score for the side
/// without crediting the batsman; wides and no-balls add their extra run
/// without consuming a ball. The active bowler's balls-bowled count tracks
/// legal deliveries.
pub fn record_ball(fixture: &mut Fixture, striker: &str, event: BallEvent) -> EngineResult<()> {
    if matches!(event, BallEvent::Wicket) {
        return Err(EngineError::InvalidInput(
            "wickets are recorded through the dismissal operation".to_string(),
        ));
    }

    let (batting, bowling) = innings_sides(fixture)?;
    let striker_idx = entry_index(fixture, batting, striker)?;
    if fixture.roster(batting)[striker_idx].status != PlayingStatus::ActiveBatsman {
        return Err(EngineError::InvalidState(format!(
            "player {} is not an active batsman",
            striker
        )));
    }
    let bowler_idx = active_bowler_index(fixture, bowling)?;

    {
        let batsman = &mut fixture.roster_mut(batting)[striker_idx];
        batsman.runs_scored = batsman.runs_scored.checked_add(event.batsman_runs()).ok_or_else(
            || EngineError::InvalidInput(format!("run counter overflow for player {}", striker)),
        )?;
        if event.is_legal_delivery() {
            batsman.balls_faced += 1;
        }
        batsman.ball_log.push(event);
    }
    if event.is_legal_delivery() {
        fixture.roster_mut(bowling)[bowler_idx].balls_bowled += 1;
    }

    push_innings_event(fixture, event)?;
    fixture.score.add(batting, 0, event.team_runs())?;
    Ok(())
}

/// Dismiss the outgoing batsman and bring in the incoming one.
///
/// Increments the batting side's wicket count, credits the active bowler,
/// appends a wicket marker to both the bowler's log and the innings log,
/// and consumes one legal ball.
pub fn dismiss(fixture: &mut Fixture, outgoing: &str, incoming: &str) -> EngineResult<()> {
    let (batting, bowling) = innings_sides(fixture)?;

    let out_idx = entry_index(fixture, batting, outgoing)?;
    if fixture.roster(batting)[out_idx].status != PlayingStatus::ActiveBatsman {
        return Err(EngineError::InvalidState(format!(
            "player {} is not an active batsman",
            outgoing
        )));
    }
    let in_idx = entry_index(fixture, batting, incoming)?;
    match fixture.roster(batting)[in_idx].status {
        PlayingStatus::Out => {
            return Err(EngineError::InvalidState(format!(
                "player {} is out and cannot bat again",
                incoming
            )))
        }
        PlayingStatus::ActiveBatsman => {
            return Err(EngineError::InvalidState(format!(
                "player {} is already batting",
                incoming
            )))
        }
        _ => {}
    }
    let bowler_idx = active_bowler_index(fixture, bowling)?;

    fixture.roster_mut(batting)[out_idx].status = PlayingStatus::Out;
    fixture.roster_mut(batting)[out_idx].ball_log.push(BallEvent::Wicket);
    fixture.roster_mut(batting)[in_idx].status = PlayingStatus::ActiveBatsman;
    {
        let bowler = &mut fixture.roster_mut(bowling)[bowler_idx];
        bowler.wickets_taken += 1;
        bowler.balls_bowled += 1;
        bowler.ball_log.push(BallEvent::Wicket);
    }

    {
        let state = cricket_state_mut(fixture)?;
        match batting {
            TeamSide::Team1 => state.wickets_t1 += 1,
            TeamSide::Team2 => state.wickets_t2 += 1,
        }
    }
    push_innings_event(fixture, BallEvent::Wicket)?;
    Ok(())
}

/// Hand the ball to a different bowler; the previous active bowler reverts
/// to Playing.
pub fn change_bowler(fixture: &mut Fixture, new_bowler: &str) -> EngineResult<()> {
    let (_, bowling) = innings_sides(fixture)?;
    let idx = entry_index(fixture, bowling, new_bowler)?;
    if fixture.roster(bowling)[idx].status == PlayingStatus::Out {
        return Err(EngineError::InvalidState(format!(
            "player {} is out and cannot bowl",
            new_bowler
        )));
    }
    clear_status(fixture, bowling, PlayingStatus::ActiveBowler);
    fixture.roster_mut(bowling)[idx].status = PlayingStatus::ActiveBowler;
    Ok(())
}

/// Re-arm both rosters for the second innings: every ActiveBatsman,
/// ActiveBowler, and Out reverts to Playing. Cumulative counters are kept.
pub fn rearm_rosters(fixture: &mut Fixture) {
    for side in [TeamSide::Team1, TeamSide::Team2] {
        for entry in fixture.roster_mut(side).iter_mut() {
            if matches!(
                entry.status,
                PlayingStatus::ActiveBatsman | PlayingStatus::ActiveBowler | PlayingStatus::Out
            ) {
                entry.status = PlayingStatus::Playing;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchStatus, Overs, PlayerEntry, Stage};

    fn roster(prefix: &str) -> Vec<PlayerEntry> {
        (1..=11)
            .map(|i| {
                PlayerEntry::new(
                    i as u8,
                    &format!("{}-{}", prefix, i),
                    &format!("{} Player {}", prefix, i),
                    &format!("N-{}-{}", prefix, i),
                    "A",
                )
            })
            .collect()
    }

    fn live_fixture() -> Fixture {
        let mut fx = Fixture::new(
            Sport::Cricket,
            2026,
            Stage::PoolA,
            "EE",
            "CS",
            roster("EE"),
            roster("CS"),
        );
        fx.status = MatchStatus::Live;
        fx.segment = 1;
        record_toss(&mut fx, "EE", TossDecision::Bat).unwrap();
        fx
    }

    #[test]
    fn test_toss_assigns_both_innings() {
        let fx = live_fixture();
        let state = fx.cricket.as_ref().unwrap();
        assert_eq!(state.first_inning_batting.as_deref(), Some("EE"));
        assert_eq!(state.first_inning_bowling.as_deref(), Some("CS"));
        assert_eq!(state.second_inning_batting.as_deref(), Some("CS"));
        assert_eq!(state.second_inning_bowling.as_deref(), Some("EE"));
        assert_eq!(state.toss_loser_decision, Some(TossDecision::Bowl));
    }

    #[test]
    fn test_active_roles_require_correct_side() {
        let mut fx = live_fixture();
        // Bowler named from the batting side's roster
        let err = assign_active_roles(&mut fx, "EE-1", "EE-2", "EE-3").unwrap_err();
        assert_eq!(err.kind(), "not_found");

        assign_active_roles(&mut fx, "EE-1", "EE-2", "CS-1").unwrap();
        assert_eq!(fx.nominations_t1[0].status, PlayingStatus::ActiveBatsman);
        assert_eq!(fx.nominations_t2[0].status, PlayingStatus::ActiveBowler);
    }

    #[test]
    fn test_out_player_cannot_be_reactivated() {
        let mut fx = live_fixture();
        assign_active_roles(&mut fx, "EE-1", "EE-2", "CS-1").unwrap();
        dismiss(&mut fx, "EE-1", "EE-3").unwrap();

        let err = assign_active_roles(&mut fx, "EE-1", "EE-4", "CS-1").unwrap_err();
        assert_eq!(err.kind(), "invalid_state");
    }

    #[test]
    fn test_reassignment_reverts_previous_roles() {
        let mut fx = live_fixture();
        assign_active_roles(&mut fx, "EE-1", "EE-2", "CS-1").unwrap();
        assign_active_roles(&mut fx, "EE-3", "EE-4", "CS-2").unwrap();

        assert_eq!(fx.nominations_t1[0].status, PlayingStatus::Playing);
        assert_eq!(fx.nominations_t1[2].status, PlayingStatus::ActiveBatsman);
        assert_eq!(fx.nominations_t2[0].status, PlayingStatus::Playing);
        assert_eq!(fx.nominations_t2[1].status, PlayingStatus::ActiveBowler);
    }

    #[test]
    fn test_runs_update_batsman_bowler_and_score() {
        let mut fx = live_fixture();
        assign_active_roles(&mut fx, "EE-1", "EE-2", "CS-1").unwrap();

        record_ball(&mut fx, "EE-1", BallEvent::Runs(4)).unwrap();
        record_ball(&mut fx, "EE-1", BallEvent::Runs(1)).unwrap();

        assert_eq!(fx.nominations_t1[0].runs_scored, 5);
        assert_eq!(fx.nominations_t1[0].balls_faced, 2);
        assert_eq!(fx.nominations_t2[0].balls_bowled, 2);
        assert_eq!(fx.score.totals(), (5, 0));
        let state = fx.cricket.as_ref().unwrap();
        assert_eq!(state.overs_inning1, Overs::new(0, 2));
        assert_eq!(state.log_inning1.len(), 2);
    }

    #[test]
    fn test_wide_scores_without_consuming_a_ball() {
        let mut fx = live_fixture();
        assign_active_roles(&mut fx, "EE-1", "EE-2", "CS-1").unwrap();

        record_ball(&mut fx, "EE-1", BallEvent::Wide).unwrap();

        assert_eq!(fx.score.totals(), (1, 0));
        assert_eq!(fx.nominations_t1[0].runs_scored, 0);
        assert_eq!(fx.nominations_t1[0].balls_faced, 0);
        assert_eq!(fx.nominations_t2[0].balls_bowled, 0);
        assert_eq!(fx.cricket.as_ref().unwrap().overs_inning1, Overs::new(0, 0));
    }

    #[test]
    fn test_bye_scores_team_runs_only() {
        let mut fx = live_fixture();
        assign_active_roles(&mut fx, "EE-1", "EE-2", "CS-1").unwrap();

        record_ball(&mut fx, "EE-1", BallEvent::Bye(2)).unwrap();

        assert_eq!(fx.score.totals(), (2, 0));
        assert_eq!(fx.nominations_t1[0].runs_scored, 0);
        assert_eq!(fx.nominations_t1[0].balls_faced, 1);
        assert_eq!(fx.cricket.as_ref().unwrap().overs_inning1, Overs::new(0, 1));
    }

    #[test]
    fn test_dismissal_bookkeeping() {
        let mut fx = live_fixture();
        assign_active_roles(&mut fx, "EE-1", "EE-2", "CS-1").unwrap();

        dismiss(&mut fx, "EE-1", "EE-3").unwrap();

        let state = fx.cricket.as_ref().unwrap();
        assert_eq!(state.wickets_t1, 1);
        assert_eq!(state.log_inning1.last(), Some(&BallEvent::Wicket));
        assert_eq!(state.overs_inning1, Overs::new(0, 1));
        assert_eq!(fx.nominations_t1[0].status, PlayingStatus::Out);
        assert_eq!(fx.nominations_t1[2].status, PlayingStatus::ActiveBatsman);
        assert_eq!(fx.nominations_t2[0].wickets_taken, 1);
    }

    #[test]
    fn test_bowler_change_is_exclusive() {
        let mut fx = live_fixture();
        assign_active_roles(&mut fx, "EE-1", "EE-2", "CS-1").unwrap();

        change_bowler(&mut fx, "CS-2").unwrap();

        assert_eq!(fx.nominations_t2[0].status, PlayingStatus::Playing);
        assert_eq!(fx.nominations_t2[1].status, PlayingStatus::ActiveBowler);
        let bowlers = fx
            .nominations_t2
            .iter()
            .filter(|p| p.status == PlayingStatus::ActiveBowler)
            .count();
        assert_eq!(bowlers, 1);
    }

    #[test]
    fn test_rearm_keeps_counters() {
        let mut fx = live_fixture();
        assign_active_roles(&mut fx, "EE-1", "EE-2", "CS-1").unwrap();
        record_ball(&mut fx, "EE-1", BallEvent::Runs(6)).unwrap();
        dismiss(&mut fx, "EE-1", "EE-3").unwrap();

        rearm_rosters(&mut fx);

        assert!(fx
            .nominations_t1
            .iter()
            .chain(fx.nominations_t2.iter())
            .all(|p| matches!(p.status, PlayingStatus::Playing | PlayingStatus::Reserved)));
        assert_eq!(fx.nominations_t1[0].runs_scored, 6);
        assert_eq!(fx.nominations_t2[0].wickets_taken, 1);
    }

    #[test]
    fn test_second_innings_swaps_sides() {
        let mut fx = live_fixture();
        fx.segment = 2;
        let (batting, bowling) = innings_sides(&fx).unwrap();
        assert_eq!(batting, TeamSide::Team2);
        assert_eq!(bowling, TeamSide::Team1);
    }
}
