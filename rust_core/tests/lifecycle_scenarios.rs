//! End-to-end lifecycle runs against the in-memory stores.

use std::sync::Arc;

use sportsmeet_rust_core::db::{
    AggregateStatsStore, FixtureStore, MemoryAggregateStatsStore, MemoryFixtureStore,
    MemoryNominationStore,
};
use sportsmeet_rust_core::engine::{MatchLifecycleEngine, ResolutionHooks};
use sportsmeet_rust_core::knockout::KnockoutPropagator;
use sportsmeet_rust_core::models::{
    AuthContext, BallEvent, Fixture, MatchResult, MatchStatus, PlayerEntry, PlayingStatus, Role,
    Stage, TeamSide, TossDecision, TBD,
};
use sportsmeet_rust_core::stats::TournamentFinalizer;
use sportsmeet_rust_core::Sport;

struct Harness {
    engine: MatchLifecycleEngine,
    fixtures: Arc<MemoryFixtureStore>,
    nominations: Arc<MemoryNominationStore>,
    stats: Arc<MemoryAggregateStatsStore>,
}

fn harness() -> Harness {
    let fixtures = Arc::new(MemoryFixtureStore::new());
    let nominations = Arc::new(MemoryNominationStore::new());
    let stats = Arc::new(MemoryAggregateStatsStore::new());
    let hooks = ResolutionHooks::new(
        KnockoutPropagator::new(fixtures.clone(), nominations.clone()),
        TournamentFinalizer::new(fixtures.clone(), nominations.clone(), stats.clone()),
    );
    Harness {
        engine: MatchLifecycleEngine::new(fixtures.clone(), hooks),
        fixtures,
        nominations,
        stats,
    }
}

fn referee() -> AuthContext {
    AuthContext {
        user_id: "ref-1".to_string(),
        role: Role::Referee,
        department: None,
        sport: None,
    }
}

fn roster(dept: &str, n: usize) -> Vec<PlayerEntry> {
    (1..=n)
        .map(|i| {
            PlayerEntry::new(
                i as u8,
                &format!("{}-{}", dept, i),
                &format!("{} Player {}", dept, i),
                &format!("NID-{}-{}", dept, i),
                "A",
            )
        })
        .collect()
}

#[tokio::test]
async fn football_pool_match_start_to_finish() {
    let h = harness();
    let fx = Fixture::new(
        Sport::Football,
        2026,
        Stage::PoolA,
        "CS",
        "ME",
        roster("CS", 11),
        roster("ME", 11),
    );
    let id = fx.id;
    h.fixtures.insert(&fx).await.unwrap();

    h.engine.start(&referee(), Sport::Football, id).await.unwrap();

    // Striker scores a hat-trick across both halves
    for _ in 0..2 {
        h.engine
            .record_scoring_event(&referee(), Sport::Football, id, TeamSide::Team1, "CS-9", 1)
            .await
            .unwrap();
    }
    h.engine
        .advance_segment(&referee(), Sport::Football, id)
        .await
        .unwrap();
    h.engine
        .record_scoring_event(&referee(), Sport::Football, id, TeamSide::Team1, "CS-9", 1)
        .await
        .unwrap();

    let outcome = h.engine.stop(&referee(), Sport::Football, id).await.unwrap();
    assert!(outcome.success);
    assert!(outcome.warnings.is_empty());

    let fx = outcome.data.unwrap();
    assert_eq!(fx.status, MatchStatus::Recent);
    assert_eq!(fx.score.totals(), (3, 0));
    assert_eq!(fx.result, Some(MatchResult::Team("CS".to_string())));
    assert_eq!(fx.nominations_t1[8].goals, 3);
}

#[tokio::test]
async fn badminton_sets_decide_the_match() {
    let h = harness();
    let fx = Fixture::new(
        Sport::Badminton,
        2026,
        Stage::PoolB,
        "EE",
        "CE",
        roster("EE", 2),
        roster("CE", 2),
    );
    let id = fx.id;
    h.fixtures.insert(&fx).await.unwrap();

    h.engine.start(&referee(), Sport::Badminton, id).await.unwrap();

    // EE 21-18, CE 21-19, EE 21-15
    for (ee, ce) in [(21u16, 18u16), (19, 21), (21, 15)] {
        h.engine
            .record_scoring_event(&referee(), Sport::Badminton, id, TeamSide::Team1, "EE-1", ee)
            .await
            .unwrap();
        h.engine
            .record_scoring_event(&referee(), Sport::Badminton, id, TeamSide::Team2, "CE-1", ce)
            .await
            .unwrap();
        h.engine
            .advance_segment(&referee(), Sport::Badminton, id)
            .await
            .unwrap();
    }

    let outcome = h.engine.stop(&referee(), Sport::Badminton, id).await.unwrap();
    let fx = outcome.data.unwrap();
    assert_eq!(
        fx.segment_winners,
        vec![
            Some("EE".to_string()),
            Some("CE".to_string()),
            Some("EE".to_string())
        ]
    );
    assert_eq!(fx.result, Some(MatchResult::Team("EE".to_string())));
    // Terminal segment closed the counter
    assert_eq!(fx.segment, 0);
}

#[tokio::test]
async fn playoff_winner_fills_the_semi_slot() {
    let h = harness();
    h.nominations
        .insert_roster(Sport::Football, "CS", 2026, roster("CS", 11))
        .await;
    h.nominations
        .insert_roster(Sport::Football, "ME", 2026, roster("ME", 11))
        .await;

    let playoff = Fixture::new(
        Sport::Football,
        2026,
        Stage::PlayOff,
        "CS",
        "ME",
        roster("CS", 11),
        roster("ME", 11),
    );
    let playoff_id = playoff.id;
    h.fixtures.insert(&playoff).await.unwrap();

    let semi = Fixture::new(Sport::Football, 2026, Stage::Semi, TBD, "EE", vec![], vec![]);
    let semi_id = semi.id;
    h.fixtures.insert(&semi).await.unwrap();

    // The semi cannot start while the slot is open
    let err = h
        .engine
        .start(&referee(), Sport::Football, semi_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_state");

    h.engine
        .start(&referee(), Sport::Football, playoff_id)
        .await
        .unwrap();
    h.engine
        .record_scoring_event(&referee(), Sport::Football, playoff_id, TeamSide::Team1, "CS-9", 1)
        .await
        .unwrap();
    let outcome = h
        .engine
        .stop(&referee(), Sport::Football, playoff_id)
        .await
        .unwrap();
    assert!(outcome.warnings.is_empty());

    let semi = h.fixtures.get(Sport::Football, semi_id).await.unwrap();
    assert_eq!(semi.team1, "CS");
    assert_eq!(semi.nominations_t1.len(), 11);
    h.engine.start(&referee(), Sport::Football, semi_id).await.unwrap();

    // Replaying the resolution changes nothing further
    let version = h.fixtures.get(Sport::Football, semi_id).await.unwrap().version;
    h.engine
        .rerun_resolution(&referee(), Sport::Football, playoff_id)
        .await
        .unwrap();
    let after = h.fixtures.get(Sport::Football, semi_id).await.unwrap();
    assert_eq!(after.version, version);
    assert_eq!(after.team1, "CS");
}

#[tokio::test]
async fn drawn_playoff_leaves_the_bracket_open() {
    let h = harness();
    let playoff = Fixture::new(
        Sport::Handball,
        2026,
        Stage::PlayOff,
        "CS",
        "ME",
        roster("CS", 7),
        roster("ME", 7),
    );
    let playoff_id = playoff.id;
    h.fixtures.insert(&playoff).await.unwrap();
    let semi = Fixture::new(Sport::Handball, 2026, Stage::Semi, TBD, "EE", vec![], vec![]);
    let semi_id = semi.id;
    h.fixtures.insert(&semi).await.unwrap();

    h.engine.start(&referee(), Sport::Handball, playoff_id).await.unwrap();
    let outcome = h.engine.stop(&referee(), Sport::Handball, playoff_id).await.unwrap();
    assert_eq!(outcome.data.unwrap().result, Some(MatchResult::Draw));

    let semi = h.fixtures.get(Sport::Handball, semi_id).await.unwrap();
    assert_eq!(semi.team1, TBD);
}

#[tokio::test]
async fn cricket_full_innings_and_dismissal() {
    let h = harness();
    let fx = Fixture::new(
        Sport::Cricket,
        2026,
        Stage::PoolA,
        "CS",
        "EE",
        roster("CS", 11),
        roster("EE", 11),
    );
    let id = fx.id;
    h.fixtures.insert(&fx).await.unwrap();

    h.engine.start(&referee(), Sport::Cricket, id).await.unwrap();
    h.engine
        .record_toss(&referee(), Sport::Cricket, id, "EE", TossDecision::Bowl)
        .await
        .unwrap();
    // EE chose to bowl, so CS bats first
    h.engine
        .assign_active_roles(&referee(), Sport::Cricket, id, "CS-1", "CS-2", "EE-5")
        .await
        .unwrap();

    h.engine
        .record_scoring_event(&referee(), Sport::Cricket, id, TeamSide::Team1, "CS-1", 4)
        .await
        .unwrap();
    h.engine
        .record_ball(&referee(), Sport::Cricket, id, "CS-1", BallEvent::Wide)
        .await
        .unwrap();
    let fx = h
        .engine
        .swap_roster(&referee(), Sport::Cricket, id, "CS-1", "CS-3")
        .await
        .unwrap();

    let state = fx.cricket.as_ref().unwrap();
    assert_eq!(state.first_inning_batting.as_deref(), Some("CS"));
    assert_eq!(state.wickets_t1, 1);
    // Four, wide, wicket: two legal balls
    assert_eq!(state.overs_inning1.to_string(), "0.2");
    assert_eq!(
        state.log_inning1,
        vec![BallEvent::Runs(4), BallEvent::Wide, BallEvent::Wicket]
    );
    assert_eq!(fx.score.totals(), (5, 0));
    assert_eq!(fx.nominations_t1[0].status, PlayingStatus::Out);
    assert_eq!(fx.nominations_t2[4].wickets_taken, 1);

    // Second innings: EE bats, everyone re-armed
    h.engine.advance_segment(&referee(), Sport::Cricket, id).await.unwrap();
    h.engine
        .assign_active_roles(&referee(), Sport::Cricket, id, "EE-1", "EE-2", "CS-5")
        .await
        .unwrap();
    h.engine
        .record_scoring_event(&referee(), Sport::Cricket, id, TeamSide::Team2, "EE-1", 6)
        .await
        .unwrap();

    let outcome = h.engine.stop(&referee(), Sport::Cricket, id).await.unwrap();
    let fx = outcome.data.unwrap();
    assert_eq!(fx.score.totals(), (5, 6));
    assert_eq!(fx.result, Some(MatchResult::Team("EE".to_string())));
}

#[tokio::test]
async fn final_concludes_into_the_best_player_ledger() {
    let h = harness();
    h.nominations
        .insert_roster(Sport::Football, "CS", 2026, roster("CS", 11))
        .await;
    h.nominations
        .insert_roster(Sport::Football, "EE", 2026, roster("EE", 11))
        .await;

    let fin = Fixture::new(
        Sport::Football,
        2026,
        Stage::Final,
        "CS",
        "EE",
        roster("CS", 11),
        roster("EE", 11),
    );
    let id = fin.id;
    h.fixtures.insert(&fin).await.unwrap();

    h.engine.start(&referee(), Sport::Football, id).await.unwrap();
    h.engine
        .record_scoring_event(&referee(), Sport::Football, id, TeamSide::Team1, "CS-9", 1)
        .await
        .unwrap();
    h.engine
        .record_scoring_event(&referee(), Sport::Football, id, TeamSide::Team1, "CS-9", 1)
        .await
        .unwrap();
    let outcome = h.engine.stop(&referee(), Sport::Football, id).await.unwrap();
    assert!(outcome.warnings.is_empty());

    let ledger = h.stats.get(Sport::Football, 2026).await.unwrap().unwrap();
    let top = ledger
        .players
        .iter()
        .max_by_key(|p| p.total)
        .unwrap();
    assert_eq!(top.reg_no, "CS-9");
    assert_eq!(top.total, 2);
    assert_eq!(top.matches_played, 1);
    // Everyone nominated appears, even without a scoring event
    assert_eq!(ledger.players.len(), 22);
}

#[tokio::test]
async fn concurrent_writers_get_a_version_conflict() {
    let h = harness();
    let fx = Fixture::new(
        Sport::Football,
        2026,
        Stage::PoolA,
        "CS",
        "ME",
        roster("CS", 11),
        roster("ME", 11),
    );
    let id = fx.id;
    h.fixtures.insert(&fx).await.unwrap();
    h.engine.start(&referee(), Sport::Football, id).await.unwrap();

    let mut stale = h.fixtures.get(Sport::Football, id).await.unwrap();
    h.engine
        .record_scoring_event(&referee(), Sport::Football, id, TeamSide::Team1, "CS-9", 1)
        .await
        .unwrap();

    let err = h.fixtures.save(&mut stale).await.unwrap_err();
    assert!(err.is_retriable());
}
