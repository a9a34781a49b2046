//! Redis command listener.
//!
//! Consumes lifecycle commands from the command channel, applies them
//! through the engine, and publishes the operation outcome. A concluded
//! fixture additionally gets its `FixtureResolved` event published for
//! external consumers (scoreboards, notification fan-out).

use anyhow::Result;
use futures_util::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use sportsmeet_rust_core::db::execute_with_retry;
use sportsmeet_rust_core::engine::{FixtureResolved, MatchLifecycleEngine};
use sportsmeet_rust_core::models::{
    AuthContext, BallEvent, MatchStatus, OpOutcome, TeamSide, TossDecision,
};
use sportsmeet_rust_core::redis::{RedisBus, COMMAND_CHANNEL, OUTCOME_CHANNEL, RESOLVED_CHANNEL};
use sportsmeet_rust_core::Sport;

use crate::config::ServiceConfig;

/// One lifecycle operation, as carried on the command channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LifecycleCommand {
    Start {
        sport: Sport,
        fixture_id: Uuid,
    },
    AdvanceSegment {
        sport: Sport,
        fixture_id: Uuid,
    },
    RecordScore {
        sport: Sport,
        fixture_id: Uuid,
        side: TeamSide,
        reg_no: String,
        amount: u16,
    },
    RecordBall {
        sport: Sport,
        fixture_id: Uuid,
        striker: String,
        event: BallEvent,
    },
    RecordToss {
        sport: Sport,
        fixture_id: Uuid,
        winner: String,
        decision: TossDecision,
    },
    AssignActiveRoles {
        sport: Sport,
        fixture_id: Uuid,
        batsman1: String,
        batsman2: String,
        bowler: String,
    },
    ChangeBowler {
        sport: Sport,
        fixture_id: Uuid,
        bowler: String,
    },
    SwapRoster {
        sport: Sport,
        fixture_id: Uuid,
        outgoing: String,
        incoming: String,
    },
    RecordPenalty {
        sport: Sport,
        fixture_id: Uuid,
        side: TeamSide,
        reg_no: String,
        scored: bool,
    },
    Stop {
        sport: Sport,
        fixture_id: Uuid,
    },
    RerunResolution {
        sport: Sport,
        fixture_id: Uuid,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandEnvelope {
    pub auth: AuthContext,
    #[serde(flatten)]
    pub command: LifecycleCommand,
}

pub struct CommandListener {
    engine: Arc<MatchLifecycleEngine>,
    bus: RedisBus,
    config: ServiceConfig,
}

impl CommandListener {
    pub fn new(engine: Arc<MatchLifecycleEngine>, bus: RedisBus, config: ServiceConfig) -> Self {
        Self {
            engine,
            bus,
            config,
        }
    }

    /// Subscribe and process commands until the process is stopped,
    /// re-subscribing after connection drops.
    pub async fn run(&self) -> Result<()> {
        loop {
            let pubsub = match self.bus.subscribe(COMMAND_CHANNEL).await {
                Ok(p) => p,
                Err(e) => {
                    warn!("Command channel subscribe failed: {}; retrying", e);
                    tokio::time::sleep(self.config.reconnect_delay).await;
                    continue;
                }
            };
            info!("Listening on {}", COMMAND_CHANNEL);

            let mut stream = pubsub.into_on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("Unreadable command payload: {}", e);
                        continue;
                    }
                };
                self.handle_payload(&payload).await;
            }

            warn!("Command stream ended; re-subscribing");
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    pub async fn handle_payload(&self, payload: &str) {
        let envelope: CommandEnvelope = match serde_json::from_str(payload) {
            Ok(env) => env,
            Err(e) => {
                warn!("Dropping malformed command: {}", e);
                return;
            }
        };

        let outcome = match execute_with_retry(
            || self.apply(&envelope),
            self.config.op_retry_attempts,
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Operation failed: {}", e);
                OpOutcome::failed(&e)
            }
        };

        self.publish_results(&outcome).await;
    }

    async fn apply(
        &self,
        envelope: &CommandEnvelope,
    ) -> sportsmeet_rust_core::EngineResult<OpOutcome> {
        let ctx = &envelope.auth;
        let engine = &self.engine;
        match &envelope.command {
            LifecycleCommand::Start { sport, fixture_id } => engine
                .start(ctx, *sport, *fixture_id)
                .await
                .map(|fx| OpOutcome::ok("match started", fx)),
            LifecycleCommand::AdvanceSegment { sport, fixture_id } => engine
                .advance_segment(ctx, *sport, *fixture_id)
                .await
                .map(|fx| OpOutcome::ok("segment advanced", fx)),
            LifecycleCommand::RecordScore {
                sport,
                fixture_id,
                side,
                reg_no,
                amount,
            } => engine
                .record_scoring_event(ctx, *sport, *fixture_id, *side, reg_no, *amount)
                .await
                .map(|fx| OpOutcome::ok("score recorded", fx)),
            LifecycleCommand::RecordBall {
                sport,
                fixture_id,
                striker,
                event,
            } => engine
                .record_ball(ctx, *sport, *fixture_id, striker, *event)
                .await
                .map(|fx| OpOutcome::ok("ball recorded", fx)),
            LifecycleCommand::RecordToss {
                sport,
                fixture_id,
                winner,
                decision,
            } => engine
                .record_toss(ctx, *sport, *fixture_id, winner, *decision)
                .await
                .map(|fx| OpOutcome::ok("toss recorded", fx)),
            LifecycleCommand::AssignActiveRoles {
                sport,
                fixture_id,
                batsman1,
                batsman2,
                bowler,
            } => engine
                .assign_active_roles(ctx, *sport, *fixture_id, batsman1, batsman2, bowler)
                .await
                .map(|fx| OpOutcome::ok("active roles assigned", fx)),
            LifecycleCommand::ChangeBowler {
                sport,
                fixture_id,
                bowler,
            } => engine
                .change_bowler(ctx, *sport, *fixture_id, bowler)
                .await
                .map(|fx| OpOutcome::ok("bowler changed", fx)),
            LifecycleCommand::SwapRoster {
                sport,
                fixture_id,
                outgoing,
                incoming,
            } => engine
                .swap_roster(ctx, *sport, *fixture_id, outgoing, incoming)
                .await
                .map(|fx| OpOutcome::ok("roster updated", fx)),
            LifecycleCommand::RecordPenalty {
                sport,
                fixture_id,
                side,
                reg_no,
                scored,
            } => engine
                .record_penalty(ctx, *sport, *fixture_id, *side, reg_no, *scored)
                .await
                .map(|fx| OpOutcome::ok("penalty recorded", fx)),
            LifecycleCommand::Stop { sport, fixture_id } => {
                engine.stop(ctx, *sport, *fixture_id).await
            }
            LifecycleCommand::RerunResolution { sport, fixture_id } => {
                engine.rerun_resolution(ctx, *sport, *fixture_id).await
            }
        }
    }

    async fn publish_results(&self, outcome: &OpOutcome) {
        if let Err(e) = self.bus.publish(OUTCOME_CHANNEL, outcome).await {
            error!("Failed to publish outcome: {}", e);
        }

        // A freshly concluded fixture also goes out as a resolution event
        let resolved = outcome.data.as_ref().and_then(|fx| {
            if fx.status != MatchStatus::Recent {
                return None;
            }
            fx.result.clone().map(|result| FixtureResolved {
                fixture_id: fx.id,
                sport: fx.sport,
                year: fx.year,
                stage: fx.stage,
                result,
            })
        });
        if let Some(event) = resolved {
            if let Err(e) = self.bus.publish(RESOLVED_CHANNEL, &event).await {
                error!("Failed to publish resolution event: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_envelope_parses() {
        let raw = r#"{
            "auth": {"user_id": "ref-1", "role": "referee"},
            "op": "record_score",
            "sport": "football",
            "fixture_id": "4f5c8f44-5f11-4a2f-9f5e-6a3f8a2b1c0d",
            "side": "team1",
            "reg_no": "CS-9",
            "amount": 1
        }"#;
        let env: CommandEnvelope = serde_json::from_str(raw).unwrap();
        match env.command {
            LifecycleCommand::RecordScore { sport, amount, .. } => {
                assert_eq!(sport, Sport::Football);
                assert_eq!(amount, 1);
            }
            other => panic!("wrong command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let raw = r#"{"auth": {"user_id": "x", "role": "admin"}, "op": "reschedule"}"#;
        assert!(serde_json::from_str::<CommandEnvelope>(raw).is_err());
    }
}
