//! Sportsmeet Core - Match lifecycle and live scoring for the intramural
//! tournament backend.
//!
//! This module provides:
//! - The fixture status machine (upcoming -> live -> recent)
//! - A static rule table covering all thirteen sports
//! - Scoring events, roster swaps, and segment progression
//! - The cricket innings sub-engine (toss, overs, ball-by-ball log)
//! - Knockout bracket propagation into TBD placeholder slots
//! - Tournament finalization into the per-sport best-player ledger
//! - Postgres document stores and a Redis event bus

pub mod db;
pub mod engine;
pub mod error;
pub mod knockout;
pub mod models;
pub mod redis;
pub mod sport_config;
pub mod stats;

pub use engine::{FixtureResolved, MatchLifecycleEngine, ResolutionHooks};
pub use error::{EngineError, EngineResult};
pub use knockout::KnockoutPropagator;
pub use sport_config::{Sport, SportConfig, SPORT_CONFIGS};
pub use stats::TournamentFinalizer;
