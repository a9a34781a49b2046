//! Sport rule table for all supported intramural sports.
//!
//! This module provides:
//! - The closed `Sport` enum (thirteen sports, resolved once at fixture
//!   creation, never re-derived from a string per call)
//! - Static per-sport configuration: segment count and terminology, score
//!   shape, winner-rule family, roster vocabulary, and player stat kind
//!
//! Every per-sport behavioral difference in the lifecycle engine reduces to
//! this table plus a small set of algorithm variants; there are no
//! sport-name branches anywhere else in the engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Football,
    Futsal,
    Cricket,
    Basketball,
    Volleyball,
    Snooker,
    Badminton,
    Tennis,
    TableTennis,
    TugOfWar,
    Handball,
    Kabaddi,
    Throwball,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Football => "football",
            Sport::Futsal => "futsal",
            Sport::Cricket => "cricket",
            Sport::Basketball => "basketball",
            Sport::Volleyball => "volleyball",
            Sport::Snooker => "snooker",
            Sport::Badminton => "badminton",
            Sport::Tennis => "tennis",
            Sport::TableTennis => "tabletennis",
            Sport::TugOfWar => "tugofwar",
            Sport::Handball => "handball",
            Sport::Kabaddi => "kabaddi",
            Sport::Throwball => "throwball",
        }
    }

    /// Parse a sport code (case-insensitive). Returns `None` for anything
    /// outside the closed set.
    pub fn parse(code: &str) -> Option<Sport> {
        all_sports()
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(code))
    }

    /// Rule-table entry for this sport. Every sport has one; the table is
    /// checked exhaustive in tests.
    pub fn config(&self) -> &'static SportConfig {
        SPORT_CONFIGS
            .iter()
            .find(|c| c.sport == *self)
            .expect("every Sport variant has a SPORT_CONFIGS entry")
    }
}

/// How a sport's score is stored on the fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreShape {
    /// One running integer pair for the whole match (football, futsal, cricket).
    Scalar,
    /// A fixed-length per-segment array per side (quarter/set sports).
    PerSegment,
}

/// Which winner-determination family applies at stop time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinnerRule {
    /// Higher final score wins; equal is a draw. Knockout draws may be
    /// overridden by a penalty shootout where the sport allows one.
    Cumulative { penalty_shootout: bool },
    /// Most segment wins takes the match; a tie in segment wins is a draw,
    /// optionally broken first by total points across segments (basketball).
    SegmentMajority { point_total_tiebreak: bool },
}

/// Which playing-status vocabulary a sport's rosters use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterVocab {
    /// Playing / Reserved only.
    Standard,
    /// Playing / Reserved / ActiveBatsman / ActiveBowler / Out.
    Cricket,
}

/// Which per-player counter a scoring event increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatKind {
    /// Single goals-scored counter.
    Goals,
    /// One points bucket per segment.
    PointsBySegment,
    /// Runs/balls/wickets via the innings sub-engine.
    Cricket,
}

/// Configuration for a single sport.
#[derive(Debug, Clone)]
pub struct SportConfig {
    pub sport: Sport,
    /// Number of halves/quarters/sets/innings.
    pub segment_count: u8,
    /// Terminology used in messages and logs ("half", "quarter", ...).
    pub segment_label: &'static str,
    pub score_shape: ScoreShape,
    pub winner_rule: WinnerRule,
    pub roster_vocab: RosterVocab,
    pub player_stat: PlayerStatKind,
    /// Whether the tournament finalizer maintains a best-player ledger.
    pub tracks_best_player: bool,
}

/// Static configuration for all supported sports.
pub static SPORT_CONFIGS: &[SportConfig] = &[
    // Cumulative-score sports
    SportConfig {
        sport: Sport::Football,
        segment_count: 2,
        segment_label: "half",
        score_shape: ScoreShape::Scalar,
        winner_rule: WinnerRule::Cumulative {
            penalty_shootout: true,
        },
        roster_vocab: RosterVocab::Standard,
        player_stat: PlayerStatKind::Goals,
        tracks_best_player: true,
    },
    SportConfig {
        sport: Sport::Futsal,
        segment_count: 2,
        segment_label: "half",
        score_shape: ScoreShape::Scalar,
        winner_rule: WinnerRule::Cumulative {
            penalty_shootout: true,
        },
        roster_vocab: RosterVocab::Standard,
        player_stat: PlayerStatKind::Goals,
        tracks_best_player: true,
    },
    SportConfig {
        sport: Sport::Cricket,
        segment_count: 2,
        segment_label: "inning",
        score_shape: ScoreShape::Scalar,
        winner_rule: WinnerRule::Cumulative {
            penalty_shootout: false,
        },
        roster_vocab: RosterVocab::Cricket,
        player_stat: PlayerStatKind::Cricket,
        tracks_best_player: true,
    },
    SportConfig {
        sport: Sport::Handball,
        segment_count: 2,
        segment_label: "half",
        score_shape: ScoreShape::Scalar,
        winner_rule: WinnerRule::Cumulative {
            penalty_shootout: false,
        },
        roster_vocab: RosterVocab::Standard,
        player_stat: PlayerStatKind::Goals,
        tracks_best_player: false,
    },
    SportConfig {
        sport: Sport::Kabaddi,
        segment_count: 2,
        segment_label: "half",
        score_shape: ScoreShape::Scalar,
        winner_rule: WinnerRule::Cumulative {
            penalty_shootout: false,
        },
        roster_vocab: RosterVocab::Standard,
        player_stat: PlayerStatKind::Goals,
        tracks_best_player: false,
    },
    // Segment-majority sports
    SportConfig {
        sport: Sport::Basketball,
        segment_count: 4,
        segment_label: "quarter",
        score_shape: ScoreShape::PerSegment,
        winner_rule: WinnerRule::SegmentMajority {
            point_total_tiebreak: true,
        },
        roster_vocab: RosterVocab::Standard,
        player_stat: PlayerStatKind::PointsBySegment,
        tracks_best_player: true,
    },
    SportConfig {
        sport: Sport::Volleyball,
        segment_count: 3,
        segment_label: "set",
        score_shape: ScoreShape::PerSegment,
        winner_rule: WinnerRule::SegmentMajority {
            point_total_tiebreak: false,
        },
        roster_vocab: RosterVocab::Standard,
        player_stat: PlayerStatKind::PointsBySegment,
        tracks_best_player: true,
    },
    SportConfig {
        sport: Sport::Snooker,
        segment_count: 3,
        segment_label: "frame",
        score_shape: ScoreShape::PerSegment,
        winner_rule: WinnerRule::SegmentMajority {
            point_total_tiebreak: false,
        },
        roster_vocab: RosterVocab::Standard,
        player_stat: PlayerStatKind::PointsBySegment,
        tracks_best_player: false,
    },
    SportConfig {
        sport: Sport::Badminton,
        segment_count: 3,
        segment_label: "set",
        score_shape: ScoreShape::PerSegment,
        winner_rule: WinnerRule::SegmentMajority {
            point_total_tiebreak: false,
        },
        roster_vocab: RosterVocab::Standard,
        player_stat: PlayerStatKind::PointsBySegment,
        tracks_best_player: false,
    },
    SportConfig {
        sport: Sport::Tennis,
        segment_count: 3,
        segment_label: "set",
        score_shape: ScoreShape::PerSegment,
        winner_rule: WinnerRule::SegmentMajority {
            point_total_tiebreak: false,
        },
        roster_vocab: RosterVocab::Standard,
        player_stat: PlayerStatKind::PointsBySegment,
        tracks_best_player: false,
    },
    SportConfig {
        sport: Sport::TableTennis,
        segment_count: 3,
        segment_label: "set",
        score_shape: ScoreShape::PerSegment,
        winner_rule: WinnerRule::SegmentMajority {
            point_total_tiebreak: false,
        },
        roster_vocab: RosterVocab::Standard,
        player_stat: PlayerStatKind::PointsBySegment,
        tracks_best_player: false,
    },
    SportConfig {
        sport: Sport::TugOfWar,
        segment_count: 3,
        segment_label: "pull",
        score_shape: ScoreShape::PerSegment,
        winner_rule: WinnerRule::SegmentMajority {
            point_total_tiebreak: false,
        },
        roster_vocab: RosterVocab::Standard,
        player_stat: PlayerStatKind::PointsBySegment,
        tracks_best_player: false,
    },
    SportConfig {
        sport: Sport::Throwball,
        segment_count: 3,
        segment_label: "set",
        score_shape: ScoreShape::PerSegment,
        winner_rule: WinnerRule::SegmentMajority {
            point_total_tiebreak: false,
        },
        roster_vocab: RosterVocab::Standard,
        player_stat: PlayerStatKind::PointsBySegment,
        tracks_best_player: false,
    },
];

/// All sport variants, in table order.
pub fn all_sports() -> Vec<Sport> {
    SPORT_CONFIGS.iter().map(|c| c.sport).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_sports_count() {
        // Thirteen sports configured
        assert_eq!(SPORT_CONFIGS.len(), 13);
    }

    #[test]
    fn test_every_variant_has_config() {
        for sport in all_sports() {
            let cfg = sport.config();
            assert_eq!(cfg.sport, sport);
            assert!(cfg.segment_count >= 2);
        }
    }

    #[test]
    fn test_parse_case_insensitivity() {
        assert_eq!(Sport::parse("CRICKET"), Some(Sport::Cricket));
        assert_eq!(Sport::parse("TableTennis"), Some(Sport::TableTennis));
        assert_eq!(Sport::parse("rugby"), None);
    }

    #[test]
    fn test_cricket_uses_innings_vocab() {
        let cfg = Sport::Cricket.config();
        assert_eq!(cfg.segment_label, "inning");
        assert_eq!(cfg.roster_vocab, RosterVocab::Cricket);
        assert_eq!(cfg.player_stat, PlayerStatKind::Cricket);
    }

    #[test]
    fn test_only_football_codes_have_penalties() {
        for cfg in SPORT_CONFIGS {
            let has_pens = matches!(
                cfg.winner_rule,
                WinnerRule::Cumulative {
                    penalty_shootout: true
                }
            );
            let expected = matches!(cfg.sport, Sport::Football | Sport::Futsal);
            assert_eq!(has_pens, expected, "sport {:?}", cfg.sport);
        }
    }

    #[test]
    fn test_score_shape_matches_winner_rule() {
        for cfg in SPORT_CONFIGS {
            match cfg.winner_rule {
                WinnerRule::Cumulative { .. } => {
                    assert_eq!(cfg.score_shape, ScoreShape::Scalar, "sport {:?}", cfg.sport)
                }
                WinnerRule::SegmentMajority { .. } => assert_eq!(
                    cfg.score_shape,
                    ScoreShape::PerSegment,
                    "sport {:?}",
                    cfg.sport
                ),
            }
        }
    }

    #[test]
    fn test_basketball_tiebreak_flag() {
        match Sport::Basketball.config().winner_rule {
            WinnerRule::SegmentMajority {
                point_total_tiebreak,
            } => assert!(point_total_tiebreak),
            _ => panic!("basketball is segment-majority"),
        }
    }
}
