// Shared models for the sportsmeet tournament backend
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::sport_config::{PlayerStatKind, RosterVocab, ScoreShape, Sport};

pub mod cricket;

pub use cricket::{BallEvent, CricketState, Overs, TossDecision};

/// Placeholder team name in knockout fixtures awaiting an earlier round's winner.
pub const TBD: &str = "TBD";

// ============================================================================
// Lifecycle & Bracket Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Recent,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Live => "live",
            MatchStatus::Recent => "recent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "Pool A")]
    PoolA,
    #[serde(rename = "Pool B")]
    PoolB,
    #[serde(rename = "play-off")]
    PlayOff,
    #[serde(rename = "semi")]
    Semi,
    #[serde(rename = "final")]
    Final,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::PoolA => "Pool A",
            Stage::PoolB => "Pool B",
            Stage::PlayOff => "play-off",
            Stage::Semi => "semi",
            Stage::Final => "final",
        }
    }

    pub fn is_knockout(&self) -> bool {
        matches!(self, Stage::PlayOff | Stage::Semi | Stage::Final)
    }
}

/// Final outcome of a fixture: the winning team's name, or a draw.
///
/// Serialized as a plain string ("Draw" is reserved and never a valid
/// department name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MatchResult {
    Team(String),
    Draw,
}

impl From<String> for MatchResult {
    fn from(s: String) -> Self {
        if s == "Draw" {
            MatchResult::Draw
        } else {
            MatchResult::Team(s)
        }
    }
}

impl From<MatchResult> for String {
    fn from(r: MatchResult) -> Self {
        match r {
            MatchResult::Team(t) => t,
            MatchResult::Draw => "Draw".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    Team1,
    Team2,
}

impl TeamSide {
    pub fn other(&self) -> TeamSide {
        match self {
            TeamSide::Team1 => TeamSide::Team2,
            TeamSide::Team2 => TeamSide::Team1,
        }
    }
}

// ============================================================================
// Rosters
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayingStatus {
    Playing,
    Reserved,
    ActiveBatsman,
    ActiveBowler,
    Out,
}

impl PlayingStatus {
    /// Whether this status belongs to the given roster vocabulary.
    pub fn in_vocab(&self, vocab: RosterVocab) -> bool {
        match vocab {
            RosterVocab::Standard => {
                matches!(self, PlayingStatus::Playing | PlayingStatus::Reserved)
            }
            RosterVocab::Cricket => true,
        }
    }
}

/// One nominated player, copied from the nomination store into a fixture's
/// roster at schedule time (or backfilled when a TBD slot resolves).
///
/// The per-sport counters are a union over all stat kinds; only the fields
/// the sport's `PlayerStatKind` names are ever mutated, and zero-valued
/// counters are omitted from the stored document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub shirt_number: u8,
    pub reg_no: String,
    pub name: String,
    pub national_id: String,
    pub section: String,
    pub status: PlayingStatus,

    // Goals sports
    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub goals: u16,

    // Per-segment sports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points_by_segment: Vec<u16>,

    // Cricket
    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub runs_scored: u16,
    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub balls_faced: u16,
    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub balls_bowled: u16,
    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub wickets_taken: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ball_log: Vec<BallEvent>,
}

fn is_zero_u16(v: &u16) -> bool {
    *v == 0
}

impl PlayerEntry {
    pub fn new(shirt_number: u8, reg_no: &str, name: &str, national_id: &str, section: &str) -> Self {
        Self {
            shirt_number,
            reg_no: reg_no.to_string(),
            name: name.to_string(),
            national_id: national_id.to_string(),
            section: section.to_string(),
            status: PlayingStatus::Playing,
            goals: 0,
            points_by_segment: Vec::new(),
            runs_scored: 0,
            balls_faced: 0,
            balls_bowled: 0,
            wickets_taken: 0,
            ball_log: Vec::new(),
        }
    }

    /// This player's contribution to the aggregate leaderboard for the
    /// given stat kind (runs + wickets for cricket).
    pub fn stat_total(&self, kind: PlayerStatKind) -> u32 {
        match kind {
            PlayerStatKind::Goals => self.goals as u32,
            PlayerStatKind::PointsBySegment => {
                self.points_by_segment.iter().map(|p| *p as u32).sum()
            }
            PlayerStatKind::Cricket => self.runs_scored as u32 + self.wickets_taken as u32,
        }
    }
}

// ============================================================================
// Score
// ============================================================================

/// Either a single running pair (cumulative sports) or one integer per
/// segment per side (segment-scored sports).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Score {
    Scalar { t1: u16, t2: u16 },
    PerSegment { t1: Vec<u16>, t2: Vec<u16> },
}

impl Score {
    /// Zeroed score of the right shape for a sport.
    pub fn zero_for(sport: Sport) -> Score {
        let cfg = sport.config();
        match cfg.score_shape {
            ScoreShape::Scalar => Score::Scalar { t1: 0, t2: 0 },
            ScoreShape::PerSegment => Score::PerSegment {
                t1: vec![0; cfg.segment_count as usize],
                t2: vec![0; cfg.segment_count as usize],
            },
        }
    }

    /// Whole-match totals per side.
    pub fn totals(&self) -> (u32, u32) {
        match self {
            Score::Scalar { t1, t2 } => (*t1 as u32, *t2 as u32),
            Score::PerSegment { t1, t2 } => (
                t1.iter().map(|v| *v as u32).sum(),
                t2.iter().map(|v| *v as u32).sum(),
            ),
        }
    }

    /// Both sides' score for one segment. InvalidInput when the arrays are
    /// shorter than the requested index.
    pub fn segment_pair(&self, idx: usize) -> EngineResult<(u16, u16)> {
        match self {
            Score::Scalar { .. } => Err(EngineError::InvalidInput(
                "scalar score has no per-segment entries".to_string(),
            )),
            Score::PerSegment { t1, t2 } => match (t1.get(idx), t2.get(idx)) {
                (Some(a), Some(b)) => Ok((*a, *b)),
                _ => Err(EngineError::InvalidInput(format!(
                    "score arrays shorter than segment index {}",
                    idx
                ))),
            },
        }
    }

    /// Mirror a player's scoring event into the team score. Overflowing a
    /// counter is rejected rather than wrapping; bus input is untrusted.
    pub fn add(&mut self, side: TeamSide, segment_idx: usize, amount: u16) -> EngineResult<()> {
        let slot = match self {
            Score::Scalar { t1, t2 } => match side {
                TeamSide::Team1 => t1,
                TeamSide::Team2 => t2,
            },
            Score::PerSegment { t1, t2 } => {
                let arr = match side {
                    TeamSide::Team1 => t1,
                    TeamSide::Team2 => t2,
                };
                arr.get_mut(segment_idx).ok_or_else(|| {
                    EngineError::InvalidInput(format!(
                        "segment index {} out of range",
                        segment_idx
                    ))
                })?
            }
        };
        *slot = slot.checked_add(amount).ok_or_else(|| {
            EngineError::InvalidInput(format!("team score overflow adding {}", amount))
        })?;
        Ok(())
    }
}

// ============================================================================
// Penalties (football/futsal knockout tiebreak)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyAttempt {
    pub reg_no: String,
    pub name: String,
    pub scored: bool,
}

// ============================================================================
// Fixture
// ============================================================================

/// A scheduled match between two departments for a given sport/year/stage.
///
/// The single unit of isolation: every lifecycle operation is one
/// load-mutate-persist round against this document, guarded by `version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub id: Uuid,
    pub sport: Sport,
    pub year: i32,
    pub stage: Stage,
    pub team1: String,
    pub team2: String,
    pub status: MatchStatus,
    pub result: Option<MatchResult>,
    /// Current segment, 1-based while a segment is open; 0 before start and
    /// after the terminal segment closes.
    pub segment: u8,
    /// One slot per segment, written exactly once when that segment closes.
    pub segment_winners: Vec<Option<String>>,
    pub score: Score,
    pub nominations_t1: Vec<PlayerEntry>,
    pub nominations_t2: Vec<PlayerEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cricket: Option<CricketState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub penalties_t1: Vec<PenaltyAttempt>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub penalties_t2: Vec<PenaltyAttempt>,
    /// Optimistic concurrency token; bumped on every save.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Fixture {
    pub fn new(
        sport: Sport,
        year: i32,
        stage: Stage,
        team1: &str,
        team2: &str,
        nominations_t1: Vec<PlayerEntry>,
        nominations_t2: Vec<PlayerEntry>,
    ) -> Self {
        let cfg = sport.config();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sport,
            year,
            stage,
            team1: team1.to_string(),
            team2: team2.to_string(),
            status: MatchStatus::Upcoming,
            result: None,
            segment: 0,
            segment_winners: vec![None; cfg.segment_count as usize],
            score: Score::zero_for(sport),
            nominations_t1,
            nominations_t2,
            cricket: (sport == Sport::Cricket).then(CricketState::default),
            penalties_t1: Vec::new(),
            penalties_t2: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_placeholder_team(&self) -> bool {
        self.team1 == TBD || self.team2 == TBD
    }

    /// Which side a department plays on, if either.
    pub fn side_of(&self, team: &str) -> Option<TeamSide> {
        if self.team1 == team {
            Some(TeamSide::Team1)
        } else if self.team2 == team {
            Some(TeamSide::Team2)
        } else {
            None
        }
    }

    pub fn team_name(&self, side: TeamSide) -> &str {
        match side {
            TeamSide::Team1 => &self.team1,
            TeamSide::Team2 => &self.team2,
        }
    }

    pub fn roster(&self, side: TeamSide) -> &[PlayerEntry] {
        match side {
            TeamSide::Team1 => &self.nominations_t1,
            TeamSide::Team2 => &self.nominations_t2,
        }
    }

    pub fn roster_mut(&mut self, side: TeamSide) -> &mut Vec<PlayerEntry> {
        match side {
            TeamSide::Team1 => &mut self.nominations_t1,
            TeamSide::Team2 => &mut self.nominations_t2,
        }
    }

    /// Count of segment-winner slots already written.
    pub fn closed_segments(&self) -> usize {
        self.segment_winners.iter().filter(|w| w.is_some()).count()
    }
}

// ============================================================================
// Pool (round-robin grouping, read-only for the engine)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolDoc {
    pub sport: Sport,
    pub year: i32,
    pub pool_a: Vec<String>,
    pub pool_b: Vec<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Aggregate stats (best-player ledger)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerTotals {
    pub reg_no: String,
    pub name: String,
    pub department: String,
    /// Cumulative points/goals, or runs + wickets for cricket.
    pub total: u32,
    pub matches_played: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateStats {
    pub sport: Sport,
    pub year: i32,
    pub players: Vec<PlayerTotals>,
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// Auth context & operation envelope
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Coach,
    Coordinator,
    Representative,
    Captain,
    Referee,
}

/// Authenticated caller attached to every lifecycle call. Produced by the
/// identity layer; the engine trusts `sport` and `department` as given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport: Option<Sport>,
}

/// Success/failure envelope returned by every lifecycle operation.
///
/// `warnings` carries qualified-success conditions: the primary mutation
/// committed but a post-commit side effect (knockout propagation, stats
/// finalization) failed and should be retried independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Fixture>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl OpOutcome {
    pub fn ok(message: impl Into<String>, fixture: Fixture) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(fixture),
            warnings: Vec::new(),
        }
    }

    pub fn failed(err: &EngineError) -> Self {
        Self {
            success: false,
            message: format!("{}: {}", err.kind(), err),
            data: None,
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_result_roundtrip() {
        let r: MatchResult = serde_json::from_str("\"CS\"").unwrap();
        assert_eq!(r, MatchResult::Team("CS".to_string()));
        let d: MatchResult = serde_json::from_str("\"Draw\"").unwrap();
        assert_eq!(d, MatchResult::Draw);
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"Draw\"");
    }

    #[test]
    fn test_stage_wire_names() {
        assert_eq!(serde_json::to_string(&Stage::PoolA).unwrap(), "\"Pool A\"");
        assert_eq!(
            serde_json::to_string(&Stage::PlayOff).unwrap(),
            "\"play-off\""
        );
        assert!(Stage::Semi.is_knockout());
        assert!(!Stage::PoolB.is_knockout());
    }

    #[test]
    fn test_score_shapes() {
        let mut s = Score::zero_for(Sport::Basketball);
        s.add(TeamSide::Team1, 0, 12).unwrap();
        s.add(TeamSide::Team2, 3, 9).unwrap();
        assert_eq!(s.segment_pair(0).unwrap(), (12, 0));
        assert_eq!(s.totals(), (12, 9));
        // Index past the fourth quarter is rejected
        assert!(s.add(TeamSide::Team1, 4, 1).is_err());

        let mut f = Score::zero_for(Sport::Football);
        f.add(TeamSide::Team2, 0, 1).unwrap();
        assert_eq!(f.totals(), (0, 1));
        assert!(f.segment_pair(0).is_err());
    }

    #[test]
    fn test_new_fixture_shape() {
        let fx = Fixture::new(
            Sport::Badminton,
            2026,
            Stage::PoolA,
            "CS",
            "EE",
            vec![],
            vec![],
        );
        assert_eq!(fx.status, MatchStatus::Upcoming);
        assert_eq!(fx.segment_winners.len(), 3);
        assert_eq!(fx.segment, 0);
        assert!(fx.cricket.is_none());

        let ck = Fixture::new(Sport::Cricket, 2026, Stage::Final, "CS", "EE", vec![], vec![]);
        assert!(ck.cricket.is_some());
    }

    #[test]
    fn test_placeholder_detection() {
        let fx = Fixture::new(Sport::Football, 2026, Stage::Semi, "CS", TBD, vec![], vec![]);
        assert!(fx.has_placeholder_team());
        assert_eq!(fx.side_of("CS"), Some(TeamSide::Team1));
        assert_eq!(fx.side_of("ME"), None);
    }

    #[test]
    fn test_status_vocab_gate() {
        assert!(PlayingStatus::Reserved.in_vocab(RosterVocab::Standard));
        assert!(!PlayingStatus::ActiveBowler.in_vocab(RosterVocab::Standard));
        assert!(PlayingStatus::Out.in_vocab(RosterVocab::Cricket));
    }

    #[test]
    fn test_player_stat_totals() {
        let mut p = PlayerEntry::new(7, "R-100", "A Player", "N-1", "A");
        p.goals = 3;
        assert_eq!(p.stat_total(PlayerStatKind::Goals), 3);
        p.points_by_segment = vec![4, 0, 6];
        assert_eq!(p.stat_total(PlayerStatKind::PointsBySegment), 10);
        p.runs_scored = 42;
        p.wickets_taken = 2;
        assert_eq!(p.stat_total(PlayerStatKind::Cricket), 44);
    }
}
