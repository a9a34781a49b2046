//! Cricket-specific fixture state: toss, overs arithmetic, ball-by-ball log.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Ball-by-ball log entries
// ============================================================================

/// One delivery in an innings log. Wire form matches the scorebook
/// shorthand: `"4"` runs, `"W"` wicket, `"WD"` wide, `"NB"` no-ball,
/// `"2B"` two byes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BallEvent {
    Runs(u8),
    Wicket,
    Wide,
    NoBall,
    Bye(u8),
}

impl BallEvent {
    /// Wides and no-balls are illegal deliveries and do not consume a ball.
    pub fn is_legal_delivery(&self) -> bool {
        !matches!(self, BallEvent::Wide | BallEvent::NoBall)
    }

    /// Runs added to the batting side's total by this delivery.
    pub fn team_runs(&self) -> u16 {
        match self {
            BallEvent::Runs(r) => *r as u16,
            BallEvent::Wicket => 0,
            // One-run extras per the tournament's playing conditions
            BallEvent::Wide | BallEvent::NoBall => 1,
            BallEvent::Bye(r) => *r as u16,
        }
    }

    /// Runs credited to the striking batsman (extras and byes are not).
    pub fn batsman_runs(&self) -> u16 {
        match self {
            BallEvent::Runs(r) => *r as u16,
            _ => 0,
        }
    }
}

impl fmt::Display for BallEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BallEvent::Runs(r) => write!(f, "{}", r),
            BallEvent::Wicket => write!(f, "W"),
            BallEvent::Wide => write!(f, "WD"),
            BallEvent::NoBall => write!(f, "NB"),
            BallEvent::Bye(r) => write!(f, "{}B", r),
        }
    }
}

impl From<BallEvent> for String {
    fn from(e: BallEvent) -> Self {
        e.to_string()
    }
}

impl TryFrom<String> for BallEvent {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "W" => return Ok(BallEvent::Wicket),
            "WD" => return Ok(BallEvent::Wide),
            "NB" => return Ok(BallEvent::NoBall),
            _ => {}
        }
        if let Some(byes) = s.strip_suffix('B') {
            return byes
                .parse::<u8>()
                .map(BallEvent::Bye)
                .map_err(|_| format!("bad bye entry: {}", s));
        }
        s.parse::<u8>()
            .map(BallEvent::Runs)
            .map_err(|_| format!("bad ball entry: {}", s))
    }
}

// ============================================================================
// Overs
// ============================================================================

/// Over counter with a base-6 fractional part counting legal balls 0..=5.
///
/// Wire form is the scorebook decimal (`"3.4"` = 3 overs and 4 balls);
/// advancing past `.5` rolls the whole part over (six-ball-over rule).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Overs {
    pub whole: u16,
    pub balls: u8,
}

impl Overs {
    pub fn new(whole: u16, balls: u8) -> Self {
        debug_assert!(balls <= 5);
        Self { whole, balls }
    }

    /// Advance by one legal ball.
    pub fn advance(&mut self) {
        if self.balls >= 5 {
            self.whole += 1;
            self.balls = 0;
        } else {
            self.balls += 1;
        }
    }
}

impl fmt::Display for Overs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.whole, self.balls)
    }
}

impl From<Overs> for String {
    fn from(o: Overs) -> Self {
        o.to_string()
    }
}

impl TryFrom<String> for Overs {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let (whole, balls) = s.split_once('.').unwrap_or((s.as_str(), "0"));
        let whole = whole
            .parse::<u16>()
            .map_err(|_| format!("bad overs value: {}", s))?;
        let balls = balls
            .parse::<u8>()
            .map_err(|_| format!("bad overs value: {}", s))?;
        if balls > 5 {
            return Err(format!("ball count {} exceeds a six-ball over", balls));
        }
        Ok(Overs { whole, balls })
    }
}

// ============================================================================
// Toss & innings assignments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TossDecision {
    Bat,
    Bowl,
}

/// Extra per-fixture state carried only by cricket fixtures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CricketState {
    pub toss_winner: Option<String>,
    pub toss_winner_decision: Option<TossDecision>,
    pub toss_loser: Option<String>,
    pub toss_loser_decision: Option<TossDecision>,

    pub first_inning_batting: Option<String>,
    pub first_inning_bowling: Option<String>,
    pub second_inning_batting: Option<String>,
    pub second_inning_bowling: Option<String>,

    pub wickets_t1: u8,
    pub wickets_t2: u8,

    pub overs_inning1: Overs,
    pub overs_inning2: Overs,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log_inning1: Vec<BallEvent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log_inning2: Vec<BallEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_six_advances_complete_an_over() {
        let mut o = Overs::default();
        for _ in 0..6 {
            o.advance();
        }
        assert_eq!(o, Overs::new(1, 0));
        assert_eq!(o.to_string(), "1.0");
    }

    #[test]
    fn test_advance_mid_over() {
        let mut o = Overs::new(3, 4);
        o.advance();
        assert_eq!(o, Overs::new(3, 5));
        o.advance();
        assert_eq!(o, Overs::new(4, 0));
    }

    #[test]
    fn test_overs_wire_form() {
        let o: Overs = serde_json::from_str("\"12.3\"").unwrap();
        assert_eq!(o, Overs::new(12, 3));
        assert_eq!(serde_json::to_string(&o).unwrap(), "\"12.3\"");
        assert!(serde_json::from_str::<Overs>("\"2.7\"").is_err());
    }

    #[test]
    fn test_ball_event_wire_forms() {
        for (raw, event) in [
            ("4", BallEvent::Runs(4)),
            ("W", BallEvent::Wicket),
            ("WD", BallEvent::Wide),
            ("NB", BallEvent::NoBall),
            ("2B", BallEvent::Bye(2)),
        ] {
            let parsed: BallEvent = serde_json::from_str(&format!("\"{}\"", raw)).unwrap();
            assert_eq!(parsed, event);
            assert_eq!(parsed.to_string(), raw);
        }
        assert!(serde_json::from_str::<BallEvent>("\"XX\"").is_err());
    }

    #[test]
    fn test_extras_do_not_consume_a_ball() {
        assert!(!BallEvent::Wide.is_legal_delivery());
        assert!(!BallEvent::NoBall.is_legal_delivery());
        assert!(BallEvent::Bye(1).is_legal_delivery());
        assert!(BallEvent::Wicket.is_legal_delivery());
    }

    #[test]
    fn test_byes_score_without_crediting_the_batsman() {
        let bye = BallEvent::Bye(3);
        assert_eq!(bye.team_runs(), 3);
        assert_eq!(bye.batsman_runs(), 0);
        let four = BallEvent::Runs(4);
        assert_eq!(four.team_runs(), 4);
        assert_eq!(four.batsman_runs(), 4);
    }
}
