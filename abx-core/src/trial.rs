use crate::stimulus::{Condition, StimulusRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two answer slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::A => "A",
            Side::B => "B",
        }
    }

    pub fn other(&self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown answer `{0}` (expected A or B)")]
pub struct UnknownSide(pub String);

impl FromStr for Side {
    type Err = UnknownSide;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Side::A),
            "B" | "b" => Ok(Side::B),
            other => Err(UnknownSide(other.to_string())),
        }
    }
}

/// How a triad was put together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Construction {
    /// X shares its driver with exactly one of A/B by construction
    Paired,
    /// Three records drawn at random from a pool too sparse for pairing
    Fallback,
}

/// Presentation state of a trial inside a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Pending,
    Presented,
    Responded,
}

/// An A/B/X triad with its ground truth
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbxTrial {
    pub condition: Condition,
    pub a: StimulusRecord,
    pub b: StimulusRecord,
    pub x: StimulusRecord,
    /// `None` when the triad cannot be scored: X matches neither or both of A/B
    pub correct_answer: Option<Side>,
    pub construction: Construction,
}

impl AbxTrial {
    /// Builds a trial from an arbitrary triad, deriving the answer from driver equality.
    pub fn from_triad(
        condition: Condition,
        a: StimulusRecord,
        b: StimulusRecord,
        x: StimulusRecord,
        construction: Construction,
    ) -> Self {
        let correct_answer = match (a.driver == x.driver, b.driver == x.driver) {
            (true, false) => Some(Side::A),
            (false, true) => Some(Side::B),
            _ => None,
        };
        Self {
            condition,
            a,
            b,
            x,
            correct_answer,
            construction,
        }
    }

    pub fn slot(&self, side: Side) -> &StimulusRecord {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    pub fn is_scoreable(&self) -> bool {
        self.correct_answer.is_some()
    }

    /// Whether `chosen` is the right answer, `None` for unscoreable triads
    pub fn score(&self, chosen: Side) -> Option<bool> {
        self.correct_answer.map(|correct| correct == chosen)
    }
}

/// Recorded response per trial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialResponse {
    pub trial_index: usize,
    pub is_practice: bool,
    pub trial: AbxTrial,
    pub chosen: Side,
    pub reaction_time_ms: u64,
    pub is_correct: Option<bool>,
    pub timestamp: DateTime<Utc>,
}
