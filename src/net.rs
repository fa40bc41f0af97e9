use serde::{Deserialize, Serialize};

use crate::types::{DailyPuzzle, DayKey, Mode};

// Response shapes handed to the presentation layer. Kept dumb: the
// orchestrator fills them in, clients render them.

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct StateResponse {
    pub puzzle: DailyPuzzle,
    /// Echo of the mode this state is locked to.
    pub mode: Mode,
    pub day: DayKey,
    pub committed: bool,
    pub completed: bool,
    pub total_score: u32,
    pub streak: u32,
    pub last_win_day: Option<DayKey>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CommitResponse {
    pub committed: bool,
    pub completed: bool,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct GuessResponse {
    pub correct: bool,
    /// Points granted by this call; zero on a replay or a miss.
    pub points: u32,
    pub answer: String,
    pub total_score: u32,
    pub streak: u32,
    pub completed: bool,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct GiveUpResponse {
    pub completed: bool,
    pub answer: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct DailyTotals {
    pub day: DayKey,
    pub plays: i64,
    pub wins: i64,
}
