use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::DAY_SKEW_TOLERANCE_DAYS;

// Core value types shared across the crate. These stay lean and serde-friendly
// so they cross the cache and response boundaries unchanged.

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Easy,
    Medium,
    Hard,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Easy, Mode::Medium, Mode::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Easy => "easy",
            Mode::Medium => "medium",
            Mode::Hard => "hard",
        }
    }

    /// Lenient parse: the request surface is cooperative, so an unknown mode
    /// lands on the easiest tier instead of failing the request.
    pub fn parse_lenient(raw: &str) -> Mode {
        match raw.trim().to_ascii_lowercase().as_str() {
            "medium" => Mode::Medium,
            "hard" => Mode::Hard,
            _ => Mode::Easy,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UTC calendar date identifying one day's puzzles. Formats as `YYYY-MM-DD`
/// everywhere it appears: storage keys, responses, seed strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn today() -> DayKey {
        DayKey(Utc::now().date_naive())
    }

    pub fn parse(raw: &str) -> Option<DayKey> {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .ok()
            .map(DayKey)
    }

    /// Honor a client-supplied day key within the skew window, otherwise clamp
    /// to UTC today. Absent or unparseable input also lands on today.
    pub fn from_client(raw: Option<&str>) -> DayKey {
        let today = DayKey::today();
        match raw.and_then(DayKey::parse) {
            Some(day) if (day.0 - today.0).num_days().abs() <= DAY_SKEW_TOLERANCE_DAYS => day,
            _ => today,
        }
    }

    /// The previous calendar day.
    pub fn pred(&self) -> DayKey {
        self.0.pred_opt().map(DayKey).unwrap_or(*self)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<DayKey, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DayKey::parse(&raw).ok_or_else(|| DeError::custom(format!("invalid day key: {raw}")))
    }
}

/// One day's puzzle for one difficulty mode. Immutable once built; cached and
/// addressed by (day, mode).
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct DailyPuzzle {
    pub day: DayKey,
    pub mode: Mode,
    /// The answer: the community the source comment was posted in.
    pub community: String,
    pub post_id: String,
    pub post_title: String,
    pub post_body: String,
    pub comment_id: String,
    pub comment_body: String,
}

/// Durable per-(user, mode) record. Mutated only by a winning guess.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq)]
pub struct PlayerModeState {
    pub total_score: u32,
    pub streak: u32,
    pub last_win_day: Option<DayKey>,
}

/// Assembled read view of the per-(user, mode, day) flags.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct DayFlags {
    pub committed: bool,
    pub points_awarded: bool,
    pub completed: bool,
}
