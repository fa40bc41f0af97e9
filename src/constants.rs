// Tuning and retention constants for the daily game. Kept in one place so the
// builder, filters, and orchestrator share them without duplication.

pub const ANON_USER: &str = "anonymous";

// Points for a win at clue stage 1, 2, 3.
pub const STAGE_POINTS: [u32; 3] = [100, 60, 30];
pub const FINAL_STAGE: u8 = 3;

// Known-member floors for the gated difficulty tiers.
pub const EASY_MIN_MEMBERS: u64 = 500_000;
pub const MEDIUM_MIN_MEMBERS: u64 = 50_000;

pub const MIN_COMMENT_CHARS: usize = 25;

// Scan bounds for puzzle construction.
pub const GLOBAL_FEED_LIMIT: usize = 100;
pub const COMMUNITY_SCAN_LIMIT: usize = 48;
pub const QUALIFY_CAP: usize = 6;
pub const COMMUNITY_POSTS_LIMIT: usize = 50;
pub const COMMENT_FETCH_LIMIT: usize = 200;

// Retention: long enough to cover timezone skew around a day key.
pub const PUZZLE_TTL_SECS: u64 = 48 * 60 * 60;
pub const DAY_TTL_SECS: u64 = 48 * 60 * 60;

pub const DAY_SKEW_TOLERANCE_DAYS: i64 = 1;

pub const PLAYS_COUNTER: &str = "plays";
pub const WINS_COUNTER: &str = "wins";
