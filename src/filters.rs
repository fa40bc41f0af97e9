use crate::constants::{EASY_MIN_MEMBERS, MEDIUM_MIN_MEMBERS, MIN_COMMENT_CHARS};
use crate::source::{CommentRef, CommunityInfo};
use crate::types::Mode;

// Candidate predicates for puzzle construction. All pure; the builder decides
// what to do with the verdicts.

// Markers left in place of moderated or self-deleted comments.
const TOMBSTONES: [&str; 2] = ["[deleted]", "[removed]"];

// Phrases that give the answer away by talking about the community itself.
const SELF_REFERENTIAL: [&str; 2] = ["this sub", "this subreddit"];

const BOT_SIGNATURES: [&str; 2] = ["i am a bot", "this action was performed automatically"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommunityFit {
    /// Meets every gate for the mode.
    Qualified,
    /// Not adult, but the member count is unknown; usable only when nothing
    /// fully qualifies in the scanned prefix.
    UnknownSafe,
    Rejected,
}

/// Classify a community for a difficulty tier. An unknown member count never
/// qualifies for the gated tiers: missing popularity data must not quietly
/// collapse every tier into the same pool.
pub fn classify_community(info: &CommunityInfo, mode: Mode) -> CommunityFit {
    if info.adult {
        return CommunityFit::Rejected;
    }
    let floor = match mode {
        Mode::Easy => Some(EASY_MIN_MEMBERS),
        Mode::Medium => Some(MEDIUM_MIN_MEMBERS),
        Mode::Hard => None,
    };
    match (floor, info.members) {
        (None, _) => CommunityFit::Qualified,
        (Some(min), Some(members)) if members >= min => CommunityFit::Qualified,
        (Some(_), Some(_)) => CommunityFit::Rejected,
        (Some(_), None) => CommunityFit::UnknownSafe,
    }
}

/// Loose gate: is there any comment text left at all.
pub fn comment_usable(body: &str) -> bool {
    let trimmed = body.trim();
    !trimmed.is_empty() && !TOMBSTONES.iter().any(|t| trimmed.eq_ignore_ascii_case(t))
}

/// Strict gate for the primary pool: long enough to read as a clue and free
/// of giveaways and bot boilerplate.
pub fn comment_selectable(comment: &CommentRef, answer: &str) -> bool {
    if !comment_usable(&comment.body) {
        return false;
    }
    let body = comment.body.trim();
    if body.chars().count() < MIN_COMMENT_CHARS {
        return false;
    }
    let lower = body.to_lowercase();
    if !answer.is_empty() && lower.contains(&answer.to_lowercase()) {
        return false;
    }
    if SELF_REFERENTIAL.iter().any(|p| lower.contains(p)) {
        return false;
    }
    if BOT_SIGNATURES.iter().any(|p| lower.contains(p)) {
        return false;
    }
    !comment.author.eq_ignore_ascii_case("automoderator")
}
