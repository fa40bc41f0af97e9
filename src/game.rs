use crate::constants::{FINAL_STAGE, STAGE_POINTS};
use crate::types::{DayKey, PlayerModeState};

// Pure game rules. The orchestrator in lib.rs owns all storage effects; these
// helpers stay total so they can be tested without collaborators.

/// Normalize a submitted guess down to a bare community name: strip an
/// optional `r/` or `/r/` prefix (any case) and drop everything outside
/// `[A-Za-z0-9_]`.
pub fn normalize_guess(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let bytes = trimmed.as_bytes();
    let rest = if bytes.len() >= 2 && bytes[0].eq_ignore_ascii_case(&b'r') && bytes[1] == b'/' {
        &trimmed[2..]
    } else {
        trimmed
    };
    rest.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

pub fn guess_matches(guess: &str, answer: &str) -> bool {
    let normalized = normalize_guess(guess);
    !normalized.is_empty() && normalized.eq_ignore_ascii_case(answer)
}

/// Points for a correct guess at a clue stage. Out-of-range stages clamp into
/// the 1..=3 window rather than failing the request.
pub fn points_for_stage(stage: u8) -> u32 {
    STAGE_POINTS[(stage.clamp(1, FINAL_STAGE) - 1) as usize]
}

/// Streak law: a win the calendar day after the last scored win extends the
/// streak; anything else starts over at 1.
pub fn advance_streak(state: &PlayerModeState, win_day: DayKey) -> u32 {
    match state.last_win_day {
        Some(last) if last == win_day.pred() => state.streak.saturating_add(1),
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_normalize_to_bare_community_names() {
        assert_eq!(normalize_guess("AskReddit"), "AskReddit");
        assert_eq!(normalize_guess("r/AskReddit"), "AskReddit");
        assert_eq!(normalize_guess("/r/AskReddit"), "AskReddit");
        assert_eq!(normalize_guess("R/ask_reddit!"), "ask_reddit");
        assert_eq!(normalize_guess("  r/foo-bar  "), "foobar");
        assert_eq!(normalize_guess("running"), "running");
        assert_eq!(normalize_guess(""), "");
    }

    #[test]
    fn normalization_survives_non_ascii_input() {
        assert_eq!(normalize_guess("€r/így"), "rgy");
        assert_eq!(normalize_guess("日本語"), "");
    }

    #[test]
    fn matching_is_case_insensitive_after_normalization() {
        assert!(guess_matches("r/AskReddit", "AskReddit"));
        assert!(guess_matches("askreddit", "AskReddit"));
        assert!(guess_matches(" /r/ASKREDDIT ", "AskReddit"));
        assert!(!guess_matches("AskScience", "AskReddit"));
        assert!(!guess_matches("", "AskReddit"));
        assert!(!guess_matches("r/", "AskReddit"));
    }

    #[test]
    fn stage_scoring_table() {
        assert_eq!(points_for_stage(1), 100);
        assert_eq!(points_for_stage(2), 60);
        assert_eq!(points_for_stage(3), 30);
        // malformed stages clamp instead of failing
        assert_eq!(points_for_stage(0), 100);
        assert_eq!(points_for_stage(9), 30);
    }

    #[test]
    fn streak_extends_only_from_the_previous_day() {
        let prior = PlayerModeState {
            total_score: 400,
            streak: 4,
            last_win_day: DayKey::parse("2024-01-09"),
        };
        let next_day = DayKey::parse("2024-01-10").unwrap();
        assert_eq!(advance_streak(&prior, next_day), 5);

        let after_gap = DayKey::parse("2024-01-12").unwrap();
        assert_eq!(advance_streak(&prior, after_gap), 1);

        let fresh = PlayerModeState::default();
        assert_eq!(advance_streak(&fresh, next_day), 1);
    }
}
