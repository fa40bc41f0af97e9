//! Core of a daily community-guessing trivia game: deterministic puzzle
//! selection from a live content source, plus the per-user, per-mode,
//! per-day state machine for committing, guessing, scoring, and streaks.
//! Transport, rendering, and the real content source / key-value store are
//! host concerns bound through the [`ContentSource`] and [`KvStore`] traits.

use thiserror::Error;

pub mod builder;
pub mod cache;
pub mod constants;
pub mod filters;
pub mod game;
pub mod net;
pub mod rng;
pub mod source;
pub mod store;
pub mod types;

pub use builder::{build_puzzle, BuildError};
pub use net::{CommitResponse, DailyTotals, GiveUpResponse, GuessResponse, StateResponse};
pub use source::{CommentRef, CommunityInfo, ContentSource, Listing, PostRef};
pub use store::{KvStore, MemoryStore, PlayerStore};
pub use types::{DailyPuzzle, DayFlags, DayKey, Mode, PlayerModeState};

use constants::{ANON_USER, FINAL_STAGE, PLAYS_COUNTER, WINS_COUNTER};
use game::{advance_streak, guess_matches, points_for_stage};

/// Orchestrator-level failures surfaced to the host. Hosts render these as a
/// generic retryable message; the puzzle is never partially shown.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("puzzle build failed: {0}")]
    Build(#[from] BuildError),
    #[error("state store error: {0}")]
    Store(anyhow::Error),
}

/// Request-facing game service: composes the puzzle cache and the player
/// state store over host-provided collaborators. One instance serves many
/// users; every piece of cross-request state lives in the store, keyed by
/// user/mode/day, so requests never contend in-process.
pub struct GameService<C, S> {
    source: C,
    store: S,
}

impl<C: ContentSource, S: KvStore> GameService<C, S> {
    pub fn new(source: C, store: S) -> GameService<C, S> {
        GameService { source, store }
    }

    fn players(&self) -> PlayerStore<'_, S> {
        PlayerStore::new(&self.store)
    }

    /// Stable id for the requesting user; anonymous when the source has none.
    pub async fn current_user(&self) -> String {
        match self.source.current_user().await {
            Ok(Some(id)) if !id.trim().is_empty() => id,
            Ok(_) => ANON_USER.to_string(),
            Err(err) => {
                log::warn!("[game] identity lookup failed, using anonymous: {err}");
                ANON_USER.to_string()
            }
        }
    }

    /// Read-only view of the day's session. Never transitions state, so
    /// clients can poll it across reloads without spending anything.
    pub async fn state(
        &self,
        user: &str,
        mode: &str,
        day: Option<&str>,
    ) -> Result<StateResponse, GameError> {
        let mode = Mode::parse_lenient(mode);
        let day = DayKey::from_client(day);
        let puzzle = cache::get_or_build(&self.store, &self.source, day, mode).await?;
        let players = self.players();
        let flags = players
            .day_flags(user, mode, day)
            .await
            .map_err(GameError::Store)?;
        let state = players
            .mode_state(user, mode)
            .await
            .map_err(GameError::Store)?;
        Ok(StateResponse {
            puzzle,
            mode,
            day,
            committed: flags.committed,
            completed: flags.completed,
            total_score: state.total_score,
            streak: state.streak,
            last_win_day: state.last_win_day,
        })
    }

    /// Mark the day's session begun (the user revealed past the first clue).
    /// Idempotent.
    pub async fn commit(
        &self,
        user: &str,
        mode: &str,
        day: Option<&str>,
    ) -> Result<CommitResponse, GameError> {
        let mode = Mode::parse_lenient(mode);
        let day = DayKey::from_client(day);
        let players = self.players();
        self.ensure_committed(&players, user, mode, day).await?;
        let completed = players
            .is_completed(user, mode, day)
            .await
            .map_err(GameError::Store)?;
        Ok(CommitResponse {
            committed: true,
            completed,
        })
    }

    /// Evaluate a guess at the given clue stage. A completed session is
    /// answered from the existing result without re-scoring.
    pub async fn guess(
        &self,
        user: &str,
        mode: &str,
        day: Option<&str>,
        guess_text: &str,
        stage: u8,
    ) -> Result<GuessResponse, GameError> {
        let mode = Mode::parse_lenient(mode);
        let day = DayKey::from_client(day);
        let stage = stage.clamp(1, FINAL_STAGE);
        let puzzle = cache::get_or_build(&self.store, &self.source, day, mode).await?;
        let players = self.players();

        if players
            .is_completed(user, mode, day)
            .await
            .map_err(GameError::Store)?
        {
            let state = players
                .mode_state(user, mode)
                .await
                .map_err(GameError::Store)?;
            return Ok(GuessResponse {
                correct: false,
                points: 0,
                answer: puzzle.community,
                total_score: state.total_score,
                streak: state.streak,
                completed: true,
            });
        }

        self.ensure_committed(&players, user, mode, day).await?;

        let correct = guess_matches(guess_text, &puzzle.community);
        let mut state = players
            .mode_state(user, mode)
            .await
            .map_err(GameError::Store)?;
        let mut points = 0;

        if correct {
            // claim_award is the single-fire gate: only the call that raises
            // the flag mutates the durable record.
            if players
                .claim_award(user, mode, day)
                .await
                .map_err(GameError::Store)?
            {
                points = points_for_stage(stage);
                state.streak = advance_streak(&state, day);
                state.last_win_day = Some(day);
                state.total_score = state.total_score.saturating_add(points);
                players
                    .save_mode_state(user, mode, &state)
                    .await
                    .map_err(GameError::Store)?;
                if let Err(err) = players.bump_counter(day, WINS_COUNTER).await {
                    log::warn!("[game] wins counter bump failed for {day}: {err}");
                }
                log::info!(
                    "[game] win user:{user} mode:{mode} day:{day} stage:{stage} points:{points}"
                );
            } else {
                // a parallel request already scored; report its totals
                state = players
                    .mode_state(user, mode)
                    .await
                    .map_err(GameError::Store)?;
            }
        }

        let completed = correct || stage >= FINAL_STAGE;
        if completed {
            players
                .mark_completed(user, mode, day)
                .await
                .map_err(GameError::Store)?;
        }

        Ok(GuessResponse {
            correct,
            points,
            answer: puzzle.community,
            total_score: state.total_score,
            streak: state.streak,
            completed,
        })
    }

    /// End the day's session and reveal the answer without scoring.
    pub async fn give_up(
        &self,
        user: &str,
        mode: &str,
        day: Option<&str>,
    ) -> Result<GiveUpResponse, GameError> {
        let mode = Mode::parse_lenient(mode);
        let day = DayKey::from_client(day);
        let puzzle = cache::get_or_build(&self.store, &self.source, day, mode).await?;
        let players = self.players();
        if !players
            .is_completed(user, mode, day)
            .await
            .map_err(GameError::Store)?
        {
            self.ensure_committed(&players, user, mode, day).await?;
            if players
                .mark_completed(user, mode, day)
                .await
                .map_err(GameError::Store)?
            {
                log::info!("[game] give up user:{user} mode:{mode} day:{day}");
            }
        }
        Ok(GiveUpResponse {
            completed: true,
            answer: puzzle.community,
        })
    }

    /// Shared per-day play/win counters.
    pub async fn totals(&self, day: Option<&str>) -> Result<DailyTotals, GameError> {
        let day = DayKey::from_client(day);
        let players = self.players();
        let plays = players
            .counter(day, PLAYS_COUNTER)
            .await
            .map_err(GameError::Store)?;
        let wins = players
            .counter(day, WINS_COUNTER)
            .await
            .map_err(GameError::Store)?;
        Ok(DailyTotals { day, plays, wins })
    }

    async fn ensure_committed(
        &self,
        players: &PlayerStore<'_, S>,
        user: &str,
        mode: Mode,
        day: DayKey,
    ) -> Result<(), GameError> {
        if players
            .mark_committed(user, mode, day)
            .await
            .map_err(GameError::Store)?
        {
            if let Err(err) = players.bump_counter(day, PLAYS_COUNTER).await {
                log::warn!("[game] plays counter bump failed for {day}: {err}");
            }
        }
        Ok(())
    }
}
