use crate::builder::build_puzzle;
use crate::constants::PUZZLE_TTL_SECS;
use crate::source::ContentSource;
use crate::store::{puzzle_key, KvStore};
use crate::types::{DailyPuzzle, DayKey, Mode};
use crate::GameError;

// Day+mode keyed cache over the builder, so the expensive external scan runs
// at most once per key (modulo eviction). Two concurrent misses may both
// build; the builder is deterministic, so last-writer-wins is harmless.

pub async fn get_or_build<C: ContentSource, S: KvStore>(
    store: &S,
    source: &C,
    day: DayKey,
    mode: Mode,
) -> Result<DailyPuzzle, GameError> {
    let key = puzzle_key(day, mode);
    if let Some(raw) = store.get(&key).await.map_err(GameError::Store)? {
        match serde_json::from_str::<DailyPuzzle>(&raw) {
            Ok(puzzle) => return Ok(puzzle),
            Err(err) => log::warn!("[cache] discarding undecodable entry {key}: {err}"),
        }
    }
    let puzzle = build_puzzle(source, day, mode).await?;
    let raw = serde_json::to_string(&puzzle).map_err(|err| GameError::Store(err.into()))?;
    store.set(&key, &raw).await.map_err(GameError::Store)?;
    store.expire(&key, PUZZLE_TTL_SECS).await.map_err(GameError::Store)?;
    Ok(puzzle)
}
