use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};

use crate::constants::DAY_TTL_SECS;
use crate::types::{DayFlags, DayKey, Mode, PlayerModeState};

// Key-value persistence boundary. Every key is partitioned by user/mode/day so
// distinct players and days never contend; set_nx is the only cross-request
// coordination primitive the core relies on.

#[allow(async_fn_in_trait)]
pub trait KvStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Write only if the key is absent; returns whether this call wrote it.
    async fn set_nx(&self, key: &str, value: &str) -> anyhow::Result<bool>;

    /// Atomic numeric increment; missing keys start at zero.
    async fn incr_by(&self, key: &str, delta: i64) -> anyhow::Result<i64>;

    async fn expire(&self, key: &str, ttl_secs: u64) -> anyhow::Result<()>;
}

struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

/// TTL-aware in-process store: the reference implementation for tests and
/// single-node hosts. Production hosts bind their real store behind the same
/// trait.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn prune<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a Entry> {
        let expired = entries
            .get(key)
            .and_then(|e| e.expires_at)
            .map(|at| Utc::now() >= at)
            .unwrap_or(false);
        if expired {
            entries.remove(key);
        }
        entries.get(key)
    }
}

impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store poisoned"))?;
        Ok(Self::prune(&mut entries, key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store poisoned"))?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str) -> anyhow::Result<bool> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store poisoned"))?;
        if Self::prune(&mut entries, key).is_some() {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(true)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> anyhow::Result<i64> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store poisoned"))?;
        let current = Self::prune(&mut entries, key)
            .map(|e| e.value.parse::<i64>().unwrap_or(0))
            .unwrap_or(0);
        let next = current + delta;
        let expires_at = entries.get(key).and_then(|e| e.expires_at);
        entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store poisoned"))?;
        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Some(Utc::now() + Duration::seconds(ttl_secs as i64));
        }
        Ok(())
    }
}

pub(crate) fn puzzle_key(day: DayKey, mode: Mode) -> String {
    format!("puzzle:{day}:{mode}")
}

fn mode_state_key(user: &str, mode: Mode) -> String {
    format!("player:{user}:{mode}")
}

fn committed_key(user: &str, mode: Mode, day: DayKey) -> String {
    format!("committed:{user}:{mode}:{day}")
}

fn awarded_key(user: &str, mode: Mode, day: DayKey) -> String {
    format!("awarded:{user}:{mode}:{day}")
}

fn completed_key(user: &str, mode: Mode, day: DayKey) -> String {
    format!("completed:{user}:{mode}:{day}")
}

fn counter_key(day: DayKey, name: &str) -> String {
    format!("counter:{day}:{name}")
}

/// Typed access to the durable player records and the per-day flags.
pub struct PlayerStore<'a, S: KvStore> {
    kv: &'a S,
}

impl<'a, S: KvStore> PlayerStore<'a, S> {
    pub fn new(kv: &'a S) -> PlayerStore<'a, S> {
        PlayerStore { kv }
    }

    pub async fn mode_state(&self, user: &str, mode: Mode) -> anyhow::Result<PlayerModeState> {
        match self.kv.get(&mode_state_key(user, mode)).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(state) => Ok(state),
                Err(err) => {
                    log::warn!("[store] resetting undecodable record for {user}/{mode}: {err}");
                    Ok(PlayerModeState::default())
                }
            },
            None => Ok(PlayerModeState::default()),
        }
    }

    pub async fn save_mode_state(
        &self,
        user: &str,
        mode: Mode,
        state: &PlayerModeState,
    ) -> anyhow::Result<()> {
        let raw = serde_json::to_string(state)?;
        self.kv.set(&mode_state_key(user, mode), &raw).await
    }

    pub async fn day_flags(&self, user: &str, mode: Mode, day: DayKey) -> anyhow::Result<DayFlags> {
        Ok(DayFlags {
            committed: self.kv.get(&committed_key(user, mode, day)).await?.is_some(),
            points_awarded: self.kv.get(&awarded_key(user, mode, day)).await?.is_some(),
            completed: self.kv.get(&completed_key(user, mode, day)).await?.is_some(),
        })
    }

    pub async fn is_completed(&self, user: &str, mode: Mode, day: DayKey) -> anyhow::Result<bool> {
        Ok(self.kv.get(&completed_key(user, mode, day)).await?.is_some())
    }

    async fn raise_flag(&self, key: &str) -> anyhow::Result<bool> {
        let fresh = self.kv.set_nx(key, "1").await?;
        if fresh {
            self.kv.expire(key, DAY_TTL_SECS).await?;
        }
        Ok(fresh)
    }

    /// Idempotently mark the day committed; true when this call did it.
    pub async fn mark_committed(&self, user: &str, mode: Mode, day: DayKey) -> anyhow::Result<bool> {
        self.raise_flag(&committed_key(user, mode, day)).await
    }

    /// Single-fire gate for scoring: at most one call per (user, mode, day)
    /// ever sees true.
    pub async fn claim_award(&self, user: &str, mode: Mode, day: DayKey) -> anyhow::Result<bool> {
        self.raise_flag(&awarded_key(user, mode, day)).await
    }

    pub async fn mark_completed(&self, user: &str, mode: Mode, day: DayKey) -> anyhow::Result<bool> {
        self.raise_flag(&completed_key(user, mode, day)).await
    }

    pub async fn bump_counter(&self, day: DayKey, name: &str) -> anyhow::Result<i64> {
        let key = counter_key(day, name);
        let value = self.kv.incr_by(&key, 1).await?;
        if value == 1 {
            self.kv.expire(&key, DAY_TTL_SECS).await?;
        }
        Ok(value)
    }

    pub async fn counter(&self, day: DayKey, name: &str) -> anyhow::Result<i64> {
        Ok(self
            .kv
            .get(&counter_key(day, name))
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0))
    }
}
