//! Keyed byte strings with optional millisecond expiry.
//!
//! Expiry is lazy: every read path checks the deadline first and removes a
//! dead entry before answering, so an expired value is never observable.

use std::collections::HashMap;

use tokio::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct StringEntry {
    pub value: String,
    pub expires_at: Option<Instant>,
}

#[derive(Debug, Default)]
pub struct StringStore {
    entries: HashMap<String, StringEntry>,
}

impl StringStore {
    /// Stores `value` under `key`, replacing any previous entry. A `ttl`
    /// sets an absolute deadline from now; `None` makes the entry permanent.
    pub fn set(&mut self, key: impl Into<String>, value: String, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .insert(key.into(), StringEntry { value, expires_at });
    }

    /// Returns the live value for `key`, expiring it first if its deadline
    /// has passed.
    pub fn get(&mut self, key: &str) -> Option<&str> {
        self.expire_if_due(key);
        self.entries.get(key).map(|entry| entry.value.as_str())
    }

    pub fn contains(&mut self, key: &str) -> bool {
        self.expire_if_due(key);
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.expire_if_due(key);
        self.entries.remove(key).is_some()
    }

    /// Increments the signed 64-bit integer stored at `key`, treating a
    /// missing entry as `"0"`. A live expiry is preserved.
    ///
    /// Returns `None` when the current value is not an integer or the
    /// increment overflows.
    pub fn increment(&mut self, key: &str) -> Option<i64> {
        self.expire_if_due(key);

        match self.entries.get_mut(key) {
            Some(entry) => {
                let current = entry.value.parse::<i64>().ok()?;
                let next = current.checked_add(1)?;
                entry.value = next.to_string();
                Some(next)
            }
            None => {
                self.entries.insert(
                    key.to_string(),
                    StringEntry {
                        value: "1".to_string(),
                        expires_at: None,
                    },
                );
                Some(1)
            }
        }
    }

    /// All currently live keys. Dead entries are purged as a side effect.
    pub fn live_keys(&mut self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .retain(|_, entry| entry.expires_at.map(|at| at > now).unwrap_or(true));
        self.entries.keys().cloned().collect()
    }

    fn expire_if_due(&mut self, key: &str) {
        if let Some(entry) = self.entries.get(key) {
            if let Some(expires_at) = entry.expires_at {
                if expires_at <= Instant::now() {
                    self.entries.remove(key);
                }
            }
        }
    }
}
