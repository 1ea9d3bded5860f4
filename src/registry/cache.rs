//! memoized control states keyed by settings snapshot digest

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use super::control::ControlState;
use crate::conditions::{SettingsSnapshot, Value};

/// SHA-256 over a canonical encoding of the snapshot, hex encoded
///
/// every value is written as a kind tag followed by its payload, floats by
/// their bit pattern, so `null`, `NaN` and infinities never collide
pub fn snapshot_digest(settings: &SettingsSnapshot) -> String {
    let mut hasher = Sha256::new();
    hasher.update((settings.len() as u64).to_le_bytes());
    for (name, value) in settings.iter() {
        hash_str(&mut hasher, name);
        hash_value(&mut hasher, value);
    }
    hex::encode(hasher.finalize())
}

fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn hash_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => hasher.update([0u8]),
        Value::Bool(b) => hasher.update([1u8, u8::from(*b)]),
        Value::Number(n) => {
            hasher.update([2u8]);
            hasher.update(n.to_le_bytes());
        }
        Value::Float(f) => {
            hasher.update([3u8]);
            hasher.update(f.to_bits().to_le_bytes());
        }
        Value::String(s) => {
            hasher.update([4u8]);
            hash_str(hasher, s);
        }
        Value::List(items) => {
            hasher.update([5u8]);
            hasher.update((items.len() as u64).to_le_bytes());
            for item in items {
                hash_value(hasher, item);
            }
        }
        Value::Map(map) => {
            hasher.update([6u8]);
            hasher.update((map.len() as u64).to_le_bytes());
            for (key, item) in map {
                hash_str(hasher, key);
                hash_value(hasher, item);
            }
        }
    }
}

/// per-control cache of evaluated states
#[derive(Debug, Default)]
pub struct StateCache {
    entries: HashMap<String, HashMap<String, ControlState>>,
    hits: u64,
    misses: u64,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// look up a state, counting the hit or miss
    pub fn get(&mut self, control: &str, digest: &str) -> Option<&ControlState> {
        let found = self
            .entries
            .get(control)
            .and_then(|states| states.get(digest));

        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    pub fn insert(&mut self, control: &str, digest: String, state: ControlState) {
        self.entries
            .entry(control.to_string())
            .or_default()
            .insert(digest, state);
    }

    /// drop every cached state of one control
    pub fn invalidate_control(&mut self, control: &str) {
        if let Some(states) = self.entries.remove(control) {
            tracing::debug!(control, dropped = states.len(), "invalidated control states");
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// number of cached states across all controls
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
