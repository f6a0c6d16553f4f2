//! Best score and lesson selection persistence
//!
//! The storage medium is out of scope: callers hand the simulation host an
//! opaque key-value surface (browser LocalStorage, a settings file, an
//! in-memory map for tests). Payloads are versionless JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque string key-value storage supplied by the host
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store for tests and the headless demo
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
    }
}

/// Player profile: running best score and the last-used lesson selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub best_score: u32,
    pub lesson_ids: Vec<String>,
}

impl Profile {
    const STORAGE_KEY: &'static str = "quiz_kart_profile";

    /// Load the profile, falling back to defaults on missing or corrupt data
    pub fn load(store: &dyn KeyValueStore) -> Self {
        if let Some(json) = store.get(Self::STORAGE_KEY) {
            match serde_json::from_str(&json) {
                Ok(profile) => return profile,
                Err(err) => log::warn!("corrupt profile, using defaults: {err}"),
            }
        }
        log::info!("no saved profile, starting fresh");
        Self::default()
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match serde_json::to_string(self) {
            Ok(json) => store.set(Self::STORAGE_KEY, &json),
            Err(err) => log::warn!("failed to serialize profile: {err}"),
        }
    }

    /// Record a finished run; returns true if the best score improved
    pub fn record_score(&mut self, score: u32) -> bool {
        if score > self.best_score {
            self.best_score = score;
            true
        } else {
            false
        }
    }
}
