//! High score storage backends
//!
//! Every backend logs and swallows I/O problems: a missing or broken store
//! behaves like an empty one.

use std::collections::HashMap;

use crate::highscores::HighScoreStore;

/// Volatile store, for tests and hosts without persistence
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    scores: HashMap<String, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HighScoreStore for MemoryStore {
    fn load(&self, key: &str) -> Option<u64> {
        self.scores.get(key).copied()
    }

    fn save(&mut self, key: &str, score: u64) {
        self.scores.insert(key.to_string(), score);
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;

    use crate::highscores::HighScoreStore;

    /// JSON object of `key -> score` in a single file
    #[derive(Debug, Clone)]
    pub struct FileStore {
        path: PathBuf,
    }

    impl FileStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        fn read_all(&self) -> BTreeMap<String, u64> {
            let json = match fs::read_to_string(&self.path) {
                Ok(json) => json,
                Err(_) => return BTreeMap::new(),
            };
            serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable score file {}: {}", self.path.display(), e);
                BTreeMap::new()
            })
        }
    }

    impl HighScoreStore for FileStore {
        fn load(&self, key: &str) -> Option<u64> {
            self.read_all().get(key).copied()
        }

        fn save(&mut self, key: &str, score: u64) {
            let mut all = self.read_all();
            all.insert(key.to_string(), score);
            let result = serde_json::to_string_pretty(&all)
                .map_err(std::io::Error::other)
                .and_then(|json| fs::write(&self.path, json));
            match result {
                Ok(()) => log::info!("High score saved ({} = {})", key, score),
                Err(e) => log::warn!("Failed to save high score to {}: {}", self.path.display(), e),
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorageStore;

#[cfg(target_arch = "wasm32")]
mod local {
    use crate::highscores::HighScoreStore;

    /// Browser LocalStorage; the score is stored as a decimal string
    #[derive(Debug, Clone, Copy, Default)]
    pub struct LocalStorageStore;

    impl LocalStorageStore {
        fn storage() -> Option<web_sys::Storage> {
            web_sys::window()?.local_storage().ok()?
        }
    }

    impl HighScoreStore for LocalStorageStore {
        fn load(&self, key: &str) -> Option<u64> {
            let value = Self::storage()?.get_item(key).ok()??;
            value.parse().ok()
        }

        fn save(&mut self, key: &str, score: u64) {
            let Some(storage) = Self::storage() else {
                log::warn!("LocalStorage unavailable, high score not saved");
                return;
            };
            if storage.set_item(key, &score.to_string()).is_err() {
                log::warn!("Failed to write high score to LocalStorage");
            } else {
                log::info!("High score saved ({})", score);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load("a"), None);
        store.save("a", 10);
        store.save("a", 20);
        assert_eq!(store.load("a"), Some(20));
        assert_eq!(store.load("b"), None);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_store_round_trip() {
        let path = std::env::temp_dir().join(format!("power-flap-scores-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut store = FileStore::new(&path);
        assert_eq!(store.load("flap"), None);
        store.save("flap", 1234);
        store.save("other", 5);

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.load("flap"), Some(1234));
        assert_eq!(reopened.load("other"), Some(5));
        let _ = std::fs::remove_file(&path);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_store_ignores_garbage() {
        let path = std::env::temp_dir().join(format!("power-flap-garbage-{}.json", std::process::id()));
        std::fs::write(&path, "not json").unwrap();
        let store = FileStore::new(&path);
        assert_eq!(store.load("flap"), None);
        let _ = std::fs::remove_file(&path);
    }
}
