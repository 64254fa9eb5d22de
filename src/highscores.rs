//! Best-score tracking and its persistence seam
//!
//! One scalar per game instance key. Where it is stored is up to the host:
//! see `platform::storage` for the in-memory, file and LocalStorage backends.

use serde::{Deserialize, Serialize};

/// Storage key used when the host does not pick one
pub const DEFAULT_STORAGE_KEY: &str = "powerHighScore";

/// Where a high score lives between sessions.
///
/// Implementations log and swallow their own failures; losing a high score
/// never interrupts play.
pub trait HighScoreStore {
    fn load(&self, key: &str) -> Option<u64>;
    fn save(&mut self, key: &str, score: u64);
}

/// Best score seen by this game instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HighScore {
    pub best: u64,
}

impl HighScore {
    pub fn new(best: u64) -> Self {
        Self { best }
    }

    /// Load from `store`, starting fresh when nothing is saved
    pub fn load(store: &impl HighScoreStore, key: &str) -> Self {
        match store.load(key) {
            Some(best) => {
                log::info!("Loaded high score {}", best);
                Self { best }
            }
            None => {
                log::info!("No high score found, starting fresh");
                Self::default()
            }
        }
    }

    /// Take `score` if it beats the current best. Returns true on a new record.
    pub fn record(&mut self, score: u64) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }
}

/// Format a score with thousands separators (`1234567` -> `1,234,567`)
pub fn format_score(score: u64) -> String {
    let digits = score.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
