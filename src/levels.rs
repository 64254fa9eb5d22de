//! Level book: level definitions, difficulty presets and progress
//!
//! Progress (completion and stars) lives next to the definitions so the
//! orchestrator can carry it across resets and retries.

use serde::{Deserialize, Serialize};

/// Per-level difficulty preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    #[default]
    Easy,
    Medium,
    Hard,
    Expert,
}

impl DifficultyPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Easy => "Easy",
            DifficultyPreset::Medium => "Medium",
            DifficultyPreset::Hard => "Hard",
            DifficultyPreset::Expert => "Expert",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(DifficultyPreset::Easy),
            "medium" | "med" => Some(DifficultyPreset::Medium),
            "hard" => Some(DifficultyPreset::Hard),
            "expert" => Some(DifficultyPreset::Expert),
            _ => None,
        }
    }

    /// Multiplier on world scroll speed
    pub fn world_speed(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 1.0,
            DifficultyPreset::Medium => 1.15,
            DifficultyPreset::Hard => 1.3,
            DifficultyPreset::Expert => 1.5,
        }
    }
}

/// One playable level and the player's progress on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: u32,
    pub name: String,
    pub preset: DifficultyPreset,
    /// Score that completes the level; endless when `None`
    pub target_score: Option<u64>,
    /// Par time in seconds
    pub completion_time_s: u32,
    #[serde(default)]
    pub completed: bool,
    /// Best rating so far, 0..=3
    #[serde(default)]
    pub stars: u8,
}

impl Level {
    pub fn new(
        id: u32,
        name: &str,
        preset: DifficultyPreset,
        target_score: Option<u64>,
        completion_time_s: u32,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            preset,
            target_score,
            completion_time_s,
            completed: false,
            stars: 0,
        }
    }

    /// Star rating for finishing with `score`: 90% of target or more earns 3,
    /// 70% earns 2, anything else 1
    pub fn calculate_stars(&self, score: u64) -> u8 {
        let Some(target) = self.target_score.filter(|t| *t > 0) else {
            return 1;
        };
        let ratio = score as f64 / target as f64;
        if ratio >= 0.9 {
            3
        } else if ratio >= 0.7 {
            2
        } else {
            1
        }
    }
}

/// Ordered collection of levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelBook {
    pub levels: Vec<Level>,
}

impl Default for LevelBook {
    fn default() -> Self {
        Self {
            levels: vec![
                Level::new(1, "Forest Adventure", DifficultyPreset::Easy, Some(1000), 60),
                Level::new(2, "Desert Challenge", DifficultyPreset::Medium, Some(2000), 90),
                Level::new(3, "Ice World", DifficultyPreset::Hard, Some(3000), 120),
            ],
        }
    }
}

impl LevelBook {
    pub fn new(levels: Vec<Level>) -> Self {
        Self { levels }
    }

    pub fn get(&self, id: u32) -> Option<&Level> {
        self.levels.iter().find(|l| l.id == id)
    }

    pub fn first_id(&self) -> Option<u32> {
        self.levels.first().map(|l| l.id)
    }

    /// Level following `id` in book order
    pub fn next_id(&self, id: u32) -> Option<u32> {
        let index = self.levels.iter().position(|l| l.id == id)?;
        self.levels.get(index + 1).map(|l| l.id)
    }

    /// The first level is always open; others open once their predecessor is completed
    pub fn is_unlocked(&self, id: u32) -> bool {
        match self.levels.iter().position(|l| l.id == id) {
            Some(0) => true,
            Some(index) => self.levels[index - 1].completed,
            None => false,
        }
    }

    /// Record a completion; returns the stars earned by this run.
    ///
    /// Stars are never downgraded.
    pub fn record_completion(&mut self, id: u32, score: u64) -> Option<u8> {
        let level = self.levels.iter_mut().find(|l| l.id == id)?;
        let stars = level.calculate_stars(score);
        level.completed = true;
        level.stars = level.stars.max(stars);
        log::info!(
            "level {} ({}) completed: {} stars, best {}",
            id,
            level.name,
            stars,
            level.stars
        );
        Some(stars)
    }

    pub fn total_stars(&self) -> u32 {
        self.levels.iter().map(|l| l.stars as u32).sum()
    }
}
