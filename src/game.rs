//! Game orchestrator: commands, frame loop, high score and level progress
//!
//! Wraps the deterministic `sim` reducer with everything that depends on the
//! host: frame callbacks, wall-clock deltas, persistence and level
//! selection.

use std::fmt;

use serde::Serialize;

use crate::consts::MAX_FRAME_MS;
use crate::highscores::{DEFAULT_STORAGE_KEY, HighScore, HighScoreStore};
use crate::levels::LevelBook;
use crate::platform::input::{Command, command_for_key, command_for_tap};
use crate::platform::scheduler::{FrameHandle, FrameScheduler};
use crate::sim::state::{
    ActivePowerUp, Character, Collectible, GameEvent, GamePhase, GameState, Obstacle, PowerUp,
};
use crate::sim::tick::{TickInput, tick};
use crate::tuning::{Tuning, TuningError};

/// Why a command could not be carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    /// No level with this id in the book
    UnknownLevel(u32),
    /// Level exists but its predecessor is not completed yet
    LevelLocked(u32),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::UnknownLevel(id) => write!(f, "level {} not found", id),
            GameError::LevelLocked(id) => write!(f, "level {} is locked", id),
        }
    }
}

impl std::error::Error for GameError {}

/// Read-only view of the game for renderers, HUDs and audio
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub is_playing: bool,
    pub is_paused: bool,
    pub is_game_over: bool,
    pub is_level_completed: bool,
    pub score: u64,
    pub high_score: u64,
    pub lives: u8,
    pub level: u32,
    pub level_name: Option<String>,
    pub target_score: Option<u64>,
    /// Par time of the active level in seconds
    pub par_time_s: Option<u32>,
    /// Best rating on the active level so far
    pub level_stars: u8,
    /// Stars earned across the whole book
    pub total_stars: u32,
    pub difficulty: f32,
    pub elapsed_ms: f64,
    pub character: Character,
    pub obstacles: Vec<Obstacle>,
    /// Uncollected coins only
    pub collectibles: Vec<Collectible>,
    /// Uncollected power-ups only
    pub power_ups: Vec<PowerUp>,
    pub active_power_ups: Vec<ActivePowerUp>,
    /// Events from the most recent frame
    pub events: Vec<GameEvent>,
}

/// One game instance bound to a frame scheduler and a high score store
pub struct Game<S: FrameScheduler, H: HighScoreStore> {
    state: GameState,
    levels: LevelBook,
    high_score: HighScore,
    store: H,
    storage_key: String,
    scheduler: S,
    pending_frame: Option<FrameHandle>,
    /// Timestamp of the previous frame of the current play stretch
    last_timestamp: Option<f64>,
    jump_queued: bool,
}

impl<S: FrameScheduler, H: HighScoreStore> Game<S, H> {
    /// Create a game parked in the menu, loading the high score under the default key.
    ///
    /// Fails when `tuning` could produce an unfair world.
    pub fn new(
        seed: u64,
        tuning: Tuning,
        levels: LevelBook,
        scheduler: S,
        store: H,
    ) -> Result<Self, TuningError> {
        Self::with_storage_key(seed, tuning, levels, scheduler, store, DEFAULT_STORAGE_KEY)
    }

    pub fn with_storage_key(
        seed: u64,
        tuning: Tuning,
        levels: LevelBook,
        scheduler: S,
        store: H,
        storage_key: &str,
    ) -> Result<Self, TuningError> {
        tuning.validate()?;
        let high_score = HighScore::load(&store, storage_key);
        let mut state = GameState::new(seed, tuning);
        state.level = levels.first_id().unwrap_or(state.level);
        log::info!("Game initialized with seed: {}", seed);
        Ok(Self {
            state,
            levels,
            high_score,
            store,
            storage_key: storage_key.to_string(),
            scheduler,
            pending_frame: None,
            last_timestamp: None,
            jump_queued: false,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn levels(&self) -> &LevelBook {
        &self.levels
    }

    pub fn high_score(&self) -> u64 {
        self.high_score.best
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn store(&self) -> &H {
        &self.store
    }

    /// A run is in progress (playing or paused)
    pub fn in_run(&self) -> bool {
        matches!(self.state.phase, GamePhase::Playing | GamePhase::Paused)
    }

    /// Start a level: `level`, else the active one.
    ///
    /// Ignored while a run is in progress. Unknown or locked levels leave
    /// the game where it was.
    pub fn start(&mut self, level: Option<u32>) -> Result<(), GameError> {
        if self.in_run() {
            return Ok(());
        }
        let id = level.unwrap_or(self.state.level);
        self.load_level(id)
    }

    /// Restart the active level once its run has ended
    pub fn retry(&mut self) -> Result<(), GameError> {
        if !matches!(self.state.phase, GamePhase::GameOver | GamePhase::LevelCompleted) {
            return Ok(());
        }
        let id = self.state.level;
        self.load_level(id)
    }

    /// After a completed level, move on to the next one or back to the menu
    pub fn next_level(&mut self) -> Result<(), GameError> {
        if !self.state.is_level_completed() {
            return Ok(());
        }
        match self.levels.next_id(self.state.level) {
            Some(id) => self.load_level(id),
            None => {
                log::info!("All levels completed");
                self.reset();
                Ok(())
            }
        }
    }

    /// Back to the menu with a fresh world; progress and high score survive
    pub fn reset(&mut self) {
        self.cancel_frame();
        self.jump_queued = false;
        self.last_timestamp = None;
        self.state.return_to_menu();
        log::info!("Game reset");
    }

    pub fn toggle_pause(&mut self) {
        match self.state.phase {
            GamePhase::Playing => {
                self.state.phase = GamePhase::Paused;
                self.cancel_frame();
                log::info!("Game paused");
            }
            GamePhase::Paused => {
                self.state.phase = GamePhase::Playing;
                // The pause must not count as play time
                self.last_timestamp = None;
                self.request_frame();
                log::info!("Game resumed");
            }
            _ => {}
        }
    }

    /// Queue a jump for the next frame
    pub fn jump(&mut self) {
        if self.state.is_playing() {
            self.jump_queued = true;
        }
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Start => {
                // Failures are already logged; the game stays in the menu
                let _ = self.start(None);
            }
            Command::Jump => self.jump(),
            Command::TogglePause => self.toggle_pause(),
            Command::Reset => self.reset(),
        }
    }

    /// Handle a key press (`KeyboardEvent.code`)
    pub fn handle_key(&mut self, key: &str) {
        if let Some(command) = command_for_key(key, self.in_run()) {
            self.apply(command);
        }
    }

    pub fn handle_tap(&mut self) {
        if let Some(command) = command_for_tap(self.in_run(), self.state.is_paused()) {
            self.apply(command);
        }
    }

    /// Frame callback from the host
    pub fn on_frame(&mut self, timestamp_ms: f64) {
        // This frame's request has fired
        self.pending_frame = None;
        if !self.state.is_playing() {
            return;
        }

        let dt_ms = match self.last_timestamp {
            Some(previous) => (timestamp_ms - previous).clamp(0.0, MAX_FRAME_MS as f64) as f32,
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp_ms);

        let input = TickInput {
            dt_ms,
            jump: std::mem::take(&mut self.jump_queued),
            pause: false,
        };
        tick(&mut self.state, &input);

        match self.state.phase {
            GamePhase::Playing => self.request_frame(),
            GamePhase::GameOver => self.finish_run(),
            GamePhase::LevelCompleted => {
                let (level, score) = (self.state.level, self.state.score);
                self.levels.record_completion(level, score);
                self.finish_run();
            }
            _ => {}
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = &self.state;
        let level = self.levels.get(state.level);
        Snapshot {
            phase: state.phase,
            is_playing: state.is_playing(),
            is_paused: state.is_paused(),
            is_game_over: state.is_game_over(),
            is_level_completed: state.is_level_completed(),
            score: state.score,
            high_score: self.high_score.best,
            lives: state.lives,
            level: state.level,
            level_name: level.map(|l| l.name.clone()),
            target_score: state.target_score,
            par_time_s: level.map(|l| l.completion_time_s),
            level_stars: level.map_or(0, |l| l.stars),
            total_stars: self.levels.total_stars(),
            difficulty: state.difficulty,
            elapsed_ms: state.elapsed_ms,
            character: state.character.clone(),
            obstacles: state.obstacles.clone(),
            collectibles: state.collectibles.iter().filter(|c| !c.is_collected).cloned().collect(),
            power_ups: state.power_ups.iter().filter(|p| !p.is_collected).cloned().collect(),
            active_power_ups: state.active_power_ups.clone(),
            events: state.events.clone(),
        }
    }

    fn load_level(&mut self, id: u32) -> Result<(), GameError> {
        let Some(level) = self.levels.get(id) else {
            log::warn!("Level {} not found", id);
            return Err(GameError::UnknownLevel(id));
        };
        if !self.levels.is_unlocked(id) {
            log::warn!("Level {} ({}) is locked", id, level.name);
            return Err(GameError::LevelLocked(id));
        }

        let (target, speed) = (level.target_score, level.preset.world_speed());
        log::info!("Level {}: {} loaded ({})", id, level.name, level.preset.as_str());

        self.cancel_frame();
        self.jump_queued = false;
        self.last_timestamp = None;
        self.state.begin_level(id, target, speed);
        self.request_frame();
        Ok(())
    }

    /// Run ended (either way): stop the loop and keep the best score
    fn finish_run(&mut self) {
        self.cancel_frame();
        let score = self.state.score;
        if self.high_score.record(score) {
            self.store.save(&self.storage_key, score);
            self.state.events.push(GameEvent::NewHighScore { score });
            log::info!("New high score: {}", score);
        }
    }

    fn request_frame(&mut self) {
        if self.pending_frame.is_none() {
            self.pending_frame = Some(self.scheduler.request_frame());
        }
    }

    fn cancel_frame(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel_frame(handle);
        }
    }
}

impl<S: FrameScheduler, H: HighScoreStore> Drop for Game<S, H> {
    fn drop(&mut self) {
        self.cancel_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_MS;
    use crate::levels::{DifficultyPreset, Level};
    use crate::platform::scheduler::ManualScheduler;
    use crate::platform::storage::MemoryStore;

    type TestGame = Game<ManualScheduler, MemoryStore>;

    fn new_game() -> TestGame {
        Game::new(
            7,
            Tuning::default(),
            LevelBook::default(),
            ManualScheduler::new(),
            MemoryStore::new(),
        )
        .unwrap()
    }

    /// Levels that complete on the first frame
    fn instant_book() -> LevelBook {
        LevelBook::new(vec![
            Level::new(1, "One", DifficultyPreset::Easy, Some(0), 10),
            Level::new(2, "Two", DifficultyPreset::Medium, Some(0), 10),
        ])
    }

    /// Fire the pending request and run its callback, as a host would
    fn deliver(game: &mut TestGame, timestamp_ms: f64) {
        game.scheduler.fire();
        game.on_frame(timestamp_ms);
    }

    /// Deliver frames at 60 Hz until the loop stops or `max` frames ran
    fn run_frames(game: &mut TestGame, start_ms: f64, max: u32) -> f64 {
        let mut t = start_ms;
        for _ in 0..max {
            if game.scheduler.fire().is_none() {
                break;
            }
            game.on_frame(t);
            t += FRAME_MS as f64;
        }
        t
    }

    #[test]
    fn test_start_requests_frame() {
        let mut game = new_game();
        assert_eq!(game.state().phase, GamePhase::Menu);
        assert!(!game.scheduler().has_pending());

        game.start(None).unwrap();
        assert_eq!(game.state().phase, GamePhase::Playing);
        assert_eq!(game.state().level, 1);
        assert_eq!(game.state().target_score, Some(1000));
        assert!(game.scheduler().has_pending());
    }

    #[test]
    fn test_start_unknown_level_stays_in_menu() {
        let mut game = new_game();
        assert_eq!(game.start(Some(42)), Err(GameError::UnknownLevel(42)));
        assert_eq!(game.state().phase, GamePhase::Menu);
        assert!(!game.scheduler().has_pending());
    }

    #[test]
    fn test_start_locked_level_stays_in_menu() {
        let mut game = new_game();
        assert_eq!(game.start(Some(2)), Err(GameError::LevelLocked(2)));
        assert_eq!(game.state().phase, GamePhase::Menu);
        assert_eq!(GameError::LevelLocked(2).to_string(), "level 2 is locked");
    }

    #[test]
    fn test_first_frame_credits_nothing() {
        let mut game = new_game();
        game.start(None).unwrap();
        deliver(&mut game, 1000.0);
        assert_eq!(game.state().elapsed_ms, 0.0);
        assert_eq!(game.state().time_ticks, 1);
        deliver(&mut game, 1016.0);
        assert_eq!(game.state().elapsed_ms, 16.0);
    }

    #[test]
    fn test_frame_delta_is_clamped() {
        let mut game = new_game();
        game.start(None).unwrap();
        deliver(&mut game, 1000.0);
        deliver(&mut game, 9000.0);
        assert_eq!(game.state().elapsed_ms, MAX_FRAME_MS as f64);
    }

    #[test]
    fn test_pause_cancels_frame_and_resume_is_exact() {
        let mut game = new_game();
        game.start(None).unwrap();
        deliver(&mut game, 0.0);
        deliver(&mut game, 16.0);
        deliver(&mut game, 32.0);
        assert_eq!(game.state().elapsed_ms, 32.0);

        game.toggle_pause();
        assert!(game.state().is_paused());
        assert!(!game.scheduler().has_pending());
        assert_eq!(game.scheduler().cancelled, 1);

        // A stray frame while paused changes nothing
        let ticks = game.state().time_ticks;
        game.on_frame(5000.0);
        assert_eq!(game.state().time_ticks, ticks);
        assert!(!game.scheduler().has_pending());

        game.toggle_pause();
        assert!(game.state().is_playing());
        assert!(game.scheduler().has_pending());
        deliver(&mut game, 6000.0);
        assert_eq!(game.state().elapsed_ms, 32.0);
        deliver(&mut game, 6016.0);
        assert_eq!(game.state().elapsed_ms, 48.0);
    }

    #[test]
    fn test_jump_is_applied_on_next_frame() {
        let mut game = new_game();
        game.jump();
        assert!(!game.jump_queued);

        game.start(None).unwrap();
        game.jump();
        deliver(&mut game, 0.0);
        assert!(game.state().character.is_jumping());
        assert!(game.snapshot().events.contains(&GameEvent::Jumped));
    }

    #[test]
    fn test_game_over_records_high_score() {
        let mut game = new_game();
        game.start(None).unwrap();
        game.state.score = 50;
        run_frames(&mut game, 0.0, 500);

        assert!(game.state().is_game_over());
        assert!(!game.scheduler().has_pending());
        let best = game.high_score();
        assert!(best >= 50);
        assert_eq!(best, game.state().score);
        assert_eq!(game.store().load(DEFAULT_STORAGE_KEY), Some(best));
        assert!(game.snapshot().events.contains(&GameEvent::NewHighScore { score: best }));
    }

    #[test]
    fn test_lower_score_keeps_high_score() {
        let mut store = MemoryStore::new();
        store.save(DEFAULT_STORAGE_KEY, 10_000);
        let mut game =
            Game::new(7, Tuning::default(), LevelBook::default(), ManualScheduler::new(), store).unwrap();
        assert_eq!(game.high_score(), 10_000);

        game.start(None).unwrap();
        run_frames(&mut game, 0.0, 500);
        assert!(game.state().is_game_over());
        assert_eq!(game.high_score(), 10_000);
        assert!(
            !game
                .snapshot()
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::NewHighScore { .. }))
        );
    }

    #[test]
    fn test_retry_restarts_same_level() {
        let mut game = new_game();
        game.start(None).unwrap();
        game.state.score = 50;
        run_frames(&mut game, 0.0, 500);
        assert!(game.state().is_game_over());
        let best = game.high_score();

        game.retry().unwrap();
        assert!(game.state().is_playing());
        assert_eq!(game.state().score, 0);
        assert_eq!(game.state().level, 1);
        assert_eq!(game.high_score(), best);
        assert!(game.scheduler().has_pending());
    }

    #[test]
    fn test_retry_ignored_mid_run() {
        let mut game = new_game();
        game.retry().unwrap();
        assert_eq!(game.state().phase, GamePhase::Menu);
        assert!(!game.scheduler().has_pending());

        game.start(None).unwrap();
        run_frames(&mut game, 0.0, 10);
        let ticks = game.state().time_ticks;
        game.retry().unwrap();
        assert!(game.state().is_playing());
        assert_eq!(game.state().time_ticks, ticks);

        game.toggle_pause();
        game.retry().unwrap();
        assert!(game.state().is_paused());
        assert_eq!(game.state().time_ticks, ticks);
    }

    #[test]
    fn test_invalid_tuning_is_rejected() {
        let mut tuning = Tuning::default();
        tuning.physics.gravity = 0.0;
        let result = Game::new(7, tuning, LevelBook::default(), ManualScheduler::new(), MemoryStore::new());
        assert!(matches!(result, Err(TuningError::Invalid(_))));
    }

    #[test]
    fn test_snapshot_reports_level_progress() {
        let mut game =
            Game::new(7, Tuning::default(), instant_book(), ManualScheduler::new(), MemoryStore::new())
                .unwrap();
        let before = game.snapshot();
        assert_eq!(before.par_time_s, Some(10));
        assert_eq!(before.level_stars, 0);
        assert_eq!(before.total_stars, 0);

        game.start(None).unwrap();
        deliver(&mut game, 0.0);
        let after = game.snapshot();
        assert!(after.is_level_completed);
        assert_eq!(after.level_stars, 1);
        assert_eq!(after.total_stars, 1);
    }

    #[test]
    fn test_level_completion_and_progression() {
        let mut game =
            Game::new(7, Tuning::default(), instant_book(), ManualScheduler::new(), MemoryStore::new())
                .unwrap();
        game.start(None).unwrap();
        deliver(&mut game, 0.0);

        assert!(game.state().is_level_completed());
        assert!(!game.scheduler().has_pending());
        assert!(game.levels().get(1).unwrap().completed);
        assert_eq!(game.levels().get(1).unwrap().stars, 1);

        game.next_level().unwrap();
        assert!(game.state().is_playing());
        assert_eq!(game.state().level, 2);
        assert!((game.state().world_speed - DifficultyPreset::Medium.world_speed()).abs() < 1e-6);

        deliver(&mut game, 100.0);
        assert!(game.state().is_level_completed());
        game.next_level().unwrap();
        assert_eq!(game.state().phase, GamePhase::Menu);
        assert!(game.levels().get(2).unwrap().completed);
    }

    #[test]
    fn test_next_level_ignored_mid_run() {
        let mut game = new_game();
        game.start(None).unwrap();
        game.next_level().unwrap();
        assert_eq!(game.state().level, 1);
        assert!(game.state().is_playing());
    }

    #[test]
    fn test_reset_returns_to_menu() {
        let mut game = new_game();
        game.start(None).unwrap();
        run_frames(&mut game, 0.0, 10);
        assert!(game.scheduler().has_pending());

        game.reset();
        assert_eq!(game.state().phase, GamePhase::Menu);
        assert!(game.state().obstacles.is_empty());
        assert_eq!(game.state().score, 0);
        assert!(!game.scheduler().has_pending());
    }

    #[test]
    fn test_keys_drive_commands() {
        let mut game = new_game();
        game.handle_key("KeyW");
        assert_eq!(game.state().phase, GamePhase::Menu);

        game.handle_key("Space");
        assert!(game.state().is_playing());

        game.handle_key("KeyP");
        assert!(game.state().is_paused());
        game.handle_key("Escape");
        assert!(game.state().is_playing());

        game.handle_key("KeyR");
        assert_eq!(game.state().phase, GamePhase::Menu);

        game.handle_tap();
        assert!(game.state().is_playing());
    }

    #[test]
    fn test_drop_cancels_pending_frame() {
        let mut scheduler = ManualScheduler::new();
        {
            let mut game = Game::new(
                7,
                Tuning::default(),
                LevelBook::default(),
                &mut scheduler,
                MemoryStore::new(),
            )
            .unwrap();
            game.start(None).unwrap();
        }
        assert_eq!(scheduler.requested, 1);
        assert_eq!(scheduler.cancelled, 1);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_snapshot_hides_collected_pickups() {
        let mut game = new_game();
        game.start(None).unwrap();
        deliver(&mut game, 0.0);
        if let Some(coin) = game.state.collectibles.first_mut() {
            coin.is_collected = true;
        }
        let live = game.state().collectibles.iter().filter(|c| !c.is_collected).count();
        let snapshot = game.snapshot();
        assert_eq!(snapshot.collectibles.len(), live);
        assert_eq!(snapshot.level_name.as_deref(), Some("Forest Adventure"));
        assert!(serde_json::to_string(&snapshot).is_ok());
    }
}
