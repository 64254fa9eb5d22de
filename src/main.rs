//! Power Flap entry point
//!
//! The browser build is driven by its host page through the library API.
//! Natively this runs a headless autopilot session on a manual frame
//! scheduler and logs how it went.
//!
//! Usage: `power-flap [seed] [level] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use power_flap::consts::FRAME_MS;
    use power_flap::platform::storage::FileStore;
    use power_flap::platform::{ManualScheduler, init_logging};
    use power_flap::sim::obstacles::pairs;
    use power_flap::{Game, LevelBook, Tuning, format_score};

    init_logging();
    log::info!("Power Flap (native, headless) starting...");

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        });
    let level = args.next().and_then(|s| s.parse().ok());
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Could not load tuning from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };

    let store = FileStore::new(std::env::temp_dir().join("power-flap-highscore.json"));
    let mut game = match Game::new(seed, tuning, LevelBook::default(), ManualScheduler::new(), store) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Cannot create game: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = game.start(level) {
        log::error!("Cannot start: {}", e);
        std::process::exit(1);
    }

    // Autopilot: aim the character's centre at the centre of the next gap.
    // Frames run for as long as the game keeps requesting them.
    const MAX_FRAMES: u32 = 60 * 60 * 30;
    let mut now = 0.0f64;
    let mut frames = 0;
    while frames < MAX_FRAMES && game.scheduler_mut().fire().is_some() {
        frames += 1;
        let state = game.state();
        let character = state.character.bounds();
        let target_y = pairs(&state.obstacles)
            .iter()
            .filter(|p| p.top.pos.x + p.top.size.x > character.left())
            .min_by(|a, b| a.top.pos.x.total_cmp(&b.top.pos.x))
            .map(|p| p.gap_box().center().y)
            .unwrap_or(state.tuning.world.height * 0.5);
        if character.center().y > target_y + 10.0 && state.character.velocity_y >= 0.0 {
            game.jump();
        }

        game.on_frame(now);
        now += FRAME_MS as f64;
    }

    let snapshot = game.snapshot();
    log::info!(
        "Run finished: {:?} on level {} after {:.1}s, score {} (best {})",
        snapshot.phase,
        snapshot.level,
        snapshot.elapsed_ms / 1000.0,
        format_score(snapshot.score),
        format_score(snapshot.high_score)
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The host page drives the game through the library
}
