//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logging setup
//! - Input mapping (keys and taps to commands)
//! - Frame scheduling
//! - Storage (LocalStorage on web, a JSON file on native)

pub mod input;
pub mod scheduler;
pub mod storage;

pub use input::{Command, command_for_key, command_for_tap};
pub use scheduler::{FrameHandle, FrameScheduler, ManualScheduler};
pub use storage::MemoryStore;

/// Install the logger for this platform. Safe to call more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Install the logger for this platform. Safe to call more than once.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}
