//! Keyboard and touch mapping
//!
//! Key names are DOM `KeyboardEvent.code` values.

use serde::{Deserialize, Serialize};

/// A player command the game understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Start,
    Jump,
    TogglePause,
    Reset,
}

/// Map a key press to a command.
///
/// `playing` is true while a run is in progress, paused or not. Outside a
/// run only Space and Enter do anything (start).
pub fn command_for_key(key: &str, playing: bool) -> Option<Command> {
    if !playing {
        return match key {
            "Space" | "Enter" => Some(Command::Start),
            _ => None,
        };
    }

    match key {
        "Space" | "ArrowUp" | "KeyW" => Some(Command::Jump),
        "Escape" | "KeyP" => Some(Command::TogglePause),
        "KeyR" => Some(Command::Reset),
        _ => None,
    }
}

/// Map a tap: start outside a run, jump during one, nothing while paused
pub fn command_for_tap(playing: bool, paused: bool) -> Option<Command> {
    if !playing {
        Some(Command::Start)
    } else if paused {
        None
    } else {
        Some(Command::Jump)
    }
}
