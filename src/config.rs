//! Application-level configuration constants.

use log::LevelFilter;

// Cosmetic timings (ms)
pub const SHAKE_MS: u32 = 500;
pub const PULSE_MS: u32 = 600;
pub const FADE_MS: u32 = 300;

pub const RESET_PROMPT: &str = "Reset the match?";

#[cfg(debug_assertions)]
pub const LOG_LEVEL: LevelFilter = LevelFilter::Debug;
#[cfg(not(debug_assertions))]
pub const LOG_LEVEL: LevelFilter = LevelFilter::Info;
