//! Missing Piece - A timed pattern matching mini-game engine
//!
//! Core modules:
//! - `sim`: Deterministic round engine (generation, clock, arbiter, session)
//! - `rewards`: Points/XP sync against an external profile store
//! - `runtime`: Tokio host that drives a session in real time
//! - `effects`: Sound cue capability injected into the engine
//! - `settings`: Player preferences and pacing
//! - `records`: High score / best streak derived from session totals

pub mod effects;
pub mod error;
pub mod records;
pub mod rewards;
pub mod runtime;
pub mod settings;
pub mod sim;

pub use error::{EngineError, Result};
pub use records::Records;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    use std::time::Duration;

    /// Side length of the square board canvas
    pub const BOARD_SIZE: f32 = 300.0;
    /// Side length of the missing piece rectangle
    pub const PIECE_SIZE: f32 = 60.0;

    /// Pattern tile size range
    pub const PATTERN_MIN_SIZE: f32 = 20.0;
    pub const PATTERN_MAX_SIZE: f32 = 50.0;
    /// Pattern opacity range
    pub const PATTERN_MIN_OPACITY: f32 = 0.9;
    pub const PATTERN_MAX_OPACITY: f32 = 1.0;

    /// Countdown resolution
    pub const CLOCK_STEP: Duration = Duration::from_secs(1);
    /// One-shot warning cue
    pub const WARNING_CUE_AT: u32 = 10;
    /// Continuous warning from here down
    pub const WARNING_ZONE: u32 = 6;

    /// Next-round delay after a correct answer
    pub const CORRECT_ADVANCE_DELAY: Duration = Duration::from_secs(1);
    /// Next-round delay after a wrong answer or timeout
    pub const INCORRECT_ADVANCE_DELAY: Duration = Duration::from_secs(2);
    /// How long a notification banner stays up
    pub const NOTIFICATION_DURATION: Duration = Duration::from_secs(3);

    /// Host driver tick
    pub const HOST_TICK: Duration = Duration::from_millis(100);
}

/// Wrap degrees to [0, 360)
#[inline]
pub fn normalize_degrees(deg: f32) -> f32 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert!(normalize_degrees(-1e-9) < 360.0);
    }
}
