//! Deterministic round engine
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Virtual time only (driven by `GameSession::advance`)
//! - Seeded RNG only
//! - No I/O, no audio, no network

pub mod board;
pub mod clock;
pub mod difficulty;
pub mod options;
pub mod pattern;
pub mod round;
pub mod scheduler;
pub mod session;

pub use board::{Board, BoardGenerator, PieceRect};
pub use clock::{ClockSignal, RoundClock};
pub use difficulty::{Difficulty, DifficultyProfile, DifficultyTable};
pub use options::{AnswerOption, OptionGenerator, correct_index, similar_pattern};
pub use pattern::{PALETTE, Pattern, PatternFactory, PatternId, Rgb, ShapeParams, ShapeType};
pub use round::{
    Resolution, Reward, RoundOutcome, RoundState, RoundStatus, SelectionArbiter, SessionTotals,
};
pub use scheduler::{Scheduler, TaskHandle, TaskKind};
pub use session::{GameSession, OptionView, SessionPhase, SessionView};
