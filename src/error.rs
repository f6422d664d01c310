use crate::sim::Difficulty;

/// Errors raised outside of gameplay: configuration and local files.
///
/// Gameplay itself never fails; profile store failures live in
/// [`crate::rewards::StoreError`] and are absorbed by reward sync.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("difficulty {0:?} allows no shape types")]
    EmptyShapeSet(Difficulty),

    #[error("difficulty {difficulty:?} is invalid: {reason}")]
    InvalidProfile {
        difficulty: Difficulty,
        reason: &'static str,
    },

    #[error("difficulty table is not monotonic: {0}")]
    NotMonotonic(&'static str),
}

pub type Result<T> = std::result::Result<T, EngineError>;
