//! Profile store interface
//!
//! The profile (points + experience per user) is owned by an external
//! service. The engine only ever calls these three operations.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

/// Identity of the signed-in player
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted reward balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub points: u64,
    pub experience: u64,
}

/// Full or partial profile write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<u64>,
}

impl From<Profile> for ProfileUpdate {
    fn from(profile: Profile) -> Self {
        Self {
            points: Some(profile.points),
            experience: Some(profile.experience),
        }
    }
}

/// Profile store failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("operation not supported by this store: {0}")]
    Unsupported(&'static str),

    #[error("no profile for user {0}")]
    NotFound(UserId),

    #[error("store rejected the request: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Remote profile store
pub trait ProfileStore: Send + Sync + 'static {
    fn read_profile(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<Profile, StoreError>> + Send;

    fn update_profile(
        &self,
        user: &UserId,
        update: ProfileUpdate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Add both deltas in one server-side step
    fn increment_profile_atomic(
        &self,
        user: &UserId,
        points_delta: u64,
        xp_delta: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
