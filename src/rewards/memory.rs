//! In-process profile store
//!
//! Backs the demo binary and the tests. Each operation can be switched to
//! fail, and an optional latency makes calls genuinely in flight.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use super::store::{Profile, ProfileStore, ProfileUpdate, StoreError, UserId};

#[derive(Debug)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<UserId, Profile>>,
    atomic_enabled: AtomicBool,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    latency: Option<Duration>,
    atomic_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl Default for MemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self {
            profiles: Mutex::new(HashMap::new()),
            atomic_enabled: AtomicBool::new(true),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            latency: None,
            atomic_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
        }
    }

    /// Seed a profile
    pub fn with_profile(self, user: UserId, profile: Profile) -> Self {
        self.lock().insert(user, profile);
        self
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Toggle the atomic increment operation (off = "not deployed")
    pub fn set_atomic_enabled(&self, enabled: bool) {
        self.atomic_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current stored profile
    pub fn profile(&self, user: &UserId) -> Option<Profile> {
        self.lock().get(user).copied()
    }

    /// Overwrite a profile behind the engine's back
    pub fn put_profile(&self, user: UserId, profile: Profile) {
        self.lock().insert(user, profile);
    }

    /// Successful atomic increments so far
    pub fn atomic_calls(&self) -> usize {
        self.atomic_calls.load(Ordering::SeqCst)
    }

    /// Successful full updates so far
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, Profile>> {
        self.profiles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl ProfileStore for MemoryProfileStore {
    async fn read_profile(&self, user: &UserId) -> Result<Profile, StoreError> {
        self.delay().await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("read failed".into()));
        }
        self.profile(user).ok_or_else(|| StoreError::NotFound(user.clone()))
    }

    async fn update_profile(&self, user: &UserId, update: ProfileUpdate) -> Result<(), StoreError> {
        self.delay().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("write failed".into()));
        }
        let mut profiles = self.lock();
        let profile = profiles
            .get_mut(user)
            .ok_or_else(|| StoreError::NotFound(user.clone()))?;
        if let Some(points) = update.points {
            profile.points = points;
        }
        if let Some(experience) = update.experience {
            profile.experience = experience;
        }
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn increment_profile_atomic(
        &self,
        user: &UserId,
        points_delta: u64,
        xp_delta: u64,
    ) -> Result<(), StoreError> {
        self.delay().await;
        if !self.atomic_enabled.load(Ordering::SeqCst) {
            return Err(StoreError::Unsupported("increment_profile_atomic"));
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("write failed".into()));
        }
        let mut profiles = self.lock();
        let profile = profiles
            .get_mut(user)
            .ok_or_else(|| StoreError::NotFound(user.clone()))?;
        let (Some(points), Some(experience)) = (
            profile.points.checked_add(points_delta),
            profile.experience.checked_add(xp_delta),
        ) else {
            return Err(StoreError::Rejected("profile balance would overflow".into()));
        };
        profile.points = points;
        profile.experience = experience;
        self.atomic_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
