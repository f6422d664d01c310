//! Reward sync: persist earned points/XP to the profile store
//!
//! Primary path: one atomic increment. The store applied the deltas exactly
//! once, so the session may add them to its local mirror.
//!
//! Fallback path: read the profile, add the deltas, write both fields back.
//! The session adopts the written absolute values instead of adding deltas,
//! so a stale local mirror never compounds.
//!
//! The fallback is a read-modify-write with no concurrency guard. Another
//! session writing the same profile between our read and write loses its
//! update. This is a known gap, not something this module tries to fix.
//! Within one session the runtime driver runs a single sync at a time, so a
//! session never races its own fallback writes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::store::{Profile, ProfileStore, StoreError, UserId};
use crate::sim::Reward;

/// Identifies one reserved reward within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardTicket(pub u64);

/// A reward reserved by the session, waiting to be persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardClaim {
    pub ticket: RewardTicket,
    pub user: UserId,
    pub reward: Reward,
}

/// How a claim ended up in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    /// Atomic increment applied these deltas
    Incremented(Reward),
    /// Fallback wrote these absolute values
    Reconciled(Profile),
    /// Nothing was persisted
    Lost,
}

/// Result handed back to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSettlement {
    pub ticket: RewardTicket,
    pub outcome: SyncOutcome,
}

/// The only writer of profile balances
pub struct RewardSync<S> {
    store: Arc<S>,
}

impl<S> Clone for RewardSync<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ProfileStore> RewardSync<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Persist one claim. Never fails: store errors become [`SyncOutcome::Lost`].
    pub async fn apply(&self, claim: RewardClaim) -> RewardSettlement {
        let RewardClaim { ticket, user, reward } = claim;

        let outcome = match self
            .store
            .increment_profile_atomic(&user, reward.points, reward.xp)
            .await
        {
            Ok(()) => {
                log::debug!("reward {:?} incremented for {}", reward, user);
                SyncOutcome::Incremented(reward)
            }
            Err(e) => {
                log::warn!("atomic increment failed for {} ({}), using read-modify-write", user, e);
                match self.read_modify_write(&user, reward).await {
                    Ok(profile) => SyncOutcome::Reconciled(profile),
                    Err(e) => {
                        log::error!("reward {:?} lost for {}: {}", reward, user, e);
                        SyncOutcome::Lost
                    }
                }
            }
        };

        RewardSettlement { ticket, outcome }
    }

    async fn read_modify_write(
        &self,
        user: &UserId,
        reward: Reward,
    ) -> Result<Profile, StoreError> {
        let current = self.store.read_profile(user).await?;
        let overflow = || StoreError::Rejected("profile balance would overflow".into());
        let updated = Profile {
            points: current.points.checked_add(reward.points).ok_or_else(overflow)?,
            experience: current.experience.checked_add(reward.xp).ok_or_else(overflow)?,
        };
        self.store.update_profile(user, updated.into()).await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::MemoryProfileStore;

    fn user() -> UserId {
        UserId::new("student-1")
    }

    fn claim(points: u64, xp: u64) -> RewardClaim {
        RewardClaim {
            ticket: RewardTicket(1),
            user: user(),
            reward: Reward { points, xp },
        }
    }

    fn store(points: u64, experience: u64) -> Arc<MemoryProfileStore> {
        Arc::new(MemoryProfileStore::new().with_profile(user(), Profile { points, experience }))
    }

    #[tokio::test]
    async fn test_atomic_path() {
        let store = store(100, 10);
        let settlement = RewardSync::new(store.clone()).apply(claim(45, 4)).await;

        assert_eq!(settlement.ticket, RewardTicket(1));
        assert_eq!(settlement.outcome, SyncOutcome::Incremented(Reward { points: 45, xp: 4 }));
        assert_eq!(store.profile(&user()), Some(Profile { points: 145, experience: 14 }));
        assert_eq!(store.atomic_calls(), 1);
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_path_writes_absolute_values() {
        let store = store(100, 10);
        store.set_atomic_enabled(false);

        let settlement = RewardSync::new(store.clone()).apply(claim(20, 2)).await;
        let expected = Profile { points: 120, experience: 12 };
        assert_eq!(settlement.outcome, SyncOutcome::Reconciled(expected));
        assert_eq!(store.profile(&user()), Some(expected));
        assert_eq!(store.atomic_calls(), 0);
        assert_eq!(store.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_read_failure_loses_reward() {
        let store = store(100, 10);
        store.set_atomic_enabled(false);
        store.set_fail_reads(true);

        let settlement = RewardSync::new(store.clone()).apply(claim(20, 2)).await;
        assert_eq!(settlement.outcome, SyncOutcome::Lost);
        assert_eq!(store.profile(&user()), Some(Profile { points: 100, experience: 10 }));
    }

    #[tokio::test]
    async fn test_write_failure_loses_reward() {
        let store = store(5, 5);
        store.set_fail_writes(true);

        let settlement = RewardSync::new(store.clone()).apply(claim(30, 3)).await;
        assert_eq!(settlement.outcome, SyncOutcome::Lost);
        assert_eq!(store.profile(&user()), Some(Profile { points: 5, experience: 5 }));
    }

    #[tokio::test]
    async fn test_overflowing_balance_is_lost() {
        let near_max = Profile { points: u64::MAX - 1, experience: 7 };
        let store = Arc::new(MemoryProfileStore::new().with_profile(user(), near_max));

        // Atomic path rejects the overflow, then the fallback does too
        let settlement = RewardSync::new(store.clone()).apply(claim(45, 4)).await;
        assert_eq!(settlement.outcome, SyncOutcome::Lost);
        assert_eq!(store.profile(&user()), Some(near_max));
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_user_is_lost() {
        let store = Arc::new(MemoryProfileStore::new());
        let settlement = RewardSync::new(store).apply(claim(10, 1)).await;
        assert_eq!(settlement.outcome, SyncOutcome::Lost);
    }
}
