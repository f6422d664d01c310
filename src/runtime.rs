//! Tokio host for a [`GameSession`]
//!
//! One driver task owns the session. Commands arrive over a channel, a
//! fixed-rate interval feeds elapsed time into `advance`, and reward syncs
//! run as spawned tasks whose settlements are fed back through `settle`.
//! Every state change is published as a [`SessionView`] snapshot.
//!
//! Nothing the profile store does can hold up play: the initial profile
//! read and every reward sync run beside the command loop. Syncs run one at
//! a time, in the order the rewards were earned. A sync task that dies is
//! settled as lost.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

use crate::consts::HOST_TICK;
use crate::rewards::{
    ProfileStore, RewardClaim, RewardSettlement, RewardSync, RewardTicket, SyncOutcome,
};
use crate::sim::{Difficulty, GameSession, SessionView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    StartOrContinue,
    Select(usize),
    SetDifficulty(Difficulty),
    Stop,
    Dispose,
}

/// Control surface for a running session
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<SessionView>,
    task: JoinHandle<SessionView>,
}

/// Move `session` onto a driver task backed by `store`
pub fn spawn<S: ProfileStore>(session: GameSession, store: Arc<S>) -> SessionHandle {
    let (commands, rx) = mpsc::unbounded_channel();
    let (view_tx, view) = watch::channel(session.view());
    let task = tokio::spawn(drive(session, store, rx, view_tx));
    SessionHandle { commands, view, task }
}

impl SessionHandle {
    pub fn start_or_continue(&self) {
        self.send(Command::StartOrContinue);
    }

    pub fn select(&self, index: usize) {
        self.send(Command::Select(index));
    }

    pub fn set_difficulty(&self, difficulty: Difficulty) {
        self.send(Command::SetDifficulty(difficulty));
    }

    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    /// Subscribe to view snapshots
    pub fn view(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Tear the session down, abandoning in-flight reward syncs. Returns the
    /// final snapshot.
    pub async fn dispose(self) -> SessionView {
        self.send(Command::Dispose);
        let last = self.view.borrow().clone();
        match self.task.await {
            Ok(view) => view,
            Err(e) => {
                log::error!("Session driver failed: {}", e);
                last
            }
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::debug!("Session driver gone; dropping {:?}", command);
        }
    }
}

async fn drive<S: ProfileStore>(
    mut session: GameSession,
    store: Arc<S>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    view: watch::Sender<SessionView>,
) -> SessionView {
    // The profile read runs alongside play; a slow store never holds a round
    let mut profile_load = JoinSet::new();
    if let Some(user) = session.user().cloned() {
        let store = Arc::clone(&store);
        profile_load.spawn(async move {
            let loaded = store.read_profile(&user).await;
            (user, loaded)
        });
    }

    let sync = RewardSync::new(store);
    let mut rewards = JoinSet::new();
    // Claims wait here so only one sync per session touches the store
    let mut queued: VecDeque<RewardClaim> = VecDeque::new();
    let mut syncing: Option<(task::Id, RewardTicket)> = None;

    let mut ticker = tokio::time::interval(HOST_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();

    loop {
        tokio::select! {
            command = commands.recv() => {
                // Bring virtual time up to date so ticks and commands stay ordered
                let now = Instant::now();
                session.advance(now.duration_since(last));
                last = now;

                match command {
                    Some(Command::StartOrContinue) => {
                        session.start_or_continue();
                    }
                    Some(Command::Select(index)) => {
                        session.select(index);
                    }
                    Some(Command::SetDifficulty(difficulty)) => {
                        session.set_difficulty(difficulty);
                    }
                    Some(Command::Stop) => session.stop(),
                    Some(Command::Dispose) | None => break,
                }
            }
            _ = ticker.tick() => {
                let now = Instant::now();
                session.advance(now.duration_since(last));
                last = now;
            }
            Some(joined) = profile_load.join_next() => match joined {
                Ok((user, Ok(profile))) => {
                    if session.load_lifetime(profile) {
                        log::info!(
                            "Loaded profile for {}: {} points, {} XP",
                            user,
                            profile.points,
                            profile.experience
                        );
                    } else {
                        log::debug!("Ignoring stale profile read for {}", user);
                    }
                }
                Ok((user, Err(e))) => log::warn!("Could not load profile for {}: {}", user, e),
                Err(e) => log::error!("Profile load task failed: {}", e),
            },
            Some(joined) = rewards.join_next_with_id() => {
                let settlement = match joined {
                    Ok((_, settlement)) => Some(settlement),
                    Err(e) => {
                        log::error!("Reward sync task failed: {}", e);
                        syncing
                            .filter(|(id, _)| *id == e.id())
                            .map(|(_, ticket)| RewardSettlement {
                                ticket,
                                outcome: SyncOutcome::Lost,
                            })
                    }
                };
                syncing = None;
                if let Some(settlement) = settlement {
                    session.settle(settlement);
                }
            }
        }

        queued.extend(session.drain_reward_claims());
        if syncing.is_none() {
            if let Some(claim) = queued.pop_front() {
                let ticket = claim.ticket;
                let sync = sync.clone();
                let task = rewards.spawn(async move { sync.apply(claim).await });
                syncing = Some((task.id(), ticket));
            }
        }
        view.send_replace(session.view());
    }

    let abandoned = rewards.len() + queued.len();
    if abandoned > 0 {
        log::warn!("Abandoning {} unsettled reward syncs", abandoned);
    }
    rewards.abort_all();
    profile_load.abort_all();
    session.dispose();
    let last_view = session.view();
    view.send_replace(last_view.clone());
    last_view
}
