//! Virtual-time task scheduler
//!
//! Every delayed action in a session (clock ticks, the next-round
//! continuation, notification expiry) is a task with a [`TaskHandle`].
//! Handles are never reused, so a cancelled or fired handle can never
//! match a live task again.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Token for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskHandle(u64);

/// What a task does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// One second of round countdown elapsed
    ClockTick,
    /// Start the next round
    NextRound,
    /// Hide the notification banner
    ClearNotification,
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    handle: TaskHandle,
    due: Duration,
    kind: TaskKind,
}

/// Pending tasks ordered by due time, then by scheduling order
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_handle: u64,
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `kind` to fire `after` from now
    pub fn schedule(&mut self, after: Duration, kind: TaskKind) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.tasks.push(ScheduledTask {
            handle,
            due: self.now + after,
            kind,
        });
        handle
    }

    /// Cancel a task; returns false if it already fired or was cancelled
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        self.tasks.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|t| t.handle == handle)
    }

    /// Number of live tasks
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Number of live tasks of one kind
    pub fn pending_of(&self, kind: TaskKind) -> usize {
        self.tasks.iter().filter(|t| t.kind == kind).count()
    }

    /// Earliest due time among live tasks
    pub fn next_due(&self) -> Option<Duration> {
        self.tasks.iter().map(|t| t.due).min()
    }

    /// Remove and return the earliest task due at or before `until`,
    /// moving the clock to its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TaskHandle, TaskKind)> {
        let (index, _) = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| (t.due, t.handle))?;

        let task = self.tasks.swap_remove(index);
        self.now = self.now.max(task.due);
        Some((task.handle, task.kind))
    }

    /// Move the clock forward (never backward)
    pub fn advance_to(&mut self, t: Duration) {
        self.now = self.now.max(t);
    }
}
