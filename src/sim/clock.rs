//! Round countdown
//!
//! The clock is a chain of one-second scheduler tasks. Only the handle it
//! currently holds is honored, so a tick that was cancelled (or belongs to a
//! previous round) can never drive this clock.

use serde::{Deserialize, Serialize};

use super::scheduler::{Scheduler, TaskHandle, TaskKind};
use crate::consts::{CLOCK_STEP, WARNING_CUE_AT, WARNING_ZONE};

/// What a tick produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSignal {
    /// Plain second elapsed
    Tick { time_left: u32 },
    /// Urgency cue for the presentation layer (not scored)
    Warning { time_left: u32 },
    /// Reached zero; the clock has stopped itself
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundClock {
    time_left: u32,
    warning_active: bool,
    #[serde(skip)]
    handle: Option<TaskHandle>,
}

impl RoundClock {
    /// Start counting down from `time_limit_secs`
    pub fn start(time_limit_secs: u32, scheduler: &mut Scheduler) -> Self {
        Self {
            time_left: time_limit_secs,
            warning_active: false,
            handle: Some(scheduler.schedule(CLOCK_STEP, TaskKind::ClockTick)),
        }
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    /// True once the countdown is in its final stretch
    pub fn warning_active(&self) -> bool {
        self.warning_active
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Does `fired` belong to this clock?
    pub fn owns(&self, fired: TaskHandle) -> bool {
        self.handle == Some(fired)
    }

    /// Handle a fired tick. Returns `None` for ticks this clock does not own.
    pub fn on_tick(&mut self, fired: TaskHandle, scheduler: &mut Scheduler) -> Option<ClockSignal> {
        if !self.owns(fired) {
            return None;
        }

        self.time_left = self.time_left.saturating_sub(1);
        self.warning_active = self.time_left <= WARNING_ZONE;

        if self.time_left == 0 {
            self.handle = None;
            return Some(ClockSignal::Expired);
        }

        self.handle = Some(scheduler.schedule(CLOCK_STEP, TaskKind::ClockTick));

        let time_left = self.time_left;
        if time_left == WARNING_CUE_AT || time_left <= WARNING_ZONE {
            Some(ClockSignal::Warning { time_left })
        } else {
            Some(ClockSignal::Tick { time_left })
        }
    }

    /// Cancel the pending tick, freezing `time_left`
    pub fn stop(&mut self, scheduler: &mut Scheduler) {
        if let Some(handle) = self.handle.take() {
            scheduler.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Fire every due tick up to `secs` seconds from now
    fn run(clock: &mut RoundClock, s: &mut Scheduler, secs: u64) -> Vec<ClockSignal> {
        let until = s.now() + Duration::from_secs(secs);
        let mut out = Vec::new();
        while let Some((h, kind)) = s.pop_due(until) {
            assert_eq!(kind, TaskKind::ClockTick);
            out.extend(clock.on_tick(h, s));
        }
        s.advance_to(until);
        out
    }

    #[test]
    fn test_counts_down_and_expires_once() {
        let mut s = Scheduler::new();
        let mut clock = RoundClock::start(3, &mut s);

        let signals = run(&mut clock, &mut s, 10);
        assert_eq!(
            signals,
            vec![
                ClockSignal::Warning { time_left: 2 },
                ClockSignal::Warning { time_left: 1 },
                ClockSignal::Expired,
            ]
        );
        assert_eq!(clock.time_left(), 0);
        assert!(!clock.is_running());
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn test_warning_schedule() {
        let mut s = Scheduler::new();
        let mut clock = RoundClock::start(12, &mut s);
        let signals = run(&mut clock, &mut s, 12);

        let warned: Vec<u32> = signals
            .iter()
            .filter_map(|sig| match sig {
                ClockSignal::Warning { time_left } => Some(*time_left),
                _ => None,
            })
            .collect();
        assert_eq!(warned, vec![10, 6, 5, 4, 3, 2, 1]);
        assert_eq!(signals.last(), Some(&ClockSignal::Expired));
    }

    #[test]
    fn test_warning_flag_only_in_final_zone() {
        let mut s = Scheduler::new();
        let mut clock = RoundClock::start(30, &mut s);
        run(&mut clock, &mut s, 20);
        assert_eq!(clock.time_left(), 10);
        assert!(!clock.warning_active());
        run(&mut clock, &mut s, 4);
        assert_eq!(clock.time_left(), 6);
        assert!(clock.warning_active());
    }

    #[test]
    fn test_stop_cancels_pending_tick() {
        let mut s = Scheduler::new();
        let mut clock = RoundClock::start(30, &mut s);
        run(&mut clock, &mut s, 5);
        clock.stop(&mut s);

        assert_eq!(s.pending(), 0);
        assert!(run(&mut clock, &mut s, 60).is_empty());
        assert_eq!(clock.time_left(), 25);
    }

    #[test]
    fn test_foreign_tick_ignored() {
        let mut s = Scheduler::new();
        let mut old = RoundClock::start(30, &mut s);
        old.stop(&mut s);
        let mut clock = RoundClock::start(30, &mut s);

        let stale = s.schedule(Duration::ZERO, TaskKind::ClockTick);
        assert_eq!(clock.on_tick(stale, &mut s), None);
        assert_eq!(clock.time_left(), 30);
    }
}
