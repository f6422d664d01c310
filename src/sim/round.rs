//! Round state and the selection arbiter
//!
//! A round accepts exactly one resolution: a player selection, a timeout,
//! or an abandonment when the host stops play. The first one to reach the
//! arbiter locks the round; everything after it is a silent no-op.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::board::Board;
use super::clock::RoundClock;
use super::difficulty::Difficulty;
use super::options::AnswerOption;
use super::scheduler::Scheduler;
use crate::settings::Pacing;

/// Lifecycle of a single round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    /// Clock running, awaiting a selection
    Playing,
    /// Selection made, timed out, or abandoned
    Resolved,
}

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Selected(usize),
    Timeout,
    /// Host stopped play mid-round; unscored
    Abandoned,
}

/// Points and XP earned by a correct answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reward {
    pub points: u64,
    pub xp: u64,
}

impl Reward {
    /// `points = time_left * multiplier`, `xp = floor(points / 10)`
    pub fn for_answer(time_left: u32, difficulty: Difficulty) -> Self {
        let points = time_left as u64 * difficulty.multiplier() as u64;
        Self { points, xp: points / 10 }
    }
}

/// Running totals for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionTotals {
    /// Points earned this session
    pub score: u64,
    /// Consecutive correct answers
    pub streak: u32,
    /// Mirror of the profile's points
    pub lifetime_points: u64,
    /// Mirror of the profile's experience
    pub lifetime_xp: u64,
}

/// Result of an accepted resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub round: u32,
    pub resolution: Resolution,
    pub correct: bool,
    /// Seconds left when the round was resolved
    pub time_left: u32,
    pub reward: Option<Reward>,
    /// Delay before the next round; `None` when play was stopped
    pub advance_after: Option<Duration>,
}

/// One active round
#[derive(Debug, Clone)]
pub struct RoundState {
    pub number: u32,
    pub difficulty: Difficulty,
    pub board: Board,
    pub options: Vec<AnswerOption>,
    pub correct_index: usize,
    pub status: RoundStatus,
    pub selected_index: Option<usize>,
    pub locked: bool,
    pub clock: RoundClock,
}

impl RoundState {
    pub fn time_left(&self) -> u32 {
        self.clock.time_left()
    }

    /// Accepting input?
    pub fn is_open(&self) -> bool {
        self.status == RoundStatus::Playing && !self.locked
    }
}

/// Accepts at most one resolution per round and scores it
pub struct SelectionArbiter;

impl SelectionArbiter {
    /// Player picked option `index`. No-op if the round is closed or the
    /// index is out of range.
    pub fn select(
        round: &mut RoundState,
        totals: &mut SessionTotals,
        index: usize,
        pacing: &Pacing,
        scheduler: &mut Scheduler,
    ) -> Option<RoundOutcome> {
        let correct = round.options.get(index)?.is_correct;
        Self::resolve(round, totals, Resolution::Selected(index), correct, pacing, scheduler)
    }

    /// The clock ran out. Always incorrect.
    pub fn timeout(
        round: &mut RoundState,
        totals: &mut SessionTotals,
        pacing: &Pacing,
        scheduler: &mut Scheduler,
    ) -> Option<RoundOutcome> {
        Self::resolve(round, totals, Resolution::Timeout, false, pacing, scheduler)
    }

    /// Close the round without scoring it (streak untouched)
    pub fn abandon(round: &mut RoundState, scheduler: &mut Scheduler) -> Option<RoundOutcome> {
        if !round.is_open() {
            return None;
        }
        Self::lock(round, None, scheduler);
        Some(RoundOutcome {
            round: round.number,
            resolution: Resolution::Abandoned,
            correct: false,
            time_left: round.time_left(),
            reward: None,
            advance_after: None,
        })
    }

    fn resolve(
        round: &mut RoundState,
        totals: &mut SessionTotals,
        resolution: Resolution,
        correct: bool,
        pacing: &Pacing,
        scheduler: &mut Scheduler,
    ) -> Option<RoundOutcome> {
        if !round.is_open() {
            return None;
        }

        let selected = match resolution {
            Resolution::Selected(index) => Some(index),
            _ => None,
        };
        Self::lock(round, selected, scheduler);

        let time_left = round.time_left();
        let reward = if correct {
            let reward = Reward::for_answer(time_left, round.difficulty);
            totals.score += reward.points;
            totals.streak += 1;
            Some(reward)
        } else {
            totals.streak = 0;
            None
        };

        let delay = if correct {
            pacing.correct_delay()
        } else {
            pacing.incorrect_delay()
        };

        Some(RoundOutcome {
            round: round.number,
            resolution,
            correct,
            time_left,
            reward,
            advance_after: Some(delay),
        })
    }

    fn lock(round: &mut RoundState, selected: Option<usize>, scheduler: &mut Scheduler) {
        round.locked = true;
        round.clock.stop(scheduler);
        round.status = RoundStatus::Resolved;
        round.selected_index = selected;
    }
}
