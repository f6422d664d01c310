//! Game session: the state machine that runs rounds back to back
//!
//! ```text
//! NotStarted --start--> Playing --select/timeout--> Resolved --delay--> Playing ...
//! ```
//!
//! The session is synchronous and driven by [`GameSession::advance`]. It owns
//! the only `RoundState`/`SessionTotals` pair and every scheduled task; the
//! host feeds it commands, elapsed time, and reward settlements.

use std::time::Duration;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::board::{Board, BoardGenerator, PieceRect};
use super::clock::{ClockSignal, RoundClock};
use super::difficulty::{Difficulty, DifficultyTable};
use super::options::{AnswerOption, OptionGenerator, correct_index};
use super::pattern::Pattern;
use super::round::{
    Resolution, Reward, RoundOutcome, RoundState, RoundStatus, SelectionArbiter, SessionTotals,
};
use super::scheduler::{Scheduler, TaskHandle, TaskKind};
use crate::effects::{Effects, SilentEffects, SoundEffect};
use crate::rewards::{Profile, RewardClaim, RewardSettlement, RewardTicket, SyncOutcome, UserId};
use crate::settings::{Pacing, Settings};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No round played yet
    NotStarted,
    /// A round is awaiting a selection
    Playing,
    /// Last round is resolved; the next one may be scheduled
    Resolved,
    /// Torn down by the host; inert
    Disposed,
}

#[derive(Debug)]
struct Notification {
    text: String,
    clear: TaskHandle,
}

/// Owns one player's run of rounds
pub struct GameSession {
    table: DifficultyTable,
    difficulty: Difficulty,
    pacing: Pacing,
    seed: u64,
    rng: Pcg32,
    scheduler: Scheduler,
    round: Option<RoundState>,
    rounds_started: u32,
    totals: SessionTotals,
    user: Option<UserId>,
    /// Pending next-round task
    continuation: Option<TaskHandle>,
    notification: Option<Notification>,
    next_ticket: u64,
    /// Claims not yet handed to the host
    outbox: Vec<RewardClaim>,
    /// Claims handed out and not yet settled
    in_flight: Vec<(RewardTicket, Reward)>,
    /// A settlement has touched the lifetime mirror
    lifetime_settled: bool,
    effects: Box<dyn Effects>,
    disposed: bool,
}

impl GameSession {
    pub fn new(settings: &Settings, user: Option<UserId>) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);
        Self {
            table: DifficultyTable::standard(),
            difficulty: settings.difficulty,
            pacing: settings.pacing,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            scheduler: Scheduler::new(),
            round: None,
            rounds_started: 0,
            totals: SessionTotals::default(),
            user,
            continuation: None,
            notification: None,
            next_ticket: 1,
            outbox: Vec::new(),
            in_flight: Vec::new(),
            lifetime_settled: false,
            effects: Box::new(SilentEffects),
            disposed: false,
        }
    }

    /// Replace the difficulty table
    pub fn with_table(mut self, table: DifficultyTable) -> Self {
        self.table = table;
        self
    }

    /// Inject a sound cue sink
    pub fn with_effects(mut self, effects: Box<dyn Effects>) -> Self {
        self.effects = effects;
        self
    }

    // === Queries ===

    pub fn phase(&self) -> SessionPhase {
        if self.disposed {
            return SessionPhase::Disposed;
        }
        match &self.round {
            None => SessionPhase::NotStarted,
            Some(round) if round.status == RoundStatus::Playing => SessionPhase::Playing,
            Some(_) => SessionPhase::Resolved,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn totals(&self) -> &SessionTotals {
        &self.totals
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Next-round task pending?
    pub fn has_pending_continuation(&self) -> bool {
        self.continuation.is_some()
    }

    /// Live scheduled tasks (clock, continuation, notification)
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    /// Live tasks of one kind
    pub fn pending_tasks_of(&self, kind: TaskKind) -> usize {
        self.scheduler.pending_of(kind)
    }

    /// Rewards reserved but not yet settled
    pub fn pending_rewards(&self) -> usize {
        self.outbox.len() + self.in_flight.len()
    }

    pub fn notification(&self) -> Option<&str> {
        self.notification.as_ref().map(|n| n.text.as_str())
    }

    // === Commands ===

    /// Start a round from NotStarted, or from a Resolved state with no
    /// continuation pending. Returns whether a round was started.
    pub fn start_or_continue(&mut self) -> bool {
        match self.phase() {
            SessionPhase::NotStarted => {}
            SessionPhase::Resolved if self.continuation.is_none() => {}
            _ => return false,
        }
        self.start_round();
        true
    }

    /// Player picked option `index`
    pub fn select(&mut self, index: usize) -> Option<RoundOutcome> {
        if self.disposed {
            return None;
        }
        let round = self.round.as_mut()?;
        let outcome = SelectionArbiter::select(
            round,
            &mut self.totals,
            index,
            &self.pacing,
            &mut self.scheduler,
        )?;
        self.after_resolution(&outcome);
        Some(outcome)
    }

    /// Change difficulty. Only allowed before the first round or while
    /// resolved with no continuation pending.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> bool {
        let allowed = match self.phase() {
            SessionPhase::NotStarted => true,
            SessionPhase::Resolved => self.continuation.is_none(),
            _ => false,
        };
        if allowed {
            log::info!("Difficulty {} -> {}", self.difficulty.as_str(), difficulty.as_str());
            self.difficulty = difficulty;
        } else {
            log::debug!("Ignoring difficulty change in phase {:?}", self.phase());
        }
        allowed
    }

    /// Halt play: abandon a running round and cancel the next-round task.
    /// The session can be restarted with [`Self::start_or_continue`].
    pub fn stop(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(round) = self.round.as_mut() {
            if SelectionArbiter::abandon(round, &mut self.scheduler).is_some() {
                log::info!("Round {} abandoned", round.number);
            }
        }
        if let Some(handle) = self.continuation.take() {
            self.scheduler.cancel(handle);
        }
    }

    /// Tear down: cancel every task and drop unsettled claims. Later
    /// commands and settlements are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.stop();
        self.scheduler.cancel_all();
        self.notification = None;
        self.outbox.clear();
        self.in_flight.clear();
        self.disposed = true;
        log::info!(
            "Session disposed after {} rounds (score {}, seed {})",
            self.rounds_started,
            self.totals.score,
            self.seed
        );
    }

    /// Seed lifetime totals from the profile read at session start.
    ///
    /// The read runs alongside play, so it may land after a reward has
    /// already been settled. Such a read is stale and is ignored; returns
    /// whether the profile was applied.
    pub fn load_lifetime(&mut self, profile: Profile) -> bool {
        if self.disposed || self.lifetime_settled {
            return false;
        }
        self.totals.lifetime_points = profile.points;
        self.totals.lifetime_xp = profile.experience;
        true
    }

    /// Advance virtual time, firing every task that comes due
    pub fn advance(&mut self, elapsed: Duration) {
        if self.disposed {
            return;
        }
        let until = self.scheduler.now() + elapsed;
        while let Some((handle, kind)) = self.scheduler.pop_due(until) {
            match kind {
                TaskKind::ClockTick => self.on_clock_tick(handle),
                TaskKind::NextRound => self.on_next_round(handle),
                TaskKind::ClearNotification => self.on_clear_notification(handle),
            }
        }
        self.scheduler.advance_to(until);
    }

    // === Reward reconciliation ===

    /// Hand reserved claims to the host for syncing
    pub fn drain_reward_claims(&mut self) -> Vec<RewardClaim> {
        let claims = std::mem::take(&mut self.outbox);
        self.in_flight.extend(claims.iter().map(|c| (c.ticket, c.reward)));
        claims
    }

    /// Apply a finished sync. Unknown tickets and settlements arriving after
    /// disposal are discarded; returns whether the settlement was applied.
    pub fn settle(&mut self, settlement: RewardSettlement) -> bool {
        if self.disposed {
            log::debug!("Discarding settlement {:?} on disposed session", settlement.ticket);
            return false;
        }
        let Some(pos) = self.in_flight.iter().position(|(t, _)| *t == settlement.ticket) else {
            log::debug!("Discarding unknown settlement {:?}", settlement.ticket);
            return false;
        };
        let (_, reserved) = self.in_flight.swap_remove(pos);

        match settlement.outcome {
            SyncOutcome::Incremented(reward) => {
                let totals = &mut self.totals;
                totals.lifetime_points = totals.lifetime_points.saturating_add(reward.points);
                totals.lifetime_xp = totals.lifetime_xp.saturating_add(reward.xp);
                self.lifetime_settled = true;
                self.announce_reward(reward);
            }
            SyncOutcome::Reconciled(profile) => {
                // Adopt the written values; the local mirror may be stale
                self.totals.lifetime_points = profile.points;
                self.totals.lifetime_xp = profile.experience;
                self.lifetime_settled = true;
                self.announce_reward(reserved);
            }
            SyncOutcome::Lost => {}
        }
        true
    }

    // === Presentation ===

    /// Snapshot for an external renderer
    pub fn view(&self) -> SessionView {
        let round = self.round.as_ref();
        let resolved = round.is_some_and(|r| r.status == RoundStatus::Resolved);
        SessionView {
            phase: self.phase(),
            difficulty: self.difficulty,
            round_number: round.map(|r| r.number).unwrap_or(0),
            board: round.map(|r| r.board.clone()),
            missing: round.map(|r| r.board.missing),
            options: round
                .map(|r| r.options.iter().map(OptionView::from).collect())
                .unwrap_or_default(),
            time_left: round.map(|r| r.time_left()).unwrap_or(0),
            warning_active: round
                .is_some_and(|r| r.status == RoundStatus::Playing && r.clock.warning_active()),
            round_status: round.map(|r| r.status),
            selected_index: round.and_then(|r| r.selected_index),
            correct_index: if resolved { round.map(|r| r.correct_index) } else { None },
            totals: self.totals,
            notification: self.notification().map(str::to_owned),
            pending_rewards: self.pending_rewards(),
        }
    }

    // === Internals ===

    fn start_round(&mut self) {
        if let Some(old) = self.round.as_mut() {
            old.clock.stop(&mut self.scheduler);
        }
        if let Some(handle) = self.continuation.take() {
            self.scheduler.cancel(handle);
        }

        let profile = self.table.profile(self.difficulty);
        let board = BoardGenerator::generate(profile, &mut self.rng);
        let options = OptionGenerator::generate(
            board.target_patterns(),
            &board.missing,
            self.difficulty,
            profile,
            &mut self.rng,
        );
        let correct_index = correct_index(&options).unwrap_or_default();
        let clock = RoundClock::start(profile.time_limit_secs, &mut self.scheduler);

        self.rounds_started += 1;
        log::info!(
            "Round {} ({}): {} layers, {} options, {}s",
            self.rounds_started,
            self.difficulty.as_str(),
            board.tiles.len(),
            options.len(),
            profile.time_limit_secs
        );

        self.round = Some(RoundState {
            number: self.rounds_started,
            difficulty: self.difficulty,
            board,
            options,
            correct_index,
            status: RoundStatus::Playing,
            selected_index: None,
            locked: false,
            clock,
        });
        self.effects.play(SoundEffect::RoundStart);
    }

    fn on_clock_tick(&mut self, handle: TaskHandle) {
        let Some(round) = self.round.as_mut() else { return };
        match round.clock.on_tick(handle, &mut self.scheduler) {
            Some(ClockSignal::Tick { time_left }) => {
                log::debug!("Round {}: {}s left", round.number, time_left);
            }
            Some(ClockSignal::Warning { time_left }) => {
                log::debug!("Round {}: {}s left (warning)", round.number, time_left);
                self.effects.play(SoundEffect::Warning);
            }
            Some(ClockSignal::Expired) => {
                if let Some(outcome) = SelectionArbiter::timeout(
                    round,
                    &mut self.totals,
                    &self.pacing,
                    &mut self.scheduler,
                ) {
                    self.after_resolution(&outcome);
                }
            }
            None => {}
        }
    }

    fn on_next_round(&mut self, handle: TaskHandle) {
        if self.continuation != Some(handle) {
            return;
        }
        self.continuation = None;
        self.start_round();
    }

    fn on_clear_notification(&mut self, handle: TaskHandle) {
        if self.notification.as_ref().is_some_and(|n| n.clear == handle) {
            self.notification = None;
        }
    }

    fn after_resolution(&mut self, outcome: &RoundOutcome) {
        match (outcome.resolution, outcome.reward) {
            (Resolution::Selected(_), Some(reward)) => {
                log::info!(
                    "Round {} correct with {}s left: +{} points (streak {})",
                    outcome.round,
                    outcome.time_left,
                    reward.points,
                    self.totals.streak
                );
                self.effects.play(SoundEffect::Correct);
                self.notify(format!("Correct! +{} points", reward.points));
                self.reserve_reward(reward);
            }
            (Resolution::Timeout, _) => {
                log::info!("Round {} timed out", outcome.round);
                self.effects.play(SoundEffect::Timeout);
                self.notify("Time's up!".to_string());
            }
            _ => {
                log::info!("Round {} wrong answer", outcome.round);
                self.effects.play(SoundEffect::Incorrect);
                self.notify("Wrong! Try again".to_string());
            }
        }

        if let Some(delay) = outcome.advance_after {
            self.continuation = Some(self.scheduler.schedule(delay, TaskKind::NextRound));
        }
    }

    fn reserve_reward(&mut self, reward: Reward) {
        let Some(user) = self.user.clone() else {
            log::debug!("No signed-in user; reward {:?} not persisted", reward);
            return;
        };
        let ticket = RewardTicket(self.next_ticket);
        self.next_ticket += 1;
        self.outbox.push(RewardClaim { ticket, user, reward });
    }

    fn announce_reward(&mut self, reward: Reward) {
        self.effects.play(SoundEffect::RewardEarned);
        self.notify(format!("+{} points, +{} XP earned!", reward.points, reward.xp));
    }

    fn notify(&mut self, text: String) {
        if let Some(old) = self.notification.take() {
            self.scheduler.cancel(old.clear);
        }
        let clear = self
            .scheduler
            .schedule(self.pacing.notification(), TaskKind::ClearNotification);
        self.notification = Some(Notification { text, clear });
    }
}

/// Option as shown to the player (correctness hidden)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionView {
    pub origin: glam::Vec2,
    pub patterns: Vec<Pattern>,
}

impl From<&AnswerOption> for OptionView {
    fn from(option: &AnswerOption) -> Self {
        Self {
            origin: option.origin,
            patterns: option.patterns.clone(),
        }
    }
}

/// Everything a renderer needs to draw the current frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub difficulty: Difficulty,
    pub round_number: u32,
    pub board: Option<Board>,
    pub missing: Option<PieceRect>,
    pub options: Vec<OptionView>,
    pub time_left: u32,
    pub warning_active: bool,
    pub round_status: Option<RoundStatus>,
    pub selected_index: Option<usize>,
    /// Revealed once the round is resolved
    pub correct_index: Option<usize>,
    pub totals: SessionTotals,
    pub notification: Option<String>,
    pub pending_rewards: usize,
}
