//! Session state machine.
//!
//! A single [`Session`] is the active timing context. It owns the mode
//! sub-state and the remaining (or elapsed) time, consumes ticks, and
//! reports zero-crossings. What happens after a crossing is decided by
//! [`crate::completion`].
//!
//! ```text
//! Idle -> Running -> Transitioning -> (Running | Completed)
//!   ^        |             |
//!   +--------+-------------+  pause / reset
//! ```

use crate::{IntervalState, Mode, ModeState, SequenceState, TimerConfig, TimerSpec};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Not ticking; time may be nonzero if paused
    Idle,
    Running,
    /// Between a zero-crossing and the next configured state
    Transitioning,
    /// Run finished; a fresh `start` or `reset` leaves this state
    Completed,
}

/// Result of feeding time into a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session was not running; nothing changed
    Ignored,
    Advanced,
    /// Time reached zero and the session entered `Transitioning`
    ZeroCrossing,
}

#[derive(Clone, Debug)]
pub struct Session {
    name: String,
    mode: ModeState,
    time: u64,
    initial_duration: u64,
    state: RunState,
    repeat: bool,
    /// Bumped by every control and every applied transition
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            name: "Timer".into(),
            mode: ModeState::Countdown,
            time: 0,
            initial_duration: 0,
            state: RunState::Idle,
            repeat: false,
            generation: 0,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> &ModeState {
        &self.mode
    }

    /// Remaining seconds, or elapsed seconds for a stopwatch
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn initial_duration(&self) -> u64 {
        self.initial_duration
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn is_transitioning(&self) -> bool {
        self.state == RunState::Transitioning
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Mode sub-state can reach a zero-crossing without looping forever
    pub fn is_well_formed(&self) -> bool {
        match &self.mode {
            ModeState::Countdown => self.initial_duration > 0,
            ModeState::Stopwatch => true,
            ModeState::Interval(interval) => interval.is_valid(),
            ModeState::Sequence(sequence) => sequence.is_valid(),
        }
    }

    /// Short description of the active phase, e.g. `Rest (round 2/4)`
    pub fn phase_label(&self) -> String {
        match &self.mode {
            ModeState::Countdown | ModeState::Stopwatch => self.name.clone(),
            ModeState::Interval(interval) => format!(
                "{} (round {}/{})",
                if interval.is_work { "Work" } else { "Rest" },
                interval.current_round,
                interval.rounds
            ),
            ModeState::Sequence(sequence) => match sequence.current_step() {
                Some(step) => format!(
                    "{} (step {}/{})",
                    step.name,
                    sequence.current_step_index + 1,
                    sequence.steps().len()
                ),
                None => self.name.clone(),
            },
        }
    }

    // ── Controls ─────────────────────────────────────────────────────

    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    /// Initialize a fresh run from `spec` and start ticking
    ///
    /// Allowed from any state. A configuration that cannot run (zero
    /// duration, zero rounds, empty sequence) crosses zero immediately.
    pub fn start(&mut self, spec: &TimerSpec) -> TickOutcome {
        let (mode, initial) = match &spec.config {
            TimerConfig::Countdown { duration_secs } => (ModeState::Countdown, *duration_secs),
            TimerConfig::Stopwatch => (ModeState::Stopwatch, 0),
            TimerConfig::Interval {
                work_secs,
                rest_secs,
                rounds,
            } => (
                ModeState::Interval(IntervalState::new(*work_secs, *rest_secs, *rounds)),
                *work_secs,
            ),
            TimerConfig::Sequence { steps } => {
                let sequence = SequenceState::new(steps.clone());
                let first = sequence.current_step().map(|s| s.seconds()).unwrap_or(0);
                (ModeState::Sequence(sequence), first)
            }
        };

        self.name = spec.name.clone();
        self.mode = mode;
        self.initial_duration = initial;
        self.time = initial;
        self.state = RunState::Running;
        self.generation += 1;

        tracing::info!(
            "Started {} session '{}' at {}s",
            spec.config.mode(),
            self.name,
            self.time
        );

        if !self.is_well_formed() {
            tracing::warn!(
                "Session '{}' has an unusable {} configuration, completing immediately",
                self.name,
                self.mode.mode()
            );
            self.time = 0;
        }

        self.check_zero()
    }

    /// Running (or Transitioning) -> Idle, time preserved
    pub fn pause(&mut self) -> bool {
        match self.state {
            RunState::Running | RunState::Transitioning => {
                self.state = RunState::Idle;
                self.generation += 1;
                tracing::info!("Paused '{}' at {}s", self.name, self.time);
                true
            }
            _ => false,
        }
    }

    /// Idle -> Running without re-initializing the run
    pub fn resume(&mut self) -> TickOutcome {
        if self.state != RunState::Idle {
            return TickOutcome::Ignored;
        }
        self.state = RunState::Running;
        self.generation += 1;
        tracing::info!("Resumed '{}' at {}s", self.name, self.time);
        self.check_zero()
    }

    /// Any state -> Idle with the run rewound to its first phase
    pub fn reset(&mut self) {
        self.mode = match &self.mode {
            ModeState::Interval(interval) => ModeState::Interval(IntervalState::new(
                interval.work,
                interval.rest,
                interval.rounds,
            )),
            ModeState::Sequence(sequence) => ModeState::Sequence(sequence.at(0)),
            other => other.clone(),
        };
        self.time = if self.mode.mode() == Mode::Stopwatch {
            0
        } else {
            self.initial_duration
        };
        self.state = RunState::Idle;
        self.generation += 1;
        tracing::info!("Reset '{}' to {}s", self.name, self.time);
    }

    /// One wall-clock second
    pub fn tick(&mut self) -> TickOutcome {
        self.elapse(1)
    }

    /// Apply `seconds` in one step: added for a stopwatch, subtracted
    /// (floored at zero) otherwise
    pub fn elapse(&mut self, seconds: u64) -> TickOutcome {
        if self.state != RunState::Running {
            return TickOutcome::Ignored;
        }

        if self.mode.mode().counts_down() {
            self.time = self.time.saturating_sub(seconds);
            tracing::debug!("'{}' remaining {}s", self.name, self.time);
            self.check_zero()
        } else {
            self.time = self.time.saturating_add(seconds);
            tracing::debug!("'{}' elapsed {}s", self.name, self.time);
            TickOutcome::Advanced
        }
    }

    // ── Transition hooks used by the completion engine ───────────────

    /// Transitioning -> Running with the next phase, step or round armed
    ///
    /// A zero-length phase crosses zero immediately.
    pub fn continue_with(&mut self, mode: ModeState, time: u64) -> TickOutcome {
        self.mode = mode;
        self.time = time;
        self.state = RunState::Running;
        self.generation += 1;
        tracing::debug!("'{}' continuing with {}s", self.name, time);
        self.check_zero()
    }

    /// Transitioning -> Completed
    pub fn finish(&mut self) {
        self.state = RunState::Completed;
        self.generation += 1;
        tracing::info!("Session '{}' completed", self.name);
    }

    fn check_zero(&mut self) -> TickOutcome {
        if self.state == RunState::Running && self.time == 0 && self.mode.mode().counts_down() {
            self.state = RunState::Transitioning;
            tracing::debug!("'{}' crossed zero", self.name);
            TickOutcome::ZeroCrossing
        } else {
            TickOutcome::Advanced
        }
    }
}
