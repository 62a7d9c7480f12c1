//! Core domain types for the focus timer.
//!
//! This module defines the fundamental types used throughout the system:
//! - Timer specifications (countdown, stopwatch, interval, sequence)
//! - Mode sub-state carried by an active session
//! - Session records emitted when a run finishes
//! - Persistent gamification and library state

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Timer Specification
// ============================================================================

/// Active timer discipline
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Countdown,
    Stopwatch,
    Interval,
    Sequence,
}

impl Mode {
    /// Countdown-style modes count down toward a zero-crossing.
    pub fn counts_down(self) -> bool {
        !matches!(self, Mode::Stopwatch)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Countdown => "countdown",
            Mode::Stopwatch => "stopwatch",
            Mode::Interval => "interval",
            Mode::Sequence => "sequence",
        };
        f.pad(s)
    }
}

/// Unit a sequence step duration is expressed in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepUnit {
    #[default]
    Sec,
    Min,
}

impl StepUnit {
    pub fn to_seconds(self, duration: u64) -> u64 {
        match self {
            StepUnit::Sec => duration,
            StepUnit::Min => duration.saturating_mul(60),
        }
    }
}

/// One ordered unit of a sequence
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    pub duration: u64,
    #[serde(default)]
    pub unit: StepUnit,
}

impl Step {
    pub fn new(name: impl Into<String>, duration: u64, unit: StepUnit) -> Self {
        Self {
            name: name.into(),
            color: None,
            duration,
            unit,
        }
    }

    /// Step duration converted to seconds
    pub fn seconds(&self) -> u64 {
        self.unit.to_seconds(self.duration)
    }
}

/// Mode-specific configuration supplied when a session starts
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimerConfig {
    Countdown {
        duration_secs: u64,
    },
    Stopwatch,
    Interval {
        work_secs: u64,
        rest_secs: u64,
        rounds: u32,
    },
    Sequence {
        steps: Vec<Step>,
    },
}

impl TimerConfig {
    pub fn mode(&self) -> Mode {
        match self {
            TimerConfig::Countdown { .. } => Mode::Countdown,
            TimerConfig::Stopwatch => Mode::Stopwatch,
            TimerConfig::Interval { .. } => Mode::Interval,
            TimerConfig::Sequence { .. } => Mode::Sequence,
        }
    }
}

/// A named timer ready to be started
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerSpec {
    pub name: String,
    pub config: TimerConfig,
}

impl TimerSpec {
    /// Create a spec named after its mode
    pub fn new(config: TimerConfig) -> Self {
        let name = match config.mode() {
            Mode::Countdown => "Timer",
            Mode::Stopwatch => "Stopwatch",
            Mode::Interval => "Interval",
            Mode::Sequence => "Sequence",
        };
        Self {
            name: name.into(),
            config,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

// ============================================================================
// Mode Sub-state
// ============================================================================

/// Interval phase bookkeeping
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntervalState {
    pub work: u64,
    pub rest: u64,
    pub rounds: u32,
    /// 1-indexed
    pub current_round: u32,
    pub is_work: bool,
}

impl IntervalState {
    pub fn new(work: u64, rest: u64, rounds: u32) -> Self {
        Self {
            work,
            rest,
            rounds,
            current_round: 1,
            is_work: true,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.rounds >= 1
            && self.work.saturating_add(self.rest) > 0
            && (1..=self.rounds).contains(&self.current_round)
    }

    /// Accounted length of a full run: every round's work and rest
    pub fn total_seconds(&self) -> u64 {
        u64::from(self.rounds).saturating_mul(self.work.saturating_add(self.rest))
    }
}

/// Sequence step bookkeeping. Steps are shared and never mutated once a run starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceState {
    steps: Arc<[Step]>,
    pub current_step_index: usize,
}

impl SequenceState {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            current_step_index: 0,
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.steps.get(self.current_step_index)
    }

    /// Same steps positioned at `index`
    pub fn at(&self, index: usize) -> Self {
        Self {
            steps: Arc::clone(&self.steps),
            current_step_index: index,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.current_step_index < self.steps.len() && self.total_seconds() > 0
    }

    pub fn total_seconds(&self) -> u64 {
        self.steps
            .iter()
            .fold(0u64, |acc, step| acc.saturating_add(step.seconds()))
    }
}

/// Mode together with only the fields that mode needs
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModeState {
    Countdown,
    Stopwatch,
    Interval(IntervalState),
    Sequence(SequenceState),
}

impl ModeState {
    pub fn mode(&self) -> Mode {
        match self {
            ModeState::Countdown => Mode::Countdown,
            ModeState::Stopwatch => Mode::Stopwatch,
            ModeState::Interval(_) => Mode::Interval,
            ModeState::Sequence(_) => Mode::Sequence,
        }
    }
}

// ============================================================================
// Session Records
// ============================================================================

/// Kind of run a record summarizes
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Timer,
    Interval,
    Sequence,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordKind::Timer => "timer",
            RecordKind::Interval => "interval",
            RecordKind::Sequence => "sequence",
        };
        f.pad(s)
    }
}

/// Immutable summary of a finished run
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub name: String,
    pub total_seconds: u64,
    pub details: String,
    pub completed_at: DateTime<Local>,
}

// ============================================================================
// Gamification State
// ============================================================================

/// Consecutive-day completion streak
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StreakState {
    pub current_streak: u32,
    pub last_completion_date: Option<NaiveDate>,
}

/// Completions counted for a single calendar day
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DayTally {
    pub date: Option<NaiveDate>,
    pub completions: u32,
}

/// Daily challenge flavour
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    /// Complete N sessions
    Completions,
    /// Focus for N minutes
    Time,
    /// Finish a session before the morning cutoff
    Morning,
    /// Complete N pomodoro-length sessions
    Pomodoro,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyChallenge {
    pub kind: ChallengeKind,
    pub target: u32,
    pub progress: u32,
    pub date: NaiveDate,
}

impl DailyChallenge {
    pub fn is_complete(&self) -> bool {
        self.progress >= self.target
    }
}

/// Streak, achievements and challenge state mutated by the progress calculator
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct ProgressState {
    #[serde(default)]
    pub streak: StreakState,
    #[serde(default)]
    pub achievements: BTreeSet<String>,
    #[serde(default)]
    pub total_completions: u32,
    #[serde(default)]
    pub today: DayTally,
    #[serde(default)]
    pub daily_challenge: Option<DailyChallenge>,
}

// ============================================================================
// Library State
// ============================================================================

/// A timer preset saved by the user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedTimer {
    pub id: Uuid,
    pub spec: TimerSpec,
    pub created_at: DateTime<Local>,
}

/// Aggregate of finished runs for one calendar month
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct MonthlyTotals {
    pub sessions: u32,
    pub total_seconds: u64,
}

/// A message sealed now and opened at a later date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeCapsule {
    pub id: Uuid,
    pub message: String,
    pub created_at: DateTime<Local>,
    pub open_at: DateTime<Local>,
    #[serde(default)]
    pub opened: bool,
}

/// Everything persisted between process runs, loaded once at startup
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct UserState {
    #[serde(default)]
    pub progress: ProgressState,
    #[serde(default)]
    pub saved_timers: Vec<SavedTimer>,
    /// Keyed by `YYYY-MM`
    #[serde(default)]
    pub monthly: BTreeMap<String, MonthlyTotals>,
    #[serde(default)]
    pub capsules: Vec<TimeCapsule>,
}
