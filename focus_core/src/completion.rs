//! Completion decision table.
//!
//! When a session crosses zero the engine asks [`plan_transition`] what
//! comes next:
//! - **Countdown**: finish with `initial_duration`; repeat re-arms it
//! - **Interval**: work -> rest -> next round's work; the last rest
//!   finishes the run with `rounds * (work + rest)`
//! - **Sequence**: advance one step; the last step finishes the run with
//!   the sum of every step
//!
//! Unusable sub-state finishes immediately with zero totals and never
//! re-arms, so a bad configuration cannot loop.

use crate::{IntervalState, ModeState, RecordKind, SequenceState, Step};

/// Next phase, step or round to arm
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Phase {
    pub mode: ModeState,
    pub time: u64,
}

/// What a finished run contributes to its session record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub kind: RecordKind,
    pub total_seconds: u64,
    pub details: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Stay running with the next phase; no record yet
    Continue(Phase),
    /// The full run ended; `rearm` is set when repeat restarts it
    Finish {
        summary: RunSummary,
        rearm: Option<Phase>,
    },
}

/// Decide what follows a zero-crossing
pub fn plan_transition(mode: &ModeState, initial_duration: u64, repeat: bool) -> Transition {
    match mode {
        ModeState::Countdown if initial_duration > 0 => Transition::Finish {
            summary: RunSummary {
                kind: RecordKind::Timer,
                total_seconds: initial_duration,
                details: format!("{} countdown", format_duration(initial_duration)),
            },
            rearm: repeat.then(|| Phase {
                mode: ModeState::Countdown,
                time: initial_duration,
            }),
        },
        ModeState::Interval(interval) if interval.is_valid() => plan_interval(interval, repeat),
        ModeState::Sequence(sequence) if sequence.is_valid() => plan_sequence(sequence, repeat),
        other => {
            tracing::warn!(
                "Zero-crossing with unusable {} state, finishing with zero totals",
                other.mode()
            );
            Transition::Finish {
                summary: RunSummary {
                    kind: record_kind(other),
                    total_seconds: 0,
                    details: "invalid configuration".into(),
                },
                rearm: None,
            }
        }
    }
}

fn plan_interval(interval: &IntervalState, repeat: bool) -> Transition {
    if interval.is_work {
        return Transition::Continue(Phase {
            mode: ModeState::Interval(IntervalState {
                is_work: false,
                ..interval.clone()
            }),
            time: interval.rest,
        });
    }

    if interval.current_round < interval.rounds {
        return Transition::Continue(Phase {
            mode: ModeState::Interval(IntervalState {
                current_round: interval.current_round + 1,
                is_work: true,
                ..interval.clone()
            }),
            time: interval.work,
        });
    }

    // Every configured round is accounted in full, final rest included
    let summary = RunSummary {
        kind: RecordKind::Interval,
        total_seconds: interval.total_seconds(),
        details: format!(
            "{} x {} work / {} rest",
            interval.rounds,
            format_duration(interval.work),
            format_duration(interval.rest)
        ),
    };
    let rearm = repeat.then(|| Phase {
        mode: ModeState::Interval(IntervalState::new(
            interval.work,
            interval.rest,
            interval.rounds,
        )),
        time: interval.work,
    });
    Transition::Finish { summary, rearm }
}

fn plan_sequence(sequence: &SequenceState, repeat: bool) -> Transition {
    let next = sequence.current_step_index + 1;
    if let Some(step) = sequence.steps().get(next) {
        return Transition::Continue(Phase {
            mode: ModeState::Sequence(sequence.at(next)),
            time: step.seconds(),
        });
    }

    let summary = RunSummary {
        kind: RecordKind::Sequence,
        total_seconds: sequence.total_seconds(),
        details: sequence
            .steps()
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(" → "),
    };
    let rearm = repeat.then(|| Phase {
        mode: ModeState::Sequence(sequence.at(0)),
        time: sequence.steps().first().map(Step::seconds).unwrap_or(0),
    });
    Transition::Finish { summary, rearm }
}

fn record_kind(mode: &ModeState) -> RecordKind {
    match mode {
        ModeState::Interval(_) => RecordKind::Interval,
        ModeState::Sequence(_) => RecordKind::Sequence,
        ModeState::Countdown | ModeState::Stopwatch => RecordKind::Timer,
    }
}

/// Human-readable duration, e.g. `25m`, `1h 05m`, `1m 30s`
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    match (hours, minutes, secs) {
        (0, 0, s) => format!("{}s", s),
        (0, m, 0) => format!("{}m", m),
        (0, m, s) => format!("{}m {}s", m, s),
        (h, 0, 0) => format!("{}h", h),
        (h, m, _) => format!("{}h {:02}m", h, m),
    }
}
