//! Focus engine: clock, session, completion and progress wired together.
//!
//! The engine is single-threaded and has no internal timers. The caller
//! drives it with explicit timestamps:
//!
//! ```ignore
//! let mut engine = FocusEngine::new(user_state, config);
//! engine.start(&spec, Local::now());
//! loop {
//!     let now = Local::now();
//!     let mut events = engine.tick(now);
//!     events.extend(engine.poll(now));
//!     // dispatch events to notification / sound / history collaborators
//! }
//! ```
//!
//! A zero-crossing does not advance the session right away. It schedules a
//! continuation stamped with the session generation and due after the
//! settle delay; [`FocusEngine::poll`] runs due continuations and drops any
//! whose stamp no longer matches (the user paused, reset or restarted in
//! the meantime).

use crate::challenge::ensure_daily_challenge;
use crate::clock::Clock;
use crate::completion::{plan_transition, Phase, RunSummary, Transition};
use crate::events::{EngineEvent, SoundCue};
use crate::session::{Session, TickOutcome};
use crate::{progress, stats, Config, SessionRecord, TimerSpec, UserState};
use chrono::{DateTime, Duration, Local, NaiveDate};
use uuid::Uuid;

/// Deferred completion decision
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingAdvance {
    generation: u64,
    due_at: DateTime<Local>,
}

pub struct FocusEngine {
    session: Session,
    clock: Clock,
    pending: Vec<PendingAdvance>,
    user: UserState,
    config: Config,
}

impl FocusEngine {
    pub fn new(user: UserState, config: Config) -> Self {
        Self {
            session: Session::new(),
            clock: Clock::new(config.timer.suspend_gap_ms),
            pending: Vec::new(),
            user,
            config,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn user_state(&self) -> &UserState {
        &self.user
    }

    /// A completion decision is waiting for its settle delay
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Generate today's challenge if the stored one is stale
    pub fn refresh_daily_challenge(&mut self, today: NaiveDate) -> bool {
        ensure_daily_challenge(&mut self.user.progress, today)
    }

    // ── Controls ─────────────────────────────────────────────────────

    /// Begin a fresh run of `spec`
    ///
    /// A run that is still ticking is abandoned first: its ambient track is
    /// stopped and any queued continuation goes stale.
    pub fn start(&mut self, spec: &TimerSpec, now: DateTime<Local>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if self.session.is_running() {
            tracing::info!(
                "Abandoning running session '{}' at {}s",
                self.session.name(),
                self.session.time()
            );
            events.push(EngineEvent::Sound(SoundCue::StopAmbient));
        }
        self.clock.start(now);

        let outcome = self.session.start(spec);
        self.push_running_events(&mut events);
        self.handle_outcome(outcome, now, &mut events);
        events
    }

    pub fn pause(&mut self) -> Vec<EngineEvent> {
        self.clock.stop();
        if self.session.pause() {
            vec![EngineEvent::Sound(SoundCue::StopAmbient)]
        } else {
            Vec::new()
        }
    }

    pub fn resume(&mut self, now: DateTime<Local>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        let outcome = self.session.resume();
        if outcome == TickOutcome::Ignored {
            return events;
        }

        self.clock.start(now);
        self.push_running_events(&mut events);
        self.handle_outcome(outcome, now, &mut events);
        events
    }

    pub fn reset(&mut self) -> Vec<EngineEvent> {
        let was_running = self.session.is_running();
        self.clock.stop();
        self.session.reset();
        if was_running {
            vec![EngineEvent::Sound(SoundCue::StopAmbient)]
        } else {
            Vec::new()
        }
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.session.set_repeat(repeat);
    }

    /// Deliver one periodic tick
    ///
    /// Session time moves by the whole wall-clock seconds since the previous
    /// tick, whatever the tick cadence; the sub-second remainder carries over.
    pub fn tick(&mut self, now: DateTime<Local>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if !self.session.is_running() {
            return events;
        }

        let seconds = self.clock.advance(now);
        if seconds > 0 {
            let outcome = self.session.elapse(seconds);
            self.handle_outcome(outcome, now, &mut events);
        }
        events
    }

    /// The host is about to stop delivering ticks
    pub fn suspend(&mut self, now: DateTime<Local>) {
        if self.session.is_running() {
            self.clock.on_suspend(now);
        }
    }

    /// The host resumed; apply the time that passed while suspended
    pub fn wake(&mut self, now: DateTime<Local>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        let Some(elapsed) = self.clock.on_resume(now) else {
            return events;
        };

        tracing::info!("Correcting for {}s of suspension", elapsed);
        let outcome = self.session.elapse(elapsed);
        self.handle_outcome(outcome, now, &mut events);
        events
    }

    /// Run every continuation whose settle delay has passed
    pub fn poll(&mut self, now: DateTime<Local>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due_at <= now);
        self.pending = waiting;

        for pending in due {
            if pending.generation != self.session.generation()
                || !self.session.is_transitioning()
            {
                tracing::debug!(
                    "Dropping stale continuation (generation {} vs {})",
                    pending.generation,
                    self.session.generation()
                );
                continue;
            }
            self.advance(now, &mut events);
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn handle_outcome(
        &mut self,
        outcome: TickOutcome,
        now: DateTime<Local>,
        events: &mut Vec<EngineEvent>,
    ) {
        if outcome != TickOutcome::ZeroCrossing {
            return;
        }

        self.clock.stop();
        let delay = i64::try_from(self.config.timer.settle_delay_ms).unwrap_or(i64::MAX);
        self.pending.push(PendingAdvance {
            generation: self.session.generation(),
            due_at: now + Duration::milliseconds(delay),
        });

        events.push(EngineEvent::Sound(SoundCue::PlayCompletion(
            self.config.sound.completion.clone(),
        )));
        events.push(EngineEvent::Sound(SoundCue::StopAmbient));
    }

    fn advance(&mut self, now: DateTime<Local>, events: &mut Vec<EngineEvent>) {
        let transition = plan_transition(
            self.session.mode(),
            self.session.initial_duration(),
            self.session.repeat(),
        );

        match transition {
            Transition::Continue(phase) => {
                self.rearm(phase, now, events);
            }
            Transition::Finish { summary, rearm } => {
                // Session transition completes before progress reads the record
                let record = self.build_record(summary, now);
                if rearm.is_none() {
                    self.session.finish();
                }
                self.record_completion(&record, events);
                if let Some(phase) = rearm {
                    self.rearm(phase, now, events);
                }
            }
        }
    }

    fn rearm(&mut self, phase: Phase, now: DateTime<Local>, events: &mut Vec<EngineEvent>) {
        let outcome = self.session.continue_with(phase.mode, phase.time);
        events.push(EngineEvent::PhaseStarted {
            label: self.session.phase_label(),
            seconds: self.session.time(),
        });
        self.clock.start(now);
        self.push_running_events(events);
        // A zero-length phase crosses as soon as it is armed
        self.handle_outcome(outcome, now, events);
    }

    fn build_record(&self, summary: RunSummary, now: DateTime<Local>) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            kind: summary.kind,
            name: self.session.name().to_string(),
            total_seconds: summary.total_seconds,
            details: summary.details,
            completed_at: now,
        }
    }

    fn record_completion(&mut self, record: &SessionRecord, events: &mut Vec<EngineEvent>) {
        tracing::info!(
            "Recorded {} '{}' ({}s)",
            record.kind,
            record.name,
            record.total_seconds
        );
        events.push(EngineEvent::SessionCompleted(record.clone()));

        ensure_daily_challenge(&mut self.user.progress, record.completed_at.date_naive());
        let report = progress::apply_record(&mut self.user.progress, record, &self.config.challenge);
        stats::record_month(&mut self.user.monthly, record);
        events.extend(report.into_events());
    }

    fn push_running_events(&self, events: &mut Vec<EngineEvent>) {
        if !self.session.is_running() {
            return;
        }
        if let Some(ambient) = &self.config.sound.ambient {
            events.push(EngineEvent::Sound(SoundCue::StartAmbient(ambient.clone())));
        }
    }
}
