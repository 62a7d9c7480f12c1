#![forbid(unsafe_code)]

//! Core domain model and business logic for the focus timer.
//!
//! This crate provides:
//! - Domain types (timer configs, mode sub-states, session records)
//! - Session state machine and drift-correcting clock
//! - Completion engine with settle-delay continuations
//! - Streaks, achievements and the daily challenge
//! - Persistence (session log, CSV archive, user state)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod clock;
pub mod session;
pub mod completion;
pub mod achievements;
pub mod challenge;
pub mod events;
pub mod progress;
pub mod stats;
pub mod presets;
pub mod capsules;
pub mod session_log;
pub mod csv_rollup;
pub mod state;
pub mod history;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use clock::Clock;
pub use session::{RunState, Session, TickOutcome};
pub use completion::{format_duration, plan_transition, Transition};
pub use achievements::{find_achievement, Achievement};
pub use events::{EngineEvent, SoundCue};
pub use session_log::{SessionLog, SessionSink};
pub use history::load_recent_records;
pub use engine::FocusEngine;
