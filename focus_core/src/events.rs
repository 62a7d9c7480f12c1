//! Events emitted by the engine for notification and sound collaborators.
//!
//! The engine never calls UI, toast or audio code itself; every operation
//! returns the events it produced and the caller dispatches them.

use crate::achievements::Achievement;
use crate::{DailyChallenge, SessionRecord};

/// Fire-and-forget signal for the sound collaborator
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SoundCue {
    /// Named completion sound, played on entering a transition
    PlayCompletion(String),
    StopAmbient,
    /// Named ambient track, started whenever a session starts running
    StartAmbient(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// A new phase, step or round became active
    PhaseStarted { label: String, seconds: u64 },
    SessionCompleted(SessionRecord),
    AchievementUnlocked(&'static Achievement),
    StreakExtended(u32),
    ChallengeCompleted(DailyChallenge),
    Sound(SoundCue),
}
