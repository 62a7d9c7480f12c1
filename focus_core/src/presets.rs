//! Saved timer presets.

use crate::{SavedTimer, TimerSpec, UserState};
use chrono::{DateTime, Local};
use uuid::Uuid;

impl UserState {
    /// Save `spec` under its name, replacing any preset with the same name
    pub fn save_timer(&mut self, spec: TimerSpec, now: DateTime<Local>) -> &SavedTimer {
        self.saved_timers.retain(|t| t.spec.name != spec.name);
        tracing::info!("Saved preset '{}'", spec.name);
        self.saved_timers.push(SavedTimer {
            id: Uuid::new_v4(),
            spec,
            created_at: now,
        });
        &self.saved_timers[self.saved_timers.len() - 1]
    }

    /// Returns true if a preset was removed
    pub fn remove_timer(&mut self, name: &str) -> bool {
        let before = self.saved_timers.len();
        self.saved_timers.retain(|t| t.spec.name != name);
        before != self.saved_timers.len()
    }

    pub fn find_timer(&self, name: &str) -> Option<&SavedTimer> {
        self.saved_timers
            .iter()
            .find(|t| t.spec.name.eq_ignore_ascii_case(name))
    }
}
