//! Time capsules: messages sealed now and revealed on a later date.

use crate::{TimeCapsule, UserState};
use chrono::{DateTime, Local};
use uuid::Uuid;

impl UserState {
    pub fn seal_capsule(
        &mut self,
        message: impl Into<String>,
        open_at: DateTime<Local>,
        now: DateTime<Local>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.capsules.push(TimeCapsule {
            id,
            message: message.into(),
            created_at: now,
            open_at,
            opened: false,
        });
        tracing::info!("Sealed capsule {} until {}", id, open_at);
        id
    }

    /// Mark every unopened capsule due at `now` as opened and return them
    pub fn open_due_capsules(&mut self, now: DateTime<Local>) -> Vec<TimeCapsule> {
        let mut due = Vec::new();
        for capsule in self.capsules.iter_mut() {
            if !capsule.opened && capsule.open_at <= now {
                capsule.opened = true;
                due.push(capsule.clone());
            }
        }
        due
    }
}
