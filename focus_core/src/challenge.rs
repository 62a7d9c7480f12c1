//! Daily challenge generation and progress.

use crate::config::ChallengeConfig;
use crate::{ChallengeKind, DailyChallenge, ProgressState, SessionRecord};
use chrono::{Datelike, NaiveDate, Timelike};

/// Challenge templates cycled through by calendar day
const TEMPLATES: &[(ChallengeKind, u32)] = &[
    (ChallengeKind::Completions, 3),
    (ChallengeKind::Time, 60),
    (ChallengeKind::Morning, 1),
    (ChallengeKind::Pomodoro, 4),
    (ChallengeKind::Completions, 5),
    (ChallengeKind::Time, 90),
];

/// Challenge assigned to `date`
///
/// Selection is a pure function of the date, so regenerating on the same
/// day always yields the same challenge.
pub fn challenge_for(date: NaiveDate) -> DailyChallenge {
    let index = date.num_days_from_ce().rem_euclid(TEMPLATES.len() as i32) as usize;
    let (kind, target) = TEMPLATES[index];
    DailyChallenge {
        kind,
        target,
        progress: 0,
        date,
    }
}

/// Replace the stored challenge if it is not for `today`
///
/// Returns true when a new challenge was generated.
pub fn ensure_daily_challenge(state: &mut ProgressState, today: NaiveDate) -> bool {
    match &state.daily_challenge {
        Some(challenge) if challenge.date == today => false,
        _ => {
            let challenge = challenge_for(today);
            tracing::info!(
                "New daily challenge for {}: {:?} x{}",
                today,
                challenge.kind,
                challenge.target
            );
            state.daily_challenge = Some(challenge);
            true
        }
    }
}

/// Advance `challenge` for one finished run
///
/// Returns true only when this record moved progress across the target.
/// Records from another day leave the challenge untouched.
pub fn record_progress(
    challenge: &mut DailyChallenge,
    record: &SessionRecord,
    config: &ChallengeConfig,
) -> bool {
    if record.completed_at.date_naive() != challenge.date {
        tracing::debug!(
            "Record from {} does not count toward challenge for {}",
            record.completed_at.date_naive(),
            challenge.date
        );
        return false;
    }

    let was_complete = challenge.is_complete();

    match challenge.kind {
        ChallengeKind::Completions => {
            challenge.progress = challenge.progress.saturating_add(1);
        }
        ChallengeKind::Time => {
            let minutes = u32::try_from(record.total_seconds / 60).unwrap_or(u32::MAX);
            challenge.progress = challenge.progress.saturating_add(minutes);
        }
        ChallengeKind::Morning => {
            if record.completed_at.hour() < config.morning_cutoff_hour {
                challenge.progress = challenge.progress.max(challenge.target);
            }
        }
        ChallengeKind::Pomodoro => {
            let band = config.pomodoro_min_secs..=config.pomodoro_max_secs;
            if band.contains(&record.total_seconds) {
                challenge.progress = challenge.progress.saturating_add(1);
            }
        }
    }

    tracing::debug!(
        "Challenge progress {}/{}",
        challenge.progress,
        challenge.target
    );

    !was_complete && challenge.is_complete()
}

/// User-facing challenge text; the morning cutoff comes from `config`
pub fn describe(challenge: &DailyChallenge, config: &ChallengeConfig) -> String {
    match challenge.kind {
        ChallengeKind::Completions => format!("Complete {} sessions", challenge.target),
        ChallengeKind::Time => format!("Focus for {} minutes", challenge.target),
        ChallengeKind::Morning => format!(
            "Finish a session before {:02}:00",
            config.morning_cutoff_hour
        ),
        ChallengeKind::Pomodoro => format!("Complete {} pomodoros", challenge.target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordKind;
    use chrono::{Local, TimeZone};
    use uuid::Uuid;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
    }

    fn record_at(hour: u32, total_seconds: u64) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            kind: RecordKind::Timer,
            name: "Timer".into(),
            total_seconds,
            details: String::new(),
            completed_at: Local.with_ymd_and_hms(2024, 3, 12, hour, 30, 0).unwrap(),
        }
    }

    fn challenge(kind: ChallengeKind, target: u32) -> DailyChallenge {
        DailyChallenge {
            kind,
            target,
            progress: 0,
            date: day(),
        }
    }

    #[test]
    fn test_challenge_for_is_deterministic() {
        assert_eq!(challenge_for(day()), challenge_for(day()));
        let next = day().succ_opt().unwrap();
        assert_ne!(challenge_for(day()).kind, challenge_for(next).kind);
    }

    #[test]
    fn test_ensure_regenerates_only_for_new_day() {
        let mut state = ProgressState::default();
        assert!(ensure_daily_challenge(&mut state, day()));

        state.daily_challenge.as_mut().unwrap().progress = 2;
        assert!(!ensure_daily_challenge(&mut state, day()));
        assert_eq!(state.daily_challenge.as_ref().unwrap().progress, 2);

        assert!(ensure_daily_challenge(&mut state, day().succ_opt().unwrap()));
        assert_eq!(state.daily_challenge.as_ref().unwrap().progress, 0);
    }

    #[test]
    fn test_completion_signal_emitted_once() {
        let config = ChallengeConfig::default();
        let mut c = challenge(ChallengeKind::Completions, 2);

        assert!(!record_progress(&mut c, &record_at(12, 60), &config));
        assert!(record_progress(&mut c, &record_at(13, 60), &config));
        assert!(!record_progress(&mut c, &record_at(14, 60), &config));
        assert_eq!(c.progress, 3);
    }

    #[test]
    fn test_time_challenge_adds_whole_minutes() {
        let config = ChallengeConfig::default();
        let mut c = challenge(ChallengeKind::Time, 60);
        record_progress(&mut c, &record_at(12, 25 * 60 + 59), &config);
        assert_eq!(c.progress, 25);
    }

    #[test]
    fn test_morning_challenge_respects_cutoff() {
        let config = ChallengeConfig::default();
        let mut c = challenge(ChallengeKind::Morning, 1);
        assert!(!record_progress(&mut c, &record_at(10, 60), &config));
        assert_eq!(c.progress, 0);
        assert!(record_progress(&mut c, &record_at(9, 60), &config));
        assert_eq!(c.progress, 1);
    }

    #[test]
    fn test_pomodoro_band() {
        let config = ChallengeConfig::default();
        let mut c = challenge(ChallengeKind::Pomodoro, 4);
        record_progress(&mut c, &record_at(12, 25 * 60), &config);
        record_progress(&mut c, &record_at(12, 10 * 60), &config);
        record_progress(&mut c, &record_at(12, 50 * 60), &config);
        assert_eq!(c.progress, 1);
    }

    #[test]
    fn test_describe_uses_configured_cutoff() {
        let config = ChallengeConfig {
            morning_cutoff_hour: 8,
            ..ChallengeConfig::default()
        };
        let c = challenge(ChallengeKind::Morning, 1);
        assert_eq!(describe(&c, &config), "Finish a session before 08:00");
        assert_eq!(
            describe(&c, &ChallengeConfig::default()),
            "Finish a session before 10:00"
        );
    }

    #[test]
    fn test_other_day_records_ignored() {
        let config = ChallengeConfig::default();
        let mut c = challenge(ChallengeKind::Completions, 1);
        c.date = day().pred_opt().unwrap();
        assert!(!record_progress(&mut c, &record_at(12, 60), &config));
        assert_eq!(c.progress, 0);
    }
}
