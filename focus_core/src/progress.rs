//! Progress calculator: streaks, achievements and the daily challenge.
//!
//! [`apply_record`] consumes one finished [`SessionRecord`] and updates each
//! part of [`ProgressState`] exactly once:
//! 1. Streak continuity against the completion's calendar day
//! 2. Achievement rules, skipping anything already unlocked
//! 3. Daily challenge progress, signalling completion only on first crossing

use crate::achievements::{all_achievements, Achievement, RuleContext};
use crate::config::ChallengeConfig;
use crate::events::EngineEvent;
use crate::{challenge, DailyChallenge, ProgressState, SessionRecord, StreakState};
use chrono::{NaiveDate, Timelike};

/// What a single record changed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressReport {
    /// New streak length, when it grew
    pub streak_extended: Option<u32>,
    pub unlocked: Vec<&'static Achievement>,
    pub challenge_completed: Option<DailyChallenge>,
}

impl ProgressReport {
    pub fn into_events(self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if let Some(streak) = self.streak_extended {
            events.push(EngineEvent::StreakExtended(streak));
        }
        events.extend(
            self.unlocked
                .into_iter()
                .map(EngineEvent::AchievementUnlocked),
        );
        if let Some(challenge) = self.challenge_completed {
            events.push(EngineEvent::ChallengeCompleted(challenge));
        }
        events
    }
}

/// Update streak continuity for a completion on `today`
///
/// - Same day as the last completion: unchanged
/// - The day after: +1
/// - Anything else, including no previous completion: restart at 1
///
/// Returns the new streak when it grew.
pub fn update_streak(streak: &mut StreakState, today: NaiveDate) -> Option<u32> {
    let previous = streak.current_streak;

    match streak.last_completion_date {
        Some(last) if last == today => {}
        Some(last) if last.succ_opt() == Some(today) => {
            streak.current_streak = previous.saturating_add(1);
        }
        _ => streak.current_streak = 1,
    }
    streak.last_completion_date = Some(today);

    (streak.current_streak > previous).then_some(streak.current_streak)
}

/// Unlock every achievement whose rule holds and is not yet unlocked
pub fn evaluate_achievements(
    state: &mut ProgressState,
    ctx: &RuleContext,
) -> Vec<&'static Achievement> {
    let mut unlocked = Vec::new();
    for achievement in all_achievements() {
        if state.achievements.contains(achievement.id) {
            continue;
        }
        if achievement.rule.is_met(ctx) {
            state.achievements.insert(achievement.id.to_string());
            tracing::info!("Achievement unlocked: {}", achievement.name);
            unlocked.push(achievement);
        }
    }
    unlocked
}

/// Fold one finished run into the gamification state
///
/// The daily challenge is only advanced if one exists for the record's day;
/// generating it is the caller's job (see [`challenge::ensure_daily_challenge`]).
pub fn apply_record(
    state: &mut ProgressState,
    record: &SessionRecord,
    config: &ChallengeConfig,
) -> ProgressReport {
    let today = record.completed_at.date_naive();

    let streak_extended = update_streak(&mut state.streak, today);

    if state.today.date != Some(today) {
        state.today.date = Some(today);
        state.today.completions = 0;
    }
    state.today.completions = state.today.completions.saturating_add(1);

    let ctx = RuleContext {
        total_completions: state.total_completions,
        current_streak: state.streak.current_streak,
        completion_hour: record.completed_at.hour(),
        completions_today: state.today.completions,
    };
    let unlocked = evaluate_achievements(state, &ctx);
    state.total_completions = state.total_completions.saturating_add(1);

    let challenge_completed = match state.daily_challenge.as_mut() {
        Some(daily) => challenge::record_progress(daily, record, config).then(|| {
            tracing::info!(
                "Daily challenge complete: {}",
                challenge::describe(daily, config)
            );
            daily.clone()
        }),
        None => None,
    };

    tracing::debug!(
        "Applied record {}: streak {}, {} total, {} today",
        record.id,
        state.streak.current_streak,
        state.total_completions,
        state.today.completions
    );

    ProgressReport {
        streak_extended,
        unlocked,
        challenge_completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChallengeKind, RecordKind};
    use chrono::{DateTime, Local, TimeZone};
    use uuid::Uuid;

    fn at(day: u32, hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, day, hour, 15, 0).unwrap()
    }

    fn record(completed_at: DateTime<Local>, total_seconds: u64) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            kind: RecordKind::Timer,
            name: "Timer".into(),
            total_seconds,
            details: "test".into(),
            completed_at,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_streak_continues_from_yesterday() {
        let mut streak = StreakState {
            current_streak: 4,
            last_completion_date: Some(date(11)),
        };
        assert_eq!(update_streak(&mut streak, date(12)), Some(5));
        assert_eq!(streak.last_completion_date, Some(date(12)));

        // Second completion the same day leaves it unchanged
        assert_eq!(update_streak(&mut streak, date(12)), None);
        assert_eq!(streak.current_streak, 5);
    }

    #[test]
    fn test_streak_restarts_after_gap() {
        let mut streak = StreakState {
            current_streak: 9,
            last_completion_date: Some(date(5)),
        };
        assert_eq!(update_streak(&mut streak, date(12)), None);
        assert_eq!(streak.current_streak, 1);
    }

    #[test]
    fn test_streak_starts_from_nothing() {
        let mut streak = StreakState::default();
        assert_eq!(update_streak(&mut streak, date(12)), Some(1));
        assert_eq!(streak.current_streak, 1);
    }

    #[test]
    fn test_first_record_unlocks_first_session() {
        let mut state = ProgressState::default();
        let report = apply_record(&mut state, &record(at(12, 12), 1500), &ChallengeConfig::default());

        let ids: Vec<_> = report.unlocked.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["first_session"]);
        assert_eq!(report.streak_extended, Some(1));
        assert_eq!(state.total_completions, 1);
        assert!(state.achievements.contains("first_session"));
    }

    #[test]
    fn test_achievements_never_reemitted() {
        let mut state = ProgressState::default();
        let config = ChallengeConfig::default();

        apply_record(&mut state, &record(at(12, 23), 60), &config);
        assert!(state.achievements.contains("night_owl"));

        let report = apply_record(&mut state, &record(at(12, 23), 60), &config);
        assert!(report.unlocked.is_empty());
        assert_eq!(state.achievements.len(), 2);
    }

    #[test]
    fn test_multiple_unlocks_from_one_record() {
        let mut state = ProgressState {
            total_completions: 9,
            streak: StreakState {
                current_streak: 2,
                last_completion_date: Some(date(11)),
            },
            ..ProgressState::default()
        };
        state.achievements.insert("first_session".into());

        let report = apply_record(&mut state, &record(at(12, 6), 60), &ChallengeConfig::default());
        let ids: Vec<_> = report.unlocked.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["ten_sessions", "streak_3", "early_bird"]);
    }

    #[test]
    fn test_same_day_tally_resets_on_new_day() {
        let mut state = ProgressState::default();
        let config = ChallengeConfig::default();

        for _ in 0..4 {
            apply_record(&mut state, &record(at(11, 12), 60), &config);
        }
        assert_eq!(state.today.completions, 4);

        let report = apply_record(&mut state, &record(at(12, 12), 60), &config);
        assert_eq!(state.today.completions, 1);
        assert!(!report.unlocked.iter().any(|a| a.id == "productive_day"));
    }

    #[test]
    fn test_productive_day_unlocks_on_fifth() {
        let mut state = ProgressState::default();
        let config = ChallengeConfig::default();

        for _ in 0..4 {
            apply_record(&mut state, &record(at(12, 12), 60), &config);
        }
        let report = apply_record(&mut state, &record(at(12, 13), 60), &config);
        assert!(report.unlocked.iter().any(|a| a.id == "productive_day"));
    }

    #[test]
    fn test_challenge_completion_reported_once() {
        let mut state = ProgressState {
            daily_challenge: Some(DailyChallenge {
                kind: ChallengeKind::Completions,
                target: 2,
                progress: 0,
                date: date(12),
            }),
            ..ProgressState::default()
        };
        let config = ChallengeConfig::default();

        let first = apply_record(&mut state, &record(at(12, 12), 60), &config);
        assert!(first.challenge_completed.is_none());

        let second = apply_record(&mut state, &record(at(12, 13), 60), &config);
        assert!(second.challenge_completed.is_some());

        let third = apply_record(&mut state, &record(at(12, 14), 60), &config);
        assert!(third.challenge_completed.is_none());
        assert_eq!(state.daily_challenge.unwrap().progress, 3);
    }

    #[test]
    fn test_morning_challenge_completes_through_apply_record() {
        let mut state = ProgressState {
            daily_challenge: Some(DailyChallenge {
                kind: ChallengeKind::Morning,
                target: 1,
                progress: 0,
                date: date(12),
            }),
            ..ProgressState::default()
        };
        let config = ChallengeConfig {
            morning_cutoff_hour: 8,
            ..ChallengeConfig::default()
        };

        let late = apply_record(&mut state, &record(at(12, 9), 60), &config);
        assert!(late.challenge_completed.is_none());

        let early = apply_record(&mut state, &record(at(12, 7), 60), &config);
        let completed = early.challenge_completed.expect("challenge should complete");
        assert_eq!(completed.progress, 1);
        assert_eq!(state.daily_challenge.as_ref().map(|c| c.progress), Some(1));
    }

    #[test]
    fn test_report_into_events_order() {
        let mut state = ProgressState::default();
        let events = apply_record(&mut state, &record(at(12, 12), 60), &ChallengeConfig::default())
            .into_events();
        assert!(matches!(events[0], EngineEvent::StreakExtended(1)));
        assert!(matches!(events[1], EngineEvent::AchievementUnlocked(a) if a.id == "first_session"));
    }
}
