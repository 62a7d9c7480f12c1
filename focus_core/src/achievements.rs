//! Built-in achievement table.
//!
//! Each achievement is unlocked by exactly one [`Rule`]. Evaluation and the
//! unlocked set live in [`crate::progress`].

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Condition under which an achievement unlocks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    /// Lifetime finished runs, counting the one being recorded
    TotalCompletions(u32),
    /// Current consecutive-day streak
    Streak(u32),
    /// Local hour of completion in `[start, end)`, wrapping past midnight
    /// when `start > end`
    HourWindow { start: u32, end: u32 },
    /// Finished runs on the completion's calendar day
    SameDayCompletions(u32),
}

/// Facts about a single completion that rules are evaluated against
#[derive(Clone, Copy, Debug)]
pub struct RuleContext {
    /// Lifetime completions before this one
    pub total_completions: u32,
    pub current_streak: u32,
    pub completion_hour: u32,
    /// Including this one
    pub completions_today: u32,
}

impl Rule {
    pub fn is_met(&self, ctx: &RuleContext) -> bool {
        match *self {
            Rule::TotalCompletions(requirement) => {
                ctx.total_completions.saturating_add(1) >= requirement
            }
            Rule::Streak(requirement) => ctx.current_streak >= requirement,
            Rule::HourWindow { start, end } => {
                let hour = ctx.completion_hour;
                if start <= end {
                    (start..end).contains(&hour)
                } else {
                    hour >= start || hour < end
                }
            }
            Rule::SameDayCompletions(requirement) => ctx.completions_today >= requirement,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub rule: Rule,
}

const ACHIEVEMENTS: &[Achievement] = &[
    // Cumulative
    Achievement {
        id: "first_session",
        name: "First Focus",
        description: "Complete your first session",
        rule: Rule::TotalCompletions(1),
    },
    Achievement {
        id: "ten_sessions",
        name: "Getting Serious",
        description: "Complete 10 sessions",
        rule: Rule::TotalCompletions(10),
    },
    Achievement {
        id: "fifty_sessions",
        name: "Half Century",
        description: "Complete 50 sessions",
        rule: Rule::TotalCompletions(50),
    },
    Achievement {
        id: "hundred_sessions",
        name: "Centurion",
        description: "Complete 100 sessions",
        rule: Rule::TotalCompletions(100),
    },
    // Streaks
    Achievement {
        id: "streak_3",
        name: "On a Roll",
        description: "Keep a 3-day streak",
        rule: Rule::Streak(3),
    },
    Achievement {
        id: "streak_7",
        name: "Week Warrior",
        description: "Keep a 7-day streak",
        rule: Rule::Streak(7),
    },
    Achievement {
        id: "streak_30",
        name: "Unstoppable",
        description: "Keep a 30-day streak",
        rule: Rule::Streak(30),
    },
    // Time of day
    Achievement {
        id: "early_bird",
        name: "Early Bird",
        description: "Finish a session between 5am and 8am",
        rule: Rule::HourWindow { start: 5, end: 8 },
    },
    Achievement {
        id: "night_owl",
        name: "Night Owl",
        description: "Finish a session between 10pm and 4am",
        rule: Rule::HourWindow { start: 22, end: 4 },
    },
    // Same day
    Achievement {
        id: "productive_day",
        name: "Productive Day",
        description: "Complete 5 sessions in one day",
        rule: Rule::SameDayCompletions(5),
    },
    Achievement {
        id: "marathon_day",
        name: "Marathon",
        description: "Complete 10 sessions in one day",
        rule: Rule::SameDayCompletions(10),
    },
];

/// Lookup by id, built once
static BY_ID: Lazy<HashMap<&'static str, &'static Achievement>> =
    Lazy::new(|| ACHIEVEMENTS.iter().map(|a| (a.id, a)).collect());

/// Every achievement, in evaluation order
pub fn all_achievements() -> &'static [Achievement] {
    ACHIEVEMENTS
}

pub fn find_achievement(id: &str) -> Option<&'static Achievement> {
    BY_ID.get(id).copied()
}
