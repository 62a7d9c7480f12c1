use chrono::{Duration, Local};
use clap::{Parser, Subcommand};
use focus_core::challenge::{challenge_for, describe};
use focus_core::config::ChallengeConfig;
use focus_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "focus")]
#[command(about = "Focus timer with streaks, achievements and daily challenges", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a timer until it completes
    Run {
        #[command(subcommand)]
        timer: TimerCommand,

        /// Display name for the run
        #[arg(long, global = true)]
        name: Option<String>,

        /// Repeat until this many runs have been recorded
        #[arg(long, global = true, default_value_t = 1)]
        runs: u32,

        /// Advance a simulated clock instead of sleeping (for testing)
        #[arg(long, global = true)]
        simulate: bool,

        /// Stop after this many ticks
        #[arg(long, global = true)]
        max_ticks: Option<u64>,
    },

    /// Show streak, challenge and monthly totals
    Status,

    /// Show the most recent finished runs
    History {
        /// Number of records to show (defaults to history.recent_limit)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Roll up the session log to CSV
    Rollup {
        /// Clean up processed logs after rollup
        #[arg(long)]
        cleanup: bool,
    },

    /// Manage saved timer presets
    Preset {
        #[command(subcommand)]
        action: PresetCommand,
    },

    /// Seal and open time capsules
    Capsule {
        #[command(subcommand)]
        action: CapsuleCommand,
    },
}

#[derive(Subcommand, Clone)]
enum TimerCommand {
    /// Count down from a fixed duration
    Countdown {
        /// Duration such as 25m, 90s or 1h
        #[arg(long)]
        duration: String,
    },
    /// Count up without completing
    Stopwatch,
    /// Alternate work and rest for a number of rounds
    Interval {
        #[arg(long)]
        work: String,
        #[arg(long)]
        rest: String,
        #[arg(long, default_value_t = 1)]
        rounds: u32,
    },
    /// Run named steps in order
    Sequence {
        /// Step as NAME:DURATION, e.g. "Plan:5m"; repeat for each step
        #[arg(long = "step", required = true)]
        steps: Vec<String>,
    },
    /// Run a saved preset
    Preset {
        /// Preset name (case-insensitive)
        preset: String,
    },
}

#[derive(Subcommand)]
enum PresetCommand {
    /// Save a timer under a name, replacing any preset with that name
    Add {
        name: String,
        #[command(subcommand)]
        timer: TimerCommand,
    },
    /// List saved presets
    List,
    /// Remove a preset by name
    Remove { name: String },
}

#[derive(Subcommand)]
enum CapsuleCommand {
    /// Seal a message to be opened later
    Seal {
        message: String,
        /// Days until the capsule can be opened
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
    /// Open every capsule that is due
    Open,
}

/// Files under the data directory
struct DataPaths {
    log_dir: PathBuf,
    log: PathBuf,
    csv: PathBuf,
    state: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        let log_dir = data_dir.join("log");
        Self {
            log: log_dir.join("sessions.jsonl"),
            log_dir,
            csv: data_dir.join("sessions.csv"),
            state: data_dir.join("state.json"),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    focus_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = DataPaths::new(&data_dir);

    match cli.command {
        Commands::Run {
            timer,
            name,
            runs,
            simulate,
            max_ticks,
        } => {
            let options = RunOptions {
                runs,
                simulate,
                max_ticks,
            };
            cmd_run(&paths, config, timer, name, options)
        }
        Commands::Status => cmd_status(&paths, &config.challenge),
        Commands::History { limit } => {
            cmd_history(&paths, limit.unwrap_or(config.history.recent_limit))
        }
        Commands::Rollup { cleanup } => cmd_rollup(&paths, cleanup),
        Commands::Preset { action } => cmd_preset(&paths, action),
        Commands::Capsule { action } => cmd_capsule(&paths, action),
    }
}

struct RunOptions {
    runs: u32,
    simulate: bool,
    max_ticks: Option<u64>,
}

fn cmd_run(
    paths: &DataPaths,
    config: Config,
    timer: TimerCommand,
    name: Option<String>,
    options: RunOptions,
) -> Result<()> {
    if options.runs == 0 {
        return Err(Error::InvalidTimer("--runs must be at least 1".into()));
    }

    let user_state = UserState::load(&paths.state)?;
    let mut spec = resolve_timer(&timer, &user_state)?;
    if let Some(name) = name {
        spec = spec.with_name(name);
    }

    if options.simulate && spec.config.mode() == Mode::Stopwatch && options.max_ticks.is_none() {
        return Err(Error::InvalidTimer(
            "a simulated stopwatch needs --max-ticks".into(),
        ));
    }

    let tick_interval = std::time::Duration::from_millis(config.timer.tick_interval_ms);
    let mut sink = SessionLog::new(&paths.log, config.history.recent_limit);
    let challenge_config = config.challenge.clone();
    let mut engine = FocusEngine::new(user_state, config);

    let mut now = Local::now();
    if engine.refresh_daily_challenge(now.date_naive()) {
        if let Some(challenge) = &engine.user_state().progress.daily_challenge {
            println!("New daily challenge: {}", describe(challenge, &challenge_config));
        }
    }

    engine.set_repeat(options.runs > 1);
    let mut events = engine.start(&spec, now);
    println!(
        "▶ {} ({})",
        engine.session().phase_label(),
        format_duration(engine.session().time())
    );

    let mut recorded = 0u32;
    let mut ticks = 0u64;
    loop {
        let mut state_dirty = false;
        for event in events.drain(..) {
            if let EngineEvent::SessionCompleted(record) = &event {
                sink.append(record)?;
                recorded += 1;
                state_dirty = true;
                if recorded + 1 >= options.runs {
                    engine.set_repeat(false);
                }
            }
            report(&event, &challenge_config);
        }
        if state_dirty {
            engine.user_state().save(&paths.state)?;
        }

        if engine.session().state() == RunState::Completed && !engine.has_pending() {
            break;
        }
        if options.max_ticks.is_some_and(|max| ticks >= max) {
            if !options.simulate {
                println!();
            }
            println!(
                "Stopped after {} ticks at {}",
                ticks,
                format_duration(engine.session().time())
            );
            break;
        }

        if options.simulate {
            now += Duration::seconds(1);
        } else {
            std::thread::sleep(tick_interval);
            now = Local::now();
        }
        ticks += 1;

        events = engine.tick(now);
        events.extend(engine.poll(now));

        if !options.simulate && engine.session().is_running() {
            print!("\r  {}   ", format_clock(engine.session().time()));
            io::stdout().flush()?;
        }
    }

    engine.user_state().save(&paths.state)?;
    Ok(())
}

/// Print one engine event for the user
fn report(event: &EngineEvent, challenge_config: &ChallengeConfig) {
    match event {
        EngineEvent::PhaseStarted { label, seconds } => {
            println!("\n▶ {} ({})", label, format_duration(*seconds));
        }
        EngineEvent::SessionCompleted(record) => {
            println!(
                "\n✓ Completed {}: {} ({})",
                record.name,
                record.details,
                format_duration(record.total_seconds)
            );
        }
        EngineEvent::AchievementUnlocked(achievement) => {
            println!(
                "🏆 Achievement unlocked: {} - {}",
                achievement.name, achievement.description
            );
        }
        EngineEvent::StreakExtended(days) => {
            println!("🔥 Streak: {} day{}", days, if *days == 1 { "" } else { "s" });
        }
        EngineEvent::ChallengeCompleted(challenge) => {
            println!("★ Daily challenge complete: {}", describe(challenge, challenge_config));
        }
        // No audio backend in the terminal
        EngineEvent::Sound(cue) => tracing::debug!("Sound cue: {:?}", cue),
    }
}

fn cmd_status(paths: &DataPaths, challenge_config: &ChallengeConfig) -> Result<()> {
    let state = UserState::load(&paths.state)?;
    let progress = &state.progress;
    let today = Local::now().date_naive();

    println!("Streak:      {} day(s)", progress.streak.current_streak);
    println!("Completions: {}", progress.total_completions);

    let challenge = match &progress.daily_challenge {
        Some(c) if c.date == today => c.clone(),
        _ => challenge_for(today),
    };
    println!(
        "Challenge:   {} ({}/{}){}",
        describe(&challenge, challenge_config),
        challenge.progress.min(challenge.target),
        challenge.target,
        if challenge.is_complete() { " ✓" } else { "" }
    );

    let month = focus_core::stats::month_key(today);
    let totals = state.monthly.get(&month).cloned().unwrap_or_default();
    println!(
        "This month:  {} sessions, {}",
        totals.sessions,
        format_duration(totals.total_seconds)
    );

    println!(
        "Achievements: {}/{}",
        progress.achievements.len(),
        focus_core::achievements::all_achievements().len()
    );
    for id in &progress.achievements {
        match find_achievement(id) {
            Some(a) => println!("  🏆 {} - {}", a.name, a.description),
            None => tracing::warn!("Unknown achievement id in state: {}", id),
        }
    }

    let due = state
        .capsules
        .iter()
        .filter(|c| !c.opened && c.open_at <= Local::now())
        .count();
    if due > 0 {
        println!("{} time capsule(s) ready - run `focus capsule open`", due);
    }

    Ok(())
}

fn cmd_history(paths: &DataPaths, limit: usize) -> Result<()> {
    let records = load_recent_records(&paths.log, &paths.csv, limit)?;
    if records.is_empty() {
        println!("No sessions recorded yet.");
        return Ok(());
    }

    for record in records {
        println!(
            "{}  {:<8}  {:<16}  {:>8}  {}",
            record.completed_at.format("%Y-%m-%d %H:%M"),
            record.kind,
            record.name,
            format_duration(record.total_seconds),
            record.details
        );
    }
    Ok(())
}

fn cmd_rollup(paths: &DataPaths, cleanup: bool) -> Result<()> {
    if !paths.log.exists() {
        println!("No session log found - nothing to roll up.");
        return Ok(());
    }

    let count = focus_core::csv_rollup::log_to_csv_and_archive(&paths.log, &paths.csv)?;

    println!("✓ Rolled up {} sessions to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = focus_core::csv_rollup::cleanup_processed_logs(&paths.log_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed logs", cleaned);
        }
    }

    Ok(())
}

fn cmd_preset(paths: &DataPaths, action: PresetCommand) -> Result<()> {
    match action {
        PresetCommand::Add { name, timer } => {
            if matches!(timer, TimerCommand::Preset { .. }) {
                return Err(Error::InvalidTimer(
                    "a preset cannot refer to another preset".into(),
                ));
            }
            let spec = build_spec(&timer)?.with_name(name);
            UserState::update(&paths.state, |state| {
                let saved = state.save_timer(spec, Local::now());
                println!("✓ Saved preset '{}'", saved.spec.name);
                Ok(())
            })?;
        }
        PresetCommand::List => {
            let state = UserState::load(&paths.state)?;
            if state.saved_timers.is_empty() {
                println!("No saved presets.");
            }
            for saved in &state.saved_timers {
                println!("{:<16}  {}", saved.spec.name, summarize(&saved.spec.config));
            }
        }
        PresetCommand::Remove { name } => {
            let mut removed = false;
            UserState::update(&paths.state, |state| {
                removed = state.remove_timer(&name);
                Ok(())
            })?;
            if removed {
                println!("✓ Removed preset '{}'", name);
            } else {
                eprintln!("No preset named '{}'", name);
            }
        }
    }
    Ok(())
}

fn cmd_capsule(paths: &DataPaths, action: CapsuleCommand) -> Result<()> {
    match action {
        CapsuleCommand::Seal { message, days } => {
            if days < 0 {
                return Err(Error::Other("--days cannot be negative".into()));
            }
            let now = Local::now();
            let open_at = now + Duration::days(days);
            UserState::update(&paths.state, |state| {
                state.seal_capsule(message, open_at, now);
                Ok(())
            })?;
            println!("✓ Capsule sealed until {}", open_at.format("%Y-%m-%d"));
        }
        CapsuleCommand::Open => {
            let mut opened = Vec::new();
            UserState::update(&paths.state, |state| {
                opened = state.open_due_capsules(Local::now());
                Ok(())
            })?;
            if opened.is_empty() {
                println!("No capsules ready to open.");
            }
            for capsule in opened {
                println!(
                    "✉ Sealed {}: {}",
                    capsule.created_at.format("%Y-%m-%d"),
                    capsule.message
                );
            }
        }
    }
    Ok(())
}

fn resolve_timer(timer: &TimerCommand, state: &UserState) -> Result<TimerSpec> {
    match timer {
        TimerCommand::Preset { preset } => state
            .find_timer(preset)
            .map(|saved| saved.spec.clone())
            .ok_or_else(|| Error::InvalidTimer(format!("no preset named '{}'", preset))),
        other => build_spec(other),
    }
}

fn build_spec(timer: &TimerCommand) -> Result<TimerSpec> {
    let config = match timer {
        TimerCommand::Countdown { duration } => TimerConfig::Countdown {
            duration_secs: parse_seconds(duration)?,
        },
        TimerCommand::Stopwatch => TimerConfig::Stopwatch,
        TimerCommand::Interval { work, rest, rounds } => TimerConfig::Interval {
            work_secs: parse_seconds(work)?,
            rest_secs: parse_seconds(rest)?,
            rounds: *rounds,
        },
        TimerCommand::Sequence { steps } => TimerConfig::Sequence {
            steps: steps
                .iter()
                .map(|s| parse_step(s))
                .collect::<Result<Vec<_>>>()?,
        },
        TimerCommand::Preset { preset } => {
            return Err(Error::InvalidTimer(format!(
                "preset '{}' must be resolved against saved state",
                preset
            )))
        }
    };
    Ok(TimerSpec::new(config))
}

/// Split `25m` into its number and unit suffix
fn split_unit(input: &str) -> Result<(u64, &str)> {
    let input = input.trim();
    let digits_end = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, unit) = input.split_at(digits_end);
    let value = digits
        .parse::<u64>()
        .map_err(|_| Error::InvalidTimer(format!("invalid duration '{}'", input)))?;
    Ok((value, unit))
}

/// Parse `90`, `90s`, `25m` or `1h` into seconds
fn parse_seconds(input: &str) -> Result<u64> {
    let (value, unit) = split_unit(input)?;
    match unit {
        "" | "s" => Ok(value),
        "m" => Ok(StepUnit::Min.to_seconds(value)),
        "h" => Ok(value.saturating_mul(3600)),
        _ => Err(Error::InvalidTimer(format!(
            "unknown duration unit in '{}'",
            input
        ))),
    }
}

/// Parse `NAME:DURATION` into a sequence step
fn parse_step(input: &str) -> Result<Step> {
    let (name, duration) = input
        .rsplit_once(':')
        .ok_or_else(|| Error::InvalidTimer(format!("step '{}' is not NAME:DURATION", input)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidTimer(format!("step '{}' has no name", input)));
    }

    let (value, unit) = split_unit(duration)?;
    let step = match unit {
        "" | "s" => Step::new(name, value, StepUnit::Sec),
        "m" => Step::new(name, value, StepUnit::Min),
        "h" => Step::new(name, value.saturating_mul(60), StepUnit::Min),
        _ => {
            return Err(Error::InvalidTimer(format!(
                "unknown duration unit in step '{}'",
                input
            )))
        }
    };
    Ok(step)
}

fn summarize(config: &TimerConfig) -> String {
    match config {
        TimerConfig::Countdown { duration_secs } => {
            format!("countdown {}", format_duration(*duration_secs))
        }
        TimerConfig::Stopwatch => "stopwatch".to_string(),
        TimerConfig::Interval {
            work_secs,
            rest_secs,
            rounds,
        } => format!(
            "interval {} x {} / {}",
            rounds,
            format_duration(*work_secs),
            format_duration(*rest_secs)
        ),
        TimerConfig::Sequence { steps } => format!(
            "sequence {}",
            steps
                .iter()
                .map(|s| format!("{} {}", s.name, format_duration(s.seconds())))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// `MM:SS`, or `H:MM:SS` past an hour
fn format_clock(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}
