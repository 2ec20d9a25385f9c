// ABOUTME: Fastwell CLI for running the coaching engine against local data
// ABOUTME: Analyzes activity logs, simulates a fast, generates advice, and runs trigger passes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors
//!
//! Usage:
//! ```bash
//! # Print the behavior snapshot for a JSON array of activity records
//! fastwell-cli analyze --input activity.json
//!
//! # Walk through a 16:8 fast with a 30 minute pause on a simulated clock
//! fastwell-cli simulate
//!
//! # Generate advice for a seeded user
//! fastwell-cli advise --query "How do I handle hunger in the evening?"
//! fastwell-cli advise --type sleep
//!
//! # Seed a few users and run one proactive trigger pass
//! fastwell-cli triggers
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use fastwell::advice::AdviceRequest;
use fastwell::clock::{Clock, ManualClock};
use fastwell::config::CoachConfig;
use fastwell::context::{CoachServices, StoreSet};
use fastwell::intelligence::PatternAnalyzer;
use fastwell::logging::LoggingConfig;
use fastwell::models::{
    ActivityRecord, AdviceType, ExerciseRecord, FastingSession, FastingType, HealthGoal,
    HealthProfile, MealRecord, MealType, SleepRecord,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "fastwell-cli",
    about = "Fastwell coaching engine CLI",
    long_about = "Run behavior analysis, session simulations, advice generation, and trigger passes locally."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the behavior snapshot for a JSON array of activity records
    Analyze {
        /// Path to the activity records
        #[arg(long)]
        input: PathBuf,

        /// Analyze only this user's records (defaults to the first record's owner)
        #[arg(long)]
        user: Option<Uuid>,
    },

    /// Run a 16:8 fast with a 30 minute pause against a simulated clock
    Simulate,

    /// Generate advice for a seeded user
    Advise {
        /// Question to answer
        #[arg(long)]
        query: Option<String>,

        /// Advice type (nutrition, fasting, exercise, sleep, ...)
        #[arg(long = "type")]
        advice_type: Option<String>,
    },

    /// Seed users and run one proactive trigger pass
    Triggers,
}

fn init_logging(verbose: bool) -> Result<()> {
    let mut config = LoggingConfig::from_env();
    if verbose {
        "debug".clone_into(&mut config.level);
    }
    config.init()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let config = CoachConfig::from_env().context("invalid FASTWELL_* configuration")?;

    match cli.command {
        Command::Analyze { input, user } => analyze(&config, &input, user),
        Command::Simulate => simulate(config).await,
        Command::Advise { query, advice_type } => advise(config, query, advice_type).await,
        Command::Triggers => triggers(config).await,
    }
}

fn analyze(config: &CoachConfig, input: &Path, user: Option<Uuid>) -> Result<()> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let records: Vec<ActivityRecord> =
        serde_json::from_str(&raw).context("input must be a JSON array of activity records")?;

    let user_id = user
        .or_else(|| records.first().map(ActivityRecord::user_id))
        .ok_or_else(|| anyhow!("no records and no --user given"))?;
    let owned: Vec<ActivityRecord> = records
        .into_iter()
        .filter(|r| r.user_id() == user_id)
        .collect();

    let analyzer = PatternAnalyzer::new(config.analysis.analyzer_config());
    let snapshot = analyzer.analyze(user_id, &owned, Utc::now());
    print_json(&snapshot)
}

async fn simulate(config: CoachConfig) -> Result<()> {
    let start = Utc::now();
    let clock = Arc::new(ManualClock::new(start));
    let services = CoachServices::builder()
        .config(config)
        .clock(clock.clone())
        .build()?;
    let sessions = services.sessions();
    let user = Uuid::new_v4();

    print_json(&sessions.start(user, FastingType::SixteenEight, None).await?)?;

    clock.advance(Duration::hours(2));
    print_json(&sessions.pause(user).await?)?;

    clock.advance(Duration::minutes(30));
    print_json(&sessions.resume(user).await?)?;

    clock.advance(Duration::hours(14));
    let before_end = sessions
        .current(user)
        .await?
        .ok_or_else(|| anyhow!("session disappeared"))?;
    info!(
        elapsed_hours = before_end.elapsed().num_minutes() as f64 / 60.0,
        progress = before_end.progress,
        "target reached"
    );
    print_json(&before_end)?;

    print_json(&sessions.end(user, true).await?)?;
    let snapshot = services.behavior().refresh(user).await?;
    print_json(&snapshot)
}

async fn advise(
    config: CoachConfig,
    query: Option<String>,
    advice_type: Option<String>,
) -> Result<()> {
    let services = CoachServices::builder().config(config).build()?;
    let now = services.clock().now();
    let user = Uuid::new_v4();
    seed_user(
        services.stores(),
        user,
        now,
        vec![HealthGoal::WeightLoss, HealthGoal::BetterSleep],
        7,
    )
    .await?;

    let mut request = AdviceRequest::for_user(user);
    if let Some(query) = query {
        request = request.with_query(query);
    }
    if let Some(raw) = advice_type {
        let parsed =
            AdviceType::parse(&raw).ok_or_else(|| anyhow!("unknown advice type: {raw}"))?;
        request = request.with_type(parsed);
    }

    let record = services.generator().generate(request).await;
    print_json(&record)
}

async fn triggers(config: CoachConfig) -> Result<()> {
    let services = CoachServices::builder().config(config).build()?;
    let now = services.clock().now();

    seed_user(services.stores(), Uuid::new_v4(), now, vec![HealthGoal::WeightLoss], 7).await?;
    seed_user(services.stores(), Uuid::new_v4(), now, vec![HealthGoal::BetterSleep], 0).await?;
    seed_user(services.stores(), Uuid::new_v4(), now, Vec::new(), 5).await?;

    let outcomes = services.triggers().run_pass().await;
    print_json(&outcomes)
}

/// Store a profile and `days` of meals, fasts, workouts, and sleep ending at `now`
async fn seed_user(
    stores: &StoreSet,
    user_id: Uuid,
    now: DateTime<Utc>,
    goals: Vec<HealthGoal>,
    days: i64,
) -> Result<()> {
    let profile = HealthProfile::new(user_id, now)
        .with_age(38)
        .with_body(172.0, 81.0)
        .with_goals(goals);
    stores.profiles.save(profile).await?;

    for day in 1..=days {
        let midnight = now - Duration::days(day);
        let meals = [
            (Duration::hours(12), MealType::Lunch, 650.0),
            (Duration::hours(19), MealType::Dinner, 800.0),
        ];
        for (offset, meal_type, calories) in meals {
            let meal = MealRecord::new(user_id, midnight + offset, meal_type).with_calories(calories);
            stores.activity.append(ActivityRecord::Meal(meal)).await?;
        }

        let fast_start = midnight - Duration::hours(4);
        let mut fast = FastingSession::start(user_id, FastingType::SixteenEight, None, fast_start);
        let completed = day % 3 != 0;
        let fasted = if completed {
            Duration::hours(16)
        } else {
            Duration::hours(9)
        };
        fast.end_at(fast_start + fasted, completed)?;
        stores.activity.append(ActivityRecord::Fasting(fast)).await?;

        if day % 2 == 0 {
            let workout = ExerciseRecord {
                id: Uuid::new_v4(),
                user_id,
                timestamp: midnight + Duration::hours(7),
                duration_minutes: 40.0,
                kind: "run".to_owned(),
                calories_burned: Some(380.0),
            };
            stores.activity.append(ActivityRecord::Exercise(workout)).await?;
        }

        let bedtime = midnight - Duration::minutes(60);
        let sleep = SleepRecord {
            id: Uuid::new_v4(),
            user_id,
            started_at: bedtime,
            ended_at: bedtime + Duration::minutes(6 * 60 + 45),
            quality: Some(0.7),
        };
        stores.activity.append(ActivityRecord::Sleep(sleep)).await?;
    }
    Ok(())
}
