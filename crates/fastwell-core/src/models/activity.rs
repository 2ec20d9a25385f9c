// ABOUTME: Activity log record types covering meals, fasting, exercise, and sleep
// ABOUTME: ActivityRecord is the tagged union appended to and queried from the activity log
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use super::fasting::FastingSession;
use super::nutrition::MealRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A logged workout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseRecord {
    /// Record identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Start of the workout
    pub timestamp: DateTime<Utc>,
    /// Duration in minutes
    pub duration_minutes: f64,
    /// Free-form kind ("walk", "strength", ...)
    pub kind: String,
    /// Estimated energy expenditure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<f64>,
}

/// A logged night of sleep
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SleepRecord {
    /// Record identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Bedtime
    pub started_at: DateTime<Utc>,
    /// Wake time
    pub ended_at: DateTime<Utc>,
    /// Self-reported or device quality in [0, 1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
}

impl SleepRecord {
    /// Hours slept, never negative
    #[must_use]
    pub fn duration_hours(&self) -> f64 {
        let secs = (self.ended_at - self.started_at).num_seconds().max(0);
        secs as f64 / 3600.0
    }
}

/// Discriminant of an activity record, used for log filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Meal records
    Meal,
    /// Archived fasting sessions
    Fasting,
    /// Exercise records
    Exercise,
    /// Sleep records
    Sleep,
}

/// One entry in the append-only activity log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "record_type", rename_all = "snake_case")]
pub enum ActivityRecord {
    /// A meal
    Meal(MealRecord),
    /// A fasting session, archived when it reached a terminal state
    Fasting(FastingSession),
    /// A workout
    Exercise(ExerciseRecord),
    /// A night of sleep
    Sleep(SleepRecord),
}

impl ActivityRecord {
    /// Owner of the record
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        match self {
            Self::Meal(m) => m.user_id,
            Self::Fasting(f) => f.user_id,
            Self::Exercise(e) => e.user_id,
            Self::Sleep(s) => s.user_id,
        }
    }

    /// Timestamp the log is ordered by
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Meal(m) => m.timestamp,
            Self::Fasting(f) => f.started_at,
            Self::Exercise(e) => e.timestamp,
            Self::Sleep(s) => s.started_at,
        }
    }

    /// Record discriminant
    #[must_use]
    pub const fn kind(&self) -> ActivityKind {
        match self {
            Self::Meal(_) => ActivityKind::Meal,
            Self::Fasting(_) => ActivityKind::Fasting,
            Self::Exercise(_) => ActivityKind::Exercise,
            Self::Sleep(_) => ActivityKind::Sleep,
        }
    }
}
