// ABOUTME: Pattern analyzer turning a window of activity records into a behavior snapshot
// ABOUTME: Meal timing, fasting adherence, exercise frequency, sleep quality, and overall score
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use crate::config::{AnalysisTargets, AnalyzerConfig, ScoreWeights};
use crate::statistics::{
    distinct_days, events_per_active_day, hour_of_day, mean, timing_consistency,
};
use chrono::{DateTime, Duration, Utc};
use fastwell_core::constants::fasting::SECONDS_PER_HOUR;
use fastwell_core::models::{
    ActivityRecord, BehaviorSnapshot, ExercisePatterns, ExerciseRecord, FastingPatterns,
    FastingSession, FastingState, MealPatterns, MealRecord, NutritionTrend, SleepPatterns,
    SleepRecord, TrendPoint,
};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// Sub-scores feeding the overall health score; `None` means "no data"
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreComponents {
    /// Meal timing consistency
    pub meal_consistency: Option<f64>,
    /// Fasting success rate
    pub fasting_success: Option<f64>,
    /// Normalized exercise frequency
    pub exercise_frequency: Option<f64>,
    /// Sleep quality
    pub sleep_quality: Option<f64>,
}

impl ScoreComponents {
    /// Pull the components out of a finished snapshot
    #[must_use]
    pub fn from_snapshot(snapshot: &BehaviorSnapshot) -> Self {
        Self {
            meal_consistency: snapshot.meal_consistency(),
            fasting_success: snapshot.fasting_success_rate(),
            exercise_frequency: snapshot.exercise_frequency(),
            sleep_quality: snapshot.sleep_quality(),
        }
    }

    fn weighted(&self, weights: &ScoreWeights) -> [(Option<f64>, f64); 4] {
        [
            (self.meal_consistency, weights.meal_consistency),
            (self.fasting_success, weights.fasting_success),
            (self.exercise_frequency, weights.exercise_frequency),
            (self.sleep_quality, weights.sleep_quality),
        ]
    }
}

/// Records of one user, split by kind after windowing
#[derive(Default)]
struct Partitioned<'a> {
    meals: Vec<&'a MealRecord>,
    fasts: Vec<&'a FastingSession>,
    workouts: Vec<&'a ExerciseRecord>,
    nights: Vec<&'a SleepRecord>,
}

/// Computes behavior snapshots from activity history.
///
/// The analyzer holds configuration only. `analyze` is a pure function of
/// its arguments.
#[derive(Debug, Clone, Default)]
pub struct PatternAnalyzer {
    config: AnalyzerConfig,
}

impl PatternAnalyzer {
    /// Create an analyzer with the given configuration
    #[must_use]
    pub const fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze one user's records as of `now`.
    ///
    /// Records belonging to other users, records outside the window and
    /// meals superseded by a correction are ignored.
    #[must_use]
    pub fn analyze(
        &self,
        user_id: Uuid,
        records: &[ActivityRecord],
        now: DateTime<Utc>,
    ) -> BehaviorSnapshot {
        let windowed = self.windowed(user_id, records, now);
        let record_count = windowed.len();
        let earliest = windowed.first().map(|r| r.timestamp());
        let parts = partition(&windowed);

        let meal_patterns = meal_patterns(&parts.meals);
        let fasting_patterns = fasting_patterns(&parts.fasts, now);
        let exercise_patterns =
            exercise_patterns(&parts.workouts, &self.config.targets, window_weeks(earliest, now));
        let sleep_patterns = sleep_patterns(&parts.nights, &self.config.targets);

        let mut snapshot = BehaviorSnapshot {
            user_id,
            computed_at: now,
            record_count,
            meal_patterns,
            fasting_patterns,
            exercise_patterns,
            sleep_patterns,
            overall_health_score: None,
        };
        snapshot.overall_health_score = self.overall_score(&ScoreComponents::from_snapshot(&snapshot));

        debug!(
            user.id = %user_id,
            records = record_count,
            score = ?snapshot.overall_health_score,
            "Behavior snapshot computed"
        );
        snapshot
    }

    /// Analyze many users in parallel
    #[must_use]
    pub fn analyze_batch(
        &self,
        inputs: &[(Uuid, Vec<ActivityRecord>)],
        now: DateTime<Utc>,
    ) -> Vec<BehaviorSnapshot> {
        inputs
            .par_iter()
            .map(|(user_id, records)| self.analyze(*user_id, records, now))
            .collect()
    }

    /// Weighted mean over the components that are present.
    ///
    /// Missing components are left out of both numerator and denominator.
    /// Returns `None` when nothing is present or all present weights are zero.
    #[must_use]
    pub fn overall_score(&self, components: &ScoreComponents) -> Option<f64> {
        let (weighted_sum, weight_total) = components
            .weighted(&self.config.weights)
            .into_iter()
            .filter_map(|(value, weight)| value.map(|v| (v.clamp(0.0, 1.0), weight)))
            .fold((0.0, 0.0), |(sum, total), (value, weight)| {
                (sum + value * weight, total + weight)
            });
        if weight_total <= 0.0 {
            return None;
        }
        Some((weighted_sum / weight_total).clamp(0.0, 1.0))
    }

    fn windowed<'a>(
        &self,
        user_id: Uuid,
        records: &'a [ActivityRecord],
        now: DateTime<Utc>,
    ) -> Vec<&'a ActivityRecord> {
        let cutoff = now - Duration::days(self.config.window.lookback_days);
        let mut selected: Vec<&ActivityRecord> = records
            .iter()
            .filter(|r| r.user_id() == user_id)
            .filter(|r| r.timestamp() >= cutoff && r.timestamp() <= now)
            .collect();
        selected.sort_by_key(|r| r.timestamp());

        let excess = selected.len().saturating_sub(self.config.window.max_records);
        selected.drain(..excess);

        let superseded: HashSet<Uuid> = selected
            .iter()
            .filter_map(|r| match r {
                ActivityRecord::Meal(meal) => meal.corrects,
                _ => None,
            })
            .collect();
        selected.retain(|r| match r {
            ActivityRecord::Meal(meal) => !superseded.contains(&meal.id),
            _ => true,
        });
        selected
    }
}

fn partition<'a>(records: &[&'a ActivityRecord]) -> Partitioned<'a> {
    let mut parts = Partitioned::default();
    for record in records.iter().copied() {
        match record {
            ActivityRecord::Meal(meal) => parts.meals.push(meal),
            ActivityRecord::Fasting(session) => parts.fasts.push(session),
            ActivityRecord::Exercise(workout) => parts.workouts.push(workout),
            ActivityRecord::Sleep(night) => parts.nights.push(night),
        }
    }
    parts
}

/// Weeks covered by the window, from the earliest record to now, floored at 1
fn window_weeks(earliest: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let days = earliest.map_or(0, |first| (now - first).num_days() + 1);
    (days as f64 / 7.0).max(1.0)
}

fn meal_patterns(meals: &[&MealRecord]) -> Option<MealPatterns> {
    if meals.is_empty() {
        return None;
    }
    let hours: Vec<f64> = meals.iter().map(|m| hour_of_day(m.timestamp)).collect();
    let calories: Vec<f64> = meals.iter().filter_map(|m| m.calories).collect();
    let active_days = distinct_days(meals.iter().map(|m| m.timestamp));

    let points = meals
        .iter()
        .map(|m| TrendPoint {
            at: m.timestamp,
            calories: m.calories,
            protein_g: m.macros.protein_g,
            carbohydrates_g: m.macros.carbohydrates_g,
            fat_g: m.macros.fat_g,
        })
        .collect();

    Some(MealPatterns {
        meal_count: meals.len(),
        active_days,
        meals_per_day: events_per_active_day(meals.len(), active_days),
        timing_consistency: timing_consistency(&hours),
        average_meal_hour: mean(&hours),
        average_calories: mean(&calories),
        last_meal_at: meals.iter().map(|m| m.timestamp).max(),
        nutrition_trend: NutritionTrend { points },
    })
}

fn fasting_patterns(fasts: &[&FastingSession], now: DateTime<Utc>) -> Option<FastingPatterns> {
    if fasts.is_empty() {
        return None;
    }
    let completed_count = fasts
        .iter()
        .filter(|s| s.state == FastingState::Completed)
        .count();
    let abandoned_count = fasts
        .iter()
        .filter(|s| s.state == FastingState::Abandoned)
        .count();
    let terminal = completed_count + abandoned_count;

    let elapsed_hours: Vec<f64> = fasts
        .iter()
        .filter(|s| s.state.is_terminal())
        .map(|s| s.elapsed(now).num_seconds() as f64 / SECONDS_PER_HOUR as f64)
        .collect();
    let start_hours: Vec<f64> = fasts.iter().map(|s| hour_of_day(s.started_at)).collect();
    let active_days = distinct_days(fasts.iter().map(|s| s.started_at));

    Some(FastingPatterns {
        session_count: fasts.len(),
        completed_count,
        abandoned_count,
        success_rate: (terminal > 0).then(|| completed_count as f64 / terminal as f64),
        average_elapsed_hours: mean(&elapsed_hours),
        start_time_consistency: timing_consistency(&start_hours),
        sessions_per_day: events_per_active_day(fasts.len(), active_days),
    })
}

fn exercise_patterns(
    workouts: &[&ExerciseRecord],
    targets: &AnalysisTargets,
    weeks: f64,
) -> Option<ExercisePatterns> {
    if workouts.is_empty() {
        return None;
    }
    let active_days = distinct_days(workouts.iter().map(|w| w.timestamp));
    let active_days_per_week = active_days as f64 / weeks;
    let durations: Vec<f64> = workouts.iter().map(|w| w.duration_minutes).collect();
    let hours: Vec<f64> = workouts.iter().map(|w| hour_of_day(w.timestamp)).collect();

    Some(ExercisePatterns {
        session_count: workouts.len(),
        active_days,
        sessions_per_day: events_per_active_day(workouts.len(), active_days),
        active_days_per_week,
        normalized_frequency: (active_days_per_week / targets.exercise_days_per_week)
            .clamp(0.0, 1.0),
        average_duration_minutes: mean(&durations).unwrap_or_default(),
        timing_consistency: timing_consistency(&hours),
    })
}

fn sleep_patterns(nights: &[&SleepRecord], targets: &AnalysisTargets) -> Option<SleepPatterns> {
    if nights.is_empty() {
        return None;
    }
    let durations: Vec<f64> = nights.iter().map(|n| n.duration_hours()).collect();
    let average_duration_hours = mean(&durations).unwrap_or_default();
    let qualities: Vec<f64> = nights
        .iter()
        .filter_map(|n| n.quality)
        .map(|q| q.clamp(0.0, 1.0))
        .collect();

    let quality_score = mean(&qualities).unwrap_or_else(|| {
        let distance = (average_duration_hours - targets.ideal_sleep_hours).abs();
        (1.0 - distance / targets.sleep_tolerance_hours).clamp(0.0, 1.0)
    });

    // Bedtimes straddle midnight; shift early-morning hours past 24 so 23:30 and 00:30 are close.
    let bedtimes: Vec<f64> = nights
        .iter()
        .map(|n| {
            let hour = hour_of_day(n.started_at);
            if hour < 12.0 {
                hour + 24.0
            } else {
                hour
            }
        })
        .collect();

    Some(SleepPatterns {
        night_count: nights.len(),
        average_duration_hours,
        quality_score,
        bedtime_consistency: timing_consistency(&bedtimes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fastwell_core::models::{FastingType, MealType};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_overall_score_renormalizes_over_present_components() {
        let analyzer = PatternAnalyzer::default();
        let only_two = ScoreComponents {
            meal_consistency: Some(0.8),
            sleep_quality: Some(0.4),
            ..ScoreComponents::default()
        };
        let score = analyzer.overall_score(&only_two).unwrap();
        assert!((score - 0.6).abs() < 1e-12);
        assert_eq!(analyzer.overall_score(&ScoreComponents::default()), None);
    }

    #[test]
    fn test_corrected_meal_is_dropped() {
        let user = Uuid::new_v4();
        let original = MealRecord::new(user, now() - Duration::hours(5), MealType::Lunch)
            .with_calories(900.0);
        let fixed = original.correction().with_calories(600.0);
        let records = vec![ActivityRecord::Meal(original), ActivityRecord::Meal(fixed)];

        let snapshot = PatternAnalyzer::default().analyze(user, &records, now());
        let meals = snapshot.meal_patterns.unwrap();
        assert_eq!(meals.meal_count, 1);
        assert!((meals.average_calories.unwrap() - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_window_keeps_most_recent_records() {
        let user = Uuid::new_v4();
        let records: Vec<ActivityRecord> = (0..10)
            .map(|i| {
                ActivityRecord::Meal(MealRecord::new(
                    user,
                    now() - Duration::days(i),
                    MealType::Breakfast,
                ))
            })
            .collect();
        let mut config = AnalyzerConfig::default();
        config.window.max_records = 3;

        let snapshot = PatternAnalyzer::new(config).analyze(user, &records, now());
        assert_eq!(snapshot.record_count, 3);
        assert_eq!(
            snapshot.meal_patterns.unwrap().last_meal_at,
            Some(now())
        );
    }

    #[test]
    fn test_open_sessions_do_not_affect_success_rate() {
        let user = Uuid::new_v4();
        let open = FastingSession::start(user, FastingType::SixteenEight, None, now() - Duration::hours(3));
        let snapshot = PatternAnalyzer::default().analyze(user, &[ActivityRecord::Fasting(open)], now());
        let fasting = snapshot.fasting_patterns.unwrap();
        assert_eq!(fasting.session_count, 1);
        assert_eq!(fasting.success_rate, None);
        assert_eq!(snapshot.overall_health_score, None);
    }
}
