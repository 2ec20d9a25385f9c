// ABOUTME: Statistical helpers for behavioral analysis
// ABOUTME: Mean, population deviation, hour-of-day conversion, consistency and frequency metrics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use chrono::{DateTime, Timelike, Utc};
use std::collections::HashSet;

/// Arithmetic mean, `None` for an empty slice
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation, `None` for an empty slice
#[must_use]
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Fractional hour of day in UTC, in [0, 24)
#[must_use]
pub fn hour_of_day(at: DateTime<Utc>) -> f64 {
    f64::from(at.hour()) + f64::from(at.minute()) / 60.0 + f64::from(at.second()) / 3600.0
}

/// Regularity of a series of fractional hours: `max(0, 1 - stddev / mean)`.
///
/// Returns `None` with fewer than two samples. A series of identical values
/// scores 1.0, including the all-midnight series.
#[must_use]
pub fn timing_consistency(hours: &[f64]) -> Option<f64> {
    if hours.len() < 2 {
        return None;
    }
    let avg = mean(hours)?;
    let deviation = population_std_dev(hours)?;
    if deviation <= f64::EPSILON {
        return Some(1.0);
    }
    if avg <= 0.0 {
        return Some(0.0);
    }
    Some((1.0 - deviation / avg).clamp(0.0, 1.0))
}

/// Number of distinct UTC calendar days
#[must_use]
pub fn distinct_days<I>(timestamps: I) -> usize
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    timestamps
        .into_iter()
        .map(|at| at.date_naive())
        .collect::<HashSet<_>>()
        .len()
}

/// Events per active day, with active days floored at 1
#[must_use]
pub fn events_per_active_day(events: usize, active_days: usize) -> f64 {
    events as f64 / active_days.max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_identical_hours_are_perfectly_consistent() {
        assert_eq!(timing_consistency(&[8.5, 8.5, 8.5]), Some(1.0));
        assert_eq!(timing_consistency(&[0.0, 0.0]), Some(1.0));
    }

    #[test]
    fn test_single_sample_is_omitted() {
        assert_eq!(timing_consistency(&[12.0]), None);
        assert_eq!(timing_consistency(&[]), None);
    }

    #[test]
    fn test_consistency_uses_coefficient_of_variation() {
        // mean 10, population sd 2 -> 0.8
        let score = timing_consistency(&[8.0, 12.0]).unwrap();
        assert!((score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_consistency_never_negative() {
        let score = timing_consistency(&[0.5, 23.5, 0.5, 0.5]).unwrap();
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_hour_of_day_is_fractional() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 7, 30, 0).unwrap();
        assert!((hour_of_day(at) - 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_frequency_floors_active_days() {
        assert!(events_per_active_day(0, 0).abs() < f64::EPSILON);
        assert!((events_per_active_day(6, 2) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distinct_days_counts_calendar_days() {
        let day = |d, h| Utc.with_ymd_and_hms(2025, 1, d, h, 0, 0).unwrap();
        assert_eq!(distinct_days([day(1, 8), day(1, 20), day(3, 9)]), 2);
    }
}
