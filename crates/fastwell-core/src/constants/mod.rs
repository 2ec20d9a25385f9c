// ABOUTME: Domain constants shared by the analytics and service layers
// ABOUTME: Fasting windows, score bounds, rating limits, and record limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

/// Fasting protocol constants
pub mod fasting {
    /// Seconds in one hour
    pub const SECONDS_PER_HOUR: i64 = 3600;

    /// Longest custom fasting window accepted (72 hours, in minutes)
    pub const MAX_CUSTOM_TARGET_MINUTES: u32 = 72 * 60;

    /// Shortest custom fasting window accepted (in minutes)
    pub const MIN_CUSTOM_TARGET_MINUTES: u32 = 60;
}

/// Score bounds and defaults
pub mod scores {
    /// Lower bound for every normalized score
    pub const MIN_SCORE: f64 = 0.0;

    /// Upper bound for every normalized score
    pub const MAX_SCORE: f64 = 1.0;

    /// Confidence assigned to canned advice when a backend is unavailable
    pub const CANNED_ADVICE_CONFIDENCE: f64 = 0.4;

    /// Confidence assigned when the generated response cannot be parsed
    pub const PARSE_FALLBACK_CONFIDENCE: f64 = 0.3;

    /// Highest confidence a degraded advice record may carry
    pub const DEGRADED_CONFIDENCE_CEILING: f64 = 0.5;
}

/// Feedback rating limits
pub mod feedback {
    /// Lowest accepted rating
    pub const MIN_RATING: u8 = 1;

    /// Highest accepted rating
    pub const MAX_RATING: u8 = 5;
}

/// Health profile heuristics
pub mod health {
    /// Keywords that mark a health condition as chronic
    pub const CHRONIC_CONDITION_KEYWORDS: &[&str] = &[
        "diabetes",
        "hypertension",
        "heart",
        "kidney",
        "thyroid",
        "asthma",
        "cholesterol",
        "pcos",
    ];
}

/// Service identifiers used in structured logs
pub mod service_names {
    /// Engine service name
    pub const FASTWELL_COACH: &str = "fastwell-coach";
}
