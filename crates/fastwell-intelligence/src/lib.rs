// ABOUTME: Behavioral analytics engine for the fastwell coaching platform
// ABOUTME: Pure statistics, pattern analysis, and feedback trend scoring with no I/O
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

#![deny(unsafe_code)]

//! # Fastwell Intelligence
//!
//! Every function in this crate is pure: the same records and the same `now`
//! always produce the same output. The service layer decides when to run the
//! analysis and where to cache it.

/// Analyzer and feedback-trend configuration
pub mod config;

/// Mean, deviation, time-of-day and frequency helpers
pub mod statistics;

/// Activity log to `BehaviorSnapshot` analysis
pub mod pattern_analyzer;

/// Feedback history to `PersonalizedInsights` analysis
pub mod feedback_trends;

pub use config::{AnalysisTargets, AnalysisWindow, AnalyzerConfig, FeedbackTrendConfig, ScoreWeights};
pub use feedback_trends::FeedbackTrendAnalyzer;
pub use pattern_analyzer::{PatternAnalyzer, ScoreComponents};
