// ABOUTME: Engine configuration loaded from FASTWELL_* environment variables
// ABOUTME: Typed sections for sessions, analysis, advice, feedback, triggers, and the LLM endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

//! # Configuration
//!
//! `CoachConfig::default()` is a complete, valid configuration.
//! `CoachConfig::from_env()` overlays any `FASTWELL_*` variables that are set
//! and validates the result.

/// Deployment environment and env-var helpers
pub mod environment;

pub use environment::{env_optional, env_parse, env_string, Environment};

use std::fmt;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use fastwell_intelligence::{AnalysisTargets, AnalysisWindow, AnalyzerConfig, FeedbackTrendConfig};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::triggers::TriggerThresholds;

/// Session display settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds between display refreshes
    pub tick_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 30,
        }
    }
}

impl SessionConfig {
    /// Tick period
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

/// Behavior analysis settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Most recent records analyzed per user
    pub max_records: usize,
    /// Days of history analyzed
    pub lookback_days: i64,
    /// Age after which a cached snapshot is recomputed
    pub staleness_secs: i64,
    /// Active days per week that count as full exercise frequency
    pub target_exercise_days_per_week: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_records: 500,
            lookback_days: 30,
            staleness_secs: 3600,
            target_exercise_days_per_week: 4.0,
        }
    }
}

impl AnalysisConfig {
    /// Analyzer configuration with default score weights
    #[must_use]
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            window: AnalysisWindow {
                max_records: self.max_records,
                lookback_days: self.lookback_days,
            },
            targets: AnalysisTargets {
                exercise_days_per_week: self.target_exercise_days_per_week,
                ..AnalysisTargets::default()
            },
            ..AnalyzerConfig::default()
        }
    }

    /// Snapshot staleness threshold
    #[must_use]
    pub const fn staleness(&self) -> ChronoDuration {
        ChronoDuration::seconds(self.staleness_secs)
    }
}

/// Which text generation backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationBackendKind {
    /// Offline template backend
    #[default]
    Template,
    /// `OpenAI`-compatible HTTP endpoint
    OpenAi,
}

impl GenerationBackendKind {
    /// Parse a configuration value
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for unknown backends
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_lowercase().as_str() {
            "template" | "offline" => Ok(Self::Template),
            "openai" | "openai_compatible" | "local" => Ok(Self::OpenAi),
            other => Err(ConfigError::Parse(format!("unknown advice backend: {other}"))),
        }
    }
}

impl fmt::Display for GenerationBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template => write!(f, "template"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

/// Advice pipeline settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdviceConfig {
    /// Retrieval deadline in milliseconds
    pub retrieval_timeout_ms: u64,
    /// Generation deadline in milliseconds
    pub generation_timeout_ms: u64,
    /// Snippets retrieved per request
    pub top_k: usize,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion budget
    pub max_tokens: u32,
    /// Generation backend
    pub backend: GenerationBackendKind,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            retrieval_timeout_ms: 3_000,
            generation_timeout_ms: 20_000,
            top_k: 4,
            temperature: 0.4,
            max_tokens: 700,
            backend: GenerationBackendKind::Template,
        }
    }
}

impl AdviceConfig {
    /// Retrieval deadline
    #[must_use]
    pub const fn retrieval_timeout(&self) -> Duration {
        Duration::from_millis(self.retrieval_timeout_ms)
    }

    /// Generation deadline
    #[must_use]
    pub const fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }
}

/// Proactive trigger settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Seconds between scheduled passes
    pub schedule_secs: u64,
    /// Days without a meal before a reminder
    pub meal_gap_days: i64,
    /// Fasting success rate that counts as low
    pub low_success_rate: f64,
    /// Terminal sessions needed before judging success rate
    pub min_terminal_sessions: usize,
    /// Meal timing consistency that counts as irregular
    pub irregular_timing_below: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        let thresholds = TriggerThresholds::default();
        Self {
            schedule_secs: 6 * 60 * 60,
            meal_gap_days: thresholds.meal_gap_days,
            low_success_rate: thresholds.low_success_rate,
            min_terminal_sessions: thresholds.min_terminal_sessions,
            irregular_timing_below: thresholds.irregular_timing_below,
        }
    }
}

impl TriggerConfig {
    /// Period of the trigger schedule
    #[must_use]
    pub const fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_secs)
    }

    /// Rule thresholds
    #[must_use]
    pub const fn thresholds(&self) -> TriggerThresholds {
        TriggerThresholds {
            meal_gap_days: self.meal_gap_days,
            low_success_rate: self.low_success_rate,
            min_terminal_sessions: self.min_terminal_sessions,
            irregular_timing_below: self.irregular_timing_below,
        }
    }
}

/// `OpenAI`-compatible endpoint settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL, e.g. `http://localhost:11434/v1`
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Bearer token, optional for local servers
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_owned(),
            model: "qwen2.5:7b-instruct".to_owned(),
            api_key: None,
            request_timeout_secs: 60,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoachConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Session display
    pub session: SessionConfig,
    /// Behavior analysis
    pub analysis: AnalysisConfig,
    /// Advice pipeline
    pub advice: AdviceConfig,
    /// Feedback trends
    pub feedback: FeedbackTrendConfig,
    /// Proactive triggers
    pub triggers: TriggerConfig,
    /// Generation endpoint
    pub llm: LlmConfig,
}

impl CoachConfig {
    /// Load from the environment over the defaults, then validate
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for malformed or out-of-range values
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let session = SessionConfig {
            tick_interval_secs: env_parse(
                "FASTWELL_TICK_INTERVAL_SECS",
                defaults.session.tick_interval_secs,
            )?,
        };

        let analysis = AnalysisConfig {
            max_records: env_parse("FASTWELL_ANALYSIS_MAX_RECORDS", defaults.analysis.max_records)?,
            lookback_days: env_parse(
                "FASTWELL_ANALYSIS_LOOKBACK_DAYS",
                defaults.analysis.lookback_days,
            )?,
            staleness_secs: env_parse(
                "FASTWELL_SNAPSHOT_STALENESS_SECS",
                defaults.analysis.staleness_secs,
            )?,
            target_exercise_days_per_week: env_parse(
                "FASTWELL_EXERCISE_TARGET_DAYS",
                defaults.analysis.target_exercise_days_per_week,
            )?,
        };

        let backend = match env_optional("FASTWELL_ADVICE_BACKEND") {
            Some(raw) => GenerationBackendKind::parse(&raw)?,
            None => defaults.advice.backend,
        };
        let advice = AdviceConfig {
            retrieval_timeout_ms: env_parse(
                "FASTWELL_RETRIEVAL_TIMEOUT_MS",
                defaults.advice.retrieval_timeout_ms,
            )?,
            generation_timeout_ms: env_parse(
                "FASTWELL_GENERATION_TIMEOUT_MS",
                defaults.advice.generation_timeout_ms,
            )?,
            top_k: env_parse("FASTWELL_RAG_TOP_K", defaults.advice.top_k)?,
            temperature: env_parse("FASTWELL_LLM_TEMPERATURE", defaults.advice.temperature)?,
            max_tokens: env_parse("FASTWELL_LLM_MAX_TOKENS", defaults.advice.max_tokens)?,
            backend,
        };

        let feedback = FeedbackTrendConfig {
            window: env_parse("FASTWELL_FEEDBACK_WINDOW", defaults.feedback.window)?,
            suppress_below: env_parse(
                "FASTWELL_FEEDBACK_SUPPRESS_BELOW",
                defaults.feedback.suppress_below,
            )?,
            prefer_above: env_parse(
                "FASTWELL_FEEDBACK_PREFER_ABOVE",
                defaults.feedback.prefer_above,
            )?,
            min_samples: env_parse("FASTWELL_FEEDBACK_MIN_SAMPLES", defaults.feedback.min_samples)?,
        };

        let triggers = TriggerConfig {
            schedule_secs: env_parse(
                "FASTWELL_TRIGGER_SCHEDULE_SECS",
                defaults.triggers.schedule_secs,
            )?,
            meal_gap_days: env_parse(
                "FASTWELL_TRIGGER_MEAL_GAP_DAYS",
                defaults.triggers.meal_gap_days,
            )?,
            low_success_rate: env_parse(
                "FASTWELL_TRIGGER_LOW_SUCCESS_RATE",
                defaults.triggers.low_success_rate,
            )?,
            min_terminal_sessions: env_parse(
                "FASTWELL_TRIGGER_MIN_TERMINAL_SESSIONS",
                defaults.triggers.min_terminal_sessions,
            )?,
            irregular_timing_below: env_parse(
                "FASTWELL_TRIGGER_IRREGULAR_TIMING_BELOW",
                defaults.triggers.irregular_timing_below,
            )?,
        };

        let llm = LlmConfig {
            base_url: env_string("FASTWELL_LLM_BASE_URL", &defaults.llm.base_url),
            model: env_string("FASTWELL_LLM_MODEL", &defaults.llm.model),
            api_key: env_optional("FASTWELL_LLM_API_KEY"),
            request_timeout_secs: env_parse(
                "FASTWELL_LLM_TIMEOUT_SECS",
                defaults.llm.request_timeout_secs,
            )?,
        };

        let config = Self {
            environment: Environment::from_env(),
            session,
            analysis,
            advice,
            feedback,
            triggers,
            llm,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every section
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.tick_interval_secs == 0 {
            return Err(ConfigError::InvalidRange("tick_interval_secs must be at least 1"));
        }
        if self.analysis.staleness_secs < 0 {
            return Err(ConfigError::InvalidRange("staleness_secs must not be negative"));
        }
        self.analysis.analyzer_config().validate()?;

        if self.advice.retrieval_timeout_ms == 0 || self.advice.generation_timeout_ms == 0 {
            return Err(ConfigError::InvalidRange("advice timeouts must be positive"));
        }
        if self.advice.top_k == 0 {
            return Err(ConfigError::InvalidRange("top_k must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.advice.temperature) {
            return Err(ConfigError::InvalidRange("temperature must be within 0.0-2.0"));
        }
        if self.advice.max_tokens == 0 {
            return Err(ConfigError::InvalidRange("max_tokens must be at least 1"));
        }

        self.feedback.validate()?;

        if self.triggers.schedule_secs == 0 {
            return Err(ConfigError::InvalidRange("trigger schedule must be positive"));
        }
        if self.triggers.meal_gap_days <= 0 {
            return Err(ConfigError::InvalidRange("meal_gap_days must be positive"));
        }
        if !(0.0..=1.0).contains(&self.triggers.low_success_rate)
            || !(0.0..=1.0).contains(&self.triggers.irregular_timing_below)
        {
            return Err(ConfigError::InvalidRange("trigger rates must be within 0.0-1.0"));
        }

        if self.advice.backend == GenerationBackendKind::OpenAi && self.llm.base_url.is_empty() {
            return Err(ConfigError::InvalidRange(
                "FASTWELL_LLM_BASE_URL is required for the openai backend",
            ));
        }
        if self.llm.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidRange("LLM request timeout must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CoachConfig::default();
        config.validate().unwrap();
        assert_eq!(config.analysis.staleness(), ChronoDuration::hours(1));
        assert_eq!(config.advice.retrieval_timeout(), Duration::from_secs(3));
        assert_eq!(config.triggers.thresholds(), TriggerThresholds::default());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = CoachConfig::default();
        config.advice.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = CoachConfig::default();
        config.feedback.suppress_below = 4.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_the_api_key() {
        let llm = LlmConfig {
            api_key: Some("sk-secret".to_owned()),
            ..LlmConfig::default()
        };
        let rendered = format!("{llm:?}");
        assert!(!rendered.contains("sk-secret"));
    }
}
