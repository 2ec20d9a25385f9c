// ABOUTME: Integration tests for environment-driven configuration
// ABOUTME: FASTWELL_* overrides, malformed values, backend selection, and logging settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::env;
use std::time::Duration as StdDuration;

use fastwell::config::{CoachConfig, Environment, GenerationBackendKind};
use fastwell::context::CoachServicesBuilder;
use fastwell::errors::ConfigError;
use fastwell::logging::{LogFormat, LoggingConfig};
use serial_test::serial;

fn clear_env() {
    for (key, _) in env::vars() {
        if key.starts_with("FASTWELL_") {
            env::remove_var(key);
        }
    }
    for key in ["ENVIRONMENT", "LOG_FORMAT", "SERVICE_NAME"] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_unset_environment_yields_defaults() {
    clear_env();
    let config = CoachConfig::from_env().unwrap();
    assert_eq!(config, CoachConfig::default());
    assert_eq!(config.environment, Environment::Development);
}

#[test]
#[serial]
fn test_overrides_are_applied() {
    clear_env();
    env::set_var("FASTWELL_ENVIRONMENT", "prod");
    env::set_var("FASTWELL_TICK_INTERVAL_SECS", "5");
    env::set_var("FASTWELL_SNAPSHOT_STALENESS_SECS", "600");
    env::set_var("FASTWELL_RAG_TOP_K", "2");
    env::set_var("FASTWELL_TRIGGER_MEAL_GAP_DAYS", "7");
    env::set_var("FASTWELL_TRIGGER_MIN_TERMINAL_SESSIONS", "5");
    env::set_var("FASTWELL_FEEDBACK_MIN_SAMPLES", "4");
    env::set_var("FASTWELL_LLM_MODEL", "llama3.1:8b");
    env::set_var("FASTWELL_GENERATION_TIMEOUT_MS", "");

    let config = CoachConfig::from_env().unwrap();
    clear_env();

    assert!(config.environment.is_production());
    assert_eq!(config.session.tick_interval(), StdDuration::from_secs(5));
    assert_eq!(config.analysis.staleness_secs, 600);
    assert_eq!(config.advice.top_k, 2);
    assert_eq!(
        config.advice.generation_timeout_ms,
        CoachConfig::default().advice.generation_timeout_ms
    );
    assert_eq!(config.triggers.thresholds().meal_gap_days, 7);
    assert_eq!(config.triggers.thresholds().min_terminal_sessions, 5);
    assert_eq!(config.feedback.min_samples, 4);
    assert_eq!(config.llm.model, "llama3.1:8b");
}

#[test]
#[serial]
fn test_malformed_value_is_a_parse_error() {
    clear_env();
    env::set_var("FASTWELL_RAG_TOP_K", "four");
    let err = CoachConfig::from_env().unwrap_err();
    clear_env();
    match err {
        ConfigError::Parse(message) => assert!(message.contains("FASTWELL_RAG_TOP_K")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
#[serial]
fn test_out_of_range_value_fails_validation() {
    clear_env();
    env::set_var("FASTWELL_TRIGGER_LOW_SUCCESS_RATE", "1.5");
    let err = CoachConfig::from_env().unwrap_err();
    clear_env();
    assert!(matches!(err, ConfigError::InvalidRange(_)));
}

#[test]
#[serial]
fn test_backend_selection() {
    clear_env();
    env::set_var("FASTWELL_ADVICE_BACKEND", "OpenAI");
    env::set_var("FASTWELL_LLM_BASE_URL", "http://127.0.0.1:8080/v1");
    env::set_var("FASTWELL_LLM_API_KEY", "sk-test-123");
    let config = CoachConfig::from_env().unwrap();

    assert_eq!(config.advice.backend, GenerationBackendKind::OpenAi);
    assert_eq!(config.llm.base_url, "http://127.0.0.1:8080/v1");
    assert!(!format!("{config:?}").contains("sk-test-123"));
    assert!(CoachServicesBuilder::default().config(config).build().is_ok());

    env::set_var("FASTWELL_ADVICE_BACKEND", "carrier-pigeon");
    let err = CoachConfig::from_env().unwrap_err();
    clear_env();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
#[serial]
fn test_environment_falls_back_to_generic_variable() {
    clear_env();
    env::set_var("ENVIRONMENT", "testing");
    assert_eq!(Environment::from_env(), Environment::Testing);
    env::set_var("FASTWELL_ENVIRONMENT", "production");
    assert_eq!(Environment::from_env(), Environment::Production);
    clear_env();
    assert_eq!(Environment::from_str_or_default("staging"), Environment::Development);
}

#[test]
#[serial]
fn test_logging_config_from_env() {
    clear_env();
    env::set_var("LOG_FORMAT", "json");
    env::set_var("FASTWELL_ENVIRONMENT", "production");
    env::set_var("SERVICE_NAME", "coach-worker");
    let logging = LoggingConfig::from_env();
    clear_env();

    assert_eq!(logging.format, LogFormat::Json);
    assert_eq!(logging.environment, "production");
    assert_eq!(logging.service_name, "coach-worker");
    assert!(logging.include_location);

    env::set_var("LOG_FORMAT", "fancy");
    assert_eq!(LoggingConfig::from_env().format, LogFormat::Pretty);
    clear_env();
}
