// ABOUTME: Configuration error types for environment loading and validation
// ABOUTME: Defines error variants for invalid ranges, parse failures, and weight validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use std::env;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Value outside acceptable range (e.g., a timeout of zero)
    #[error("Invalid range: {0}")]
    InvalidRange(&'static str),

    /// Environment variable access error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] env::VarError),

    /// Failed to parse configuration value
    #[error("Parse error: {0}")]
    Parse(String),

    /// Score weights don't sum to 1.0
    #[error("Invalid weights: {0}")]
    InvalidWeights(&'static str),
}
