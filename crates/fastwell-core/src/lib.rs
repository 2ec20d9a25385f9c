// ABOUTME: Core types and constants for the fastwell coaching engine
// ABOUTME: Foundation crate with error handling, domain models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

#![deny(unsafe_code)]

//! # Fastwell Core
//!
//! Foundation crate providing shared types for the fastwell coaching engine.
//! Nothing in here performs I/O or spawns tasks, so both the analytics crate
//! and the async service layer can depend on it freely.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and domain-specific errors
//! - **constants**: Domain constants (fasting windows, score bounds, limits)
//! - **models**: Profiles, fasting sessions, activity records, snapshots, advice and feedback

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (profiles, sessions, activity records, advice)
pub mod models;
