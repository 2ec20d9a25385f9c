// ABOUTME: Main library entry point for the fastwell fasting coach engine
// ABOUTME: Session state machine, behavior analytics, retrieval-augmented advice, feedback, and triggers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

#![deny(unsafe_code)]

//! # Fastwell
//!
//! An engine for coaching intermittent fasting. It tracks one fasting session
//! per user, turns activity logs into behavior statistics, writes grounded
//! advice through a pluggable text generation backend, and learns from the
//! ratings users give that advice.
//!
//! ## Architecture
//!
//! - **Fasting**: `SessionStateMachine` with persist-then-publish transitions and a display ticker
//! - **Behavior**: cached `BehaviorSnapshot`s computed by `fastwell-intelligence`
//! - **Advice**: retrieval, prompt construction, generation, and graceful degradation
//! - **Feedback**: rating history folded into `PersonalizedInsights`
//! - **Triggers**: rule table evaluated on app open and on a schedule
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fastwell::context::CoachServices;
//! use fastwell::errors::AppResult;
//! use fastwell::models::FastingType;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let services = CoachServices::builder().build()?;
//!     let user = Uuid::new_v4();
//!     let snapshot = services
//!         .sessions()
//!         .start(user, FastingType::SixteenEight, None)
//!         .await?;
//!     println!("{:.0}% done", snapshot.progress * 100.0);
//!     Ok(())
//! }
//! ```

/// Core error types, domain models, and constants
pub use fastwell_core::{constants, errors, models};

/// Pure behavior analytics
pub use fastwell_intelligence as intelligence;

/// Advice generation pipeline
pub mod advice;

/// Behavior snapshot cache over the pattern analyzer
pub mod behavior;

/// Injectable wall clock
pub mod clock;

/// Environment-driven configuration
pub mod config;

/// Food content suppression while fasting
pub mod content_filter;

/// Dependency container
pub mod context;

/// Fasting session lifecycle, display theme, and ticker
pub mod fasting;

/// Advice ratings and personalization
pub mod feedback;

/// Text generation backends and response parsing
pub mod llm;

/// Logging setup and structured event helpers
pub mod logging;

/// Notification events and sinks
pub mod notifications;

/// Watch-backed observable values
pub mod observable;

/// Knowledge retrieval
pub mod rag;

/// Persistence traits and the in-memory store
pub mod store;

/// Proactive advice triggers
pub mod triggers;
