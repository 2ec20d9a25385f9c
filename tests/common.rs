// ABOUTME: Shared test utilities and fixtures for integration tests
// ABOUTME: Logging setup, a wired service harness on a manual clock, fixtures, and failing seams
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used
)]
//! Shared test utilities for `fastwell`

use std::env;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use fastwell::clock::ManualClock;
use fastwell::config::CoachConfig;
use fastwell::context::{CoachServices, CoachServicesBuilder, StoreSet};
use fastwell::errors::{AdviceError, StoreError};
use fastwell::llm::{PromptSpec, TextGenerationBackend};
use fastwell::models::{
    ActivityRecord, AdviceContext, ExerciseRecord, FastingSession, FastingType, MealRecord,
    MealType, SleepRecord,
};
use fastwell::rag::{KnowledgeRetriever, KnowledgeSnippet};
use fastwell::store::{InMemoryStore, SessionStore};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::Level;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Monday 2025-03-03 06:00 UTC
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 6, 0, 0).unwrap()
}

/// Services over one in-memory store and a manual clock
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
    pub services: CoachServices,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(CoachServices::builder())
    }

    pub fn with_config(config: CoachConfig) -> Self {
        Self::with(CoachServices::builder().config(config))
    }

    pub fn with(builder: CoachServicesBuilder) -> Self {
        init_test_logging();
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let services = builder
            .stores(StoreSet::shared(store.clone()))
            .clock(clock.clone())
            .build()
            .unwrap();
        Self {
            store,
            clock,
            services,
        }
    }
}

pub fn meal(user_id: Uuid, at: DateTime<Utc>) -> ActivityRecord {
    ActivityRecord::Meal(MealRecord::new(user_id, at, MealType::Lunch).with_calories(600.0))
}

pub fn fast(user_id: Uuid, start: DateTime<Utc>, hours: i64, completed: bool) -> ActivityRecord {
    let mut session = FastingSession::start(user_id, FastingType::SixteenEight, None, start);
    session.end_at(start + Duration::hours(hours), completed).unwrap();
    ActivityRecord::Fasting(session)
}

pub fn workout(user_id: Uuid, at: DateTime<Utc>, minutes: f64) -> ActivityRecord {
    ActivityRecord::Exercise(ExerciseRecord {
        id: Uuid::new_v4(),
        user_id,
        timestamp: at,
        duration_minutes: minutes,
        kind: "walk".to_owned(),
        calories_burned: None,
    })
}

pub fn night(user_id: Uuid, bedtime: DateTime<Utc>, hours: i64, quality: f64) -> ActivityRecord {
    ActivityRecord::Sleep(SleepRecord {
        id: Uuid::new_v4(),
        user_id,
        started_at: bedtime,
        ended_at: bedtime + Duration::hours(hours),
        quality: Some(quality),
    })
}

/// Session store whose writes can be switched to fail
pub struct FailingSessionStore {
    inner: InMemoryStore,
    fail_writes: AtomicBool,
}

impl FailingSessionStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn load_current(&self, user_id: Uuid) -> Result<Option<FastingSession>, StoreError> {
        self.inner.load_current(user_id).await
    }

    async fn save_current(
        &self,
        session: &FastingSession,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".to_owned()));
        }
        self.inner.save_current(session, expected_version).await
    }

    fn subscribe(&self, user_id: Uuid) -> watch::Receiver<Option<FastingSession>> {
        SessionStore::subscribe(&self.inner, user_id)
    }
}

/// Backend that returns a fixed response and counts calls
pub struct FixedBackend {
    response: String,
    pub calls: AtomicUsize,
}

impl FixedBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TextGenerationBackend for FixedBackend {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn generate(&self, _prompt: &PromptSpec) -> Result<String, AdviceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Backend that is always down
pub struct DownBackend;

#[async_trait]
impl TextGenerationBackend for DownBackend {
    fn name(&self) -> &'static str {
        "down"
    }

    async fn generate(&self, _prompt: &PromptSpec) -> Result<String, AdviceError> {
        Err(AdviceError::GenerationUnavailable("connection refused".to_owned()))
    }
}

/// Backend that never answers within any reasonable deadline
pub struct StalledBackend;

#[async_trait]
impl TextGenerationBackend for StalledBackend {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn generate(&self, _prompt: &PromptSpec) -> Result<String, AdviceError> {
        sleep(StdDuration::from_secs(3600)).await;
        Ok(String::new())
    }
}

/// Retriever that is always down
pub struct DownRetriever;

#[async_trait]
impl KnowledgeRetriever for DownRetriever {
    async fn retrieve(
        &self,
        _query: &str,
        _context: &AdviceContext,
        _top_k: usize,
    ) -> Result<Vec<KnowledgeSnippet>, AdviceError> {
        Err(AdviceError::RetrievalUnavailable("index offline".to_owned()))
    }
}

/// A well-formed generation response
pub const GOOD_RESPONSE: &str = r#"{
  "title": "Front-load protein after your fast",
  "content": "Break your fast with a protein-rich meal to stay full through the afternoon.",
  "summary": "Protein first.",
  "actions": ["Plan a 30 g protein first meal"],
  "tags": ["protein"],
  "confidence": 0.82,
  "urgent": false,
  "important": true,
  "category": "tip"
}"#;
