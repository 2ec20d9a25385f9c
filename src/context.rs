// ABOUTME: Dependency container that wires stores, seams, and services for the coaching engine
// ABOUTME: Builder with in-memory defaults; every service is constructed once and shared by Arc
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

//! # Coach Services
//!
//! `CoachServices::builder()` is the one place where components meet. Each
//! seam (stores, clock, retriever, generation backend, notification sink) can
//! be swapped before `build()`; anything left unset gets the in-memory or
//! offline default.

use std::sync::Arc;

use fastwell_intelligence::{FeedbackTrendAnalyzer, PatternAnalyzer};
use tracing::info;
use uuid::Uuid;

use crate::advice::{AdviceDependencies, AdviceGenerator};
use crate::behavior::BehaviorService;
use crate::clock::{Clock, SystemClock};
use crate::config::{CoachConfig, GenerationBackendKind};
use crate::content_filter::{ContentFilterPolicy, FoodContentPolicy};
use crate::errors::AppError;
use crate::fasting::{SessionStateMachine, SessionTicker};
use crate::feedback::FeedbackLoop;
use crate::llm::{OpenAiCompatibleBackend, TemplateBackend, TextGenerationBackend};
use crate::notifications::{
    BroadcastSink, FanoutSink, NotificationSink, TracingSink, NOTIFICATION_CHANNEL_CAPACITY,
};
use crate::rag::{KnowledgeRetriever, StaticKnowledgeBase};
use crate::store::{
    ActivityLogStore, AdviceStore, FeedbackStore, InMemoryStore, ProfileStore, SessionStore,
};
use crate::triggers::ProactiveTriggerEngine;

/// The five persistence seams
#[derive(Clone)]
pub struct StoreSet {
    /// Activity log
    pub activity: Arc<dyn ActivityLogStore>,
    /// Health profiles
    pub profiles: Arc<dyn ProfileStore>,
    /// Current fasting sessions
    pub sessions: Arc<dyn SessionStore>,
    /// Advice records
    pub advice: Arc<dyn AdviceStore>,
    /// Feedback history
    pub feedback: Arc<dyn FeedbackStore>,
}

impl StoreSet {
    /// Use one backend for every seam
    #[must_use]
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: ActivityLogStore + ProfileStore + SessionStore + AdviceStore + FeedbackStore + 'static,
    {
        Self {
            activity: store.clone(),
            profiles: store.clone(),
            sessions: store.clone(),
            advice: store.clone(),
            feedback: store,
        }
    }

    /// Fresh in-memory backend
    #[must_use]
    pub fn in_memory() -> Self {
        Self::shared(Arc::new(InMemoryStore::new()))
    }
}

/// Builder for `CoachServices`
#[derive(Default)]
pub struct CoachServicesBuilder {
    config: Option<CoachConfig>,
    stores: Option<StoreSet>,
    clock: Option<Arc<dyn Clock>>,
    retriever: Option<Arc<dyn KnowledgeRetriever>>,
    backend: Option<Arc<dyn TextGenerationBackend>>,
    content_filter: Option<Arc<dyn ContentFilterPolicy>>,
    extra_sinks: Vec<Arc<dyn NotificationSink>>,
}

impl CoachServicesBuilder {
    /// Use this configuration instead of the defaults
    #[must_use]
    pub fn config(mut self, config: CoachConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use these stores instead of a fresh `InMemoryStore`
    #[must_use]
    pub fn stores(mut self, stores: StoreSet) -> Self {
        self.stores = Some(stores);
        self
    }

    /// Use this clock instead of the system clock
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use this retriever instead of the built-in knowledge base
    #[must_use]
    pub fn retriever(mut self, retriever: Arc<dyn KnowledgeRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Use this backend regardless of `advice.backend`
    #[must_use]
    pub fn backend(mut self, backend: Arc<dyn TextGenerationBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Replace the food content policy
    #[must_use]
    pub fn content_filter(mut self, policy: Arc<dyn ContentFilterPolicy>) -> Self {
        self.content_filter = Some(policy);
        self
    }

    /// Also deliver notifications to `sink`
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.extra_sinks.push(sink);
        self
    }

    /// Validate the configuration and wire every service
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid or the configured
    /// HTTP backend cannot be constructed
    pub fn build(self) -> Result<CoachServices, AppError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let stores = self.stores.unwrap_or_else(StoreSet::in_memory);
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let retriever: Arc<dyn KnowledgeRetriever> = self
            .retriever
            .unwrap_or_else(|| Arc::new(StaticKnowledgeBase::new()));
        let backend: Arc<dyn TextGenerationBackend> = match self.backend {
            Some(backend) => backend,
            None => match config.advice.backend {
                GenerationBackendKind::Template => Arc::new(TemplateBackend::new()),
                GenerationBackendKind::OpenAi => {
                    Arc::new(OpenAiCompatibleBackend::new(config.llm.clone())?)
                }
            },
        };

        let broadcast = Arc::new(BroadcastSink::new(NOTIFICATION_CHANNEL_CAPACITY));
        let notifier: Arc<dyn NotificationSink> = Arc::new(
            self.extra_sinks.into_iter().fold(
                FanoutSink::new()
                    .with(broadcast.clone())
                    .with(Arc::new(TracingSink)),
                FanoutSink::with,
            ),
        );

        let behavior = Arc::new(BehaviorService::new(
            stores.activity.clone(),
            PatternAnalyzer::new(config.analysis.analyzer_config()),
            clock.clone(),
            config.analysis.staleness(),
        ));

        let sessions = Arc::new(
            SessionStateMachine::new(
                stores.sessions.clone(),
                stores.activity.clone(),
                notifier.clone(),
                clock.clone(),
            )
            .with_refresher(behavior.clone()),
        );

        let generator = Arc::new(AdviceGenerator::new(
            AdviceDependencies {
                profiles: stores.profiles.clone(),
                sessions: stores.sessions.clone(),
                advice: stores.advice.clone(),
                behavior: behavior.clone(),
                retriever,
                backend,
                notifier,
                clock: clock.clone(),
            },
            config.advice,
        ));

        let feedback = Arc::new(FeedbackLoop::new(
            stores.advice.clone(),
            stores.feedback.clone(),
            stores.profiles.clone(),
            FeedbackTrendAnalyzer::new(config.feedback),
            clock.clone(),
        ));

        let triggers = Arc::new(ProactiveTriggerEngine::new(
            stores.profiles.clone(),
            behavior.clone(),
            generator.clone(),
            clock.clone(),
            config.triggers.thresholds(),
        ));

        let content_filter = self
            .content_filter
            .unwrap_or_else(|| Arc::new(FoodContentPolicy));

        info!(
            environment = %config.environment,
            advice.backend = generator.backend_name(),
            "coach services ready"
        );

        Ok(CoachServices {
            config,
            stores,
            clock,
            broadcast,
            behavior,
            sessions,
            generator,
            feedback,
            triggers,
            content_filter,
        })
    }
}

/// Shared, fully wired engine services
pub struct CoachServices {
    config: CoachConfig,
    stores: StoreSet,
    clock: Arc<dyn Clock>,
    broadcast: Arc<BroadcastSink>,
    behavior: Arc<BehaviorService>,
    sessions: Arc<SessionStateMachine>,
    generator: Arc<AdviceGenerator>,
    feedback: Arc<FeedbackLoop>,
    triggers: Arc<ProactiveTriggerEngine>,
    content_filter: Arc<dyn ContentFilterPolicy>,
}

impl CoachServices {
    /// Start building a service set
    #[must_use]
    pub fn builder() -> CoachServicesBuilder {
        CoachServicesBuilder::default()
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &CoachConfig {
        &self.config
    }

    /// Persistence seams
    #[must_use]
    pub const fn stores(&self) -> &StoreSet {
        &self.stores
    }

    /// Clock shared by every service
    #[must_use]
    pub const fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Broadcast sink carrying every notification
    #[must_use]
    pub const fn notifications(&self) -> &Arc<BroadcastSink> {
        &self.broadcast
    }

    /// Behavior snapshot cache
    #[must_use]
    pub const fn behavior(&self) -> &Arc<BehaviorService> {
        &self.behavior
    }

    /// Fasting session state machine
    #[must_use]
    pub const fn sessions(&self) -> &Arc<SessionStateMachine> {
        &self.sessions
    }

    /// Advice generator
    #[must_use]
    pub const fn generator(&self) -> &Arc<AdviceGenerator> {
        &self.generator
    }

    /// Feedback loop
    #[must_use]
    pub const fn feedback(&self) -> &Arc<FeedbackLoop> {
        &self.feedback
    }

    /// Proactive trigger engine
    #[must_use]
    pub const fn triggers(&self) -> &Arc<ProactiveTriggerEngine> {
        &self.triggers
    }

    /// Content filter policy
    #[must_use]
    pub const fn content_filter(&self) -> &Arc<dyn ContentFilterPolicy> {
        &self.content_filter
    }

    /// Start the display ticker for `user_id` at the configured interval
    #[must_use]
    pub fn spawn_ticker(&self, user_id: Uuid) -> SessionTicker {
        SessionTicker::spawn(
            self.sessions.clone(),
            user_id,
            self.config.session.tick_interval(),
        )
    }
}
