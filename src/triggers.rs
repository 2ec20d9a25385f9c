// ABOUTME: Rule-based proactive advice: evaluates ordered rules per user and generates advice
// ABOUTME: Supports on-demand passes, app-open checks, and a cancellable periodic schedule
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant as StdInstant};

use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::advice::{AdviceGenerator, AdviceRequest};
use crate::behavior::BehaviorService;
use crate::clock::Clock;
use crate::logging::CoachLogger;
use crate::models::{BehaviorSnapshot, HealthGoal, HealthProfile, TriggerKind};
use crate::store::ProfileStore;

/// Rule thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TriggerThresholds {
    /// Days without a logged meal before a nutrition reminder
    pub meal_gap_days: i64,
    /// Fasting success rate below which a fasting tip fires
    pub low_success_rate: f64,
    /// Terminal sessions needed before the success rate is trusted
    pub min_terminal_sessions: usize,
    /// Meal timing consistency below which a nutrition insight fires
    pub irregular_timing_below: f64,
}

impl Default for TriggerThresholds {
    fn default() -> Self {
        Self {
            meal_gap_days: 3,
            low_success_rate: 0.5,
            min_terminal_sessions: 3,
            irregular_timing_below: 0.6,
        }
    }
}

struct RuleInput<'a> {
    profile: &'a HealthProfile,
    snapshot: &'a BehaviorSnapshot,
    now: DateTime<Utc>,
}

type Rule = fn(&RuleInput<'_>, &TriggerThresholds) -> bool;

fn meal_logging_gap(input: &RuleInput<'_>, t: &TriggerThresholds) -> bool {
    input
        .snapshot
        .last_meal_at()
        .is_none_or(|last| input.now - last > Duration::days(t.meal_gap_days))
}

fn weight_loss_motivation(input: &RuleInput<'_>, _: &TriggerThresholds) -> bool {
    input.profile.has_goal(HealthGoal::WeightLoss)
}

fn chronic_condition_reminder(input: &RuleInput<'_>, _: &TriggerThresholds) -> bool {
    !input.profile.chronic_conditions().is_empty()
}

fn low_fasting_success(input: &RuleInput<'_>, t: &TriggerThresholds) -> bool {
    input.snapshot.fasting_patterns.as_ref().is_some_and(|f| {
        f.completed_count + f.abandoned_count >= t.min_terminal_sessions
            && f.success_rate.is_some_and(|rate| rate < t.low_success_rate)
    })
}

fn irregular_meal_timing(input: &RuleInput<'_>, t: &TriggerThresholds) -> bool {
    input
        .snapshot
        .meal_consistency()
        .is_some_and(|c| c < t.irregular_timing_below)
}

/// Evaluated in this order; each rule fires at most once per pass
const RULES: [(TriggerKind, Rule); 5] = [
    (TriggerKind::MealLoggingGap, meal_logging_gap),
    (TriggerKind::WeightLossMotivation, weight_loss_motivation),
    (TriggerKind::ChronicConditionReminder, chronic_condition_reminder),
    (TriggerKind::LowFastingSuccess, low_fasting_success),
    (TriggerKind::IrregularMealTiming, irregular_meal_timing),
];

/// Result of evaluating one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerOutcome {
    /// User evaluated
    pub user_id: Uuid,
    /// Rules that fired, in rule order
    pub fired: Vec<TriggerKind>,
    /// Advice generated for the fired rules, in the same order
    pub advice_ids: Vec<Uuid>,
}

impl TriggerOutcome {
    const fn skipped(user_id: Uuid) -> Self {
        Self {
            user_id,
            fired: Vec::new(),
            advice_ids: Vec::new(),
        }
    }
}

/// Runs proactive rules and turns firings into advice
pub struct ProactiveTriggerEngine {
    profiles: Arc<dyn ProfileStore>,
    behavior: Arc<BehaviorService>,
    generator: Arc<AdviceGenerator>,
    clock: Arc<dyn Clock>,
    thresholds: TriggerThresholds,
}

impl ProactiveTriggerEngine {
    /// Create an engine
    #[must_use]
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        behavior: Arc<BehaviorService>,
        generator: Arc<AdviceGenerator>,
        clock: Arc<dyn Clock>,
        thresholds: TriggerThresholds,
    ) -> Self {
        Self {
            profiles,
            behavior,
            generator,
            clock,
            thresholds,
        }
    }

    /// Active thresholds
    #[must_use]
    pub const fn thresholds(&self) -> &TriggerThresholds {
        &self.thresholds
    }

    /// Rules that fire for this profile and snapshot, in rule order
    #[must_use]
    pub fn evaluate(
        &self,
        profile: &HealthProfile,
        snapshot: &BehaviorSnapshot,
        now: DateTime<Utc>,
    ) -> Vec<TriggerKind> {
        let input = RuleInput {
            profile,
            snapshot,
            now,
        };
        RULES
            .iter()
            .filter(|(_, rule)| rule(&input, &self.thresholds))
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Evaluate one user and generate advice for every rule that fires.
    ///
    /// Store failures skip the user and are logged.
    #[instrument(skip(self), fields(user.id = %user_id))]
    pub async fn run_for_user(&self, user_id: Uuid) -> TriggerOutcome {
        let now = self.clock.now();
        let profile = match self.profiles.get(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => HealthProfile::new(user_id, now),
            Err(e) => {
                warn!(user.id = %user_id, error = %e, "skipping triggers: profile unavailable");
                return TriggerOutcome::skipped(user_id);
            }
        };
        let snapshot = match self.behavior.snapshot(user_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(user.id = %user_id, error = %e, "skipping triggers: behavior snapshot unavailable");
                return TriggerOutcome::skipped(user_id);
            }
        };

        let fired = self.evaluate(&profile, &snapshot, now);
        let mut advice_ids = Vec::with_capacity(fired.len());
        for kind in &fired {
            let record = self
                .generator
                .generate(AdviceRequest::for_user(user_id).triggered_by(*kind))
                .await;
            debug!(user.id = %user_id, trigger = kind.as_str(), advice.id = %record.id(), "trigger fired");
            advice_ids.push(record.id());
        }
        TriggerOutcome {
            user_id,
            fired,
            advice_ids,
        }
    }

    /// Check a user when they open the app
    pub async fn on_app_open(&self, user_id: Uuid) -> TriggerOutcome {
        self.run_for_user(user_id).await
    }

    /// Evaluate every known user concurrently
    #[instrument(skip(self))]
    pub async fn run_pass(&self) -> Vec<TriggerOutcome> {
        let started = StdInstant::now();
        let user_ids = match self.profiles.list_user_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "trigger pass skipped: cannot list users");
                return Vec::new();
            }
        };
        let outcomes = join_all(user_ids.iter().map(|id| self.run_for_user(*id))).await;
        let fired: usize = outcomes.iter().map(|o| o.fired.len()).sum();
        CoachLogger::log_trigger_pass(
            outcomes.len(),
            fired,
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        );
        outcomes
    }

    /// Run a pass every `period` until the handle is shut down or dropped
    #[must_use]
    pub fn spawn_schedule(self: &Arc<Self>, period: StdDuration) -> TriggerScheduleHandle {
        let engine = Arc::clone(self);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let period = period.max(StdDuration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        let outcomes = engine.run_pass().await;
                        debug!(users = outcomes.len(), "scheduled trigger pass finished");
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("trigger schedule received shutdown signal");
                        break;
                    }
                }
            }
        });

        TriggerScheduleHandle {
            shutdown_tx,
            handle: Some(handle),
        }
    }
}

/// Owner of a periodic trigger schedule
pub struct TriggerScheduleHandle {
    shutdown_tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl TriggerScheduleHandle {
    /// Stop the schedule and wait for the task to exit
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }

    /// Whether the background task has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for TriggerScheduleHandle {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown_tx.try_send(()) {
            debug!(error = ?e, "trigger schedule shutdown signal send failed (task likely stopped)");
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
