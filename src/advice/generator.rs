// ABOUTME: Retrieval-augmented advice pipeline with bounded timeouts and graceful degradation
// ABOUTME: Resolves the advice type, grounds the prompt, parses the response, persists the record
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::prompts::{build_user_prompt, COACH_SYSTEM_PROMPT};
use super::templates::{infer_type, template_for, trigger_request, TypeTemplate};
use crate::behavior::BehaviorService;
use crate::clock::Clock;
use crate::config::AdviceConfig;
use crate::constants::scores::{CANNED_ADVICE_CONFIDENCE, PARSE_FALLBACK_CONFIDENCE};
use crate::errors::AdviceError;
use crate::llm::{parse_generated, GeneratedAdvice, PromptSpec, TextGenerationBackend};
use crate::logging::CoachLogger;
use crate::models::{
    AdviceBody, AdviceCategory, AdviceContext, AdvicePriority, AdviceRecord, AdviceType,
    BehaviorExcerpt, BehaviorSnapshot, FastingSession, HealthGoal, HealthProfile, NewAdvice,
    ProfileExcerpt, SessionExcerpt, TriggerKind,
};
use crate::notifications::{NotificationEvent, NotificationSink};
use crate::rag::{KnowledgeRetriever, KnowledgeSnippet};
use crate::store::{AdviceStore, ProfileStore, SessionStore};

/// Confidence used when a well-formed response omits its own
const DEFAULT_GENERATED_CONFIDENCE: f64 = 0.7;

/// What the caller wants advice about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceRequest {
    /// Recipient
    pub user_id: Uuid,
    /// Free-text question
    pub query: Option<String>,
    /// Explicit type; wins over inference and feedback suppression
    pub advice_type: Option<AdviceType>,
    /// Raised by a rule rather than the user
    pub proactive: bool,
    /// Rule that raised it
    pub trigger: Option<TriggerKind>,
}

impl AdviceRequest {
    /// Open-ended request for a user
    #[must_use]
    pub const fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            query: None,
            advice_type: None,
            proactive: false,
            trigger: None,
        }
    }

    /// Ask a specific question
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into()).filter(|q: &String| !q.trim().is_empty());
        self
    }

    /// Force the advice type
    #[must_use]
    pub const fn with_type(mut self, advice_type: AdviceType) -> Self {
        self.advice_type = Some(advice_type);
        self
    }

    /// Mark as raised by a proactive rule
    #[must_use]
    pub const fn triggered_by(mut self, trigger: TriggerKind) -> Self {
        self.proactive = true;
        self.trigger = Some(trigger);
        self
    }
}

/// Collaborators of the advice generator
pub struct AdviceDependencies {
    /// Health profiles
    pub profiles: Arc<dyn ProfileStore>,
    /// Current fasting sessions
    pub sessions: Arc<dyn SessionStore>,
    /// Advice persistence
    pub advice: Arc<dyn AdviceStore>,
    /// Behavior snapshots
    pub behavior: Arc<BehaviorService>,
    /// Reference material
    pub retriever: Arc<dyn KnowledgeRetriever>,
    /// Text generation
    pub backend: Arc<dyn TextGenerationBackend>,
    /// Push notifications for proactive advice
    pub notifier: Arc<dyn NotificationSink>,
    /// Time source
    pub clock: Arc<dyn Clock>,
}

/// Produces personalized advice; never fails
pub struct AdviceGenerator {
    deps: AdviceDependencies,
    config: AdviceConfig,
}

/// Which fallback to build when the pipeline cannot produce generated advice
#[derive(Debug, Clone, Copy)]
enum Fallback {
    Canned,
    ParseFailure,
}

impl AdviceGenerator {
    /// Create a generator
    #[must_use]
    pub const fn new(deps: AdviceDependencies, config: AdviceConfig) -> Self {
        Self { deps, config }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &AdviceConfig {
        &self.config
    }

    /// Name of the configured generation backend
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.deps.backend.name()
    }

    /// Generate, persist and (for proactive requests) announce one advice record.
    ///
    /// Store, retrieval and generation failures all degrade the result instead
    /// of failing the call. A record that could not be persisted is still
    /// returned.
    #[instrument(skip(self, request), fields(user.id = %request.user_id, proactive = request.proactive))]
    pub async fn generate(&self, request: AdviceRequest) -> AdviceRecord {
        let started = Instant::now();
        let user_id = request.user_id;
        let now = self.deps.clock.now();

        let profile = match self.deps.profiles.get(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => HealthProfile::new(user_id, now),
            Err(e) => {
                warn!(user.id = %user_id, error = %e, "profile unavailable, using minimal profile");
                HealthProfile::new(user_id, now)
            }
        };
        let snapshot = match self.deps.behavior.snapshot(user_id).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(user.id = %user_id, error = %e, "behavior snapshot unavailable");
                self.deps.behavior.cached(user_id)
            }
        };
        let session = match self.deps.sessions.load_current(user_id).await {
            Ok(session) => session,
            Err(e) => {
                warn!(user.id = %user_id, error = %e, "current session unavailable");
                None
            }
        };

        let record = self
            .compose(&request, &profile, snapshot.as_ref(), session.as_ref())
            .await;

        if let Err(e) = self.deps.advice.insert(record.clone()).await {
            warn!(
                user.id = %user_id,
                advice.id = %record.id(),
                error = %e,
                "failed to persist advice record"
            );
        }

        if record.is_proactive() {
            self.deps.notifier.push(NotificationEvent::AdviceReady {
                user_id,
                advice_id: record.id(),
                advice_type: record.advice_type(),
                priority: record.priority(),
                trigger: record.trigger(),
                title: record.body().title.clone(),
            });
        }

        CoachLogger::log_advice_generated(
            user_id,
            record.advice_type(),
            record.is_degraded(),
            record.confidence(),
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        );
        record
    }

    /// Build an advice record from already-loaded inputs without persisting it
    pub async fn compose(
        &self,
        request: &AdviceRequest,
        profile: &HealthProfile,
        snapshot: Option<&BehaviorSnapshot>,
        session: Option<&FastingSession>,
    ) -> AdviceRecord {
        let now = self.deps.clock.now();
        let advice_type = resolve_type(request, profile);
        let template = template_for(advice_type);
        let question = request
            .query
            .clone()
            .or_else(|| request.trigger.map(|t| trigger_request(t).1.to_owned()))
            .unwrap_or_else(|| template.default_query.to_owned());

        let context = AdviceContext {
            user_id: request.user_id,
            captured_at: now,
            profile: ProfileExcerpt::from_profile(profile),
            behavior: snapshot.map(|s| BehaviorExcerpt::from_snapshot(s, now)),
            session: session
                .filter(|s| s.state.is_open())
                .map(|s| SessionExcerpt::from_session(s, now)),
        };

        let draft = Draft {
            request,
            advice_type,
            template,
            context,
            now,
        };

        let retrieval_query = format!("{} {question}", advice_type.as_str().replace('_', " "));
        let snippets = match self.retrieve(&retrieval_query, &draft.context).await {
            Ok(snippets) => snippets,
            Err(e) => {
                warn!(user.id = %request.user_id, advice.type = %advice_type, error = %e, "retrieval unavailable, using canned advice");
                return draft.fallback(Fallback::Canned, Vec::new());
            }
        };
        let sources: Vec<String> = snippets.iter().map(|s| s.source_id.clone()).collect();

        let prompt = PromptSpec {
            system: COACH_SYSTEM_PROMPT.to_owned(),
            user: build_user_prompt(&question, advice_type, &draft.context, &snippets),
            advice_type,
            snippets,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            json_response: true,
        };

        let raw = match self.generate_text(&prompt).await {
            Ok(raw) => raw,
            Err(e) if e.is_unavailable() => {
                warn!(user.id = %request.user_id, advice.type = %advice_type, error = %e, "generation unavailable, using canned advice");
                return draft.fallback(Fallback::Canned, sources);
            }
            Err(e) => {
                warn!(user.id = %request.user_id, advice.type = %advice_type, error = %e, "generation failed, using safe default");
                return draft.fallback(Fallback::ParseFailure, sources);
            }
        };

        match parse_generated(&raw) {
            Ok(generated) => draft.generated(generated, sources),
            Err(e) => {
                warn!(user.id = %request.user_id, advice.type = %advice_type, error = %e, "unparseable generation, using safe default");
                draft.fallback(Fallback::ParseFailure, sources)
            }
        }
    }

    async fn retrieve(
        &self,
        query: &str,
        context: &AdviceContext,
    ) -> Result<Vec<KnowledgeSnippet>, AdviceError> {
        let limit = self.config.retrieval_timeout();
        timeout(
            limit,
            self.deps.retriever.retrieve(query, context, self.config.top_k),
        )
        .await
        .map_err(|_| AdviceError::Timeout {
            stage: "retrieval",
            after_ms: self.config.retrieval_timeout_ms,
        })?
    }

    async fn generate_text(&self, prompt: &PromptSpec) -> Result<String, AdviceError> {
        let limit = self.config.generation_timeout();
        let raw = timeout(limit, self.deps.backend.generate(prompt))
            .await
            .map_err(|_| AdviceError::Timeout {
                stage: "generation",
                after_ms: self.config.generation_timeout_ms,
            })??;
        debug!(backend = self.deps.backend.name(), len = raw.len(), "generation returned");
        Ok(raw)
    }
}

/// Inputs shared by every way of finishing a record
struct Draft<'a> {
    request: &'a AdviceRequest,
    advice_type: AdviceType,
    template: &'static TypeTemplate,
    context: AdviceContext,
    now: DateTime<Utc>,
}

impl Draft<'_> {
    fn finish(
        self,
        category: AdviceCategory,
        priority: AdvicePriority,
        body: AdviceBody,
        sources: Vec<String>,
        confidence: f64,
        degraded: bool,
    ) -> AdviceRecord {
        AdviceRecord::create(
            NewAdvice {
                user_id: self.request.user_id,
                advice_type: self.advice_type,
                category,
                priority,
                body,
                context: self.context,
                rag_sources: sources,
                confidence,
                proactive: self.request.proactive,
                trigger: self.request.trigger,
                degraded,
            },
            self.now,
        )
    }

    fn generated(self, generated: GeneratedAdvice, sources: Vec<String>) -> AdviceRecord {
        let category = generated
            .category
            .as_deref()
            .and_then(AdviceCategory::parse)
            .unwrap_or(self.template.category);
        let priority = AdvicePriority::from_flags(
            generated.urgent.unwrap_or(false),
            generated.important.unwrap_or(false),
        );
        let mut tags = generated.tags;
        let type_tag = self.advice_type.as_str().to_owned();
        if !tags.contains(&type_tag) {
            tags.push(type_tag);
        }
        let body = AdviceBody {
            title: generated.title,
            content: generated.content,
            summary: generated.summary,
            suggested_actions: generated.actions,
            tags,
        };
        let confidence = generated.confidence.unwrap_or(DEFAULT_GENERATED_CONFIDENCE);
        self.finish(category, priority, body, sources, confidence, false)
    }

    fn fallback(self, kind: Fallback, sources: Vec<String>) -> AdviceRecord {
        let confidence = match kind {
            Fallback::Canned => CANNED_ADVICE_CONFIDENCE,
            Fallback::ParseFailure => PARSE_FALLBACK_CONFIDENCE,
        };
        let template = self.template;
        let body = AdviceBody {
            title: template.canned_title.to_owned(),
            content: template.canned_content.to_owned(),
            summary: template.canned_title.to_owned(),
            suggested_actions: template
                .canned_actions
                .iter()
                .map(|a| (*a).to_owned())
                .collect(),
            tags: vec![self.advice_type.as_str().to_owned()],
        };
        self.finish(
            template.category,
            AdvicePriority::Low,
            body,
            sources,
            confidence,
            true,
        )
    }
}

/// Explicit hint, then the trigger's type, then keyword inference, then preferences
fn resolve_type(request: &AdviceRequest, profile: &HealthProfile) -> AdviceType {
    if let Some(advice_type) = request.advice_type {
        return advice_type;
    }
    if let Some(trigger) = request.trigger {
        return trigger_request(trigger).0;
    }
    if let Some(inferred) = request.query.as_deref().and_then(infer_type) {
        return inferred;
    }
    preference_order(profile)
        .into_iter()
        .find(|t| {
            !profile
                .personalized_insights
                .as_ref()
                .is_some_and(|insights| insights.is_suppressed(*t))
        })
        .unwrap_or(AdviceType::General)
}

/// Preferred types from feedback, then types implied by goals, then the default order
fn preference_order(profile: &HealthProfile) -> Vec<AdviceType> {
    let preferred = profile
        .personalized_insights
        .as_ref()
        .map(|insights| insights.preferred_types.clone())
        .unwrap_or_default();
    let from_goals = profile.goals.iter().flat_map(|goal| goal_types(*goal).iter().copied());

    let mut order: Vec<AdviceType> = Vec::with_capacity(AdviceType::ALL.len());
    for advice_type in preferred.into_iter().chain(from_goals).chain(AdviceType::ALL) {
        if !order.contains(&advice_type) {
            order.push(advice_type);
        }
    }
    order
}

const fn goal_types(goal: HealthGoal) -> &'static [AdviceType] {
    match goal {
        HealthGoal::WeightLoss => &[AdviceType::WeightManagement, AdviceType::Fasting],
        HealthGoal::MuscleGain => &[AdviceType::Exercise, AdviceType::Nutrition],
        HealthGoal::Maintenance => &[AdviceType::Nutrition],
        HealthGoal::ImprovedEnergy => &[AdviceType::Sleep, AdviceType::Exercise],
        HealthGoal::BetterSleep => &[AdviceType::Sleep],
        HealthGoal::MetabolicHealth => &[AdviceType::Fasting, AdviceType::Nutrition],
        HealthGoal::Longevity => &[AdviceType::Exercise, AdviceType::Fasting],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PersonalizedInsights;

    fn profile_with(goals: Vec<HealthGoal>, suppressed: Vec<AdviceType>) -> HealthProfile {
        let now = Utc::now();
        let mut profile = HealthProfile::new(Uuid::new_v4(), now).with_goals(goals);
        profile.personalized_insights = Some(PersonalizedInsights {
            computed_at: now,
            sample_size: 4,
            average_rating: 2.0,
            recent_average: 2.0,
            older_average: 2.0,
            trend_delta: 0.0,
            per_type: Vec::new(),
            suppressed_types: suppressed,
            preferred_types: Vec::new(),
        });
        profile
    }

    #[test]
    fn explicit_type_ignores_suppression() {
        let profile = profile_with(Vec::new(), vec![AdviceType::Sleep]);
        let request = AdviceRequest::for_user(profile.user_id).with_type(AdviceType::Sleep);
        assert_eq!(resolve_type(&request, &profile), AdviceType::Sleep);
    }

    #[test]
    fn open_ended_requests_skip_suppressed_goal_types() {
        let profile = profile_with(
            vec![HealthGoal::WeightLoss],
            vec![AdviceType::WeightManagement],
        );
        let request = AdviceRequest::for_user(profile.user_id);
        assert_eq!(resolve_type(&request, &profile), AdviceType::Fasting);
    }

    #[test]
    fn query_keywords_pick_the_type() {
        let profile = profile_with(Vec::new(), Vec::new());
        let request = AdviceRequest::for_user(profile.user_id).with_query("best workout for mornings");
        assert_eq!(resolve_type(&request, &profile), AdviceType::Exercise);
    }
}
