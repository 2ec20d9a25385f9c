// ABOUTME: Built-in fasting and lifestyle knowledge base with keyword-overlap scoring
// ABOUTME: Boosts snippets whose tags match the user's goals; works fully offline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

use std::cmp::Ordering;
use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use super::{tokenize, KnowledgeRetriever, KnowledgeSnippet};
use crate::errors::AdviceError;
use crate::models::AdviceContext;

/// Score added per tag that matches one of the user's goals
const GOAL_TAG_BOOST: f64 = 1.5;

/// Score added when a query token names a tag exactly
const TAG_MATCH_BOOST: f64 = 1.0;

struct Entry {
    source_id: &'static str,
    title: &'static str,
    body: &'static str,
    tags: &'static [&'static str],
}

const CORPUS: &[Entry] = &[
    Entry {
        source_id: "kb-fasting-basics",
        title: "How time-restricted eating works",
        body: "Time-restricted eating limits food to a daily window. After roughly twelve hours without food the body relies more on stored fat for fuel. Consistent start times make fasting easier to sustain.",
        tags: &["fasting", "metabolic", "weight_loss"],
    },
    Entry {
        source_id: "kb-fasting-hydration",
        title: "Hydration during a fast",
        body: "Water, black coffee and plain tea are fine while fasting. Headaches and fatigue during a fast are often signs of low fluid or sodium intake; a pinch of salt in water can help on longer fasts.",
        tags: &["fasting", "hydration", "energy"],
    },
    Entry {
        source_id: "kb-fasting-hunger",
        title: "Riding out hunger waves",
        body: "Hunger comes in waves tied to habitual meal times and usually fades within twenty minutes. A short walk, a glass of water or a change of activity helps the wave pass.",
        tags: &["fasting", "motivation", "hunger"],
    },
    Entry {
        source_id: "kb-breaking-fast",
        title: "Breaking a fast gently",
        body: "Break longer fasts with a moderate meal built around protein, vegetables and some fat. Very large or sugary first meals can cause discomfort and energy crashes.",
        tags: &["fasting", "nutrition", "meal"],
    },
    Entry {
        source_id: "kb-meal-timing",
        title: "Regular meal timing",
        body: "Eating at similar times each day supports steadier appetite and energy. Irregular meal timing is linked to poorer glucose control; anchor the first and last meal of the eating window.",
        tags: &["nutrition", "meal", "timing", "metabolic"],
    },
    Entry {
        source_id: "kb-protein",
        title: "Protein within the eating window",
        body: "A compressed eating window makes it easy to under-eat protein. Aim for a palm-sized protein portion at each meal to protect lean mass, especially when combining fasting with training.",
        tags: &["nutrition", "muscle_gain", "weight_loss", "meal"],
    },
    Entry {
        source_id: "kb-exercise-fasted",
        title: "Training and fasting",
        body: "Light and moderate exercise is generally well tolerated while fasting. Schedule hard sessions near the eating window so recovery meals follow soon after. Aim for activity on most days of the week.",
        tags: &["exercise", "fasting", "muscle_gain", "energy"],
    },
    Entry {
        source_id: "kb-exercise-consistency",
        title: "Building an exercise habit",
        body: "Frequency beats intensity when forming a habit. Short sessions four days a week build more consistency than one long weekly workout. Walking counts.",
        tags: &["exercise", "motivation", "longevity"],
    },
    Entry {
        source_id: "kb-sleep-hygiene",
        title: "Sleep and fasting",
        body: "Seven to nine hours of sleep helps regulate hunger hormones. Finishing the last meal two to three hours before bed and keeping a consistent bedtime improve sleep quality.",
        tags: &["sleep", "fasting", "energy"],
    },
    Entry {
        source_id: "kb-weight-plateau",
        title: "Weight plateaus",
        body: "Weight often stalls for a week or two even when habits are on track. Track trends over several weeks rather than daily readings, and check that portion sizes have not crept up.",
        tags: &["weight_loss", "weight_management", "motivation"],
    },
    Entry {
        source_id: "kb-chronic-conditions",
        title: "Fasting with a medical condition",
        body: "People with diabetes, heart, kidney or thyroid conditions should review fasting plans with their clinician, especially when taking medication that affects blood sugar or blood pressure.",
        tags: &["health_reminder", "medical", "diabetes", "metabolic"],
    },
    Entry {
        source_id: "kb-motivation-streaks",
        title: "Progress over perfection",
        body: "An abandoned fast is data, not failure. Shorter protocols completed consistently beat ambitious ones that are frequently cut short. Celebrate each completed fast.",
        tags: &["motivation", "fasting", "adherence"],
    },
];

/// Keyword-overlap retriever over a fixed corpus
#[derive(Debug, Clone, Default)]
pub struct StaticKnowledgeBase;

impl StaticKnowledgeBase {
    /// Create the built-in knowledge base
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Number of entries in the corpus
    #[must_use]
    pub const fn len(&self) -> usize {
        CORPUS.len()
    }

    /// Whether the corpus is empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        CORPUS.is_empty()
    }

    fn score(entry: &Entry, query_tokens: &HashSet<String>, goal_tags: &HashSet<&str>) -> f64 {
        let text_tokens: HashSet<String> = tokenize(entry.title)
            .into_iter()
            .chain(tokenize(entry.body))
            .collect();
        let overlap = query_tokens.intersection(&text_tokens).count() as f64;
        let tag_hits = entry
            .tags
            .iter()
            .filter(|tag| query_tokens.contains(**tag))
            .count() as f64;
        let goal_hits = entry
            .tags
            .iter()
            .filter(|tag| goal_tags.contains(**tag))
            .count() as f64;
        overlap + tag_hits * TAG_MATCH_BOOST + goal_hits * GOAL_TAG_BOOST
    }
}

#[async_trait]
impl KnowledgeRetriever for StaticKnowledgeBase {
    async fn retrieve(
        &self,
        query: &str,
        context: &AdviceContext,
        top_k: usize,
    ) -> Result<Vec<KnowledgeSnippet>, AdviceError> {
        let query_tokens: HashSet<String> = tokenize(query).into_iter().collect();
        let goal_tags: HashSet<&str> = context.profile.goals.iter().map(|g| g.tag()).collect();

        let mut scored: Vec<(f64, &Entry)> = CORPUS
            .iter()
            .map(|entry| (Self::score(entry, &query_tokens, &goal_tags), entry))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|(a, ea), (b, eb)| {
            b.partial_cmp(a)
                .unwrap_or(Ordering::Equal)
                .then_with(|| ea.source_id.cmp(eb.source_id))
        });
        scored.truncate(top_k);

        debug!(
            user.id = %context.user_id,
            query_tokens = query_tokens.len(),
            hits = scored.len(),
            "knowledge base searched"
        );

        Ok(scored
            .into_iter()
            .map(|(score, entry)| KnowledgeSnippet {
                source_id: entry.source_id.to_owned(),
                title: entry.title.to_owned(),
                body: entry.body.to_owned(),
                tags: entry.tags.iter().map(|t| (*t).to_owned()).collect(),
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HealthGoal, ProfileExcerpt};
    use chrono::Utc;
    use uuid::Uuid;

    fn context(goals: Vec<HealthGoal>) -> AdviceContext {
        AdviceContext {
            user_id: Uuid::new_v4(),
            captured_at: Utc::now(),
            profile: ProfileExcerpt {
                age: None,
                sex: None,
                activity_level: None,
                goals,
                dietary_restrictions: Vec::new(),
                health_conditions: Vec::new(),
                bmi: None,
            },
            behavior: None,
            session: None,
        }
    }

    #[tokio::test]
    async fn hydration_query_ranks_hydration_first() {
        let kb = StaticKnowledgeBase::new();
        let hits = kb
            .retrieve("headache while fasting, need hydration", &context(Vec::new()), 3)
            .await
            .unwrap();
        assert_eq!(hits[0].source_id, "kb-fasting-hydration");
        assert!(hits.len() <= 3);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn goal_tags_boost_matching_entries() {
        let kb = StaticKnowledgeBase::new();
        let hits = kb
            .retrieve("tips", &context(vec![HealthGoal::BetterSleep]), 1)
            .await
            .unwrap();
        assert_eq!(hits[0].source_id, "kb-sleep-hygiene");
    }
}
