// ABOUTME: Generation orchestrator driving one meal plan request through the pipeline states
// ABOUTME: Generate, decode, normalize, aggregate, enforce, then accept, retry, or fall back
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Generation Orchestrator
//!
//! Each attempt runs `Generate → Decode → Normalize → ResolveAggregate →
//! Enforce` and ends in `Accept`, `Retry`, or (once attempts are exhausted)
//! `Fallback`. A request never fails: the worst outcome is an empty meal
//! list.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mealforge::config::PipelineConfig;
//! use mealforge::llm::OpenAiCompatibleGenerator;
//! use mealforge::nutrition::StubFactProvider;
//! use mealforge::orchestrator::{GenerationOrchestrator, MealPlanRequest};
//!
//! async fn example() -> mealforge::errors::AppResult<()> {
//!     let generator = Arc::new(OpenAiCompatibleGenerator::from_env(120)?);
//!     let provider = Arc::new(StubFactProvider::with_standard_records());
//!     let orchestrator =
//!         GenerationOrchestrator::new(generator, provider, PipelineConfig::default());
//!     let outcome = orchestrator.plan(&MealPlanRequest::default()).await;
//!     println!("{} meals", outcome.meals.len());
//!     Ok(())
//! }
//! ```

use crate::aggregator::aggregate_all;
use crate::config::PipelineConfig;
use crate::constants::service_names;
use crate::constraints::{
    biometric_rule, merge, merge_list_values, parse_calorie_rules, rule_summaries,
    unscoped_per_meal_target, CalorieRuleInput, ConstraintTier, ProfileSource, StaticProfile,
};
use crate::decoder::{decode, DecodedResponse};
use crate::enforcer::{ConstraintEnforcer, Rejection};
use crate::errors::{AppError, AppResult};
use crate::ingredients::build_candidate;
use crate::llm::{
    recipe_system_prompt, run_with_tools, ChatMessage, GenerationRequest, IngredientLookupTool,
    PromptBuilder, TextGenerator, ToolLoopSettings,
};
use crate::logging::PipelineLogger;
use crate::models::{CalorieRule, ConstraintSet, DayPart, MealCandidate, NutritionFact};
use crate::nutrition::{FactProvider, NutritionResolver, SharedFactCache};
use crate::variety::plan_variety;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Sampling temperature when the generator can call tools
const TOOL_TEMPERATURE: f32 = 0.6;

/// Sampling temperature for plain generation
const PLAIN_TEMPERATURE: f32 = 0.9;

/// Completion token limit for generation and repair
const MAX_COMPLETION_TOKENS: u32 = 1500;

/// Pipeline state of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    /// Calling the generator
    Generate,
    /// Decoding generator text
    Decode,
    /// Converting decoded objects into candidates
    Normalize,
    /// Resolving facts and recomputing macros
    ResolveAggregate,
    /// Applying hard constraints
    Enforce,
    /// Terminal: result accepted
    Accept,
    /// Another attempt will run
    Retry,
    /// Terminal: slots filled with the closest calorie-rule violators
    Fallback,
}

impl GenerationState {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Decode => "decode",
            Self::Normalize => "normalize",
            Self::ResolveAggregate => "resolve_aggregate",
            Self::Enforce => "enforce",
            Self::Accept => "accept",
            Self::Retry => "retry",
            Self::Fallback => "fallback",
        }
    }

    /// Whether the request ends in this state
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Accept | Self::Fallback)
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One meal plan request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealPlanRequest {
    /// Site-wide defaults
    #[serde(default)]
    pub global: ConstraintTier,
    /// Stored user preferences; the profile's record is used when empty
    #[serde(default)]
    pub user: ConstraintTier,
    /// Values submitted with this request
    #[serde(default)]
    pub request: ConstraintTier,
    /// Raw calorie goals
    #[serde(default)]
    pub calorie_rules: Vec<CalorieRuleInput>,
    /// Favorite ingredients to feature
    #[serde(default)]
    pub favorites: Vec<String>,
    /// Inline profile data
    #[serde(default)]
    pub profile: Option<StaticProfile>,
}

/// Result of a meal plan request
#[derive(Debug, Clone, Serialize)]
pub struct MealPlanOutcome {
    /// Accepted meals with identifiers
    pub meals: Vec<MealCandidate>,
    /// Generation attempts made
    pub attempts: u32,
    /// Terminal state
    pub final_state: GenerationState,
    /// Whether calorie-rule violators filled missing slots
    pub fallback_used: bool,
    /// Every rejection across attempts
    pub rejections: Vec<Rejection>,
    /// Prompt sent to the generator
    pub prompt: String,
    /// Calorie goals shown in the prompt
    pub calorie_rule_summaries: Vec<String>,
    /// Merged constraints the plan was checked against
    pub constraints: ConstraintSet,
}

/// Result of a single attempt
struct AttemptResult {
    decoded: DecodedResponse,
    kept: Vec<MealCandidate>,
    rejected: Vec<Rejection>,
}

/// Drives meal plan requests through generation, verification, and enforcement
pub struct GenerationOrchestrator {
    generator: Arc<dyn TextGenerator>,
    provider: Arc<dyn FactProvider>,
    config: PipelineConfig,
    shared_cache: Option<SharedFactCache>,
}

impl GenerationOrchestrator {
    /// Create an orchestrator
    #[must_use]
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        provider: Arc<dyn FactProvider>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            generator,
            provider,
            config,
            shared_cache: None,
        }
    }

    /// Share resolved facts across requests
    #[must_use]
    pub fn with_shared_cache(mut self, cache: SharedFactCache) -> Self {
        self.shared_cache = Some(cache);
        self
    }

    /// Pipeline configuration in use
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn resolver(&self) -> NutritionResolver {
        let resolver = NutritionResolver::new(
            Arc::clone(&self.provider),
            self.config.resolver.clone(),
            self.config.timeouts.provider(),
        );
        match &self.shared_cache {
            Some(cache) => resolver.with_shared_cache(Arc::clone(cache)),
            None => resolver,
        }
    }

    /// Plan meals using the request's inline profile, if any
    pub async fn plan(&self, request: &MealPlanRequest) -> MealPlanOutcome {
        let profile = request
            .profile
            .as_ref()
            .map(|profile| profile as &dyn ProfileSource);
        self.plan_with_profile(request, profile).await
    }

    /// Plan meals with an explicit profile collaborator
    pub async fn plan_with_profile(
        &self,
        request: &MealPlanRequest,
        profile: Option<&dyn ProfileSource>,
    ) -> MealPlanOutcome {
        let span = info_span!(
            "meal_plan",
            request_id = %Uuid::new_v4(),
            generator = self.generator.name(),
        );
        self.run(request, profile).instrument(span).await
    }

    async fn run(
        &self,
        request: &MealPlanRequest,
        profile: Option<&dyn ProfileSource>,
    ) -> MealPlanOutcome {
        let constraints = merge_request(request, profile);

        let mut rules = parse_calorie_rules(&request.calorie_rules);
        if rules.is_empty() {
            if let Some(calories) = profile.and_then(ProfileSource::suggested_calories_per_meal) {
                info!(calories, "Adding calorie goal from profile biometrics");
                rules.push(biometric_rule(calories));
            }
        }
        let calorie_target = if constraints.calorie_target == 0 {
            unscoped_per_meal_target(&rules).unwrap_or(0)
        } else {
            constraints.calorie_target
        };
        let summaries = rule_summaries(&rules);

        let prompt = self
            .build_prompt(
                &constraints,
                calorie_target,
                summaries.clone(),
                profile.and_then(ProfileSource::prompt_preamble),
            )
            .await;
        let messages = vec![
            ChatMessage::system(recipe_system_prompt()),
            ChatMessage::user(prompt.clone()),
        ];

        let total = constraints.total_requested() as usize;
        let max_attempts = self.config.orchestrator.max_model_attempts.max(1);
        let mut attempts = 0;
        let mut meals = Vec::new();
        let mut rejections: Vec<Rejection> = Vec::new();
        let mut last_violations: Vec<Rejection> = Vec::new();

        while attempts < max_attempts {
            attempts += 1;
            let attempt = self
                .attempt(attempts, messages.clone(), &constraints, &rules)
                .await;

            PipelineLogger::log_attempt(
                attempts,
                attempt.decoded.meals.len(),
                attempt.kept.len(),
                attempt.rejected.len(),
                attempt.decoded.partial,
            );

            last_violations = attempt
                .rejected
                .iter()
                .filter(|rejection| rejection.reason.calorie_rule().is_some())
                .cloned()
                .collect();
            let all_rejected = attempt.kept.is_empty() && !attempt.rejected.is_empty();
            let short = total > 0 && attempt.kept.len() < total;
            let partial = attempt.decoded.partial;
            rejections.extend(attempt.rejected);
            meals = attempt.kept;

            if attempts < max_attempts && (partial || all_rejected || short) {
                warn!(
                    state = %GenerationState::Retry,
                    attempt = attempts,
                    max_attempts,
                    meals = meals.len(),
                    requested = total,
                    partial,
                    all_rejected,
                    "Retrying generation"
                );
                continue;
            }
            break;
        }

        let mut final_state = GenerationState::Accept;
        let mut fallback_used = false;
        if total > 0 && meals.len() < total && !last_violations.is_empty() {
            let filled = fill_from_violations(&mut meals, last_violations, &constraints);
            warn!(
                state = %GenerationState::Fallback,
                filled,
                "Filled slots with closest calorie matches despite rule violations"
            );
            final_state = GenerationState::Fallback;
            fallback_used = filled > 0;
        }

        for meal in &mut meals {
            meal.id = Some(Uuid::new_v4().to_string());
        }

        info!(
            state = %final_state,
            meal.count = meals.len(),
            attempts,
            fallback = fallback_used,
            "Meal plan finished"
        );

        MealPlanOutcome {
            meals,
            attempts,
            final_state,
            fallback_used,
            rejections,
            prompt,
            calorie_rule_summaries: summaries,
            constraints,
        }
    }

    async fn build_prompt(
        &self,
        constraints: &ConstraintSet,
        calorie_target: u32,
        summaries: Vec<String>,
        preamble: Option<String>,
    ) -> String {
        let mut resolver = self.resolver();
        let (focus, facts) = plan_variety(
            &mut resolver,
            constraints,
            self.config.orchestrator.favorite_limit,
        )
        .await;

        PromptBuilder::new(constraints)
            .with_calorie_target(calorie_target)
            .with_rule_summaries(summaries)
            .with_variety_context(focus.context(constraints.has_distinct_day_parts()))
            .with_facts(facts.as_ref())
            .with_preamble(preamble)
            .build()
    }

    async fn attempt(
        &self,
        attempt: u32,
        messages: Vec<ChatMessage>,
        constraints: &ConstraintSet,
        rules: &[CalorieRule],
    ) -> AttemptResult {
        info!(state = %GenerationState::Generate, attempt, "Requesting meal plan");
        let (text, seeded_facts) = match self.generate_text(messages).await {
            Ok(generated) => generated,
            Err(error) => {
                warn!(
                    attempt,
                    error = %error,
                    transient = error.code.is_transient(),
                    "Generator call failed"
                );
                (String::new(), Vec::new())
            }
        };

        info!(state = %GenerationState::Decode, attempt, chars = text.len(), "Decoding response");
        let decoded = decode(&text, Some(self.generator.as_ref()), MAX_COMPLETION_TOKENS).await;

        info!(
            state = %GenerationState::Normalize,
            attempt,
            meals = decoded.meals.len(),
            "Normalizing meals"
        );
        let mut candidates: Vec<MealCandidate> =
            decoded.meals.iter().map(build_candidate).collect();

        info!(
            state = %GenerationState::ResolveAggregate,
            attempt,
            seeded = seeded_facts.len(),
            "Recomputing macros"
        );
        let mut resolver = self.resolver();
        for (term, fact) in seeded_facts {
            resolver.seed(&term, fact);
        }
        aggregate_all(&mut candidates, &mut resolver).await;

        info!(state = %GenerationState::Enforce, attempt, "Applying constraints");
        let enforcer = ConstraintEnforcer::new(constraints, rules, &self.config.calorie);
        let outcome = enforcer.filter(candidates);

        AttemptResult {
            decoded,
            kept: outcome.kept,
            rejected: outcome.rejected,
        }
    }

    /// Generator text plus any facts the generator looked up through tools
    async fn generate_text(
        &self,
        messages: Vec<ChatMessage>,
    ) -> AppResult<(String, Vec<(String, NutritionFact)>)> {
        let generator = self.generator.as_ref();
        if generator.capabilities().supports_function_calling() {
            let tool = IngredientLookupTool::new(self.resolver());
            let settings = ToolLoopSettings {
                max_rounds: self.config.orchestrator.max_tool_rounds,
                temperature: TOOL_TEMPERATURE,
                max_tokens: MAX_COMPLETION_TOKENS,
            };
            let text = self
                .bounded(run_with_tools(generator, &tool, messages, settings))
                .await?;
            return Ok((text, tool.fact_cache()));
        }

        let request = GenerationRequest::new(messages)
            .with_temperature(PLAIN_TEMPERATURE)
            .with_max_tokens(MAX_COMPLETION_TOKENS);
        let response = self.bounded(generator.generate(&request)).await?;
        Ok((response.content.unwrap_or_default(), Vec::new()))
    }

    async fn bounded<T>(&self, call: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        let limit = self.config.timeouts.generator();
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| AppError::timeout(service_names::LLM, limit.as_secs()))?
    }
}

/// Merge the three tiers, folding request favorites and the profile record in
fn merge_request(request: &MealPlanRequest, profile: Option<&dyn ProfileSource>) -> ConstraintSet {
    let user = if request.user.is_empty() {
        profile
            .and_then(ProfileSource::constraint_record)
            .unwrap_or_default()
    } else {
        request.user.clone()
    };

    let mut submitted = request.request.clone();
    if !request.favorites.is_empty() {
        let listed = Value::from(request.favorites.clone());
        let favorites = merge_list_values([Some(&listed), submitted.get("favorites")]);
        submitted.insert("favorites".to_owned(), Value::from(favorites));
    }

    merge(&request.global, &user, &submitted)
}

/// Append the violators closest to their rule's target until the counts are met
///
/// A violator is skipped when its day-part already holds the requested
/// number of meals. Returns how many meals were added.
fn fill_from_violations(
    meals: &mut Vec<MealCandidate>,
    mut violations: Vec<Rejection>,
    constraints: &ConstraintSet,
) -> usize {
    let total = constraints.total_requested() as usize;
    violations.sort_by_key(|rejection| {
        rejection
            .reason
            .calorie_rule()
            .map_or(i64::MAX, |rule| (rejection.meal.calories - i64::from(rule.value)).abs())
    });

    let mut used: HashMap<DayPart, u32> = HashMap::new();
    for day_part in meals.iter().filter_map(MealCandidate::day_part) {
        *used.entry(day_part).or_insert(0) += 1;
    }

    let mut filled = 0;
    for rejection in violations {
        if meals.len() >= total {
            break;
        }
        let Some(rule) = rejection.reason.calorie_rule() else {
            continue;
        };
        if let Some(day_part) = rejection.meal.day_part() {
            let slot = used.entry(day_part).or_insert(0);
            if *slot >= constraints.count_for(day_part) {
                continue;
            }
            *slot += 1;
        }
        let mut meal = rejection.meal.clone();
        meal.calorie_warning = Some(format!(
            "{} kcal (goal {} {})",
            meal.calories,
            rule.operator.text(),
            rule.value
        ));
        meals.push(meal);
        filled += 1;
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enforcer::RejectionReason;
    use mealforge_core::models::CalorieOperator;
    use serde_json::json;

    fn violation(name: &str, calories: i64, rule: &CalorieRule) -> Rejection {
        Rejection {
            meal: MealCandidate {
                name: name.to_owned(),
                calories,
                ..MealCandidate::default()
            },
            reason: RejectionReason::CalorieRule {
                rule: rule.clone(),
                calories,
            },
        }
    }

    #[test]
    fn test_fill_prefers_closest_violators() {
        let rule = CalorieRule::per_meal(CalorieOperator::Under, 500);
        let mut meals = Vec::new();
        let filled = fill_from_violations(
            &mut meals,
            vec![
                violation("far", 900, &rule),
                violation("near", 520, &rule),
                violation("middle", 700, &rule),
            ],
            &ConstraintSet {
                breakfast_count: 0,
                lunch_count: 0,
                dinner_count: 2,
                ..ConstraintSet::default()
            },
        );
        assert_eq!(filled, 2);
        let names: Vec<&str> = meals.iter().map(|meal| meal.name.as_str()).collect();
        assert_eq!(names, vec!["near", "middle"]);
        assert_eq!(
            meals[0].calorie_warning.as_deref(),
            Some("520 kcal (goal under 500)")
        );
    }

    #[test]
    fn test_fill_skips_violators_for_full_day_parts() {
        let rule = CalorieRule::per_meal(CalorieOperator::Under, 300);
        let tagged = |name: &str, meal_type: &str, calories: i64| {
            let mut rejection = violation(name, calories, &rule);
            rejection.meal.meal_type = meal_type.to_owned();
            rejection
        };
        let mut meals = vec![MealCandidate {
            name: "kept breakfast".to_owned(),
            meal_type: "breakfast".to_owned(),
            calories: 250,
            ..MealCandidate::default()
        }];
        let filled = fill_from_violations(
            &mut meals,
            vec![
                tagged("extra breakfast", "breakfast", 320),
                tagged("dinner", "dinner", 450),
            ],
            &ConstraintSet {
                breakfast_count: 1,
                lunch_count: 0,
                dinner_count: 1,
                ..ConstraintSet::default()
            },
        );
        assert_eq!(filled, 1);
        let names: Vec<&str> = meals.iter().map(|meal| meal.name.as_str()).collect();
        assert_eq!(names, vec!["kept breakfast", "dinner"]);
    }

    #[test]
    fn test_request_favorites_lead_merged_favorites() {
        let request = MealPlanRequest {
            request: json!({"favorites": "tofu"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
            favorites: vec!["Salmon".to_owned()],
            ..MealPlanRequest::default()
        };
        let merged = merge_request(&request, None);
        assert_eq!(merged.favorites, vec!["salmon", "tofu"]);
    }

    #[test]
    fn test_profile_record_fills_empty_user_tier() {
        let profile = StaticProfile {
            constraints: json!({"num1": 2})
                .as_object()
                .cloned()
                .unwrap_or_default(),
            ..StaticProfile::default()
        };
        let merged = merge_request(&MealPlanRequest::default(), Some(&profile));
        assert_eq!(merged.breakfast_count, 2);
    }

    #[test]
    fn test_terminal_states() {
        assert!(GenerationState::Accept.is_terminal());
        assert!(GenerationState::Fallback.is_terminal());
        assert!(!GenerationState::Retry.is_terminal());
    }
}
