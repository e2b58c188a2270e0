// ABOUTME: Builds the meal plan generation prompt from merged constraints and grounding facts
// ABOUTME: Includes schema, requested counts, diet, calorie goals, variety cues, and fact block
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use mealforge_core::models::{ConstraintSet, DietaryRestriction, RetrievalBatch};
use std::fmt::Write as _;

/// Output schema the generator is asked to follow
pub const MEAL_SCHEMA: &str = concat!(
    r#"{"meals":[{"mealType":"breakfast|lunch|dinner","name":"string","ingredients":["string"],"#,
    r#""calories":0,"instructions":"string","carbs":0,"fats":0,"protein":0}]}"#
);

/// Builder for the user prompt of one generation request
#[derive(Debug, Clone)]
pub struct PromptBuilder<'a> {
    constraints: &'a ConstraintSet,
    calorie_target: u32,
    rule_summaries: Vec<String>,
    variety_context: Option<String>,
    facts: Option<&'a RetrievalBatch>,
    preamble: Option<String>,
}

impl<'a> PromptBuilder<'a> {
    /// Start from merged constraints
    #[must_use]
    pub const fn new(constraints: &'a ConstraintSet) -> Self {
        Self {
            constraints,
            calorie_target: constraints.calorie_target,
            rule_summaries: Vec::new(),
            variety_context: None,
            facts: None,
            preamble: None,
        }
    }

    /// Override the per-meal calorie target shown to the generator
    #[must_use]
    pub const fn with_calorie_target(mut self, calories: u32) -> Self {
        self.calorie_target = calories;
        self
    }

    /// Calorie goal summaries
    #[must_use]
    pub fn with_rule_summaries(mut self, summaries: Vec<String>) -> Self {
        self.rule_summaries = summaries;
        self
    }

    /// Variety cue sentence
    #[must_use]
    pub fn with_variety_context(mut self, context: Option<String>) -> Self {
        self.variety_context = context.filter(|text| !text.trim().is_empty());
        self
    }

    /// Retrieved facts to ground the generator
    #[must_use]
    pub const fn with_facts(mut self, facts: Option<&'a RetrievalBatch>) -> Self {
        self.facts = facts;
        self
    }

    /// Free text placed before the prompt
    #[must_use]
    pub fn with_preamble(mut self, preamble: Option<String>) -> Self {
        self.preamble = preamble.filter(|text| !text.trim().is_empty());
        self
    }

    fn extras(&self) -> Vec<String> {
        let constraints = self.constraints;
        let mut extras = Vec::new();
        if constraints.dietary_restriction != DietaryRestriction::None {
            extras.push(format!(
                "Dietary constraints: {}",
                constraints.dietary_restriction
            ));
        }
        if self.calorie_target > 0 {
            extras.push(format!(
                "Per meal target ~{} calories (±10%)",
                self.calorie_target
            ));
        }
        if !constraints.banned_ingredients.is_empty() {
            extras.push(format!(
                "Never use these ingredients: {}",
                constraints.banned_ingredients.join(", ")
            ));
        }
        if !constraints.disliked_ingredients.is_empty() {
            extras.push(format!(
                "Avoid these disliked ingredients when possible: {}",
                constraints.disliked_ingredients.join(", ")
            ));
        }
        extras
    }

    /// Render the prompt
    #[must_use]
    pub fn build(&self) -> String {
        let constraints = self.constraints;
        let extras = self.extras();
        let extras_line = if extras.is_empty() {
            "No specific dietary constraints.".to_owned()
        } else {
            extras.join(". ")
        };

        let mut prompt = String::new();
        let _ = writeln!(
            prompt,
            "You are a recipe generator that focuses on healthy, and delicious meals."
        );
        let _ = writeln!(prompt, "Return ONLY valid JSON with the exact schema: {MEAL_SCHEMA}");
        let _ = writeln!(prompt);
        let _ = writeln!(prompt, "Requirements:");
        let _ = writeln!(
            prompt,
            "1. Generate {} breakfast, {} lunch, and {} dinner recipes.",
            constraints.breakfast_count, constraints.lunch_count, constraints.dinner_count
        );
        let _ = writeln!(prompt, "2. Set mealType correctly for each meal.");
        let _ = writeln!(
            prompt,
            "3. Each meal should have a unique name and a list of ingredients; write every ingredient with a quantity and its weight in grams, e.g. \"1 cup rolled oats (80 g)\"."
        );
        let _ = writeln!(prompt, "4. Provide clear, step-by-step cooking instructions.");
        let _ = writeln!(
            prompt,
            "5. Ensure nutritional values (calories, carbs, fats, protein) are realistic and appropriate for the meal type."
        );
        let _ = writeln!(prompt, "6. Meals should be easy to prepare with common ingredients.");
        let _ = writeln!(prompt, "7. {extras_line}");
        let _ = writeln!(
            prompt,
            "8. Avoid repetition in meal names and ingredients across all meals."
        );

        if !self.rule_summaries.is_empty() {
            let _ = writeln!(prompt);
            let _ = writeln!(prompt, "Calorie goals:");
            for summary in &self.rule_summaries {
                let _ = writeln!(prompt, "- {summary}");
            }
        }

        if let Some(context) = &self.variety_context {
            let _ = writeln!(prompt);
            let _ = writeln!(prompt, "Variety: {context}");
        }

        if let Some(block) = self
            .facts
            .map(|batch| batch.to_prompt_block(RetrievalBatch::DEFAULT_HEADING))
            .filter(|block| !block.is_empty())
        {
            let _ = writeln!(prompt);
            let _ = writeln!(prompt, "{block}");
        }

        prompt.push_str("JSON only, no extra text.");

        match &self.preamble {
            Some(preamble) => format!("{}\n\n{prompt}", preamble.trim()),
            None => prompt,
        }
    }
}
