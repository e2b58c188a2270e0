// ABOUTME: Constraint models: day-parts, dietary restrictions, calorie rules, merged constraint set
// ABOUTME: Lossy parsing from form-style text coerces unknown values to neutral defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::fmt;

/// Breakfast, lunch, or dinner classification of a meal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DayPart {
    /// Morning meal
    Breakfast,
    /// Midday meal
    Lunch,
    /// Evening meal
    Dinner,
}

impl DayPart {
    /// All day-parts in display order
    pub const ALL: [Self; 3] = [Self::Breakfast, Self::Lunch, Self::Dinner];

    /// Classify a free-form meal tag by prefix ("Dinner (light)" is a dinner)
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_lowercase();
        if tag.starts_with("breakfast") {
            Some(Self::Breakfast)
        } else if tag.starts_with("lunch") {
            Some(Self::Lunch)
        } else if tag.starts_with("dinner") {
            Some(Self::Dinner)
        } else {
            None
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        }
    }

    /// Plural form used in aggregate rule labels
    #[must_use]
    pub const fn plural(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfasts",
            Self::Lunch => "lunches",
            Self::Dinner => "dinners",
        }
    }
}

impl fmt::Display for DayPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported dietary restriction values
///
/// Anything outside this set is coerced to `None` when constraints are merged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DietaryRestriction {
    /// No restriction
    #[default]
    None,
    /// Eats everything
    Omnivore,
    /// No meat or seafood
    Vegetarian,
    /// No animal products
    Vegan,
    /// Seafood but no meat
    Pescatarian,
    /// No gluten-bearing grains
    GlutenFree,
    /// Very low carbohydrate
    Keto,
    /// No grains, legumes, dairy, or refined foods
    Paleo,
    /// Reduced carbohydrate
    LowCarb,
    /// No dairy
    DairyFree,
    /// Kosher dietary laws
    Kosher,
}

impl DietaryRestriction {
    /// Every supported restriction
    pub const ALL: [Self; 11] = [
        Self::None,
        Self::Omnivore,
        Self::Vegetarian,
        Self::Vegan,
        Self::Pescatarian,
        Self::GlutenFree,
        Self::Keto,
        Self::Paleo,
        Self::LowCarb,
        Self::DairyFree,
        Self::Kosher,
    ];

    /// Parse a restriction, coercing unknown values to `None`
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        let key = s.trim().to_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|restriction| restriction.as_str() == key)
            .unwrap_or_else(|| {
                if !key.is_empty() {
                    tracing::debug!(
                        restriction = %key,
                        "Unknown dietary restriction coerced to none"
                    );
                }
                Self::None
            })
    }

    /// Canonical lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Omnivore => "omnivore",
            Self::Vegetarian => "vegetarian",
            Self::Vegan => "vegan",
            Self::Pescatarian => "pescatarian",
            Self::GlutenFree => "gluten-free",
            Self::Keto => "keto",
            Self::Paleo => "paleo",
            Self::LowCarb => "low-carb",
            Self::DairyFree => "dairy-free",
            Self::Kosher => "kosher",
        }
    }
}

impl fmt::Display for DietaryRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sanitized, merged constraint set for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSet {
    /// Effective dietary restriction
    pub dietary_restriction: DietaryRestriction,
    /// Requested breakfasts
    pub breakfast_count: u32,
    /// Requested lunches
    pub lunch_count: u32,
    /// Requested dinners
    pub dinner_count: u32,
    /// Per-meal calorie target (0 means unset)
    pub calorie_target: u32,
    /// Lowercase banned terms, diet expansion first
    pub banned_ingredients: Vec<String>,
    /// Lowercase disliked terms
    pub disliked_ingredients: Vec<String>,
    /// Favorite ingredient terms used as pantry anchors
    pub favorites: Vec<String>,
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self {
            dietary_restriction: DietaryRestriction::None,
            breakfast_count: 0,
            lunch_count: 0,
            dinner_count: crate::constants::limits::DEFAULT_DINNER_COUNT,
            calorie_target: 0,
            banned_ingredients: Vec::new(),
            disliked_ingredients: Vec::new(),
            favorites: Vec::new(),
        }
    }
}

impl ConstraintSet {
    /// Requested count for one day-part
    #[must_use]
    pub const fn count_for(&self, day_part: DayPart) -> u32 {
        match day_part {
            DayPart::Breakfast => self.breakfast_count,
            DayPart::Lunch => self.lunch_count,
            DayPart::Dinner => self.dinner_count,
        }
    }

    /// Total number of meals requested across all day-parts
    #[must_use]
    pub const fn total_requested(&self) -> u32 {
        self.breakfast_count + self.lunch_count + self.dinner_count
    }

    /// True when more than one day-part is requested
    #[must_use]
    pub fn has_distinct_day_parts(&self) -> bool {
        DayPart::ALL
            .iter()
            .filter(|part| self.count_for(**part) > 0)
            .count()
            > 1
    }
}

/// Comparison operator of a calorie rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CalorieOperator {
    /// Within a tolerance of the target
    About,
    /// Greater than or equal to the target
    AtLeast,
    /// Strictly below the target
    Under,
}

impl CalorieOperator {
    /// Parse operator text; unknown text falls back to `About`
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        match text.trim().to_lowercase().replace('_', " ").as_str() {
            "at least" => Self::AtLeast,
            "under" => Self::Under,
            _ => Self::About,
        }
    }

    /// Human-readable operator text
    #[must_use]
    pub const fn text(&self) -> &'static str {
        match self {
            Self::About => "about",
            Self::AtLeast => "at least",
            Self::Under => "under",
        }
    }
}

/// What a calorie rule applies to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalorieScope {
    /// Each individual meal, optionally only one day-part
    PerMeal {
        /// Day-part restriction, `None` for every meal
        day_part: Option<DayPart>,
    },
    /// Totals across a day-part or the whole plan (recognized, not enforced)
    Aggregate {
        /// Day-part restriction, `None` for all meals
        day_part: Option<DayPart>,
    },
}

impl CalorieScope {
    /// Parse scope text such as "each breakfast" or "all meals"
    #[must_use]
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        let (per_meal, rest) = if let Some(rest) = text.strip_prefix("each ") {
            (true, rest.trim())
        } else if let Some(rest) = text.strip_prefix("all ") {
            (false, rest.trim())
        } else {
            return None;
        };

        let day_part = match rest {
            "meal" | "meals" => None,
            other => Some(
                DayPart::ALL
                    .into_iter()
                    .find(|part| other == part.as_str() || other == part.plural())?,
            ),
        };

        Some(if per_meal {
            Self::PerMeal { day_part }
        } else {
            Self::Aggregate { day_part }
        })
    }

    /// Display label ("each meal", "all dinners")
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::PerMeal { day_part: None } => "each meal".to_owned(),
            Self::PerMeal {
                day_part: Some(part),
            } => format!("each {part}"),
            Self::Aggregate { day_part: None } => "all meals".to_owned(),
            Self::Aggregate {
                day_part: Some(part),
            } => format!("all {}", part.plural()),
        }
    }
}

/// A single calorie goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalorieRule {
    /// Comparison operator
    pub operator: CalorieOperator,
    /// Target calories (always > 0)
    pub value: u32,
    /// Where the rule applies
    pub scope: CalorieScope,
    /// Origin of an automatically added rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl CalorieRule {
    /// Parse a rule from form-style text; returns `None` for unusable input
    #[must_use]
    pub fn parse(operator: &str, value: &str, scope: &str) -> Option<Self> {
        let value: i64 = value.trim().parse().ok()?;
        if value <= 0 {
            return None;
        }
        Some(Self {
            operator: CalorieOperator::from_text(operator),
            value: u32::try_from(value).ok()?,
            scope: CalorieScope::from_text(scope)?,
            source: None,
        })
    }

    /// Per-meal rule over every meal
    #[must_use]
    pub const fn per_meal(operator: CalorieOperator, value: u32) -> Self {
        Self {
            operator,
            value,
            scope: CalorieScope::PerMeal { day_part: None },
            source: None,
        }
    }

    /// Whether this rule is enforced meal-by-meal
    #[must_use]
    pub const fn is_per_meal(&self) -> bool {
        matches!(self.scope, CalorieScope::PerMeal { .. })
    }

    /// Whether this per-meal rule covers a meal of the given day-part
    #[must_use]
    pub fn applies_to(&self, day_part: Option<DayPart>) -> bool {
        match self.scope {
            CalorieScope::PerMeal { day_part: None } => true,
            CalorieScope::PerMeal {
                day_part: Some(scope),
            } => day_part == Some(scope),
            CalorieScope::Aggregate { .. } => false,
        }
    }

    /// Check calories against this rule, given the `about` tolerance in kcal
    #[must_use]
    pub fn is_violated_by(&self, calories: i64, tolerance: u32) -> bool {
        let target = i64::from(self.value);
        match self.operator {
            CalorieOperator::About => (calories - target).abs() > i64::from(tolerance),
            CalorieOperator::AtLeast => calories < target,
            CalorieOperator::Under => calories >= target,
        }
    }

    /// Prompt summary ("About 600 calories for each meal")
    #[must_use]
    pub fn summary(&self) -> String {
        let text = self.operator.text();
        let mut chars = text.chars();
        let capitalized = chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect::<String>()
        });
        format!(
            "{capitalized} {} calories for {}",
            self.value,
            self.scope.label()
        )
    }
}
