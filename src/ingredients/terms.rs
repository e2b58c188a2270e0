// ABOUTME: Lookup-term normalization for resolving ingredients against nutrition facts
// ABOUTME: Drops cooking and measurement modifiers, derives singular token variants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use mealforge_core::constants::limits::MAX_TERM_TOKENS;
use std::collections::BTreeSet;

/// Words removed from ingredient names before lookup
const TERM_STOPWORDS: &[&str] = &[
    "fresh", "chopped", "minced", "diced", "large", "small", "medium", "sliced", "fillet",
    "fillets", "boneless", "skinless", "ground", "lean", "ripe", "whole", "pieces", "halved",
    "to", "taste", "cup", "cups", "tbsp", "tablespoon", "tablespoons", "tsp", "teaspoon",
    "teaspoons", "ounce", "ounces", "oz", "gram", "grams", "g", "lb", "pound", "pounds",
];

/// Seasoning terms that carry no meaningful macros and are never resolved
const CONDIMENT_TERMS: &[&str] = &[
    "salt",
    "pepper",
    "salt pepper",
    "black pepper",
    "seasoning",
    "seasonings",
    "spice blend",
    "herb blend",
];

fn strip_parentheticals(text: &str) -> String {
    let mut depth = 0_usize;
    text.chars()
        .map(|c| match c {
            '(' => {
                depth += 1;
                ' '
            }
            ')' => {
                depth = depth.saturating_sub(1);
                ' '
            }
            _ if depth > 0 => ' ',
            other => other,
        })
        .collect()
}

/// Reduce an ingredient name to a lookup term ("2 large Eggs (beaten)" -> "eggs")
#[must_use]
pub fn normalize_term(name: &str) -> String {
    let lowered = strip_parentheticals(&name.to_lowercase());
    let letters: String = lowered
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_whitespace() { c } else { ' ' })
        .collect();
    letters
        .split_whitespace()
        .filter(|token| !TERM_STOPWORDS.contains(token))
        .take(MAX_TERM_TOKENS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokens of a term plus their singular variants
#[must_use]
pub fn term_tokens(term: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    for token in normalize_term(term).split_whitespace() {
        tokens.insert(token.to_owned());
        if token.len() > 3 && token.ends_with("es") {
            tokens.insert(token[..token.len() - 2].to_owned());
        } else if token.len() > 2 && token.ends_with('s') {
            tokens.insert(token[..token.len() - 1].to_owned());
        }
    }
    tokens
}

/// Order-insensitive cache key built from a term's tokens
#[must_use]
pub fn sorted_token_key(term: &str) -> String {
    term_tokens(term).into_iter().collect::<Vec<_>>().join(" ")
}

/// Whether a normalized term is a seasoning that is never resolved
#[must_use]
pub fn is_condiment(term: &str) -> bool {
    CONDIMENT_TERMS.contains(&term.trim())
}
