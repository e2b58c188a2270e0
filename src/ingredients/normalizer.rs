// ABOUTME: Ingredient normalizer turning free-text or structured entries into canonical quantities
// ABOUTME: Parses mixed fractions, known units, inline gram/ounce weights, and inline calorie hints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Ingredient normalization
//!
//! Normalization is total: every input produces an [`IngredientEntry`]. The
//! worst case is a weight-less, unit-less entry carrying a cleaned display name.

use mealforge_core::constants::units::{
    GRAMS_PER_KILOGRAM, GRAMS_PER_OUNCE, GRAMS_PER_POUND, MAX_FRACTION_DENOMINATOR,
};
use mealforge_core::models::IngredientEntry;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Counts assumed for countable ingredients listed without a quantity
const DEFAULT_COUNTS: &[(&str, f64)] = &[
    ("egg", 1.0),
    ("eggs", 1.0),
    ("onion", 1.0),
    ("shallot", 1.0),
    ("tomato", 2.0),
    ("tomatoes", 2.0),
    ("lemon", 1.0),
    ("avocado", 1.0),
    ("clove", 1.0),
];

fn leading_quantity_regex() -> Option<&'static Regex> {
    static LEADING_QUANTITY: OnceLock<Option<Regex>> = OnceLock::new();
    LEADING_QUANTITY
        .get_or_init(|| {
            Regex::new(r"^(?P<qty>\d+\s+\d+/\d+|\d+/\d+|\d+\.\d+|\d+)\s*(?P<rest>.*)$").ok()
        })
        .as_ref()
}

fn weight_regex() -> Option<&'static Regex> {
    static WEIGHT: OnceLock<Option<Regex>> = OnceLock::new();
    WEIGHT
        .get_or_init(|| {
            // Mixed numbers and fractions; never start inside another number
            Regex::new(concat!(
                r"(?i)(?:^|[^\d/.])",
                r"(\d+\s+\d+/\d+|\d+/\d+|\d+(?:\.\d+)?)",
                r"\s*(g|gram|grams|oz|ounce|ounces)\b",
            ))
            .ok()
        })
        .as_ref()
}

fn kcal_regex() -> Option<&'static Regex> {
    static KCAL: OnceLock<Option<Regex>> = OnceLock::new();
    KCAL.get_or_init(|| Regex::new(r"(?i)\(\s*(\d+)\s*kcal\s*\)").ok())
        .as_ref()
}

fn broken_fraction_regex() -> Option<&'static Regex> {
    static BROKEN_FRACTION: OnceLock<Option<Regex>> = OnceLock::new();
    BROKEN_FRACTION
        .get_or_init(|| Regex::new(r"(\d+)\s*[–—-]\s*/\s*(\d+)").ok())
        .as_ref()
}

/// Canonical short token for a known unit word, or `None` if the word is not a unit
#[must_use]
pub fn canonical_unit(word: &str) -> Option<&'static str> {
    let unit = match word.trim().trim_end_matches('.').to_lowercase().as_str() {
        "tsp" | "tsps" | "teaspoon" | "teaspoons" => "tsp",
        "tbsp" | "tbsps" | "tbs" | "tablespoon" | "tablespoons" => "tbsp",
        "cup" | "cups" | "c" => "cup",
        "oz" | "ounce" | "ounces" => "oz",
        "g" | "gr" | "gram" | "grams" => "g",
        "kg" | "kgs" | "kilogram" | "kilograms" => "kg",
        "lb" | "lbs" | "pound" | "pounds" => "lb",
        "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => "ml",
        "l" | "liter" | "liters" | "litre" | "litres" => "l",
        "slice" | "slices" => "slice",
        "clove" | "cloves" => "clove",
        "can" | "cans" => "can",
        "pinch" | "pinches" => "pinch",
        "dash" | "dashes" => "dash",
        "piece" | "pieces" | "pc" | "pcs" => "piece",
        "stalk" | "stalks" => "stalk",
        "sprig" | "sprigs" => "sprig",
        "bunch" | "bunches" => "bunch",
        "handful" | "handfuls" => "handful",
        "package" | "packages" | "pkg" => "package",
        _ => return None,
    };
    Some(unit)
}

/// Parse a quantity token: integer, decimal, simple fraction, or mixed number
///
/// A zero denominator yields `None`.
#[must_use]
pub fn parse_quantity(token: &str) -> Option<f64> {
    let token = token.trim();
    let mut parts = token.split_whitespace();
    let first = parts.next()?;
    match (parts.next(), parts.next()) {
        (None, _) => parse_simple_quantity(first),
        (Some(fraction), None) if fraction.contains('/') && !first.contains('/') => {
            let whole: f64 = first.parse().ok()?;
            Some(whole + parse_fraction(fraction)?)
        }
        _ => None,
    }
}

fn parse_simple_quantity(token: &str) -> Option<f64> {
    if token.contains('/') {
        parse_fraction(token)
    } else {
        token.parse::<f64>().ok().filter(|value| value.is_finite())
    }
}

fn parse_fraction(token: &str) -> Option<f64> {
    let (numerator, denominator) = token.split_once('/')?;
    let numerator: f64 = numerator.trim().parse().ok()?;
    let denominator: f64 = denominator.trim().parse().ok()?;
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Render a quantity as a friendly fraction with denominator at most 8 (1.5 -> "1 1/2")
#[must_use]
pub fn format_fraction(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();
    if (magnitude - magnitude.round()).abs() < 1e-9 {
        return format!("{sign}{}", magnitude.round() as u64);
    }

    let (numerator, denominator) = (1..=u64::from(MAX_FRACTION_DENOMINATOR))
        .map(|den| ((magnitude * den as f64).round() as u64, den))
        .min_by(|(num_a, den_a), (num_b, den_b)| {
            let err_a = (magnitude - *num_a as f64 / *den_a as f64).abs();
            let err_b = (magnitude - *num_b as f64 / *den_b as f64).abs();
            err_a.total_cmp(&err_b)
        })
        .unwrap_or((magnitude.round() as u64, 1));

    let divisor = gcd(numerator, denominator).max(1);
    let (numerator, denominator) = (numerator / divisor, denominator / divisor);

    if denominator == 1 {
        return format!("{sign}{numerator}");
    }
    let whole = numerator / denominator;
    let remainder = numerator % denominator;
    if whole == 0 {
        format!("{sign}{remainder}/{denominator}")
    } else {
        format!("{sign}{whole} {remainder}/{denominator}")
    }
}

/// Conservative quantity for countable ingredients named without one
#[must_use]
pub fn infer_default_count(name: &str) -> Option<f64> {
    let lowered = name.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();
    DEFAULT_COUNTS
        .iter()
        .find(|(key, _)| words.contains(key))
        .map(|(_, count)| *count)
}

/// Gram and ounce weights stated anywhere in the text
///
/// Returns `(grams, ounces)` where each is the last matching value of that unit.
#[must_use]
pub fn extract_inline_weight(text: &str) -> (Option<f64>, Option<f64>) {
    let Some(regex) = weight_regex() else {
        return (None, None);
    };
    let mut grams = None;
    let mut ounces = None;
    for captures in regex.captures_iter(text) {
        let Some(value) = captures.get(1).and_then(|m| parse_quantity(m.as_str())) else {
            continue;
        };
        match captures.get(2).map(|m| m.as_str().to_lowercase()).as_deref() {
            Some("g" | "gram" | "grams") => grams = Some(value),
            Some(_) => ounces = Some(value),
            None => {}
        }
    }
    (grams, ounces)
}

/// Strip dash decorations and stray punctuation, collapsing whitespace
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            '-' | '–' | '—' => Some(' '),
            ':' | '"' | '(' | ')' => None,
            other => Some(other),
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn pre_clean(text: &str) -> String {
    let repaired = broken_fraction_regex().map_or_else(
        || text.to_owned(),
        |regex| regex.replace_all(text, "$1 1/$2").into_owned(),
    );
    let collapsed = repaired
        .replace(['–', '—'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    collapsed
        .trim_start_matches(['-', '–', '—'])
        .trim_start()
        .to_owned()
}

fn apply_weights(entry: &mut IngredientEntry, grams: Option<f64>, ounces: Option<f64>) {
    match (grams, ounces) {
        (Some(g), Some(oz)) => {
            entry.weight_g = Some(g);
            entry.weight_oz = Some(oz);
        }
        (Some(g), None) => entry.set_weight_grams(g),
        (None, Some(oz)) => entry.set_weight_ounces(oz),
        (None, None) => {}
    }
}

/// Weight implied by a quantity in a mass unit ("2 lb" -> 907 g)
fn weight_from_unit(quantity: Option<f64>, unit: Option<&str>) -> Option<f64> {
    let quantity = quantity?;
    match unit? {
        "g" => Some(quantity),
        "oz" => Some(quantity * GRAMS_PER_OUNCE),
        "lb" => Some(quantity * GRAMS_PER_POUND),
        "kg" => Some(quantity * GRAMS_PER_KILOGRAM),
        _ => None,
    }
}

fn finish_quantity(entry: &mut IngredientEntry) {
    if entry.quantity.is_none() {
        entry.quantity = infer_default_count(&entry.name);
    }
    if entry.quantity_display.is_none() {
        entry.quantity_display = entry.quantity.map(format_fraction);
    }
    if !entry.has_weight() {
        if let Some(grams) = weight_from_unit(entry.quantity, entry.unit.as_deref()) {
            entry.set_weight_grams(grams);
        }
    }
}

/// Normalize a free-text ingredient line
#[must_use]
pub fn normalize_text(raw: &str) -> IngredientEntry {
    let mut entry = IngredientEntry::named(String::new(), raw.trim());
    let cleaned = pre_clean(raw.trim());
    if cleaned.is_empty() {
        return entry;
    }

    let kcal_regex = kcal_regex();
    entry.estimated_calories = kcal_regex
        .and_then(|regex| regex.captures(&cleaned))
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse().ok());
    let without_kcal = kcal_regex.map_or_else(
        || cleaned.clone(),
        |regex| regex.replace_all(&cleaned, " ").into_owned(),
    );

    let (grams, ounces) = extract_inline_weight(&cleaned);

    let quantity_match = leading_quantity_regex().and_then(|regex| regex.captures(&without_kcal));
    if let Some(captures) = quantity_match {
        entry.quantity = captures
            .name("qty")
            .and_then(|m| parse_quantity(m.as_str()));
        let rest = captures.name("rest").map_or("", |m| m.as_str()).trim();

        let (unit, remainder) = match rest.split_once(char::is_whitespace) {
            Some((first, tail)) => match canonical_unit(first) {
                Some(unit) => (Some(unit), tail.trim()),
                None => (None, rest),
            },
            None => canonical_unit(rest).map_or((None, rest), |unit| (Some(unit), "")),
        };
        entry.unit = unit.map(str::to_owned);

        let (name_part, note_part) = match remainder.split_once('(') {
            Some((name, note)) => (name, Some(note)),
            None => (remainder, None),
        };
        entry.name = sanitize_name(name_part);
        if entry.name.is_empty() {
            entry.name = sanitize_name(remainder);
        } else {
            entry.note = note_part
                .map(sanitize_name)
                .filter(|note| !note.is_empty());
        }
    } else {
        entry.name = sanitize_name(&without_kcal);
    }

    apply_weights(&mut entry, grams, ounces);
    finish_quantity(&mut entry);
    entry
}

fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let text = text.trim();
            parse_quantity(text).or_else(|| text.parse().ok())
        }
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

fn coerce_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(text) => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    };
    text.filter(|text| !text.is_empty())
}

/// Normalize a structured ingredient object, coercing numeric fields
#[must_use]
pub fn normalize_structured(object: &Map<String, Value>) -> IngredientEntry {
    let name = coerce_text(object.get("name")).unwrap_or_default();
    let raw = coerce_text(object.get("raw")).unwrap_or_else(|| name.clone());
    let mut entry = IngredientEntry::named(sanitize_name(&name), raw);

    entry.quantity = coerce_number(object.get("quantity"));
    entry.quantity_display = coerce_text(object.get("quantity_display"));
    entry.unit = coerce_text(object.get("unit")).map(|unit| {
        canonical_unit(&unit).map_or_else(|| unit.to_lowercase(), str::to_owned)
    });
    entry.note = coerce_text(object.get("note"));
    entry.estimated_calories = coerce_number(object.get("estimated_calories"))
        .filter(|kcal| *kcal >= 0.0)
        .map(|kcal| kcal.round() as u32);

    let grams = coerce_number(object.get("weight_g"));
    let ounces = coerce_number(object.get("weight_oz"));
    if grams.is_some() || ounces.is_some() {
        apply_weights(&mut entry, grams, ounces);
    } else {
        let (grams, ounces) = extract_inline_weight(&entry.search_text());
        apply_weights(&mut entry, grams, ounces);
    }

    finish_quantity(&mut entry);
    entry
}

/// Normalize one ingredient value of any JSON shape
#[must_use]
pub fn normalize(value: &Value) -> IngredientEntry {
    match value {
        Value::String(text) => normalize_text(text),
        Value::Object(object) => normalize_structured(object),
        Value::Null => IngredientEntry::default(),
        other => normalize_text(&other.to_string()),
    }
}

/// Normalize an ingredient list value; non-list values yield an empty list
#[must_use]
pub fn normalize_all(value: Option<&Value>) -> Vec<IngredientEntry> {
    match value {
        Some(Value::Array(items)) => items.iter().map(normalize).collect(),
        Some(Value::String(text)) if !text.trim().is_empty() => text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(normalize_text)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity_variants() {
        assert_eq!(parse_quantity("2"), Some(2.0));
        assert_eq!(parse_quantity("0.5"), Some(0.5));
        assert_eq!(parse_quantity("3/4"), Some(0.75));
        assert_eq!(parse_quantity("1 1/2"), Some(1.5));
        assert_eq!(parse_quantity("1/0"), None);
        assert_eq!(parse_quantity(""), None);
    }

    #[test]
    fn test_inline_weight_reads_fractions() {
        assert_eq!(extract_inline_weight("1/2 oz cheddar"), (None, Some(0.5)));
        assert_eq!(extract_inline_weight("1 1/2 oz cheddar"), (None, Some(1.5)));
        assert_eq!(extract_inline_weight("rice (120 g)"), (Some(120.0), None));
        assert_eq!(extract_inline_weight("12.5g butter"), (Some(12.5), None));
    }

    #[test]
    fn test_format_fraction() {
        assert_eq!(format_fraction(1.5), "1 1/2");
        assert_eq!(format_fraction(0.25), "1/4");
        assert_eq!(format_fraction(2.0), "2");
        assert_eq!(format_fraction(0.333), "1/3");
    }

    #[test]
    fn test_unit_vocabulary() {
        assert_eq!(canonical_unit("Tablespoons"), Some("tbsp"));
        assert_eq!(canonical_unit("cloves"), Some("clove"));
        assert_eq!(canonical_unit("chicken"), None);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("olive — oil: \"extra\" (virgin)"), "olive oil extra virgin");
    }
}
