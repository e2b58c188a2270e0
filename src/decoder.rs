// ABOUTME: Tolerant decoder turning raw generator text into candidate meal objects
// ABOUTME: Strict parse, balanced extraction, truncated-list salvage, then a generator repair pass
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Response Decoder
//!
//! Decoding never fails. Steps run in order and the first success wins:
//!
//! 1. strict parse of the whole text;
//! 2. balanced-delimiter extraction of the first object or array;
//! 3. salvage of complete meal objects from a truncated `"meals": [` list
//!    (marked partial);
//! 4. a repair request to the generator, after which steps 1-3 run again on
//!    the repaired text.

use regex::Regex;
use serde::Serialize;
use serde_json::{Deserializer, Map, Value};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::{ChatMessage, GenerationRequest, TextGenerator, JSON_REPAIR_PREFIX};

/// Which step produced a decoded response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStage {
    /// The whole text was valid JSON
    Strict,
    /// A balanced JSON block was extracted from surrounding text
    Extracted,
    /// Complete meals were salvaged from a truncated list
    Salvaged,
    /// The generator's repaired text decoded
    Repaired,
    /// Nothing decoded
    Failed,
}

/// Candidate meals decoded from generator output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedResponse {
    /// Meal objects in generation order
    pub meals: Vec<Map<String, Value>>,
    /// True when the text was truncated and only a prefix was recovered
    pub partial: bool,
    /// Step that succeeded
    pub stage: DecodeStage,
}

impl DecodedResponse {
    /// Result of a total failure
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            meals: Vec::new(),
            partial: false,
            stage: DecodeStage::Failed,
        }
    }

    fn from_document(document: Value, stage: DecodeStage) -> Option<Self> {
        let list = match document {
            Value::Array(items) => items,
            Value::Object(mut object) => match object.remove("meals") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => return None,
        };
        Some(Self {
            meals: objects_only(list),
            partial: false,
            stage,
        })
    }
}

/// Failure of an individual decoding step
#[derive(Debug, Error)]
enum DecodeError {
    #[error("no JSON object or array start found")]
    NoJsonStart,
    #[error("delimiters never balanced")]
    Unbalanced,
    #[error("expected '{expected}' but found '{found}' at byte {offset}")]
    MismatchedCloser {
        expected: char,
        found: char,
        offset: usize,
    },
    #[error("decoded value is not an object or array")]
    NotADocument,
    #[error("no meals list present")]
    NoMealsList,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn meals_list_regex() -> Option<&'static Regex> {
    static MEALS_LIST: OnceLock<Option<Regex>> = OnceLock::new();
    MEALS_LIST
        .get_or_init(|| Regex::new(r#""meals"\s*:\s*\["#).ok())
        .as_ref()
}

fn objects_only(values: Vec<Value>) -> Vec<Map<String, Value>> {
    values
        .into_iter()
        .filter_map(|value| match value {
            Value::Object(object) => Some(object),
            other => {
                debug!(value = %other, "Skipping non-object meal entry");
                None
            }
        })
        .collect()
}

fn parse_strict(text: &str) -> Result<DecodedResponse, DecodeError> {
    let document: Value = serde_json::from_str(text.trim())?;
    DecodedResponse::from_document(document, DecodeStage::Strict).ok_or(DecodeError::NotADocument)
}

/// First balanced `{...}` or `[...]` block, ignoring delimiters inside strings
fn extract_balanced(text: &str) -> Result<&str, DecodeError> {
    let start = text.find(['{', '[']).ok_or(DecodeError::NoJsonStart)?;
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                let Some(expected) = stack.pop() else {
                    continue;
                };
                if ch != expected {
                    return Err(DecodeError::MismatchedCloser {
                        expected,
                        found: ch,
                        offset: start + offset,
                    });
                }
                if stack.is_empty() {
                    let end = start + offset + ch.len_utf8();
                    return Ok(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    Err(DecodeError::Unbalanced)
}

fn parse_extracted(text: &str) -> Result<DecodedResponse, DecodeError> {
    let candidate = extract_balanced(text)?;
    let document: Value = serde_json::from_str(candidate)?;
    DecodedResponse::from_document(document, DecodeStage::Extracted)
        .ok_or(DecodeError::NotADocument)
}

/// Decode complete values from a truncated `"meals": [` list
fn salvage_meals(text: &str) -> Result<DecodedResponse, DecodeError> {
    let found = meals_list_regex()
        .and_then(|pattern| pattern.find(text))
        .ok_or(DecodeError::NoMealsList)?;

    let mut values = Vec::new();
    let mut rest = &text[found.end()..];
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() || rest.starts_with(']') {
            break;
        }
        let mut stream = Deserializer::from_str(rest).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                values.push(value);
                rest = &rest[stream.byte_offset()..];
            }
            Some(Err(error)) => {
                debug!(error = %error, "Partial decode stopped");
                break;
            }
            None => break,
        }
    }

    let meals = objects_only(values);
    debug!(meals = meals.len(), "Recovered meals from truncated output");
    Ok(DecodedResponse {
        meals,
        partial: true,
        stage: DecodeStage::Salvaged,
    })
}

/// Run the local decoding steps; `None` when none of them succeeds
#[must_use]
pub fn decode_text(text: &str) -> Option<DecodedResponse> {
    let strict = match parse_strict(text) {
        Ok(decoded) => return Some(decoded),
        Err(error) => error,
    };
    debug!(error = %strict, "Strict parse failed");

    let extracted = match parse_extracted(text) {
        Ok(decoded) => return Some(decoded),
        Err(error) => error,
    };
    debug!(error = %extracted, "Balanced extraction failed");

    let source = extract_balanced(text).unwrap_or(text);
    match salvage_meals(source).or_else(|_| salvage_meals(text)) {
        Ok(decoded) => Some(decoded),
        Err(error) => {
            debug!(error = %error, "Truncated-list salvage failed");
            None
        }
    }
}

/// Decode generator output, asking the generator to repair it as a last resort
pub async fn decode(
    text: &str,
    repairer: Option<&dyn TextGenerator>,
    max_tokens: u32,
) -> DecodedResponse {
    let local = decode_text(text);
    if let Some(decoded) = &local {
        if !(decoded.partial && decoded.meals.is_empty()) {
            return decoded.clone();
        }
    }

    let fallback = local.unwrap_or_else(DecodedResponse::empty);
    let Some(generator) = repairer else {
        return fallback;
    };
    if text.trim().is_empty() {
        return fallback;
    }

    let request = GenerationRequest::new(vec![ChatMessage::user(format!(
        "{JSON_REPAIR_PREFIX}{text}"
    ))])
    .with_temperature(0.0)
    .with_max_tokens(max_tokens);

    match generator.generate(&request).await {
        Ok(response) => match decode_text(response.content_text()) {
            Some(repaired) if !repaired.meals.is_empty() || !fallback.partial => {
                debug!(meals = repaired.meals.len(), "Repair pass decoded");
                DecodedResponse {
                    stage: DecodeStage::Repaired,
                    ..repaired
                }
            }
            _ => {
                warn!("Repair attempt still failed to produce valid JSON");
                fallback
            }
        },
        Err(error) => {
            warn!(error = %error, "Error during repair request");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_skips_prose_and_braces_in_strings() {
        let text = r#"Sure! Here you go: {"meals":[{"name":"Oats {overnight}","mealType":"breakfast"}]} Enjoy."#;
        let decoded = decode_text(text);
        assert_eq!(decoded.as_ref().map(|d| d.stage), Some(DecodeStage::Extracted));
        assert_eq!(decoded.map(|d| d.meals.len()), Some(1));
    }

    #[test]
    fn test_mismatched_closer_aborts_extraction() {
        assert!(matches!(
            extract_balanced("x {\"a\": [1, 2}"),
            Err(DecodeError::MismatchedCloser { expected: ']', found: '}', .. })
        ));
    }

    #[test]
    fn test_extraction_stops_at_first_balanced_block() {
        assert_eq!(extract_balanced("[1]").ok(), Some("[1]"));
        assert_eq!(extract_balanced("{\"a\":1}}").ok(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_top_level_array_is_meal_list() {
        let decoded = decode_text(r#"[{"name":"A"}, 3, {"name":"B"}]"#);
        assert_eq!(decoded.map(|d| d.meals.len()), Some(2));
    }

    #[test]
    fn test_scalar_text_does_not_decode() {
        assert!(decode_text("42").is_none());
        assert!(decode_text("no json here").is_none());
    }
}
