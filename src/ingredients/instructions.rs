// ABOUTME: Instruction normalization splitting generator text into clean ordered steps
// ABOUTME: Handles multi-line strings, inline numbered runs, sentence runs, and step lists
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn numbering_regex() -> Option<&'static Regex> {
    static NUMBERING: OnceLock<Option<Regex>> = OnceLock::new();
    NUMBERING
        .get_or_init(|| Regex::new(r"^\s*\d+\s*[\.):\-]+\s*").ok())
        .as_ref()
}

fn spaced_numbering_regex() -> Option<&'static Regex> {
    static SPACED_NUMBERING: OnceLock<Option<Regex>> = OnceLock::new();
    SPACED_NUMBERING
        .get_or_init(|| Regex::new(r"^\s*\d+\s+[-–—:]\s*").ok())
        .as_ref()
}

fn inline_marker_regex() -> Option<&'static Regex> {
    static INLINE_MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    INLINE_MARKER
        .get_or_init(|| Regex::new(r"\s*(?:\d+\.)\s+").ok())
        .as_ref()
}

/// Remove a leading list marker ("1.", "1)", "1 -", "1:") from a step
#[must_use]
pub fn strip_numbering(step: &str) -> String {
    let mut text = step.to_owned();
    for regex in [numbering_regex(), spaced_numbering_regex()].into_iter().flatten() {
        text = regex.replace(&text, "").into_owned();
    }
    text.trim().to_owned()
}

/// Split after a period followed by whitespace and an uppercase letter
fn split_sentences(line: &str) -> Vec<String> {
    let mut steps = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if c != '.' {
            continue;
        }
        let mut lookahead = chars.clone();
        let mut saw_space = false;
        while lookahead.peek().is_some_and(|next| next.is_whitespace()) {
            lookahead.next();
            saw_space = true;
        }
        if saw_space && lookahead.peek().is_some_and(|next| next.is_uppercase()) {
            steps.push(std::mem::take(&mut current));
            chars = lookahead;
        }
    }
    steps.push(current);
    steps
}

fn split_single_line(line: &str) -> Vec<String> {
    let starts_numbered = numbering_regex().is_some_and(|regex| regex.is_match(line));
    if starts_numbered {
        if let Some(regex) = inline_marker_regex() {
            let parts: Vec<String> = regex
                .split(line)
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_owned)
                .collect();
            if parts.len() > 1 {
                return parts;
            }
        }
    }
    split_sentences(line)
}

fn clean_steps<I>(steps: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    steps
        .into_iter()
        .map(|step| strip_numbering(&step))
        .filter(|step| !step.is_empty())
        .collect()
}

/// Normalize an instructions value into ordered steps
///
/// Strings are split on lines; a single line is split on inline numbering
/// markers, falling back to sentence boundaries. Lists are cleaned element-wise.
#[must_use]
pub fn normalize_instructions(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(text)) => {
            let lines: Vec<&str> = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();
            match lines.as_slice() {
                [] => Vec::new(),
                [single] => clean_steps(split_single_line(single)),
                many => clean_steps(many.iter().map(|line| (*line).to_owned())),
            }
        }
        Some(Value::Array(items)) => clean_steps(items.iter().filter_map(|item| match item {
            Value::String(text) => Some(text.clone()),
            Value::Object(object) => ["text", "step", "instruction"]
                .iter()
                .find_map(|key| object.get(*key).and_then(Value::as_str))
                .map(str::to_owned),
            Value::Null => None,
            other => Some(other.to_string()),
        })),
        _ => Vec::new(),
    }
}
