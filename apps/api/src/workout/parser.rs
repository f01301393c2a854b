//! Workout Parser: turns one free-text submission into set records.

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::errors::ParseError;
use crate::llm_client::{strip_json_fences, ModelFallback};
use crate::models::workout::{MuscleGroup, SetRecord};
use crate::workout::prompts::build_parse_prompt;

#[derive(Clone)]
pub struct WorkoutParser {
    llm: ModelFallback,
}

impl WorkoutParser {
    pub fn new(llm: ModelFallback) -> Self {
        Self { llm }
    }

    /// One extraction call (with model substitution), then strict decoding.
    /// Either every set in the response is returned or none is.
    pub async fn parse(&self, raw_text: &str) -> Result<Vec<SetRecord>, ParseError> {
        if raw_text.trim().is_empty() {
            return Err(ParseError::malformed("empty submission"));
        }

        let prompt = build_parse_prompt(raw_text);
        let (model, text) = self
            .llm
            .generate(&prompt)
            .await
            .map_err(|e| ParseError::service_unavailable(e.to_string()))?;

        let sets = decode_sets(&text)?;
        info!("Parsed {} sets with {model}", sets.len());
        Ok(sets)
    }
}

/// Decodes the model's text as a non-empty JSON array of set objects.
pub fn decode_sets(text: &str) -> Result<Vec<SetRecord>, ParseError> {
    let cleaned = strip_json_fences(text);
    let value: Value = serde_json::from_str(cleaned).map_err(|e| {
        debug!("Undecodable extraction output: {cleaned}");
        ParseError::malformed(format!("not JSON: {e}"))
    })?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ParseError::malformed(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            )))
        }
    };
    if items.is_empty() {
        return Err(ParseError::malformed("no sets in response"));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(obj) => Ok(set_from_object(obj)),
            other => Err(ParseError::malformed(format!(
                "element {i} is {}, not an object",
                json_kind(other)
            ))),
        })
        .collect()
}

fn set_from_object(obj: &Map<String, Value>) -> SetRecord {
    SetRecord {
        exercise: string_field(obj, "exercise")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        muscle_group: string_field(obj, "muscle_group")
            .and_then(|s| MuscleGroup::from_prompt_label(&s))
            .unwrap_or_default(),
        weight: obj.get("weight").and_then(number).unwrap_or(0.0).max(0.0),
        reps: obj
            .get("reps")
            .and_then(number)
            .map(|r| r.max(0.0).round() as u32)
            .unwrap_or(0),
        notes: string_field(obj, "notes").unwrap_or_default(),
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Numbers, or strings that are numbers once a unit suffix is dropped ("60", "60kg").
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            let end = s
                .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
                .unwrap_or(s.len());
            s[..end].parse::<f64>().ok()
        }
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
