//! Model output parsing
//!
//! The model is an untrusted text generator. Its answer must be a JSON array
//! of objects with a non-empty `text`; `priority` falls back to medium and
//! `tags` is best-effort. Anything else rejects the whole answer.

use serde::Deserialize;
use serde_json::Value;
use taskmint_common::models::normalize_tags;
use taskmint_common::{NewTask, Priority};

use super::ExtractionError;

/// Shape of one array element as the model is asked to produce it
#[derive(Debug, Deserialize)]
struct RawTask {
    text: String,
    #[serde(default)]
    priority: Option<Value>,
    #[serde(default)]
    tags: Option<Value>,
}

/// Remove a surrounding markdown code fence (```` ``` ```` or ```` ```json ````)
pub fn strip_code_fences(raw: &str) -> &str {
    let mut body = raw.trim();

    if let Some(rest) = body.strip_prefix("```") {
        // Drop the info string (e.g. "json") on the opening fence
        body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }

    body.trim()
}

/// Parse a model answer into extracted tasks
pub fn parse_model_output(raw: &str) -> Result<Vec<NewTask>, ExtractionError> {
    let body = strip_code_fences(raw);

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractionError::MalformedResponse(format!("not valid JSON: {}", e)))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ExtractionError::MalformedResponse(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            )))
        }
    };

    if items.is_empty() {
        return Err(ExtractionError::NoTasks);
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_item(index, item))
        .collect()
}

fn parse_item(index: usize, item: Value) -> Result<NewTask, ExtractionError> {
    if !item.is_object() {
        return Err(ExtractionError::InvalidTask {
            index,
            reason: format!("expected an object, got {}", json_kind(&item)),
        });
    }

    let raw: RawTask = serde_json::from_value(item).map_err(|e| ExtractionError::InvalidTask {
        index,
        reason: e.to_string(),
    })?;

    let text = raw.text.trim();
    if text.is_empty() {
        return Err(ExtractionError::InvalidTask {
            index,
            reason: "empty text".to_string(),
        });
    }

    let priority = Priority::from_model_label(raw.priority.as_ref().and_then(Value::as_str));

    let tags = match raw.tags {
        Some(Value::Array(values)) => normalize_tags(values.iter().filter_map(Value::as_str)),
        _ => Vec::new(),
    };

    Ok(NewTask {
        text: text.to_string(),
        priority,
        tags,
    })
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
