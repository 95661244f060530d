//! Validation of model output into codeframe entries.
//!
//! The model is asked for `{"codeframe": [...]}` but may wrap it in prose or
//! markdown fences. [`extract_json`] isolates the first balanced object;
//! [`parse_codeframe`] then checks the fields the pipeline needs and rejects
//! the whole document rather than filling gaps with defaults.

use std::collections::HashSet;

use serde_json::{Map, Value};
use vcode_core::{CodeframeEntry, QuestionType, BRAND_AWARENESS_CATEGORY};

use crate::error::CodeframeError;

/// Longest slice of raw model output quoted in error messages.
const PREVIEW_CHARS: usize = 200;

/// Largest numeric id accepted from the model. Later stages allocate above
/// the existing maximum, so this keeps them clear of `u32::MAX`.
pub const MAX_MODEL_NUMERIC: u32 = 99_999;

/// Extract a JSON object from potentially noisy LLM output.
///
/// Handles pure JSON, JSON inside markdown code fences, and JSON embedded in
/// prose. Returns the trimmed input unchanged when no balanced object exists.
#[must_use]
pub fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();

    if let Some(start) = trimmed.find('{') {
        let remainder = &trimmed[start..];
        if let Some(end) = find_matching_brace(remainder) {
            return &remainder[..end];
        }
    }

    trimmed
}

/// Byte offset just past the brace closing the object that opens `s`.
/// Braces inside JSON strings are ignored.
fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;

    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if c == '\\' && in_string {
            escape = true;
            continue;
        }
        if c == '"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

pub(crate) fn preview(raw: &str) -> String {
    raw.chars().take(PREVIEW_CHARS).collect()
}

/// Parse the object at the start of the model's text, failing with `malformed`.
pub(crate) fn parse_object<F>(raw: &str, malformed: F) -> Result<Map<String, Value>, CodeframeError>
where
    F: Fn(String) -> CodeframeError,
{
    let json = extract_json(raw);
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(malformed(format!(
            "expected a JSON object, got: {}",
            preview(raw)
        ))),
        Err(e) => Err(malformed(format!("invalid JSON ({e}): {}", preview(raw)))),
    }
}

/// Validate model output into codeframe entries.
///
/// Requires a top-level `codeframe` array whose elements are objects with
/// non-empty string `code` and `label`. Codes must be unique. `definition`,
/// `examples`, `numeric` and `category` are optional but must be well typed
/// when present. Entries without a numeric id are numbered after the largest
/// supplied one. For unaided-awareness questions, uncategorised entries are
/// tagged as brand mentions.
///
/// # Errors
///
/// Returns [`CodeframeError::MalformedCodeframe`] describing the first problem found.
pub fn parse_codeframe(
    raw: &str,
    question_type: &QuestionType,
) -> Result<Vec<CodeframeEntry>, CodeframeError> {
    let root = parse_object(raw, CodeframeError::MalformedCodeframe)?;

    let items = root
        .get("codeframe")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            CodeframeError::MalformedCodeframe(format!(
                "missing top-level \"codeframe\" array: {}",
                preview(raw)
            ))
        })?;

    let mut seen_codes = HashSet::new();
    let mut seen_numerics = HashSet::new();
    let mut parsed = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| {
            CodeframeError::MalformedCodeframe(format!("codeframe[{index}] is not an object"))
        })?;

        let code = required_str(obj, "code", index)?;
        let label = required_str(obj, "label", index)?;

        if !seen_codes.insert(code.clone()) {
            return Err(CodeframeError::MalformedCodeframe(format!(
                "duplicate code '{code}'"
            )));
        }

        let numeric = optional_numeric(obj, index)?;
        if let Some(n) = numeric {
            if !seen_numerics.insert(n) {
                return Err(CodeframeError::MalformedCodeframe(format!(
                    "duplicate numeric {n} at codeframe[{index}]"
                )));
            }
        }

        let mut entry = CodeframeEntry::new(code, 0, label);
        entry.definition = optional_str(obj, "definition", index)?.unwrap_or_default();
        entry.examples = optional_examples(obj, index)?;
        entry.category = optional_str(obj, "category", index)?.filter(|c| !c.is_empty());
        if entry.category.is_none() && *question_type == QuestionType::UnaidedAwareness {
            entry.category = Some(BRAND_AWARENESS_CATEGORY.to_string());
        }

        parsed.push((entry, numeric));
    }

    let mut next_numeric = parsed
        .iter()
        .filter_map(|(_, n)| *n)
        .max()
        .unwrap_or(0);

    Ok(parsed
        .into_iter()
        .map(|(mut entry, numeric)| {
            entry.numeric = numeric.unwrap_or_else(|| {
                next_numeric += 1;
                next_numeric
            });
            entry
        })
        .collect())
}

fn required_str(obj: &Map<String, Value>, field: &str, index: usize) -> Result<String, CodeframeError> {
    match obj.get(field).and_then(Value::as_str).map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(CodeframeError::MalformedCodeframe(format!(
            "codeframe[{index}] is missing a non-empty string \"{field}\""
        ))),
    }
}

fn optional_str(
    obj: &Map<String, Value>,
    field: &str,
    index: usize,
) -> Result<Option<String>, CodeframeError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(CodeframeError::MalformedCodeframe(format!(
            "codeframe[{index}].{field} must be a string"
        ))),
    }
}

fn optional_examples(obj: &Map<String, Value>, index: usize) -> Result<Vec<String>, CodeframeError> {
    match obj.get("examples") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    CodeframeError::MalformedCodeframe(format!(
                        "codeframe[{index}].examples must contain only strings"
                    ))
                })
            })
            .collect(),
        Some(_) => Err(CodeframeError::MalformedCodeframe(format!(
            "codeframe[{index}].examples must be an array"
        ))),
    }
}

fn optional_numeric(obj: &Map<String, Value>, index: usize) -> Result<Option<u32>, CodeframeError> {
    let invalid = || {
        CodeframeError::MalformedCodeframe(format!(
            "codeframe[{index}].numeric must be an integer from 0 to {MAX_MODEL_NUMERIC}"
        ))
    };
    let numeric = match obj.get("numeric") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        Some(_) => None,
    };
    match numeric {
        Some(n) if n <= MAX_MODEL_NUMERIC => Ok(Some(n)),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
