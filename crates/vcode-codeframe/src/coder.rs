//! Full-dataset coding against a finalized codeframe.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;

use serde_json::Value;
use vcode_core::{Codeframe, CodedResponse};
use vcode_llm::{CompletionOptions, CompletionService};

use crate::error::CodeframeError;
use crate::extract::GroupResponse;
use crate::parse::{parse_object, preview};

const CODING_SYSTEM: &str = "\
You are an expert survey coder. Assign codes from the codeframe below to each \
numbered survey response. A response may receive several codes or none. Only use \
codes that appear in the codeframe.

Respond with JSON only, no prose and no markdown fences, in exactly this shape:
{
  \"assignments\": [
    {\"id\": 1, \"codes\": [\"C001\", \"C004\"]}
  ]
}

Codeframe (code | label | definition):";

/// Assigns codeframe codes to every response in batches.
pub struct ResponseCoder<'a> {
    service: &'a dyn CompletionService,
    batch_size: usize,
    completion: CompletionOptions,
}

impl<'a> ResponseCoder<'a> {
    /// `batch_size` below 1 is treated as 1.
    #[must_use]
    pub fn new(
        service: &'a dyn CompletionService,
        batch_size: usize,
        completion: CompletionOptions,
    ) -> Self {
        Self {
            service,
            batch_size: batch_size.max(1),
            completion,
        }
    }

    /// Code `responses` against `codeframe`, one result per response in input order.
    ///
    /// # Errors
    ///
    /// - [`CodeframeError::NotFinalized`] unless the codeframe is finalized.
    /// - [`CodeframeError::GenerationService`] when a batch call fails.
    /// - [`CodeframeError::MalformedAssignments`] when a batch reply is unusable.
    pub async fn code(
        &self,
        codeframe: &Codeframe,
        responses: &[GroupResponse],
        column_name: &str,
    ) -> Result<Vec<CodedResponse>, CodeframeError> {
        if !codeframe.is_finalized() {
            return Err(CodeframeError::NotFinalized {
                group_id: codeframe.group_id.clone(),
            });
        }

        let system = coding_system_prompt(codeframe);
        let known: HashSet<&str> = codeframe.entries.iter().map(|e| e.code.as_str()).collect();
        let mut coded = Vec::with_capacity(responses.len());

        for (batch_index, batch) in responses.chunks(self.batch_size).enumerate() {
            tracing::debug!(
                group_id = %codeframe.group_id,
                batch = batch_index + 1,
                responses = batch.len(),
                "coding batch"
            );

            let user = numbered_responses(batch);
            let text = self
                .service
                .complete(&system, &user, &self.completion)
                .await?;
            let mut assigned = parse_assignments(&text, batch.len())?;

            for (offset, response) in batch.iter().enumerate() {
                let codes = assigned.remove(&(offset + 1)).unwrap_or_default();
                let (kept, unknown): (BTreeSet<String>, BTreeSet<String>) =
                    codes.into_iter().partition(|c| known.contains(c.as_str()));
                if !unknown.is_empty() {
                    tracing::warn!(
                        group_id = %codeframe.group_id,
                        row_index = response.row_index,
                        ?unknown,
                        "dropping codes not in codeframe"
                    );
                }
                coded.push(CodedResponse {
                    response_text: response.text.clone(),
                    row_index: response.row_index,
                    column_name: column_name.to_string(),
                    codes_assigned: kept,
                });
            }
        }

        tracing::info!(
            group_id = %codeframe.group_id,
            responses = coded.len(),
            "coding complete"
        );
        Ok(coded)
    }
}

fn coding_system_prompt(codeframe: &Codeframe) -> String {
    let mut prompt = String::from(CODING_SYSTEM);
    for entry in &codeframe.entries {
        let _ = write!(
            prompt,
            "\n{} | {} | {}",
            entry.code, entry.label, entry.definition
        );
    }
    prompt
}

fn numbered_responses(batch: &[GroupResponse]) -> String {
    batch
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}", i + 1, r.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Map of 1-based response id to the codes the model assigned it.
///
/// Ids outside `1..=batch_len` are ignored with a warning.
fn parse_assignments(
    raw: &str,
    batch_len: usize,
) -> Result<HashMap<usize, BTreeSet<String>>, CodeframeError> {
    let root = parse_object(raw, CodeframeError::MalformedAssignments)?;
    let items = root
        .get("assignments")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            CodeframeError::MalformedAssignments(format!(
                "missing \"assignments\" array: {}",
                preview(raw)
            ))
        })?;

    let mut assigned: HashMap<usize, BTreeSet<String>> = HashMap::new();
    for (position, item) in items.iter().enumerate() {
        let id = item
            .get("id")
            .and_then(Value::as_u64)
            .and_then(|id| usize::try_from(id).ok())
            .ok_or_else(|| {
                CodeframeError::MalformedAssignments(format!(
                    "assignment {position} has no positive integer \"id\""
                ))
            })?;
        let codes = item.get("codes").and_then(Value::as_array).ok_or_else(|| {
            CodeframeError::MalformedAssignments(format!(
                "assignment {position} has no \"codes\" array"
            ))
        })?;
        let codes = codes
            .iter()
            .map(|c| {
                c.as_str().map(|s| s.trim().to_string()).ok_or_else(|| {
                    CodeframeError::MalformedAssignments(format!(
                        "assignment {position} has a non-string code: {c}"
                    ))
                })
            })
            .collect::<Result<BTreeSet<String>, _>>()?;

        if id == 0 || id > batch_len {
            tracing::warn!(id, batch_len, "ignoring assignment for unknown response id");
            continue;
        }
        assigned.entry(id).or_default().extend(codes);
    }

    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_assignments_by_id() {
        let raw = r#"{"assignments": [{"id": 1, "codes": ["C001"]}, {"id": 2, "codes": []}]}"#;
        let parsed = parse_assignments(raw, 2).unwrap();
        assert_eq!(parsed.get(&1).map(BTreeSet::len), Some(1));
        assert_eq!(parsed.get(&2).map(BTreeSet::len), Some(0));
    }

    #[test]
    fn out_of_range_ids_are_ignored() {
        let raw = r#"{"assignments": [{"id": 0, "codes": ["A"]}, {"id": 9, "codes": ["B"]}]}"#;
        assert!(parse_assignments(raw, 2).unwrap().is_empty());
    }

    #[test]
    fn repeated_ids_are_merged() {
        let raw = r#"{"assignments": [{"id": 1, "codes": ["A"]}, {"id": 1, "codes": ["B"]}]}"#;
        let parsed = parse_assignments(raw, 1).unwrap();
        assert_eq!(parsed.get(&1).map(BTreeSet::len), Some(2));
    }

    #[test]
    fn missing_assignments_array_is_malformed() {
        let err = parse_assignments(r#"{"codes": []}"#, 1).unwrap_err();
        assert!(matches!(err, CodeframeError::MalformedAssignments(_)));
    }

    #[test]
    fn non_string_code_is_malformed() {
        let err = parse_assignments(r#"{"assignments": [{"id": 1, "codes": [1]}]}"#, 1).unwrap_err();
        assert!(err.to_string().contains("non-string code"));
    }

    #[test]
    fn numbered_responses_are_one_based() {
        let batch = vec![
            GroupResponse {
                row_index: 4,
                text: "Coke".to_string(),
            },
            GroupResponse {
                row_index: 7,
                text: "Pepsi".to_string(),
            },
        ];
        assert_eq!(numbered_responses(&batch), "1. Coke\n2. Pepsi");
    }
}
