use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::question::QuestionType;

/// Category tag carried by entries that name a brand.
pub const BRAND_AWARENESS_CATEGORY: &str = "brand_awareness";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeframeStatus {
    Generated,
    Finalized,
}

impl std::fmt::Display for CodeframeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeframeStatus::Generated => write!(f, "generated"),
            CodeframeStatus::Finalized => write!(f, "finalized"),
        }
    }
}

/// One code in a codeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeframeEntry {
    pub code: String,
    pub numeric: u32,
    pub label: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<String>,
    #[serde(default)]
    pub is_parent: bool,
    #[serde(default)]
    pub is_alias: bool,
    /// Share of responses carrying this code, in `[0.0, 100.0]`.
    #[serde(default)]
    pub percentage: f64,
}

impl CodeframeEntry {
    /// A plain entry with no hierarchy links and zero coverage.
    #[must_use]
    pub fn new(code: impl Into<String>, numeric: u32, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            numeric,
            label: label.into(),
            definition: String::new(),
            examples: Vec::new(),
            category: None,
            parent_code: None,
            is_parent: false,
            is_alias: false,
            percentage: 0.0,
        }
    }

    #[must_use]
    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn is_brand(&self) -> bool {
        self.category.as_deref() == Some(BRAND_AWARENESS_CATEGORY)
    }
}

/// The code scheme for one question group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Codeframe {
    /// Identifies the generation run that produced this codeframe.
    pub run_id: Uuid,
    pub group_id: String,
    pub group_name: String,
    pub question_type: QuestionType,
    pub column_indices: Vec<usize>,
    pub entries: Vec<CodeframeEntry>,
    pub sample_size: usize,
    pub total_responses: usize,
    pub generated_at: DateTime<Utc>,
    pub status: CodeframeStatus,
    /// Last finalization time. Survives `unlock` for audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Codeframe {
    #[must_use]
    pub fn entry(&self, code: &str) -> Option<&CodeframeEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    /// Largest numeric id in use, or 0 for an empty codeframe.
    #[must_use]
    pub fn max_numeric(&self) -> u32 {
        self.entries.iter().map(|e| e.numeric).max().unwrap_or(0)
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.status == CodeframeStatus::Finalized
    }
}

/// One response after full-dataset coding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodedResponse {
    pub response_text: String,
    pub row_index: usize,
    pub column_name: String,
    pub codes_assigned: BTreeSet<String>,
}
