use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Kind of open-ended question, selecting the prompt template used for it.
///
/// Serialized as its kebab-case key. Keys without a built-in variant land in
/// [`QuestionType::Custom`] so configuration can name templates registered at
/// runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    UnaidedAwareness,
    BrandDescriptions,
    Miscellaneous,
    Custom(String),
}

impl QuestionType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::UnaidedAwareness => "unaided-awareness",
            QuestionType::BrandDescriptions => "brand-descriptions",
            QuestionType::Miscellaneous => "miscellaneous",
            QuestionType::Custom(key) => key,
        }
    }
}

impl From<String> for QuestionType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "unaided-awareness" => QuestionType::UnaidedAwareness,
            "brand-descriptions" => QuestionType::BrandDescriptions,
            "miscellaneous" => QuestionType::Miscellaneous,
            _ => QuestionType::Custom(value),
        }
    }
}

impl From<&str> for QuestionType {
    fn from(value: &str) -> Self {
        QuestionType::from(value.to_string())
    }
}

impl From<QuestionType> for String {
    fn from(value: QuestionType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of table columns coded together under one codeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionGroup {
    pub group_id: String,
    pub group_name: String,
    pub question_type: QuestionType,
    pub column_indices: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct QuestionGroupsFile {
    groups: Vec<QuestionGroup>,
}

/// Load and validate question groups from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_question_groups(path: &Path) -> Result<Vec<QuestionGroup>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: QuestionGroupsFile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    validate_question_groups(&file.groups)?;

    Ok(file.groups)
}

pub(crate) fn validate_question_groups(groups: &[QuestionGroup]) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for group in groups {
        if group.group_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "group_id must be non-empty".to_string(),
            ));
        }

        if !seen_ids.insert(group.group_id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate group_id: '{}'",
                group.group_id
            )));
        }

        if group.column_indices.is_empty() {
            return Err(ConfigError::Validation(format!(
                "group '{}' selects no columns",
                group.group_id
            )));
        }

        let mut seen_columns = HashSet::new();
        for column in &group.column_indices {
            if !seen_columns.insert(*column) {
                return Err(ConfigError::Validation(format!(
                    "group '{}' selects column {} more than once",
                    group.group_id, column
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "question_test.rs"]
mod tests;
