//! Pull a question group's responses out of the raw table.

use vcode_core::{QuestionGroup, RawTable};

/// Joins answers from a group's columns within one respondent row.
pub const RESPONSE_SEPARATOR: &str = " | ";

/// One respondent's combined answer for a question group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupResponse {
    /// Row in the raw table (1-based for data rows; row 0 is the header).
    pub row_index: usize,
    pub text: String,
}

/// Extract one combined response per data row for `group`.
///
/// Non-empty cells across the group's columns are joined in column order
/// with [`RESPONSE_SEPARATOR`]. Rows with nothing to say are dropped.
#[must_use]
pub fn extract_responses(table: &RawTable, group: &QuestionGroup) -> Vec<GroupResponse> {
    let mut columns = group.column_indices.clone();
    columns.sort_unstable();
    columns.dedup();

    (1..table.rows.len())
        .filter_map(|row_index| {
            let parts: Vec<String> = columns
                .iter()
                .filter_map(|&column| table.cell(row_index, column).as_text())
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(GroupResponse {
                    row_index,
                    text: parts.join(RESPONSE_SEPARATOR),
                })
            }
        })
        .collect()
}

/// Project extracted responses to their text, in extraction order.
#[must_use]
pub fn response_texts(responses: &[GroupResponse]) -> Vec<String> {
    responses.iter().map(|r| r.text.clone()).collect()
}

/// Header label for a group: the header cells of its columns, joined.
#[must_use]
pub fn group_column_label(table: &RawTable, group: &QuestionGroup) -> String {
    let headers: Vec<String> = group
        .column_indices
        .iter()
        .map(|&c| table.header(c).unwrap_or_else(|| format!("column {c}")))
        .collect();
    headers.join(RESPONSE_SEPARATOR)
}
