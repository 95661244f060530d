use serde::{Deserialize, Serialize};

/// One spreadsheet cell as handed over by the upload/parsing layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// Render the cell as trimmed text, or `None` when it carries nothing.
    ///
    /// Integral numbers render without a fractional part (`3.0` -> `"3"`).
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Number(n) => {
                if n.is_nan() {
                    None
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    #[allow(clippy::cast_possible_truncation)]
                    let whole = *n as i64;
                    Some(whole.to_string())
                } else {
                    Some(n.to_string())
                }
            }
        }
    }
}

/// Rectangular-ish table of raw cell values. Row 0 is the header.
///
/// Rows may be ragged; reads past the end of a row yield [`CellValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTable {
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    #[must_use]
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// Build a table from plain strings; empty strings become [`CellValue::Empty`].
    #[must_use]
    pub fn from_strings(rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|s| {
                        if s.is_empty() {
                            CellValue::Empty
                        } else {
                            CellValue::Text((*s).to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        Self { rows }
    }

    /// Number of data rows (excluding the header).
    #[must_use]
    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(EMPTY)
    }

    /// Header text for a column, if the header row has one.
    #[must_use]
    pub fn header(&self, column: usize) -> Option<String> {
        self.cell(0, column).as_text()
    }
}
