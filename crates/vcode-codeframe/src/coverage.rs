//! Per-code coverage percentages.

use std::collections::HashMap;

use vcode_core::{Codeframe, CodeframeEntry, CodedResponse};

#[allow(clippy::cast_precision_loss)]
fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

/// Estimate each entry's coverage over the sampled responses.
///
/// A response counts toward an entry when it contains, case-insensitively,
/// the entry's label or any of its examples.
pub fn estimate_sample_coverage(entries: &mut [CodeframeEntry], sampled: &[String]) {
    let lowered: Vec<String> = sampled.iter().map(|s| s.to_lowercase()).collect();

    for entry in entries.iter_mut() {
        let needles: Vec<String> = std::iter::once(&entry.label)
            .chain(&entry.examples)
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let hits = lowered
            .iter()
            .filter(|response| needles.iter().any(|n| response.contains(n.as_str())))
            .count();

        entry.percentage = percent(hits, sampled.len());
    }
}

/// Number of coded responses carrying each code.
#[must_use]
pub fn usage_counts(coded: &[CodedResponse]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for response in coded {
        for code in &response.codes_assigned {
            *counts.entry(code.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Recompute every entry's percentage from full-dataset coding results.
pub fn apply_coverage(codeframe: &mut Codeframe, coded: &[CodedResponse]) {
    let counts = usage_counts(coded);
    for entry in &mut codeframe.entries {
        let count = counts.get(&entry.code).copied().unwrap_or(0);
        entry.percentage = percent(count, coded.len());
    }
}
