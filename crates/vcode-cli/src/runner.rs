//! Orchestration for multi-group generation runs.
//!
//! Wide column selections are chunked into batches, each batch is generated
//! independently with caller-level retry, and up to `max_concurrent` batches
//! are in flight at once. Per-group failures are collected, not propagated,
//! so one bad group does not abort the run.

use futures::stream::{self, StreamExt};
use vcode_codeframe::{
    ensure_catch_all, extract_responses, move_catch_alls_last, response_texts,
    BrandHierarchyManager, CodeframeError, CodeframeGenerator,
};
use vcode_core::{Codeframe, QuestionGroup, QuestionType, RawTable};

use crate::retry::retry_with_backoff;

/// Fan-out and retry knobs for [`run_generation`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunSettings {
    pub column_batch_size: usize,
    pub max_concurrent: usize,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

/// Result of generating one (possibly chunked) question group.
pub(crate) struct GroupOutcome {
    pub group: QuestionGroup,
    pub result: Result<Codeframe, CodeframeError>,
}

/// Split `group` into sub-groups of at most `batch_size` columns.
///
/// Sub-groups are named `<group_id>_batch<n>` and `<group_name> (part n)`,
/// numbered from 1. Groups that already fit are returned unchanged.
pub(crate) fn chunk_columns(group: &QuestionGroup, batch_size: usize) -> Vec<QuestionGroup> {
    let batch_size = batch_size.max(1);
    if group.column_indices.len() <= batch_size {
        return vec![group.clone()];
    }

    group
        .column_indices
        .chunks(batch_size)
        .enumerate()
        .map(|(i, columns)| QuestionGroup {
            group_id: format!("{}_batch{}", group.group_id, i + 1),
            group_name: format!("{} (part {})", group.group_name, i + 1),
            question_type: group.question_type.clone(),
            column_indices: columns.to_vec(),
        })
        .collect()
}

/// Generate, catch-all and (for brand questions) roll up every group.
///
/// Brand roll-up numbers parents from 1000, so appended catch-alls are moved
/// back behind them afterwards.
///
/// Returns one outcome per chunked group in completion order.
pub(crate) async fn run_generation(
    generator: &CodeframeGenerator<'_>,
    hierarchy: &BrandHierarchyManager,
    table: &RawTable,
    groups: &[QuestionGroup],
    settings: RunSettings,
) -> Vec<GroupOutcome> {
    let batches: Vec<QuestionGroup> = groups
        .iter()
        .flat_map(|g| chunk_columns(g, settings.column_batch_size))
        .collect();

    tracing::info!(
        groups = groups.len(),
        batches = batches.len(),
        max_concurrent = settings.max_concurrent,
        "starting generation run"
    );

    stream::iter(batches)
        .map(|group| async move {
            let result = generate_group(generator, hierarchy, table, &group, settings).await;
            GroupOutcome { group, result }
        })
        .buffer_unordered(settings.max_concurrent.max(1))
        .collect()
        .await
}

async fn generate_group(
    generator: &CodeframeGenerator<'_>,
    hierarchy: &BrandHierarchyManager,
    table: &RawTable,
    group: &QuestionGroup,
    settings: RunSettings,
) -> Result<Codeframe, CodeframeError> {
    let responses = response_texts(&extract_responses(table, group));
    let generated = retry_with_backoff(
        &group.group_id,
        settings.max_retries,
        settings.backoff_base_ms,
        || generator.generate(group, &responses),
    )
    .await?;

    let codeframe = ensure_catch_all(generated);
    if group.question_type == QuestionType::UnaidedAwareness {
        Ok(move_catch_alls_last(hierarchy.process_codeframe(codeframe)))
    } else {
        Ok(codeframe)
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
