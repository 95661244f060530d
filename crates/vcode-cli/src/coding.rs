//! `code` and `rollup` handlers.

use std::path::Path;

use vcode_codeframe::{
    extract_responses, group_column_label, usage_counts, BrandHierarchyManager, ResponseCoder,
};
use vcode_core::{AppConfig, Codeframe, CodedResponse, QuestionGroup, RawTable};

use crate::io::{read_json, write_json};
use crate::retry::retry_with_backoff;

/// The question group a codeframe was generated for.
fn group_of(codeframe: &Codeframe) -> QuestionGroup {
    QuestionGroup {
        group_id: codeframe.group_id.clone(),
        group_name: codeframe.group_name.clone(),
        question_type: codeframe.question_type.clone(),
        column_indices: codeframe.column_indices.clone(),
    }
}

/// Code every response in the codeframe's columns and write the results.
pub(crate) async fn run_code(
    config: &AppConfig,
    table_path: &Path,
    codeframe_path: &Path,
    out: &Path,
) -> anyhow::Result<()> {
    let table: RawTable = read_json(table_path)?;
    let codeframe: Codeframe = read_json(codeframe_path)?;
    let group = group_of(&codeframe);
    let responses = extract_responses(&table, &group);
    let column_name = group_column_label(&table, &group);

    let client = crate::build_client(config)?;
    let coder = ResponseCoder::new(
        &client,
        config.coding_batch_size,
        crate::completion_options(config),
    );

    let coded = retry_with_backoff(
        &group.group_id,
        config.max_retries,
        config.retry_backoff_base_ms,
        || coder.code(&codeframe, &responses, &column_name),
    )
    .await?;

    write_json(out, &coded)?;

    let counts = usage_counts(&coded);
    println!("coded {} responses for '{}'", coded.len(), group.group_id);
    for entry in &codeframe.entries {
        let count = counts.get(&entry.code).copied().unwrap_or(0);
        println!("  {:>5}  {:<28} {}", count, entry.code, entry.label);
    }
    Ok(())
}

/// Add parent brand codes to coded responses.
pub(crate) fn run_rollup(
    hierarchy: &BrandHierarchyManager,
    coded_path: &Path,
    out: &Path,
) -> anyhow::Result<()> {
    let coded: Vec<CodedResponse> = read_json(coded_path)?;
    let rolled = hierarchy.roll_up_responses(&coded);
    let added: usize = coded
        .iter()
        .zip(&rolled)
        .map(|(before, after)| after.codes_assigned.len() - before.codes_assigned.len())
        .sum();
    write_json(out, &rolled)?;
    println!(
        "rolled up {} responses ({added} parent codes added)",
        rolled.len()
    );
    Ok(())
}
