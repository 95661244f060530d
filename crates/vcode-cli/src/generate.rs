//! `generate` handler.

use std::path::Path;

use vcode_codeframe::{BrandHierarchyManager, CodeframeGenerator, GenerationOptions};
use vcode_core::{load_question_groups, AppConfig, RawTable};

use crate::io::{read_json, write_json};
use crate::runner::{run_generation, RunSettings};

pub(crate) struct GenerateArgs<'a> {
    pub table: &'a Path,
    pub groups: &'a Path,
    pub out_dir: &'a Path,
    pub group_filter: Option<&'a str>,
    pub seed: Option<u64>,
}

/// Generate a codeframe per question group and write `<group_id>.codeframe.json`.
///
/// Successful groups are written even when others fail; the command then
/// exits with an error naming the failure count so the run can be repeated.
pub(crate) async fn run_generate(
    config: &AppConfig,
    hierarchy: &BrandHierarchyManager,
    args: GenerateArgs<'_>,
) -> anyhow::Result<()> {
    let mut groups = load_question_groups(args.groups)?;
    if let Some(id) = args.group_filter {
        groups.retain(|g| g.group_id == id);
        if groups.is_empty() {
            anyhow::bail!("question group '{id}' not found in {}", args.groups.display());
        }
    }

    let table: RawTable = read_json(args.table)?;
    let client = crate::build_client(config)?;
    let generator = CodeframeGenerator::new(
        &client,
        GenerationOptions {
            sample_percentage: config.sample_percentage,
            minimum_floor: config.sample_minimum,
            completion: crate::completion_options(config),
            seed: args.seed,
        },
    );
    let settings = RunSettings {
        column_batch_size: config.column_batch_size,
        max_concurrent: config.max_concurrent_groups,
        max_retries: config.max_retries,
        backoff_base_ms: config.retry_backoff_base_ms,
    };

    let mut outcomes = run_generation(&generator, hierarchy, &table, &groups, settings).await;
    outcomes.sort_by(|a, b| a.group.group_id.cmp(&b.group.group_id));

    let total = outcomes.len();
    let mut failed = 0usize;
    for outcome in outcomes {
        match outcome.result {
            Ok(codeframe) => {
                let path = args
                    .out_dir
                    .join(format!("{}.codeframe.json", codeframe.group_id));
                write_json(&path, &codeframe)?;
                println!(
                    "{}: {} codes from {} of {} responses -> {}",
                    codeframe.group_id,
                    codeframe.entries.len(),
                    codeframe.sample_size,
                    codeframe.total_responses,
                    path.display()
                );
            }
            Err(e) => {
                failed += 1;
                tracing::error!(
                    group_id = %outcome.group.group_id,
                    retryable = e.is_retryable(),
                    error = %e,
                    "codeframe generation failed"
                );
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {total} question groups failed");
    }
    Ok(())
}
