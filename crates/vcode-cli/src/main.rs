mod coding;
mod generate;
mod hierarchy;
mod io;
mod lifecycle;
mod retry;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vcode_codeframe::BrandHierarchyManager;
use vcode_core::AppConfig;
use vcode_llm::{ChatCompletionsClient, CompletionOptions};

use crate::generate::GenerateArgs;
use crate::hierarchy::HierarchyCommands;

#[derive(Debug, Parser)]
#[command(name = "vcode")]
#[command(about = "Survey verbatim codeframe generation and brand roll-up")]
struct Cli {
    /// Brand hierarchy file (overrides VCODE_HIERARCHY_PATH)
    #[arg(long, global = true)]
    hierarchy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate codeframes for the question groups of a table
    Generate {
        /// Raw table as JSON: an array of rows, row 0 is the header
        #[arg(long)]
        table: PathBuf,

        /// Question group definitions (YAML)
        #[arg(long)]
        groups: PathBuf,

        /// Directory for `<group_id>.codeframe.json` files
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,

        /// Only generate this question group
        #[arg(long)]
        group: Option<String>,

        /// Seed the sampler for a reproducible prompt
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Lock a generated codeframe for coding and export
    Finalize {
        codeframe: PathBuf,

        /// Finalize even if no substantive code has any usage
        #[arg(long)]
        force: bool,
    },
    /// Reopen a finalized codeframe for editing
    Unlock { codeframe: PathBuf },
    /// Code every response against a finalized codeframe
    Code {
        #[arg(long)]
        table: PathBuf,

        #[arg(long)]
        codeframe: PathBuf,

        /// Output file for coded responses (JSON)
        #[arg(long)]
        out: PathBuf,
    },
    /// Add parent brand codes to coded responses
    Rollup {
        /// Coded responses produced by `code`
        #[arg(long)]
        coded: PathBuf,

        #[arg(long)]
        out: PathBuf,
    },
    /// Inspect and edit brand hierarchies
    Hierarchy {
        #[command(subcommand)]
        command: HierarchyCommands,
    },
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Completion client from configuration; fails when no API key is set.
pub(crate) fn build_client(config: &AppConfig) -> anyhow::Result<ChatCompletionsClient> {
    let api_key = config
        .llm_api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("VCODE_LLM_API_KEY must be set for this command"))?;
    Ok(ChatCompletionsClient::with_base_url(
        api_key,
        &config.llm_model,
        config.llm_timeout_secs,
        &config.llm_base_url,
    )?)
}

pub(crate) fn completion_options(config: &AppConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.llm_temperature),
        max_tokens: Some(config.llm_max_tokens),
        json_mode: true,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = vcode_core::load_app_config()?;
    init_tracing(&config.log_level);
    tracing::debug!(?config, "configuration loaded");

    let hierarchy_path = cli
        .hierarchy
        .clone()
        .unwrap_or_else(|| config.hierarchy_path.clone());

    match cli.command {
        Commands::Generate {
            table,
            groups,
            out_dir,
            group,
            seed,
        } => {
            let manager = BrandHierarchyManager::from_rollup_file(io::read_rollup_file(
                &hierarchy_path,
            )?);
            generate::run_generate(
                &config,
                &manager,
                GenerateArgs {
                    table: &table,
                    groups: &groups,
                    out_dir: &out_dir,
                    group_filter: group.as_deref(),
                    seed,
                },
            )
            .await?;
        }
        Commands::Finalize { codeframe, force } => lifecycle::run_finalize(&codeframe, force)?,
        Commands::Unlock { codeframe } => lifecycle::run_unlock(&codeframe)?,
        Commands::Code {
            table,
            codeframe,
            out,
        } => coding::run_code(&config, &table, &codeframe, &out).await?,
        Commands::Rollup { coded, out } => {
            let manager = BrandHierarchyManager::from_rollup_file(io::read_rollup_file(
                &hierarchy_path,
            )?);
            coding::run_rollup(&manager, &coded, &out)?;
        }
        Commands::Hierarchy { command } => hierarchy::run_hierarchy(&hierarchy_path, command)?,
    }

    Ok(())
}
