//! `hierarchy` command handlers.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use vcode_codeframe::BrandHierarchyManager;
use anyhow::Context;
use vcode_core::{validate_rollup, BrandFamily, Codeframe, RollupFile};

use crate::io::{read_json, read_rollup_file, write_rollup_file};

/// Sub-commands available under `hierarchy`.
#[derive(Debug, Subcommand)]
pub enum HierarchyCommands {
    /// Print the configured brand hierarchies as a tree
    Summary,
    /// Propose hierarchies from a codeframe's brand entries
    Suggest {
        /// Codeframe JSON produced by `generate`
        codeframe: PathBuf,

        /// Append the suggestions to the hierarchy file
        #[arg(long)]
        apply: bool,
    },
    /// Add a parent brand with its sub-brands and aliases
    Add {
        parent: String,

        #[arg(long = "sub-brand")]
        sub_brands: Vec<String>,

        #[arg(long = "alias")]
        aliases: Vec<String>,
    },
}

pub(crate) fn run_hierarchy(path: &Path, command: HierarchyCommands) -> anyhow::Result<()> {
    let file = read_rollup_file(path)?;
    let reference_families = file.reference_families.clone();
    let mut manager = BrandHierarchyManager::from_rollup_file(file);

    match command {
        HierarchyCommands::Summary => {
            println!("{}", manager.generate_hierarchy_summary());
        }
        HierarchyCommands::Suggest { codeframe, apply } => {
            let codeframe: Codeframe = read_json(&codeframe)?;
            let suggestions = manager.suggest_hierarchies(&codeframe);
            if suggestions.is_empty() {
                println!("no hierarchy suggestions for '{}'", codeframe.group_id);
                return Ok(());
            }
            for suggestion in &suggestions {
                println!(
                    "{}: {}",
                    suggestion.parent_brand,
                    suggestion.sub_brands.join(", ")
                );
            }
            if apply {
                for suggestion in suggestions {
                    manager.add_hierarchy(
                        suggestion.parent_brand,
                        suggestion.sub_brands,
                        suggestion.aliases,
                    );
                }
                save(path, &manager, reference_families)?;
            }
        }
        HierarchyCommands::Add {
            parent,
            sub_brands,
            aliases,
        } => {
            manager.add_hierarchy(parent, sub_brands, aliases);
            save(path, &manager, reference_families)?;
        }
    }

    Ok(())
}

/// Validate with the same rules the loader applies, then write.
fn save(
    path: &Path,
    manager: &BrandHierarchyManager,
    reference_families: Vec<BrandFamily>,
) -> anyhow::Result<()> {
    let file = RollupFile {
        config: manager.export_config(),
        reference_families,
    };
    validate_rollup(&file)
        .with_context(|| format!("refusing to write {}", path.display()))?;
    write_rollup_file(path, &file)?;
    println!(
        "wrote {} hierarchies to {}",
        file.config.hierarchies.len(),
        path.display()
    );
    Ok(())
}
