use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A parent brand with the sub-brands and aliases that roll up into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandHierarchy {
    pub parent_brand: String,
    #[serde(default)]
    pub sub_brands: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl BrandHierarchy {
    #[must_use]
    pub fn new(parent_brand: impl Into<String>, sub_brands: Vec<String>, aliases: Vec<String>) -> Self {
        Self {
            parent_brand: parent_brand.into(),
            sub_brands,
            aliases,
        }
    }

    /// Code synthesized for the parent entry.
    #[must_use]
    pub fn parent_code(&self) -> String {
        brand_code(&self.parent_brand)
    }

    /// Codes of every sub-brand and alias under this parent.
    #[must_use]
    pub fn member_codes(&self) -> HashSet<String> {
        self.sub_brands
            .iter()
            .chain(&self.aliases)
            .map(|name| brand_code(name))
            .collect()
    }
}

/// Per-project roll-up configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandRollupConfig {
    #[serde(default)]
    pub hierarchies: Vec<BrandHierarchy>,
    #[serde(default = "default_true")]
    pub rollup_enabled: bool,
    #[serde(default = "default_true")]
    pub preserve_sub_brands: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BrandRollupConfig {
    fn default() -> Self {
        Self {
            hierarchies: Vec::new(),
            rollup_enabled: true,
            preserve_sub_brands: true,
        }
    }
}

/// Known brand family used to suggest hierarchies from codeframe labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandFamily {
    pub parent: String,
    pub members: Vec<String>,
}

/// On-disk shape of the roll-up configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollupFile {
    #[serde(flatten)]
    pub config: BrandRollupConfig,
    /// Overrides the built-in reference families when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_families: Vec<BrandFamily>,
}

/// Derive the `BRAND_<UPPER_SNAKE>` code for a brand name.
///
/// Letters and digits in any script are kept (upper-cased where the script
/// has case), apostrophes are dropped, and any other run of characters
/// becomes a single underscore. A name with no letters or digits at all is
/// encoded by its code points (`BRAND_U1F964`) so distinct names stay distinct.
#[must_use]
pub fn brand_code(name: &str) -> String {
    let mut snake = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !snake.is_empty() {
                snake.push('_');
            }
            pending_sep = false;
            snake.extend(c.to_uppercase());
        } else if c != '\'' && c != '\u{2019}' {
            pending_sep = true;
        }
    }
    if snake.is_empty() {
        snake = name
            .trim()
            .chars()
            .map(|c| format!("U{:X}", u32::from(c)))
            .collect::<Vec<_>>()
            .join("_");
    }
    format!("BRAND_{snake}")
}

/// Load and validate the roll-up configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_rollup_config(path: &Path) -> Result<RollupFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: RollupFile = serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
        path: path.display().to_string(),
        source: e,
    })?;

    validate_rollup(&file)?;

    Ok(file)
}

/// Check a roll-up file before it is used or written.
///
/// # Errors
///
/// Returns `ConfigError::Validation` for a blank or duplicate (case-insensitive)
/// parent brand, a blank sub-brand or alias, or an incomplete reference family.
pub fn validate_rollup(file: &RollupFile) -> Result<(), ConfigError> {
    let mut seen_parents = HashSet::new();

    for hierarchy in &file.config.hierarchies {
        if hierarchy.parent_brand.trim().is_empty() {
            return Err(ConfigError::Validation(
                "parent_brand must be non-empty".to_string(),
            ));
        }

        if !seen_parents.insert(hierarchy.parent_brand.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate parent_brand: '{}'",
                hierarchy.parent_brand
            )));
        }

        if let Some(empty) = hierarchy
            .sub_brands
            .iter()
            .chain(&hierarchy.aliases)
            .find(|name| name.trim().is_empty())
        {
            return Err(ConfigError::Validation(format!(
                "parent_brand '{}' lists an empty sub-brand or alias ({empty:?})",
                hierarchy.parent_brand
            )));
        }
    }

    for family in &file.reference_families {
        if family.parent.trim().is_empty() || family.members.is_empty() {
            return Err(ConfigError::Validation(format!(
                "reference family '{}' needs a parent and at least one member",
                family.parent
            )));
        }
    }

    Ok(())
}
