//! JSON artifact and roll-up file helpers.

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use vcode_core::{load_rollup_config, RollupFile};

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Write `value` as pretty JSON, creating parent directories as needed.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Load the roll-up file, or an empty configuration when it does not exist.
pub(crate) fn read_rollup_file(path: &Path) -> anyhow::Result<RollupFile> {
    if !path.exists() {
        tracing::warn!(
            path = %path.display(),
            "hierarchy file not found; using empty roll-up configuration"
        );
        return Ok(RollupFile::default());
    }
    Ok(load_rollup_config(path)?)
}

pub(crate) fn write_rollup_file(path: &Path, file: &RollupFile) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(file)?;
    std::fs::write(path, yaml).with_context(|| format!("failed to write {}", path.display()))
}
