//! `finalize` and `unlock` handlers. Both rewrite the codeframe file in place.

use std::path::Path;

use vcode_codeframe::{finalize, unlock, FinalizeOptions};
use vcode_core::Codeframe;

use crate::io::{read_json, write_json};

pub(crate) fn run_finalize(path: &Path, force: bool) -> anyhow::Result<()> {
    let mut codeframe: Codeframe = read_json(path)?;
    finalize(&mut codeframe, FinalizeOptions { allow_unused: force })?;
    write_json(path, &codeframe)?;
    println!(
        "finalized '{}' ({} codes)",
        codeframe.group_id,
        codeframe.entries.len()
    );
    Ok(())
}

pub(crate) fn run_unlock(path: &Path) -> anyhow::Result<()> {
    let mut codeframe: Codeframe = read_json(path)?;
    unlock(&mut codeframe)?;
    write_json(path, &codeframe)?;
    println!("unlocked '{}'", codeframe.group_id);
    Ok(())
}
