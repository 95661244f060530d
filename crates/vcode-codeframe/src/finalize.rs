//! Generated/finalized lifecycle for codeframes.
//!
//! ```text
//! generated --finalize--> finalized --unlock--> generated --finalize--> ...
//! ```

use chrono::{DateTime, Utc};
use vcode_core::{Codeframe, CodeframeStatus};

use crate::catch_all::is_catch_all;
use crate::error::CodeframeError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinalizeOptions {
    /// Finalize even when no substantive code has any usage yet.
    pub allow_unused: bool,
}

/// Lock a generated codeframe, stamping `finalized_at` with the current time.
///
/// # Errors
///
/// See [`finalize_at`].
pub fn finalize(codeframe: &mut Codeframe, options: FinalizeOptions) -> Result<(), CodeframeError> {
    finalize_at(codeframe, options, Utc::now())
}

/// Lock a generated codeframe, stamping `finalized_at` with `now`.
///
/// # Errors
///
/// - [`CodeframeError::InvalidStateTransition`] unless the status is `generated`.
/// - [`CodeframeError::NoUsage`] when no non-catch-all entry has a nonzero
///   percentage and `options.allow_unused` is false.
pub fn finalize_at(
    codeframe: &mut Codeframe,
    options: FinalizeOptions,
    now: DateTime<Utc>,
) -> Result<(), CodeframeError> {
    if codeframe.status != CodeframeStatus::Generated {
        return Err(CodeframeError::InvalidStateTransition {
            from: codeframe.status,
            action: "finalize",
        });
    }

    let has_usage = codeframe
        .entries
        .iter()
        .any(|e| !is_catch_all(e) && e.percentage > 0.0);
    if !has_usage && !options.allow_unused {
        return Err(CodeframeError::NoUsage {
            group_id: codeframe.group_id.clone(),
        });
    }

    codeframe.status = CodeframeStatus::Finalized;
    codeframe.finalized_at = Some(now);
    tracing::info!(
        group_id = %codeframe.group_id,
        entries = codeframe.entries.len(),
        forced = !has_usage,
        "codeframe finalized"
    );
    Ok(())
}

/// Reopen a finalized codeframe for editing.
///
/// `finalized_at` is kept; the next [`finalize`] overwrites it.
///
/// # Errors
///
/// Returns [`CodeframeError::InvalidStateTransition`] unless the status is `finalized`.
pub fn unlock(codeframe: &mut Codeframe) -> Result<(), CodeframeError> {
    if codeframe.status != CodeframeStatus::Finalized {
        return Err(CodeframeError::InvalidStateTransition {
            from: codeframe.status,
            action: "unlock",
        });
    }
    codeframe.status = CodeframeStatus::Generated;
    tracing::info!(group_id = %codeframe.group_id, "codeframe unlocked");
    Ok(())
}
