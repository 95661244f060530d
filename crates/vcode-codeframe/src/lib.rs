//! Codeframe generation and brand roll-up pipeline.
//!
//! ```text
//! RawTable ─extract─> responses ─sample─> prompt ─complete─> parse
//!     ─> Codeframe (generated) ─ensure_catch_all─> ─process_codeframe─>
//!     ─finalize─> Codeframe (finalized) ─code─> CodedResponse ─roll_up─>
//! ```
//!
//! Every stage is a plain function or a value-owning struct. Nothing here
//! retries, caches, or persists; callers own orchestration.

pub mod catch_all;
pub mod coder;
pub mod coverage;
pub mod error;
pub mod extract;
pub mod finalize;
pub mod generator;
pub mod hierarchy;
pub mod parse;
pub mod prompts;
pub mod sampler;

pub use catch_all::{
    classify, ensure_catch_all, is_catch_all, move_catch_alls_last, CatchAllKind,
    CATCH_ALL_CATEGORY,
};
pub use coder::ResponseCoder;
pub use coverage::{apply_coverage, estimate_sample_coverage, usage_counts};
pub use error::CodeframeError;
pub use extract::{
    extract_responses, group_column_label, response_texts, GroupResponse, RESPONSE_SEPARATOR,
};
pub use finalize::{finalize, finalize_at, unlock, FinalizeOptions};
pub use generator::{CodeframeGenerator, GenerationOptions};
pub use hierarchy::{seed_families, BrandHierarchyManager};
pub use parse::{extract_json, parse_codeframe};
pub use prompts::{PromptInstance, PromptRegistry, PromptTemplate};
pub use sampler::{sample, sample_with, target_sample_size};
