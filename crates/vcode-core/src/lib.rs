//! Shared data model and configuration for the verbatim coding pipeline.

pub mod app_config;
pub mod codeframe;
pub mod config;
pub mod hierarchy;
pub mod question;
pub mod table;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use codeframe::{
    Codeframe, CodeframeEntry, CodeframeStatus, CodedResponse, BRAND_AWARENESS_CATEGORY,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use hierarchy::{
    brand_code, load_rollup_config, validate_rollup, BrandFamily, BrandHierarchy, BrandRollupConfig,
    RollupFile,
};
pub use question::{load_question_groups, QuestionGroup, QuestionType};
pub use table::{CellValue, RawTable};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}
