use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let env = parse_environment(&or_default("VCODE_ENV", "development"))?;
    let log_level = or_default("VCODE_LOG_LEVEL", "info");
    let hierarchy_path = PathBuf::from(or_default(
        "VCODE_HIERARCHY_PATH",
        "./config/hierarchies.yaml",
    ));

    let llm_api_key = lookup("VCODE_LLM_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());
    let llm_base_url = or_default("VCODE_LLM_BASE_URL", "https://api.openai.com/v1");
    let llm_model = or_default("VCODE_LLM_MODEL", "gpt-4o-mini");
    let llm_temperature: f32 = parse_var(&or_default, "VCODE_LLM_TEMPERATURE", "0.3")?;
    let llm_max_tokens: u32 = parse_var(&or_default, "VCODE_LLM_MAX_TOKENS", "4000")?;
    let llm_timeout_secs: u64 = parse_var(&or_default, "VCODE_LLM_TIMEOUT_SECS", "120")?;

    let sample_percentage: f64 = parse_var(&or_default, "VCODE_SAMPLE_PERCENTAGE", "30")?;
    if !(0.0..=100.0).contains(&sample_percentage) {
        return Err(ConfigError::InvalidEnvVar {
            var: "VCODE_SAMPLE_PERCENTAGE".to_string(),
            reason: format!("{sample_percentage} is outside 0..=100"),
        });
    }
    let sample_minimum: usize = parse_var(&or_default, "VCODE_SAMPLE_MINIMUM", "20")?;

    let column_batch_size: usize = parse_var(&or_default, "VCODE_COLUMN_BATCH_SIZE", "3")?;
    let max_concurrent_groups: usize =
        parse_var(&or_default, "VCODE_MAX_CONCURRENT_GROUPS", "3")?;
    let max_retries: u32 = parse_var(&or_default, "VCODE_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms: u64 =
        parse_var(&or_default, "VCODE_RETRY_BACKOFF_BASE_MS", "1000")?;
    let coding_batch_size: usize = parse_var(&or_default, "VCODE_CODING_BATCH_SIZE", "50")?;

    Ok(AppConfig {
        env,
        log_level,
        hierarchy_path,
        llm_api_key,
        llm_base_url,
        llm_model,
        llm_temperature,
        llm_max_tokens,
        llm_timeout_secs,
        sample_percentage,
        sample_minimum,
        column_batch_size,
        max_concurrent_groups,
        max_retries,
        retry_backoff_base_ms,
        coding_batch_size,
    })
}

fn parse_var<T, D>(or_default: &D, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    D: Fn(&str, &str) -> String,
{
    let raw = or_default(var, default);
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "VCODE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
