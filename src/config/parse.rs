use super::types::Config;
use crate::config::expand_env_vars;
use regex::Regex;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    use std::io::Read;

    let mut file = File::open(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open config file '{}': {}", path.display(), e),
        ))
    })?;

    let mut yaml_string = String::new();
    file.read_to_string(&mut yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    // Expand environment variables in the YAML string before parsing
    let yaml_string = expand_env_vars(&yaml_string);
    check_unexpanded_vars(&yaml_string)?;

    let config: Config = serde_yaml::from_str(&yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        ))
    })?;

    validate_config(&config)?;

    Ok(config)
}

/// Checks for unexpanded environment variables and returns a helpful error
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let re = Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
    let mut unexpanded_vars: Vec<String> = re
        .captures_iter(yaml_string)
        .map(|cap| cap.get(1).unwrap().as_str().to_string())
        .collect();

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    unexpanded_vars.sort();
    unexpanded_vars.dedup();

    Err(ConfigError::Validation(format!(
        "Environment variables are not set: {}\n\
         \n\
         To fix this, either:\n\
         1. Set the environment variables (e.g., export INFLUX_PASSWORD=...)\n\
         2. Replace the variables in the config file with actual values",
        unexpanded_vars.join(", ")
    )))
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.source.url.is_empty() {
        errors.push("source.url must not be empty".to_string());
    }
    if config.source.database.is_empty() {
        errors.push("source.database must not be empty".to_string());
    }
    if config.source.page_size == 0 {
        errors.push("source.page_size must be at least 1".to_string());
    }

    if config.destination.url.is_empty() {
        errors.push("destination.url must not be empty".to_string());
    }
    if config.destination.database.is_empty() {
        errors.push("destination.database must not be empty".to_string());
    }
    if config.destination.collection.is_empty() {
        errors.push("destination.collection must not be empty".to_string());
    }

    if config.run.machine_type.is_empty() {
        errors.push("run.machine_type must not be empty".to_string());
    }
    if config.run.start_timestamp.timestamp_nanos_opt().is_none() {
        errors.push(format!(
            "run.start_timestamp '{}' is outside the representable nanosecond range",
            config.run.start_timestamp
        ));
    }

    if config.batch.size == 0 {
        errors.push("batch.size must be at least 1".to_string());
    }
    if config.batch.max_retries == 0 {
        errors.push("batch.max_retries must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}
