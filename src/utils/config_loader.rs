use async_trait::async_trait;
use dotenvy::dotenv;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use std::{env, fs};
use thiserror::Error;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([a-zA-Z_][0-9a-zA-Z_]*)\}").expect("env var pattern is a valid regex"));

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Error loading config: {0}")]
    ConfigError(String),
}

#[async_trait]
pub trait GuardConfigLoader {
    type SectionType;

    async fn load_section_from_file(file_name: String) -> Result<Self::SectionType, LoadConfigError>;
}

pub trait GuardConfigLoaderSync {
    type SectionType;

    fn load_section_from_file_sync(file_name: String) -> Result<Self::SectionType, LoadConfigError>;
}

pub async fn load_from_file<T: DeserializeOwned>(file_name: String) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = tokio::fs::read_to_string(file_name).await?;
    parse_config(&contents)
}

pub fn load_from_file_sync<T: DeserializeOwned>(file_name: String) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = fs::read_to_string(file_name)?;
    parse_config(&contents)
}

/// Parses TOML after substituting `${VAR}` references from the environment
pub fn parse_config<T: DeserializeOwned>(raw_config: &str) -> Result<T, LoadConfigError> {
    let contents = expand_vars(raw_config);
    let config: T = toml::from_str(&contents)?;
    Ok(config)
}

fn expand_vars(raw_config: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(raw_config, |caps: &Captures| match env::var(&caps[1]) {
            Ok(val) => val,
            Err(_) => caps[0].to_string(),
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        name: String,
    }

    #[test]
    fn test_unknown_vars_are_left_untouched() {
        let raw = "name = \"${SANDWICH_GUARD_SURELY_UNSET_VAR}\"";
        assert_eq!(expand_vars(raw), raw);
    }

    #[test]
    fn test_known_vars_are_substituted() {
        // PATH is set in every test environment
        let path = env::var("PATH").unwrap_or_default();
        let parsed: Sample = parse_config("name = \"${PATH}\"").unwrap();
        assert_eq!(parsed.name, path);
    }

    #[test]
    fn test_missing_file() {
        let result = load_from_file_sync::<Sample>("/nonexistent/guard.toml".to_string());
        assert!(matches!(result, Err(LoadConfigError::IoError(_))));
    }

    #[tokio::test]
    async fn test_async_load() {
        let path = env::temp_dir().join(format!("guard_loader_{}.toml", std::process::id()));
        tokio::fs::write(&path, "name = \"pool\"").await.unwrap();

        let parsed: Sample = load_from_file(path.to_string_lossy().to_string()).await.unwrap();
        assert_eq!(parsed.name, "pool");

        let _ = tokio::fs::remove_file(&path).await;
    }
}
