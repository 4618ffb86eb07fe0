//! Key-value settings source.
//!
//! Values come from a TOML file (keys of the `[main]` table plus any top-level
//! scalars) and are overridden by environment variables named
//! `RAGLINE_<KEY>`. When a profile is active (`RAGLINE_PROFILE=PROD`), the
//! variable `PROD_RAGLINE_<KEY>` wins over the unprefixed one.

use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::ConfigError;

const ENV_PREFIX: &str = "RAGLINE_";
const PROFILE_VAR: &str = "RAGLINE_PROFILE";
const MAIN_SECTION: &str = "main";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

#[derive(Debug, Clone, Default)]
pub struct Settings {
    profile: String,
    values: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
    use_env: bool,
}

impl Settings {
    /// Settings backed only by the environment.
    pub fn from_env() -> Self {
        Self {
            profile: env_opt(PROFILE_VAR).unwrap_or_default().to_uppercase(),
            values: BTreeMap::new(),
            overrides: BTreeMap::new(),
            use_env: true,
        }
    }

    /// Load settings from a TOML file layered under the environment.
    ///
    /// A missing file at the default location is not an error; the caller
    /// passes `required = true` when the path was given explicitly.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let mut settings = Self::from_env();
        if !path.exists() && !required {
            debug!(path = %path.display(), "settings file not found, using environment only");
            return Ok(settings);
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        settings.values = parse_toml(&content)?;
        debug!(path = %path.display(), keys = settings.values.len(), "loaded settings file");
        Ok(settings)
    }

    /// Settings from a TOML string, ignoring the environment.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            profile: String::new(),
            values: parse_toml(content)?,
            overrides: BTreeMap::new(),
            use_env: false,
        })
    }

    /// Set a key at the file layer; the environment still wins.
    pub fn with_value(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Set a key above every other layer (command-line flags).
    pub fn with_override(mut self, key: &str, value: impl Into<String>) -> Self {
        self.overrides.insert(key.to_string(), value.into());
        self
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(v) = self.overrides.get(key).filter(|v| !v.is_empty()) {
            return Some(v.clone());
        }
        if self.use_env {
            let var = format!("{}{}", ENV_PREFIX, key.to_uppercase());
            if let Some(v) = profiled_env_opt(&self.profile, &var) {
                return Some(v);
            }
        }
        self.values.get(key).filter(|v| !v.is_empty()).cloned()
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    /// Parse a key into `T`, returning `default` when unset.
    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid(key, &raw, e)),
            None => Ok(default),
        }
    }

    /// Parse a key into `T`, or `None` when unset.
    pub fn parse_opt<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| raw.trim().parse().map_err(|e| ConfigError::invalid(key, &raw, e)))
            .transpose()
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::invalid(key, &raw, "expected a boolean")),
            },
            None => Ok(default),
        }
    }
}

/// Flatten the `[main]` table and top-level scalars into string values.
fn parse_toml(content: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let table: toml::Table = content
        .parse()
        .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;

    let mut values = BTreeMap::new();
    for (key, value) in &table {
        if let Some(scalar) = scalar_to_string(value) {
            values.insert(key.clone(), scalar);
        }
    }
    if let Some(toml::Value::Table(main)) = table.get(MAIN_SECTION) {
        for (key, value) in main {
            if let Some(scalar) = scalar_to_string(value) {
                values.insert(key.clone(), scalar);
            }
        }
    }
    Ok(values)
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_main_section() {
        let settings = Settings::from_toml_str("[main]\nembedmodel = \"nomic-embed-text\"\n").unwrap();
        assert_eq!(settings.require("embedmodel").unwrap(), "nomic-embed-text");
    }

    #[test]
    fn main_section_overrides_top_level() {
        let settings =
            Settings::from_toml_str("collection = \"top\"\n[main]\ncollection = \"main\"\n").unwrap();
        assert_eq!(settings.get("collection").as_deref(), Some("main"));
    }

    #[test]
    fn scalars_are_stringified() {
        let settings = Settings::from_toml_str("[main]\nworkers = 4\nreset_collection = false\n").unwrap();
        assert_eq!(settings.parse_or("workers", 0usize).unwrap(), 4);
        assert!(!settings.bool_or("reset_collection", true).unwrap());
    }

    #[test]
    fn missing_required_key() {
        let settings = Settings::from_toml_str("").unwrap();
        let err = settings.require("embedmodel").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey(ref k) if k == "embedmodel"));
    }

    #[test]
    fn negative_count_is_rejected() {
        let settings = Settings::from_toml_str("[main]\nword_overlap = -1\n").unwrap();
        let err = settings.parse_or("word_overlap", 0usize).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "word_overlap"));
    }

    #[test]
    fn with_value_overrides_file() {
        let settings = Settings::from_toml_str("[main]\nchunker = \"words\"\n")
            .unwrap()
            .with_value("chunker", "greedy");
        assert_eq!(settings.get_or("chunker", "words"), "greedy");
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        assert!(matches!(
            Settings::from_toml_str("[main\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_override_wins() {
        std::env::set_var("RAGLINE_SETTINGS_TEST_ONLY_KEY", "from-env");
        let settings = Settings::from_env().with_value("settings_test_only_key", "from-file");
        assert_eq!(settings.get("settings_test_only_key").as_deref(), Some("from-env"));
        std::env::remove_var("RAGLINE_SETTINGS_TEST_ONLY_KEY");
    }

    #[test]
    fn override_beats_env() {
        std::env::set_var("RAGLINE_SETTINGS_TEST_OVERRIDE_KEY", "from-env");
        let settings = Settings::from_env().with_override("settings_test_override_key", "from-flag");
        assert_eq!(settings.get("settings_test_override_key").as_deref(), Some("from-flag"));
        std::env::remove_var("RAGLINE_SETTINGS_TEST_OVERRIDE_KEY");
    }

    #[test]
    fn missing_optional_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.toml"), false).unwrap();
        assert!(settings.get("settings_test_absent_key").is_none());
        assert!(Settings::load(&dir.path().join("absent.toml"), true).is_err());
    }
}
