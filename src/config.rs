//! Configuration for skip list construction and logging
//!
//! Settings come from a TOML document (all fields optional) and are then
//! overridden by environment variables:
//!
//! | Variable             | Field                     |
//! |----------------------|---------------------------|
//! | `ZSKIPLIST_SEED`     | `seed`                    |
//! | `ZSKIPLIST_VERIFY`   | `verify_invariants`       |
//! | `ZSKIPLIST_LOG`      | `log.level`               |
//! | `ZSKIPLIST_LOG_JSON` | `log.json`                |

use crate::data::{GeometricLevel, SkipList};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkipListConfig {
    /// Seed for level generation; `None` seeds from OS entropy
    pub seed: Option<u64>,
    /// Re-check every structural invariant after each mutation (debug builds)
    pub verify_invariants: bool,
    /// Logging settings
    pub log: LogConfig,
}

impl Default for SkipListConfig {
    fn default() -> Self {
        SkipListConfig {
            seed: None,
            verify_invariants: false,
            log: LogConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` env-filter directive (default: info)
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Failure to load configuration
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl SkipListConfig {
    /// Configuration for tests: fixed seed, invariants checked on every op
    pub fn test(seed: u64) -> Self {
        SkipListConfig {
            seed: Some(seed),
            verify_invariants: true,
            log: LogConfig {
                level: "debug".to_string(),
                json: false,
            },
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = SkipListConfig::default();
        config.apply_env();
        config
    }

    /// Apply `ZSKIPLIST_*` overrides. Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(seed) = lookup("ZSKIPLIST_SEED").and_then(|s| s.trim().parse().ok()) {
            self.seed = Some(seed);
        }
        if let Some(verify) = lookup("ZSKIPLIST_VERIFY").and_then(|v| parse_flag(&v)) {
            self.verify_invariants = verify;
        }
        if let Some(level) = lookup("ZSKIPLIST_LOG").filter(|s| !s.trim().is_empty()) {
            self.log.level = level;
        }
        if let Some(json) = lookup("ZSKIPLIST_LOG_JSON").and_then(|v| parse_flag(&v)) {
            self.log.json = json;
        }
    }

    /// Build an empty skip list according to this configuration
    pub fn build(&self) -> SkipList<GeometricLevel> {
        let level_gen = match self.seed {
            Some(seed) => GeometricLevel::seeded(seed),
            None => GeometricLevel::from_entropy(),
        };
        let mut list = SkipList::with_generator(level_gen);
        list.set_verify_invariants(self.verify_invariants);
        list
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Member;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SkipListConfig::default();
        assert_eq!(config.seed, None);
        assert!(!config.verify_invariants);
        assert_eq!(config.log.level, "info");
        assert!(!config.log.json);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = SkipListConfig::from_toml_str(
            r#"
            seed = 42

            [log]
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(42));
        assert!(!config.verify_invariants);
        assert_eq!(config.log.level, "info");
        assert!(config.log.json);
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = SkipListConfig::from_toml_str("seed = \"nope\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "verify_invariants = true").unwrap();
        let config = SkipListConfig::from_file(file.path()).unwrap();
        assert!(config.verify_invariants);

        let missing = SkipListConfig::from_file("/nonexistent/zskiplist.toml").unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ZSKIPLIST_SEED", "7"),
            ("ZSKIPLIST_VERIFY", "yes"),
            ("ZSKIPLIST_LOG", "trace"),
            ("ZSKIPLIST_LOG_JSON", "garbage"),
        ]
        .into_iter()
        .collect();
        let mut config = SkipListConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.seed, Some(7));
        assert!(config.verify_invariants);
        assert_eq!(config.log.level, "trace");
        assert!(!config.log.json);
    }

    #[test]
    fn test_build_seeded_is_reproducible() {
        let config = SkipListConfig::test(5);
        let mut a = config.build();
        let mut b = config.build();
        for i in 0..200 {
            a.insert(i as f64, Member::from("m")).unwrap();
            b.insert(i as f64, Member::from("m")).unwrap();
        }
        assert_eq!(a.level(), b.level());
        assert!(a.check_invariants().is_ok());
    }
}
