// ABOUTME: Split configuration loaded from an optional TOML file and CLI overrides
// ABOUTME: Validates batch size, sequence width, schema and migration names

use crate::dump::DEFAULT_BATCH_SIZE;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings that shape how a dump is split into migrations
///
/// Every field has a default, so an empty TOML file (or none at all) yields
/// the stock behaviour:
///
/// ```toml
/// schema = "public"
/// batch_size = 1000
/// sequence_width = 6
/// init_name = "init_setup"
/// foreign_keys_name = "add_foreign_keys"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitConfig {
    /// Schema whose tables own indexes, triggers and constraints
    pub schema: String,
    /// Maximum number of value tuples per INSERT statement
    pub batch_size: usize,
    /// Zero-padded width of the sequence prefix in file names
    pub sequence_width: usize,
    /// Name of the leading migration holding the dump preamble and globals
    pub init_name: String,
    /// Name of the trailing migration holding foreign keys
    pub foreign_keys_name: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            sequence_width: 6,
            init_name: "init_setup".to_string(),
            foreign_keys_name: "add_foreign_keys".to_string(),
        }
    }
}

impl SplitConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SplitConfig =
            toml::from_str(contents).context("Failed to parse split configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Check that the configuration can produce usable migrations
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `batch_size` is zero
    /// - `sequence_width` is outside 1..=20
    /// - `schema` is empty
    /// - `init_name` or `foreign_keys_name` is empty or not file-name safe
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be greater than zero");
        }
        if !(1..=20).contains(&self.sequence_width) {
            bail!(
                "sequence_width must be between 1 and 20, got {}",
                self.sequence_width
            );
        }
        if self.schema.trim().is_empty() {
            bail!("schema cannot be empty");
        }
        for (field, value) in [
            ("init_name", &self.init_name),
            ("foreign_keys_name", &self.foreign_keys_name),
        ] {
            if value.is_empty() {
                bail!("{} cannot be empty", field);
            }
            if !value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                bail!(
                    "{} may only contain ASCII letters, digits, '_' and '-', got '{}'",
                    field,
                    value
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SplitConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.schema, "public");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = SplitConfig::from_toml_str("").unwrap();
        assert_eq!(config, SplitConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = SplitConfig::from_toml_str("schema = \"app\"\nbatch_size = 250\n").unwrap();
        assert_eq!(config.schema, "app");
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.sequence_width, 6);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(SplitConfig::from_toml_str("batch_size = 0").is_err());
        assert!(SplitConfig::from_toml_str("sequence_width = 0").is_err());
        assert!(SplitConfig::from_toml_str("sequence_width = 21").is_err());
        assert!(SplitConfig::from_toml_str("schema = \"  \"").is_err());
        assert!(SplitConfig::from_toml_str("init_name = \"../escape\"").is_err());
        assert!(SplitConfig::from_toml_str("foreign_keys_name = \"\"").is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = SplitConfig::from_toml_str("bach_size = 10").unwrap_err();
        assert!(format!("{:#}", err).contains("bach_size"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splitter.toml");
        std::fs::write(&path, "sequence_width = 4\n").unwrap();

        let config = SplitConfig::load(&path).unwrap();
        assert_eq!(config.sequence_width, 4);

        assert!(SplitConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
