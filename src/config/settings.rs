//! # Factory Settings
//!
//! Defines the configuration structure for the certificate factory.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Certificate factory configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FactoryConfig {
    /// Subject common name of issued leaf certificates
    #[validate(length(min = 1, message = "CN cannot be empty"))]
    pub cn: String,

    /// Subject organization entries
    pub organization: Vec<String>,

    /// Days ahead of expiry at which a certificate counts as expired
    #[validate(range(min = 0, max = 3650, message = "Expiration check must be between 0 and 3650 days"))]
    pub expiration_days_check: i64,

    /// Lifetime of issued leaf certificates in days
    #[validate(range(min = 1, max = 3650, message = "Validity must be between 1 and 3650 days"))]
    pub validity_days: i64,

    /// Annotation key length limits
    #[validate(nested)]
    pub annotation_key_limits: AnnotationKeyLimits,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            cn: "dyncert".to_string(),
            organization: vec!["dyncert".to_string()],
            expiration_days_check: 90,
            validity_days: 365,
            annotation_key_limits: AnnotationKeyLimits::default(),
        }
    }
}

impl FactoryConfig {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents).map_err(|e| {
            Error::config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(cn) = env_value("DYNCERT_CN") {
            self.cn = cn;
        }

        if let Some(organization) = env_value("DYNCERT_ORGANIZATION") {
            self.organization = organization
                .split(',')
                .map(|org| org.trim().to_string())
                .filter(|org| !org.is_empty())
                .collect();
        }

        if let Some(days) = env_value("DYNCERT_EXPIRATION_DAYS_CHECK") {
            self.expiration_days_check = days.parse().map_err(|e| {
                Error::config(format!("Invalid DYNCERT_EXPIRATION_DAYS_CHECK: {}", e))
            })?;
        }

        if let Some(days) = env_value("DYNCERT_VALIDITY_DAYS") {
            self.validity_days = days
                .parse()
                .map_err(|e| Error::config(format!("Invalid DYNCERT_VALIDITY_DAYS: {}", e)))?;
        }

        Ok(())
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self)?;
        self.annotation_key_limits.validate_custom()
    }
}

/// Length limits applied when a CN is turned into an annotation key.
///
/// Keys shorter than `max_key_len` without a `:` are used verbatim. Anything
/// else is cut to `truncated_len` bytes and suffixed with `-` plus
/// `digest_chars` hex characters of its SHA-256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AnnotationKeyLimits {
    #[validate(range(min = 16, max = 253, message = "max_key_len must be between 16 and 253"))]
    pub max_key_len: usize,

    #[validate(range(min = 1, message = "truncated_len must be positive"))]
    pub truncated_len: usize,

    #[validate(range(min = 4, max = 64, message = "digest_chars must be between 4 and 64"))]
    pub digest_chars: usize,
}

impl Default for AnnotationKeyLimits {
    fn default() -> Self {
        Self { max_key_len: 64, truncated_len: 56, digest_chars: 6 }
    }
}

impl AnnotationKeyLimits {
    fn validate_custom(&self) -> Result<()> {
        // hashed keys must stay below max_key_len
        if self.truncated_len + 1 + self.digest_chars >= self.max_key_len {
            return Err(Error::validation(format!(
                "truncated_len ({}) + 1 + digest_chars ({}) must be below max_key_len ({})",
                self.truncated_len, self.digest_chars, self.max_key_len
            )));
        }
        Ok(())
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
