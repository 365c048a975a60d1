//! Sweeper configuration.
//!
//! Values come from an optional mounted YAML file and are then overridden by
//! command-line flags or their environment variables.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::DEFAULT_PAGE_SIZE;
use crate::sweep::SweepRules;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level sweeper configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SweeperConfig {
    /// Annotation key carrying the TTL in seconds
    #[serde(rename = "annotationKey", default)]
    pub annotation_key: String,

    /// Whether to sweep batch jobs after pods
    #[serde(rename = "includeJobs", default = "default_include_jobs")]
    pub include_jobs: bool,

    /// Log decisions without deleting anything
    #[serde(rename = "dryRun", default)]
    pub dry_run: bool,

    /// Objects requested per list page
    #[serde(rename = "pageSize", default = "default_page_size")]
    pub page_size: u32,

    #[serde(default)]
    pub jobs: JobSweepConfig,
}

/// Job-specific sweep settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JobSweepConfig {
    /// Only delete expired jobs that still have active pods
    #[serde(rename = "requireActive", default)]
    pub require_active: bool,
}

fn default_include_jobs() -> bool {
    true
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            annotation_key: String::new(),
            include_jobs: default_include_jobs(),
            dry_run: false,
            page_size: default_page_size(),
            jobs: JobSweepConfig::default(),
        }
    }
}

impl SweeperConfig {
    /// Load configuration from a mounted ConfigMap file
    ///
    /// # Errors
    /// Returns `ConfigError::Read` if the file cannot be read and
    /// `ConfigError::Parse` if it is not valid YAML for this struct.
    pub fn from_mounted_file(config_path: &str) -> Result<Self, ConfigError> {
        let config_str =
            std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                path: config_path.to_string(),
                source,
            })?;
        Ok(serde_yaml::from_str(&config_str)?)
    }

    /// # Errors
    /// Returns `ConfigError::Invalid` for an empty annotation key or a zero page size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.annotation_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "annotation key is required (set ANNOTATION_KEY or --annotation-key)".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid(
                "page size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Rules handed to each sweep
    #[must_use]
    pub fn rules(&self) -> SweepRules {
        SweepRules {
            annotation_key: self.annotation_key.trim().to_string(),
            dry_run: self.dry_run,
            jobs_require_active: self.jobs.require_active,
        }
    }
}
