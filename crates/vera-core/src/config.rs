//! Runtime configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::audit::ContestOptions;
use crate::contestation::RecomputeOptions;
use crate::decision::{DecisionPolicy, DEFAULT_RECOMPUTE_HALF_WIDTH, DEFAULT_THRESHOLD};
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(#[from] ModelError),

    #[error("invalid config: trace version must not be empty")]
    EmptyTraceVersion,
}

/// How recompute decides whether a contestation changed the decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecomputePolicy {
    /// Band around the prior threshold inside which a strength counts as indeterminate
    pub indeterminate_half_width: f64,
}

impl Default for RecomputePolicy {
    fn default() -> Self {
        Self {
            indeterminate_half_width: DEFAULT_RECOMPUTE_HALF_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VeraConfig {
    /// Labeling for freshly sealed traces
    pub decision: DecisionPolicy,
    pub recompute: RecomputePolicy,
    /// Version string stamped on sealed traces
    pub trace_version: String,
}

impl Default for VeraConfig {
    fn default() -> Self {
        Self {
            decision: DecisionPolicy::default(),
            recompute: RecomputePolicy::default(),
            trace_version: "0.1.0".to_string(),
        }
    }
}

impl VeraConfig {
    /// Load and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: VeraConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.decision.validate()?;
        DecisionPolicy::three_way(DEFAULT_THRESHOLD, self.recompute.indeterminate_half_width)
            .validate()?;
        if self.trace_version.trim().is_empty() {
            return Err(ConfigError::EmptyTraceVersion);
        }
        Ok(())
    }

    /// Recompute options for a bare framework recompute, centred on the
    /// configured decision threshold.
    pub fn recompute_options(&self) -> RecomputeOptions {
        RecomputeOptions {
            policy: DecisionPolicy::three_way(
                self.decision.threshold,
                self.recompute.indeterminate_half_width,
            ),
            ..RecomputeOptions::default()
        }
    }

    pub fn contest_options(&self) -> ContestOptions {
        ContestOptions {
            decision_half_width: self.decision.indeterminate_half_width,
            change_half_width: self.recompute.indeterminate_half_width,
            ..ContestOptions::default()
        }
    }
}
