use crate::error::ConfigError;
use abx_core::Condition;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub practice_trials: usize,
    pub experiment_trials: usize,
    /// Conditions trials are drawn from
    pub conditions: Vec<Condition>,
    /// Driver directories to scan; empty means every subdirectory
    pub drivers: Vec<String>,
    pub stim_root: PathBuf,
    /// Fixed RNG seed for reproducible trial sequences
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            practice_trials: 0,
            experiment_trials: 20,
            conditions: Condition::ALL.to_vec(),
            drivers: Vec::new(),
            stim_root: PathBuf::from("stim"),
            seed: None,
        }
    }
}

impl ExperimentConfig {
    /// Reads a JSON config file; missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.conditions.is_empty() {
            return Err(ConfigError::NoConditions);
        }
        if self.experiment_trials == 0 {
            return Err(ConfigError::NoTrials);
        }
        Ok(())
    }
}
