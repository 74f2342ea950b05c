use abx_core::Condition;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no conditions enabled")]
    NoConditions,

    #[error("experiment trial count must be positive")]
    NoTrials,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("participant id is required")]
    EmptyParticipant,

    #[error("no stimuli available for conditions {conditions:?}")]
    NoEligibleStimuli { conditions: Vec<Condition> },
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink rejected row: {0}")]
    Rejected(String),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}
