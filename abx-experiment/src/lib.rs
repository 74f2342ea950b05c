pub mod config;
pub mod error;
pub mod record;
pub mod recorder;
pub mod sampler;
pub mod sink;
pub mod state;
pub mod summary;
pub mod trial;

pub use config::ExperimentConfig;
pub use error::{ConfigError, SessionError, SinkError};
pub use record::{COLUMNS, ResponseRow, write_csv};
pub use recorder::{ExportPaths, Recorder, participant_file_stem};
pub use sampler::{TrialSampler, make_trials};
pub use sink::{CsvFileSink, MemorySink, Sink};
pub use state::{SessionEvent, SessionStateMachine};
pub use summary::{ConditionSummary, SessionSummary};
pub use trial::{PlannedTrial, TrialTimestamps};
