use crate::record::{ResponseRow, write_csv};
use crate::sink::Sink;
use abx_core::TrialResponse;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where [`Recorder::write_exports`] put its files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub log: PathBuf,
    pub backup: Option<PathBuf>,
}

/// Forwards each response to a primary sink and keeps the full log locally.
///
/// Rows the sink refuses are kept in a backup buffer instead of being lost;
/// the session never waits on sink success.
#[derive(Debug)]
pub struct Recorder<S: Sink> {
    participant: String,
    sink: S,
    log: Vec<ResponseRow>,
    backup: Vec<ResponseRow>,
}

impl<S: Sink> Recorder<S> {
    pub fn new(participant: &str, sink: S) -> Self {
        Self {
            participant: participant.to_string(),
            sink,
            log: Vec::new(),
            backup: Vec::new(),
        }
    }

    /// Logs a response; returns whether the primary sink accepted it
    pub fn record(&mut self, response: &TrialResponse) -> bool {
        let row = ResponseRow::from_response(&self.participant, response);
        let delivered = match self.sink.append(&row) {
            Ok(()) => {
                debug!("trial {} written to {}", row.trial_index, self.sink.name());
                true
            }
            Err(e) => {
                warn!(
                    "{} sink failed for trial {}, keeping row locally: {}",
                    self.sink.name(),
                    row.trial_index,
                    e
                );
                self.backup.push(row.clone());
                false
            }
        };
        self.log.push(row);
        delivered
    }

    pub fn log(&self) -> &[ResponseRow] {
        &self.log
    }

    /// Rows the primary sink did not accept
    pub fn backup(&self) -> &[ResponseRow] {
        &self.backup
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Writes `<participant>_abx.csv` and, when rows were diverted,
    /// `<participant>_abx_local_backup.csv` into `dir`.
    pub fn write_exports(&self, dir: &Path) -> io::Result<ExportPaths> {
        std::fs::create_dir_all(dir)?;
        let stem = participant_file_stem(&self.participant);

        let log = dir.join(format!("{stem}_abx.csv"));
        write_csv(BufWriter::new(File::create(&log)?), &self.log)?;

        let backup = if self.backup.is_empty() {
            None
        } else {
            let path = dir.join(format!("{stem}_abx_local_backup.csv"));
            write_csv(BufWriter::new(File::create(&path)?), &self.backup)?;
            Some(path)
        };

        Ok(ExportPaths { log, backup })
    }
}

/// Participant id made safe for use in a file name
pub fn participant_file_stem(participant: &str) -> String {
    let stem: String = participant
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "anon".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use abx_core::{AbxTrial, Condition, Construction, Side, StimulusRecord};
    use chrono::Utc;

    /// Refuses every other row
    struct FlakySink {
        calls: usize,
    }

    impl Sink for FlakySink {
        fn append(&mut self, _row: &ResponseRow) -> Result<(), SinkError> {
            self.calls += 1;
            if self.calls % 2 == 0 {
                Err(SinkError::Unavailable("quota exceeded".into()))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn response(index: usize) -> TrialResponse {
        let trial = AbxTrial::from_triad(
            Condition::Heat,
            StimulusRecord::new(Condition::Heat, "VER", "VER/a_heat.png"),
            StimulusRecord::new(Condition::Heat, "NOR", "NOR/b_heat.png"),
            StimulusRecord::new(Condition::Heat, "VER", "VER/c_heat.png"),
            Construction::Paired,
        );
        TrialResponse {
            trial_index: index,
            is_practice: false,
            is_correct: trial.score(Side::A),
            trial,
            chosen: Side::A,
            reaction_time_ms: 500,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn failed_rows_go_to_backup_and_log_keeps_everything() {
        let mut recorder = Recorder::new("p 01", FlakySink { calls: 0 });
        let delivered: Vec<bool> = (0..4).map(|i| recorder.record(&response(i))).collect();

        assert_eq!(delivered, vec![true, false, true, false]);
        assert_eq!(recorder.log().len(), 4);
        let backed_up: Vec<usize> = recorder.backup().iter().map(|r| r.trial_index).collect();
        assert_eq!(backed_up, vec![1, 3]);

        let dir = tempfile::tempdir().unwrap();
        let paths = recorder.write_exports(dir.path()).unwrap();
        assert_eq!(paths.log, dir.path().join("p_01_abx.csv"));
        let backup = std::fs::read_to_string(paths.backup.unwrap()).unwrap();
        assert_eq!(backup.lines().count(), 3);
    }

    #[test]
    fn no_backup_file_when_every_row_was_delivered() {
        let mut recorder = Recorder::new("p02", crate::sink::MemorySink::new());
        recorder.record(&response(0));
        assert_eq!(recorder.sink().rows().len(), 1);

        let dir = tempfile::tempdir().unwrap();
        let paths = recorder.write_exports(dir.path()).unwrap();
        assert!(paths.backup.is_none());
        let log = std::fs::read_to_string(paths.log).unwrap();
        assert_eq!(log.lines().count(), 2);
    }
}
