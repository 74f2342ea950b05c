use crate::error::SinkError;
use crate::record::{COLUMNS, ResponseRow, csv_line};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only destination for response rows
pub trait Sink {
    fn append(&mut self, row: &ResponseRow) -> Result<(), SinkError>;

    fn name(&self) -> &str;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn append(&mut self, row: &ResponseRow) -> Result<(), SinkError> {
        (**self).append(row)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Appends rows to a CSV file, writing the header when the file is new or empty
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for CsvFileSink {
    fn append(&mut self, row: &ResponseRow) -> Result<(), SinkError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if file.metadata()?.len() == 0 {
            file.write_all(csv_line(&COLUMNS).as_bytes())?;
        }
        file.write_all(csv_line(&row.cells()).as_bytes())?;
        Ok(())
    }

    fn name(&self) -> &str {
        "csv-file"
    }
}

/// Keeps rows in memory; used when no remote sink is configured
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Vec<ResponseRow>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[ResponseRow] {
        &self.rows
    }
}

impl Sink for MemorySink {
    fn append(&mut self, row: &ResponseRow) -> Result<(), SinkError> {
        self.rows.push(row.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
