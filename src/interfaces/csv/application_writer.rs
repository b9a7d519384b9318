use crate::domain::application::ApplicationRecord;
use crate::error::{Result, ServiceError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ApplicationRow<'a> {
    id: String,
    status: &'static str,
    program: &'a str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'a> From<&'a ApplicationRecord> for ApplicationRow<'a> {
    fn from(record: &'a ApplicationRecord) -> Self {
        Self {
            id: record.id.to_string(),
            status: record.status.as_str(),
            program: record
                .sections
                .program_selection
                .as_ref()
                .map(|p| p.program.as_str())
                .unwrap_or(""),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Writes one summary row per application to a CSV sink.
pub struct ApplicationWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ApplicationWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes the header followed by `records` in the order given.
    pub fn write_applications(&mut self, records: &[ApplicationRecord]) -> Result<()> {
        if records.is_empty() {
            self.writer
                .write_record(["id", "status", "program", "created_at", "updated_at"])
                .map_err(csv_error)?;
        }
        for record in records {
            self.writer
                .serialize(ApplicationRow::from(record))
                .map_err(csv_error)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

fn csv_error(e: csv::Error) -> ServiceError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => ServiceError::IoError(io),
        other => ServiceError::Validation(format!("could not write CSV: {:?}", other)),
    }
}
