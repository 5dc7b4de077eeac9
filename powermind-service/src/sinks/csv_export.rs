use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

use powermind_domain::Observation;
use time::format_description::well_known::Rfc3339;

use crate::pipeline::{PipelineError, Sink};

pub const OBSERVATION_COLUMNS: [&str; 4] = ["timestamp", "actual_kwh", "hour", "day_of_week"];

/// Flat CSV export of an observation series, readable by
/// [`CsvSeriesSource`](crate::sources::CsvSeriesSource).
///
/// The header row is written by the first `write`; later writes append rows.
pub struct CsvObservationSink<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

impl<W: Write> CsvObservationSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            header_written: false,
        }
    }

    pub fn into_inner(self) -> Result<W, PipelineError> {
        self.writer
            .into_inner()
            .map_err(|e| PipelineError::Sink(format!("failed to flush CSV export: {e}")))
    }
}

impl CsvObservationSink<File> {
    pub fn create(path: &Path) -> Result<Self, PipelineError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| PipelineError::Sink(format!("failed to create {}: {e}", parent.display())))?;
        }
        let file = File::create(path)
            .map_err(|e| PipelineError::Sink(format!("failed to create {}: {e}", path.display())))?;
        Ok(Self::new(file))
    }
}

impl<W: Write> Sink<[Observation]> for CsvObservationSink<W> {
    fn write(&mut self, input: &[Observation]) -> Result<(), PipelineError> {
        let csv_err = |e: csv::Error| PipelineError::Sink(format!("failed to write CSV export: {e}"));

        if !self.header_written {
            self.writer.write_record(OBSERVATION_COLUMNS).map_err(csv_err)?;
            self.header_written = true;
        }
        for obs in input {
            let ts = obs
                .ts
                .format(&Rfc3339)
                .map_err(|e| PipelineError::Sink(format!("failed to format timestamp: {e}")))?;
            self.writer
                .write_record([
                    ts,
                    obs.actual_kwh.to_string(),
                    obs.hour.to_string(),
                    obs.day_of_week.to_string(),
                ])
                .map_err(csv_err)?;
        }
        self.writer
            .flush()
            .map_err(|e| PipelineError::Sink(format!("failed to flush CSV export: {e}")))?;

        metrics::counter!("export_observations_written_total").increment(input.len() as u64);
        Ok(())
    }
}
