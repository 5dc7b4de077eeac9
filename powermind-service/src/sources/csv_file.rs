use std::{fs::File, io::Read, path::PathBuf};

use csv::StringRecord;
use powermind_domain::Observation;
use time::OffsetDateTime;

use crate::pipeline::{PipelineError, Source};

/// CSV replay source for an observation series.
///
/// Expected header columns (by name):
/// - timestamp (RFC3339 timestamp)
/// - actual_kwh
/// - hour (optional, must match timestamp)
/// - day_of_week (optional, Monday = 0, must match timestamp)
pub struct CsvSeriesSource {
    path: PathBuf,
}

impl CsvSeriesSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn parse_optional_u8(s: &str, column: &str) -> Result<Option<u8>, PipelineError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|e| PipelineError::Source(format!("invalid {column} '{trimmed}': {e}")))
}

fn record_to_observation(
    record: &StringRecord,
    headers: &StringRecord,
) -> Result<Observation, PipelineError> {
    let get = |name: &str| -> Result<&str, PipelineError> {
        headers
            .iter()
            .position(|h| h == name)
            .and_then(|idx| record.get(idx))
            .ok_or_else(|| PipelineError::Source(format!("missing column '{name}' in CSV record")))
    };

    let ts_str = get("timestamp")?;
    let ts = OffsetDateTime::parse(ts_str.trim(), &time::format_description::well_known::Rfc3339)
        .map_err(|e| PipelineError::Source(format!("invalid timestamp '{ts_str}': {e}")))?;

    let kwh_str = get("actual_kwh")?;
    let actual_kwh: f64 = kwh_str
        .trim()
        .parse()
        .map_err(|e| PipelineError::Source(format!("invalid actual_kwh '{kwh_str}': {e}")))?;

    // Keep the file's calendar columns; series validation rejects disagreement.
    let mut obs = Observation::at(ts, actual_kwh);
    if let Some(hour) = parse_optional_u8(get("hour").unwrap_or(""), "hour")? {
        obs.hour = hour;
    }
    if let Some(dow) = parse_optional_u8(get("day_of_week").unwrap_or(""), "day_of_week")? {
        obs.day_of_week = dow;
    }

    Ok(obs)
}

/// Reads a whole series from CSV text with a header row.
pub fn read_observations<R: Read>(reader: R) -> Result<Vec<Observation>, PipelineError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::Source(format!("failed to read CSV headers: {e}")))?
        .clone();

    let mut observations = Vec::new();
    for result in rdr.records() {
        let record = result
            .map_err(|e| PipelineError::Source(format!("failed to read CSV record: {e}")))?;

        match record_to_observation(&record, &headers) {
            Ok(obs) => observations.push(obs),
            Err(e) => {
                metrics::counter!("series_csv_parse_errors_total").increment(1);
                return Err(e);
            }
        }
    }

    Ok(observations)
}

impl Source for CsvSeriesSource {
    fn describe(&self) -> String {
        format!("csv({})", self.path.display())
    }

    fn observations(&self) -> Result<Vec<Observation>, PipelineError> {
        let file = File::open(&self.path)
            .map_err(|e| PipelineError::Source(format!("failed to open CSV file: {e}")))?;
        let observations = read_observations(file)?;
        tracing::debug!(
            path = %self.path.display(),
            rows = observations.len(),
            "series CSV loaded"
        );
        Ok(observations)
    }
}
