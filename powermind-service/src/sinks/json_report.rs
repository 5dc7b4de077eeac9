use std::{
    fs::{self, File},
    io::{self, Write},
    path::Path,
};

use powermind_domain::{
    queries::{anomaly_points, hourly_load_profile, HourlyLoad},
    ImpactSummary,
};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    forecast::ValidationMetrics,
    pipeline::{PipelineError, PipelineOutput, Sink},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyPoint {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub actual_kwh: f64,
    pub predicted_kwh: f64,
    pub waste_kwh: f64,
}

/// Serializable summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct WasteReport {
    pub source: String,
    pub fingerprint: String,
    pub model: &'static str,
    pub observations: usize,
    pub currency: String,
    pub summary: ImpactSummary,
    pub validation: Option<ValidationMetrics>,
    pub anomalies: Vec<AnomalyPoint>,
    pub hourly_profile: Vec<HourlyLoad>,
}

impl WasteReport {
    pub fn from_output(output: &PipelineOutput, currency: &str) -> Self {
        let anomalies = anomaly_points(&output.records)
            .into_iter()
            .map(|r| AnomalyPoint {
                timestamp: r.ts(),
                actual_kwh: r.actual_kwh(),
                predicted_kwh: r.predicted_kwh(),
                waste_kwh: r.waste_kwh,
            })
            .collect();

        Self {
            source: output.source.clone(),
            fingerprint: output.fingerprint.clone(),
            model: output.model,
            observations: output.observations.len(),
            currency: currency.to_string(),
            summary: output.summary,
            validation: output.forecast.validation,
            anomalies,
            hourly_profile: hourly_load_profile(&output.observations),
        }
    }
}

/// Pretty-printed JSON report written to any `Write`.
pub struct JsonReportSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonReportSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonReportSink<Box<dyn Write>> {
    /// Report file when `path` is set, stdout otherwise.
    pub fn to_path_or_stdout(path: Option<&Path>) -> Result<Self, PipelineError> {
        let writer: Box<dyn Write> = match path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|e| {
                        PipelineError::Sink(format!("failed to create {}: {e}", parent.display()))
                    })?;
                }
                Box::new(File::create(path).map_err(|e| {
                    PipelineError::Sink(format!("failed to create {}: {e}", path.display()))
                })?)
            }
            None => Box::new(io::stdout().lock()),
        };
        Ok(Self::new(writer))
    }
}

impl<W: Write> Sink<WasteReport> for JsonReportSink<W> {
    fn write(&mut self, input: &WasteReport) -> Result<(), PipelineError> {
        serde_json::to_writer_pretty(&mut self.writer, input)
            .map_err(|e| PipelineError::Sink(format!("failed to write report: {e}")))?;
        self.writer
            .write_all(b"\n")
            .and_then(|()| self.writer.flush())
            .map_err(|e| PipelineError::Sink(format!("failed to write report: {e}")))
    }
}
