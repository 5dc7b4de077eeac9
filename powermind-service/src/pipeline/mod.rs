use powermind_domain::{ImpactSummary, Observation, WasteRecord};

use crate::{
    detect::{self, DetectorParams},
    fingerprint,
    forecast::{self, FitError, ForecastReport, Regressor},
    transform,
};

/// Smallest series that yields at least one feature row.
pub const MIN_OBSERVATIONS: usize = 3;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("insufficient data: {observations} observations, at least {required} required")]
    InsufficientData { observations: usize, required: usize },
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },
    #[error("model fit error: {0}")]
    ModelFit(#[from] FitError),
    #[error("source error: {0}")]
    Source(String),
    #[error("transform error: {0}")]
    Transform(String),
    #[error("sink error: {0}")]
    Sink(String),
}

impl PipelineError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }
}

/// Produces the observation series a run operates on.
pub trait Source {
    /// Short human-readable origin, used in logs and reports.
    fn describe(&self) -> String;

    fn observations(&self) -> Result<Vec<Observation>, PipelineError>;
}

/// Consumes a finished artifact of a run (an export, a report).
pub trait Sink<T: ?Sized> {
    fn write(&mut self, input: &T) -> Result<(), PipelineError>;
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub source: String,
    pub model: &'static str,
    pub fingerprint: String,
    pub observations: Vec<Observation>,
    pub forecast: ForecastReport,
    pub records: Vec<WasteRecord>,
    pub summary: ImpactSummary,
}

/// Generator (or file) → forecaster → detector.
pub struct Pipeline<S, R> {
    pub source: S,
    pub regressor: R,
    pub train_fraction: f64,
    pub detector: DetectorParams,
}

impl<S, R> Pipeline<S, R>
where
    S: Source,
    R: Regressor,
{
    pub fn run(mut self) -> Result<PipelineOutput, PipelineError> {
        let source = self.source.describe();
        let observations = self.source.observations()?;
        transform::validate_series(&observations)?;

        if observations.len() < MIN_OBSERVATIONS {
            return Err(PipelineError::InsufficientData {
                observations: observations.len(),
                required: MIN_OBSERVATIONS,
            });
        }

        let fingerprint = fingerprint::series_fingerprint(&observations);
        tracing::info!(
            source = %source,
            observations = observations.len(),
            fingerprint = %fingerprint,
            "series loaded"
        );

        let features = transform::build_features(&observations);
        let forecast = forecast::fit_predict(&features, self.train_fraction, &mut self.regressor)?;
        if let Some(v) = &forecast.validation {
            metrics::histogram!("forecast_validation_mae").record(v.mae);
            tracing::info!(
                model = self.regressor.name(),
                train_rows = forecast.train_rows,
                test_rows = v.samples,
                mae = v.mae,
                rmse = v.rmse,
                "baseline fitted"
            );
        } else {
            tracing::info!(
                model = self.regressor.name(),
                train_rows = forecast.train_rows,
                "baseline fitted without a held-out suffix"
            );
        }

        let (records, summary) = detect::detect_waste(&forecast.predictions, &self.detector);

        metrics::counter!("pipeline_runs_total").increment(1);
        metrics::counter!("waste_anomalies_total").increment(summary.anomaly_count as u64);
        metrics::gauge!("waste_total_kwh").set(summary.total_waste_kwh);
        tracing::info!(
            anomalies = summary.anomaly_count,
            total_waste_kwh = summary.total_waste_kwh,
            money_saved = summary.money_saved,
            co2_reduced = summary.co2_reduced,
            "waste detection complete"
        );

        Ok(PipelineOutput {
            source,
            model: self.regressor.name(),
            fingerprint,
            observations,
            forecast,
            records,
            summary,
        })
    }
}
