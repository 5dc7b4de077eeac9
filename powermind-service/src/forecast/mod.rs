//! Baseline forecasting over engineered feature rows.
//!
//! Any model implementing [`Regressor`] can produce the baseline; the
//! surrounding split/fit/predict flow in [`fit_predict`] does not change.

pub mod boosted;
pub mod linear;
pub mod naive;

use powermind_domain::{FeatureRow, PredictionRow};

use crate::{
    config::{ForecastConfig, ModelKind},
    pipeline::PipelineError,
};

pub use boosted::{BoostedTrees, BoostedTreesParams};
pub use linear::LinearRegression;
pub use naive::{NaiveBaseline, Statistic};

/// One row of regression inputs, in [`FeatureRow::inputs`] order.
pub type Inputs = [f64; FeatureRow::INPUTS];

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("training set is empty")]
    EmptyTrainingSet,
    #[error("{inputs} input rows but {targets} targets")]
    LengthMismatch { inputs: usize, targets: usize },
    #[error("non-finite value in training row {row}")]
    NonFinite { row: usize },
    #[error("normal equations are singular")]
    Singular,
    #[error("model has not been fitted")]
    NotFitted,
}

/// Fit/predict capability used to produce the baseline.
pub trait Regressor {
    fn name(&self) -> &'static str;

    fn fit(&mut self, inputs: &[Inputs], targets: &[f64]) -> Result<(), FitError>;

    fn predict(&self, inputs: &[Inputs]) -> Result<Vec<f64>, FitError>;
}

/// Shared sanity checks every model runs before fitting.
pub(crate) fn check_training(inputs: &[Inputs], targets: &[f64]) -> Result<(), FitError> {
    if inputs.len() != targets.len() {
        return Err(FitError::LengthMismatch {
            inputs: inputs.len(),
            targets: targets.len(),
        });
    }
    if inputs.is_empty() {
        return Err(FitError::EmptyTrainingSet);
    }
    for (row, (x, y)) in inputs.iter().zip(targets).enumerate() {
        if !y.is_finite() || x.iter().any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite { row });
        }
    }
    Ok(())
}

/// Error of the fitted baseline on the held-out suffix.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ValidationMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub samples: usize,
}

impl ValidationMetrics {
    fn compute(predicted: &[f64], actual: &[f64]) -> Option<Self> {
        if actual.is_empty() {
            return None;
        }
        let n = actual.len() as f64;
        let (abs, sq) = predicted
            .iter()
            .zip(actual)
            .fold((0.0, 0.0), |(abs, sq), (p, a)| {
                let e = a - p;
                (abs + e.abs(), sq + e * e)
            });
        Some(Self {
            mae: abs / n,
            rmse: (sq / n).sqrt(),
            samples: actual.len(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ForecastReport {
    /// One prediction per feature row, training prefix included.
    pub predictions: Vec<PredictionRow>,
    pub train_rows: usize,
    /// `None` when the whole series was used for training.
    pub validation: Option<ValidationMetrics>,
}

/// Length of the leading training prefix for `rows` feature rows.
///
/// The trailing test suffix holds `ceil(rows * (1 - train_fraction))` rows.
pub fn train_len(rows: usize, train_fraction: f64) -> usize {
    // Absorb float noise such as 10 * (1 - 0.7) = 3.0000000000000004.
    let test = ((rows as f64) * (1.0 - train_fraction) - 1e-9).ceil().max(0.0) as usize;
    rows.saturating_sub(test)
}

pub fn check_train_fraction(train_fraction: f64) -> Result<(), PipelineError> {
    if train_fraction > 0.0 && train_fraction <= 1.0 {
        Ok(())
    } else {
        Err(PipelineError::invalid(
            "forecast.train_fraction",
            format!("must be in (0, 1], got {train_fraction}"),
        ))
    }
}

/// Fits `regressor` on the leading prefix of `rows`, then predicts every row.
///
/// Row order is preserved; the split never shuffles.
pub fn fit_predict<R>(
    rows: &[FeatureRow],
    train_fraction: f64,
    regressor: &mut R,
) -> Result<ForecastReport, PipelineError>
where
    R: Regressor + ?Sized,
{
    check_train_fraction(train_fraction)?;

    let train_rows = train_len(rows.len(), train_fraction);
    let inputs: Vec<Inputs> = rows.iter().map(FeatureRow::inputs).collect();
    let targets: Vec<f64> = rows.iter().map(|r| r.actual_kwh).collect();

    regressor.fit(&inputs[..train_rows], &targets[..train_rows])?;
    let predicted = regressor.predict(&inputs)?;

    let validation = ValidationMetrics::compute(&predicted[train_rows..], &targets[train_rows..]);
    let predictions = rows
        .iter()
        .zip(predicted)
        .map(|(features, predicted_kwh)| PredictionRow {
            features: features.clone(),
            predicted_kwh,
        })
        .collect();

    Ok(ForecastReport {
        predictions,
        train_rows,
        validation,
    })
}

/// Runtime-selected baseline model.
#[derive(Debug, Clone)]
pub enum Model {
    Boosted(BoostedTrees),
    Linear(LinearRegression),
    Naive(NaiveBaseline),
}

impl Model {
    pub fn from_config(cfg: &ForecastConfig) -> Result<Self, PipelineError> {
        let model = match cfg.model {
            ModelKind::Boosted => Self::Boosted(BoostedTrees::new(cfg.boosted.params()?)),
            ModelKind::Linear => Self::Linear(LinearRegression::with_ridge(cfg.linear.ridge)?),
            ModelKind::Naive => Self::Naive(NaiveBaseline::new(cfg.naive.statistic)),
        };
        Ok(model)
    }
}

impl Regressor for Model {
    fn name(&self) -> &'static str {
        match self {
            Self::Boosted(m) => m.name(),
            Self::Linear(m) => m.name(),
            Self::Naive(m) => m.name(),
        }
    }

    fn fit(&mut self, inputs: &[Inputs], targets: &[f64]) -> Result<(), FitError> {
        match self {
            Self::Boosted(m) => m.fit(inputs, targets),
            Self::Linear(m) => m.fit(inputs, targets),
            Self::Naive(m) => m.fit(inputs, targets),
        }
    }

    fn predict(&self, inputs: &[Inputs]) -> Result<Vec<f64>, FitError> {
        match self {
            Self::Boosted(m) => m.predict(inputs),
            Self::Linear(m) => m.predict(inputs),
            Self::Naive(m) => m.predict(inputs),
        }
    }
}
