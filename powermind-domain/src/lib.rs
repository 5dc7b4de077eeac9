pub mod domain;
pub mod queries;

pub use domain::{FeatureRow, ImpactSummary, Observation, PredictionRow, WasteRecord};
