mod observation;
mod waste;

pub use observation::Observation;
pub use waste::{FeatureRow, ImpactSummary, PredictionRow, WasteRecord};
