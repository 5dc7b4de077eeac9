use time::OffsetDateTime;

/// Model inputs derived from an observation and its two predecessors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureRow {
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub ts: OffsetDateTime,
    pub hour: u8,
    pub day_of_week: u8,
    /// Previous observation's kWh.
    pub lag_1: f64,
    /// Mean of this observation's kWh and the two preceding ones.
    pub rolling_mean: f64,
    /// Regression target.
    pub actual_kwh: f64,
}

impl FeatureRow {
    /// Number of regression inputs returned by [`FeatureRow::inputs`].
    pub const INPUTS: usize = 4;

    /// Regression inputs in a fixed order: hour, day_of_week, lag_1, rolling_mean.
    pub fn inputs(&self) -> [f64; Self::INPUTS] {
        [
            f64::from(self.hour),
            f64::from(self.day_of_week),
            self.lag_1,
            self.rolling_mean,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PredictionRow {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub features: FeatureRow,
    pub predicted_kwh: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WasteRecord {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub prediction: PredictionRow,
    /// `actual_kwh - predicted_kwh`; negative when the baseline overshoots.
    pub waste_kwh: f64,
    pub anomaly: bool,
}

impl WasteRecord {
    pub fn ts(&self) -> OffsetDateTime {
        self.prediction.features.ts
    }

    pub fn actual_kwh(&self) -> f64 {
        self.prediction.features.actual_kwh
    }

    pub fn predicted_kwh(&self) -> f64 {
        self.prediction.predicted_kwh
    }
}

/// Aggregate impact of the anomalous records of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImpactSummary {
    pub total_waste_kwh: f64,
    pub money_saved: f64,
    pub co2_reduced: f64,
    pub anomaly_count: usize,
}
