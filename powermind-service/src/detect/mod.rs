//! Baseline-vs-actual comparison and impact aggregation.

use powermind_domain::{ImpactSummary, PredictionRow, WasteRecord};

use crate::pipeline::PipelineError;

/// Validated detector parameters. The threshold has no default at this level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorParams {
    threshold_kwh: f64,
    cost_rate_per_kwh: f64,
    emission_factor_kg_per_kwh: f64,
}

fn positive(field: &'static str, value: f64) -> Result<f64, PipelineError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(PipelineError::invalid(field, format!("must be positive, got {value}")))
    }
}

impl DetectorParams {
    pub fn new(
        threshold_kwh: f64,
        cost_rate_per_kwh: f64,
        emission_factor_kg_per_kwh: f64,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            threshold_kwh: positive("detector.threshold_kwh", threshold_kwh)?,
            cost_rate_per_kwh: positive("detector.cost_rate_per_kwh", cost_rate_per_kwh)?,
            emission_factor_kg_per_kwh: positive(
                "detector.emission_factor_kg_per_kwh",
                emission_factor_kg_per_kwh,
            )?,
        })
    }

    pub fn threshold_kwh(&self) -> f64 {
        self.threshold_kwh
    }

    pub fn cost_rate_per_kwh(&self) -> f64 {
        self.cost_rate_per_kwh
    }

    pub fn emission_factor_kg_per_kwh(&self) -> f64 {
        self.emission_factor_kg_per_kwh
    }
}

/// Flags rows whose actual load exceeds the baseline by more than the
/// threshold and totals the impact of those rows only.
///
/// Overshooting predictions give negative waste and are never anomalous.
pub fn detect_waste(
    rows: &[PredictionRow],
    params: &DetectorParams,
) -> (Vec<WasteRecord>, ImpactSummary) {
    let records: Vec<WasteRecord> = rows
        .iter()
        .map(|row| {
            let waste_kwh = row.features.actual_kwh - row.predicted_kwh;
            WasteRecord {
                prediction: row.clone(),
                waste_kwh,
                anomaly: waste_kwh > params.threshold_kwh,
            }
        })
        .collect();

    let (total_waste_kwh, anomaly_count) = records
        .iter()
        .filter(|r| r.anomaly)
        .fold((0.0, 0), |(sum, n), r| (sum + r.waste_kwh, n + 1));

    let summary = ImpactSummary {
        total_waste_kwh,
        money_saved: total_waste_kwh * params.cost_rate_per_kwh,
        co2_reduced: total_waste_kwh * params.emission_factor_kg_per_kwh,
        anomaly_count,
    };

    (records, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use powermind_domain::FeatureRow;
    use proptest::prelude::*;
    use time::{macros::datetime, Duration};

    fn rows(pairs: &[(f64, f64)]) -> Vec<PredictionRow> {
        let start = datetime!(2024-01-01 02:00:00 UTC);
        pairs
            .iter()
            .enumerate()
            .map(|(i, &(actual_kwh, predicted_kwh))| {
                let ts = start + Duration::hours(i as i64);
                PredictionRow {
                    features: FeatureRow {
                        ts,
                        hour: ts.hour(),
                        day_of_week: 0,
                        lag_1: actual_kwh,
                        rolling_mean: actual_kwh,
                        actual_kwh,
                    },
                    predicted_kwh,
                }
            })
            .collect()
    }

    fn params(threshold: f64) -> DetectorParams {
        DetectorParams::new(threshold, 8.0, 0.82).expect("valid params")
    }

    #[test]
    fn boundary_waste_is_not_anomalous() {
        let (records, summary) = detect_waste(&rows(&[(30.0, 20.0), (30.5, 20.0)]), &params(10.0));
        assert!(!records[0].anomaly);
        assert!(records[1].anomaly);
        assert_eq!(summary.anomaly_count, 1);
        assert_eq!(summary.total_waste_kwh, 10.5);
    }

    #[test]
    fn only_anomalous_waste_is_totalled() {
        let input = rows(&[(20.0, 20.0), (45.0, 20.0), (28.0, 20.0), (10.0, 40.0), (36.0, 21.0)]);
        let (records, summary) = detect_waste(&input, &params(10.0));

        let flags: Vec<bool> = records.iter().map(|r| r.anomaly).collect();
        assert_eq!(flags, vec![false, true, false, false, true]);
        assert_eq!(records[3].waste_kwh, -30.0);
        assert_eq!(summary.total_waste_kwh, 40.0);
        assert_eq!(summary.money_saved, 40.0 * 8.0);
        assert_eq!(summary.co2_reduced, 40.0 * 0.82);
    }

    #[test]
    fn large_negative_waste_is_never_anomalous() {
        let (records, summary) = detect_waste(&rows(&[(0.0, 500.0)]), &params(1.0));
        assert!(!records[0].anomaly);
        assert_eq!(summary, ImpactSummary::default());
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        let (records, summary) = detect_waste(&[], &params(10.0));
        assert!(records.is_empty());
        assert_eq!(summary, ImpactSummary::default());
    }

    #[test]
    fn rejects_non_positive_parameters() {
        for (t, c, e) in [(0.0, 8.0, 0.82), (10.0, -1.0, 0.82), (10.0, 8.0, 0.0), (f64::NAN, 8.0, 0.82)] {
            assert!(matches!(
                DetectorParams::new(t, c, e),
                Err(PipelineError::InvalidConfiguration { .. })
            ));
        }
    }

    proptest! {
        #[test]
        fn records_and_summary_hold_invariants(
            pairs in prop::collection::vec((0.0f64..120.0, 0.0f64..120.0), 0..50),
            threshold in 0.1f64..40.0,
        ) {
            let input = rows(&pairs);
            let p = params(threshold);
            let (records, summary) = detect_waste(&input, &p);

            prop_assert_eq!(records.len(), input.len());
            let mut expected_total = 0.0;
            for r in &records {
                prop_assert!((r.waste_kwh - (r.actual_kwh() - r.predicted_kwh())).abs() < 1e-9);
                prop_assert_eq!(r.anomaly, r.waste_kwh > threshold);
                if r.anomaly {
                    expected_total += r.waste_kwh;
                }
            }
            prop_assert!((summary.total_waste_kwh - expected_total).abs() < 1e-9);
            prop_assert_eq!(summary.money_saved, summary.total_waste_kwh * 8.0);
            prop_assert_eq!(summary.co2_reduced, summary.total_waste_kwh * 0.82);

            let (again, again_summary) = detect_waste(&input, &p);
            prop_assert_eq!(again, records);
            prop_assert_eq!(again_summary, summary);
        }
    }
}
