use crate::pipeline::PipelineError;
use powermind_domain::{FeatureRow, Observation};
use time::{macros::datetime, OffsetDateTime};

/// Earliest timestamp a series may carry.
pub const SERIES_MIN_TS: OffsetDateTime = datetime!(2000-01-01 00:00:00 UTC);
/// Latest timestamp a series may carry.
pub const SERIES_MAX_TS: OffsetDateTime = datetime!(2100-01-01 00:00:00 UTC);

/// Pure validation of an observation series.
///
/// Rules:
/// - kWh must be finite.
/// - ts must be within a broad sanity window [2000-01-01, 2100-01-01].
/// - hour and day_of_week must match ts.
/// - timestamps strictly increase by one fixed interval.
pub fn validate_series(observations: &[Observation]) -> Result<(), PipelineError> {
    match check_series(observations) {
        Ok(()) => Ok(()),
        Err(e) => {
            metrics::counter!("series_validation_rejected_total").increment(1);
            Err(e)
        }
    }
}

fn check_series(observations: &[Observation]) -> Result<(), PipelineError> {
    for (i, obs) in observations.iter().enumerate() {
        if !obs.actual_kwh.is_finite() {
            return Err(PipelineError::Transform(format!(
                "observation {i}: kwh must be finite"
            )));
        }
        if obs.ts < SERIES_MIN_TS || obs.ts > SERIES_MAX_TS {
            return Err(PipelineError::Transform(format!(
                "observation {i}: timestamp out of allowed range"
            )));
        }
        let expected = Observation::at(obs.ts, obs.actual_kwh);
        if obs.hour != expected.hour || obs.day_of_week != expected.day_of_week {
            return Err(PipelineError::Transform(format!(
                "observation {i}: hour/day_of_week do not match timestamp {}",
                obs.ts
            )));
        }
    }

    if let [first, second, ..] = observations {
        let interval = second.ts - first.ts;
        if !interval.is_positive() {
            return Err(PipelineError::Transform(
                "timestamps must be strictly increasing".to_string(),
            ));
        }
        for (i, pair) in observations.windows(2).enumerate() {
            if pair[1].ts - pair[0].ts != interval {
                return Err(PipelineError::Transform(format!(
                    "observation {}: expected a fixed interval of {interval}, got {}",
                    i + 1,
                    pair[1].ts - pair[0].ts
                )));
            }
        }
    }

    Ok(())
}

/// Lag and rolling-mean features for every observation with two predecessors.
///
/// The first two observations are dropped, so the result has
/// `observations.len().saturating_sub(2)` rows.
pub fn build_features(observations: &[Observation]) -> Vec<FeatureRow> {
    observations
        .windows(3)
        .map(|w| {
            let current = &w[2];
            FeatureRow {
                ts: current.ts,
                hour: current.hour,
                day_of_week: current.day_of_week,
                lag_1: w[1].actual_kwh,
                rolling_mean: (w[0].actual_kwh + w[1].actual_kwh + w[2].actual_kwh) / 3.0,
                actual_kwh: current.actual_kwh,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use time::Duration;

    fn series(values: &[f64]) -> Vec<Observation> {
        let start = datetime!(2024-01-01 00:00:00 UTC);
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Observation::at(start + Duration::hours(i as i64), *v))
            .collect()
    }

    #[test]
    fn features_use_previous_value_and_three_point_mean() {
        let rows = build_features(&series(&[10.0, 20.0, 30.0, 60.0]));
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].hour, 2);
        assert_eq!(rows[0].lag_1, 20.0);
        assert_eq!(rows[0].rolling_mean, 20.0);
        assert_eq!(rows[0].actual_kwh, 30.0);

        assert_eq!(rows[1].hour, 3);
        assert_eq!(rows[1].lag_1, 30.0);
        assert!((rows[1].rolling_mean - 110.0 / 3.0).abs() < 1e-12);
        assert_eq!(rows[1].actual_kwh, 60.0);
    }

    #[test]
    fn short_series_has_no_features() {
        assert!(build_features(&series(&[])).is_empty());
        assert!(build_features(&series(&[1.0, 2.0])).is_empty());
    }

    #[test]
    fn series_validation_accepts_contiguous_series() {
        assert!(validate_series(&series(&[20.0, 21.0, 22.0])).is_ok());
        assert!(validate_series(&[]).is_ok());
    }

    #[test]
    fn series_validation_rejects_gap() {
        let mut obs = series(&[20.0, 21.0, 22.0]);
        obs[2] = Observation::at(obs[2].ts + Duration::hours(1), 22.0);
        assert!(matches!(validate_series(&obs), Err(PipelineError::Transform(_))));
    }

    #[test]
    fn series_validation_rejects_decreasing_timestamps() {
        let mut obs = series(&[20.0, 21.0]);
        obs.reverse();
        assert!(matches!(validate_series(&obs), Err(PipelineError::Transform(_))));
    }

    #[test]
    fn series_validation_rejects_non_finite_kwh() {
        let obs = series(&[20.0, f64::NAN, 22.0]);
        assert!(matches!(validate_series(&obs), Err(PipelineError::Transform(_))));
    }

    #[test]
    fn series_validation_rejects_out_of_range_ts() {
        let obs = vec![Observation::at(datetime!(1800-01-01 00:00:00 UTC), 1.0)];
        assert!(matches!(validate_series(&obs), Err(PipelineError::Transform(_))));
    }

    #[test]
    fn series_validation_rejects_mismatched_hour() {
        let mut obs = series(&[20.0, 21.0, 22.0]);
        obs[1].hour = 7;
        assert!(matches!(validate_series(&obs), Err(PipelineError::Transform(_))));
    }

    proptest! {
        #[test]
        fn feature_count_is_len_minus_two(values in prop::collection::vec(0.0f64..100.0, 0..64)) {
            let rows = build_features(&series(&values));
            prop_assert_eq!(rows.len(), values.len().saturating_sub(2));
        }
    }
}
