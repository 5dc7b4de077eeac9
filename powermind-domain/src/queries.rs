use crate::domain::{Observation, WasteRecord};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HourlyLoad {
    pub hour: u8,
    pub mean_kwh: f64,
    pub samples: usize,
}

/// Anomalous records in series order.
pub fn anomaly_points(records: &[WasteRecord]) -> Vec<&WasteRecord> {
    records.iter().filter(|r| r.anomaly).collect()
}

/// Mean kWh by hour-of-day over a series.
///
/// Hours with no samples are omitted; the result is ordered by hour.
pub fn hourly_load_profile(observations: &[Observation]) -> Vec<HourlyLoad> {
    let mut sums = [0.0_f64; 24];
    let mut counts = [0_usize; 24];

    for obs in observations {
        let idx = usize::from(obs.hour % 24);
        sums[idx] += obs.actual_kwh;
        counts[idx] += 1;
    }

    (0..24u8)
        .filter(|&h| counts[usize::from(h)] > 0)
        .map(|h| {
            let idx = usize::from(h);
            HourlyLoad {
                hour: h,
                mean_kwh: sums[idx] / counts[idx] as f64,
                samples: counts[idx],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureRow, PredictionRow};
    use time::macros::datetime;
    use time::Duration;

    fn record(offset_hours: i64, waste_kwh: f64, anomaly: bool) -> WasteRecord {
        let ts = datetime!(2024-01-01 00:00:00 UTC) + Duration::hours(offset_hours);
        WasteRecord {
            prediction: PredictionRow {
                features: FeatureRow {
                    ts,
                    hour: ts.hour(),
                    day_of_week: 0,
                    lag_1: 20.0,
                    rolling_mean: 20.0,
                    actual_kwh: 20.0 + waste_kwh,
                },
                predicted_kwh: 20.0,
            },
            waste_kwh,
            anomaly,
        }
    }

    #[test]
    fn anomaly_points_keeps_order_and_skips_normal_records() {
        let records = vec![
            record(0, 1.0, false),
            record(1, 30.0, true),
            record(2, -4.0, false),
            record(3, 12.0, true),
        ];

        let points = anomaly_points(&records);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].ts(), records[1].ts());
        assert_eq!(points[1].ts(), records[3].ts());
    }

    #[test]
    fn hourly_profile_averages_per_hour() {
        let start = datetime!(2024-01-01 00:00:00 UTC);
        let observations = vec![
            Observation::at(start, 10.0),
            Observation::at(start + Duration::hours(1), 30.0),
            Observation::at(start + Duration::hours(24), 20.0),
        ];

        let profile = hourly_load_profile(&observations);
        assert_eq!(profile.len(), 2);
        assert_eq!(profile[0], HourlyLoad { hour: 0, mean_kwh: 15.0, samples: 2 });
        assert_eq!(profile[1], HourlyLoad { hour: 1, mean_kwh: 30.0, samples: 1 });
    }

    #[test]
    fn hourly_profile_of_empty_series_is_empty() {
        assert!(hourly_load_profile(&[]).is_empty());
    }
}
