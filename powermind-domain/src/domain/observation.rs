use time::{OffsetDateTime, UtcOffset};

/// One metered interval of the load series.
///
/// `hour` and `day_of_week` are calendar fields of `ts` (UTC), with Monday as
/// day 0. Use [`Observation::at`] to keep them consistent with the timestamp.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub ts: OffsetDateTime,
    pub hour: u8,
    pub day_of_week: u8,
    pub actual_kwh: f64,
}

impl Observation {
    /// Keeps `ts` as given; the calendar fields are read in UTC.
    pub fn at(ts: OffsetDateTime, actual_kwh: f64) -> Self {
        let utc = ts.to_offset(UtcOffset::UTC);
        Self {
            ts,
            hour: utc.hour(),
            day_of_week: utc.weekday().number_days_from_monday(),
            actual_kwh,
        }
    }
}
