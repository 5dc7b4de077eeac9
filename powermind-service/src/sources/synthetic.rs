use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use time::{macros::datetime, Duration, OffsetDateTime};

use powermind_domain::Observation;

use crate::{
    pipeline::{PipelineError, Source},
    transform::{SERIES_MAX_TS, SERIES_MIN_TS},
};

/// Base load in kWh for each hour of the day.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProfile {
    hourly_kwh: [f64; 24],
}

impl LoadProfile {
    /// Same base load at every hour.
    pub fn flat(kwh: f64) -> Self {
        Self {
            hourly_kwh: [kwh; 24],
        }
    }

    pub fn base_kwh(&self, hour: u8) -> f64 {
        self.hourly_kwh[usize::from(hour % 24)]
    }
}

impl Default for LoadProfile {
    /// Office-style day: 50 kWh during 9–17, 35 kWh in the evening (18–22),
    /// 20 kWh overnight.
    fn default() -> Self {
        let mut hourly_kwh = [20.0; 24];
        for (hour, kwh) in hourly_kwh.iter_mut().enumerate() {
            *kwh = match hour {
                9..=17 => 50.0,
                18..=22 => 35.0,
                _ => 20.0,
            };
        }
        Self { hourly_kwh }
    }
}

/// Shape of a synthetic series. Construct with [`SeriesSpec::new`] or take the
/// [`Default`] week of hourly data and adjust it with the `with_*` methods.
#[derive(Debug, Clone)]
pub struct SeriesSpec {
    period_count: usize,
    start: OffsetDateTime,
    interval: Duration,
    profile: LoadProfile,
    noise_std_kwh: f64,
    spike_count: usize,
    spike_kwh: f64,
}

impl Default for SeriesSpec {
    /// 168 hourly periods from 2024-01-01T00:00Z, N(0, 5) noise, five +25 kWh spikes.
    fn default() -> Self {
        Self {
            period_count: 24 * 7,
            start: datetime!(2024-01-01 00:00:00 UTC),
            interval: Duration::HOUR,
            profile: LoadProfile::default(),
            noise_std_kwh: 5.0,
            spike_count: 5,
            spike_kwh: 25.0,
        }
    }
}

impl SeriesSpec {
    pub fn new(
        period_count: usize,
        start: OffsetDateTime,
        interval: Duration,
    ) -> Result<Self, PipelineError> {
        if period_count == 0 {
            return Err(PipelineError::invalid("generator.period_count", "must be positive"));
        }
        if !interval.is_positive() {
            return Err(PipelineError::invalid(
                "generator.interval_secs",
                format!("must be positive, got {interval}"),
            ));
        }
        if start < SERIES_MIN_TS || start > SERIES_MAX_TS {
            return Err(PipelineError::invalid(
                "generator.start",
                format!("must lie within {SERIES_MIN_TS} and {SERIES_MAX_TS}, got {start}"),
            ));
        }
        let last_ts = i32::try_from(period_count - 1)
            .ok()
            .and_then(|steps| interval.checked_mul(steps))
            .and_then(|span| start.checked_add(span));
        if !last_ts.is_some_and(|ts| ts <= SERIES_MAX_TS) {
            return Err(PipelineError::invalid(
                "generator.interval_secs",
                format!("{period_count} periods of {interval} from {start} run past {SERIES_MAX_TS}"),
            ));
        }

        Ok(Self {
            period_count,
            start,
            interval,
            ..Self::default()
        })
    }

    pub fn with_profile(mut self, profile: LoadProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Gaussian noise with mean 0; a standard deviation of 0 disables noise.
    pub fn with_noise(mut self, std_dev_kwh: f64) -> Result<Self, PipelineError> {
        if !(std_dev_kwh >= 0.0 && std_dev_kwh.is_finite()) {
            return Err(PipelineError::invalid(
                "generator.noise_std_kwh",
                format!("must be finite and non-negative, got {std_dev_kwh}"),
            ));
        }
        self.noise_std_kwh = std_dev_kwh;
        Ok(self)
    }

    /// `count` is clamped to the series length at generation time.
    pub fn with_spikes(mut self, count: usize, kwh: f64) -> Result<Self, PipelineError> {
        if !kwh.is_finite() {
            return Err(PipelineError::invalid(
                "generator.spike_kwh",
                format!("must be finite, got {kwh}"),
            ));
        }
        self.spike_count = count;
        self.spike_kwh = kwh;
        Ok(self)
    }

    pub fn period_count(&self) -> usize {
        self.period_count
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Draws a series from `rng`.
///
/// Timestamps are `start + i * interval`; [`SeriesSpec::new`] guarantees the
/// last one stays inside the series validation window.
///
/// All noise draws happen first, in timestamp order, followed by the spike
/// index draws; the same stream state therefore always yields the same series.
pub fn generate_series<R>(rng: &mut R, spec: &SeriesSpec) -> Vec<Observation>
where
    R: Rng + ?Sized,
{
    let mut observations = Vec::with_capacity(spec.period_count);
    let mut ts = spec.start;
    for i in 0..spec.period_count {
        if i > 0 {
            ts += spec.interval;
        }
        let mut obs = Observation::at(ts, 0.0);
        let z: f64 = StandardNormal.sample(rng);
        obs.actual_kwh = spec.profile.base_kwh(obs.hour) + z * spec.noise_std_kwh;
        observations.push(obs);
    }

    let spikes = spec.spike_count.min(observations.len());
    for idx in index::sample(rng, observations.len(), spikes).into_iter() {
        observations[idx].actual_kwh += spec.spike_kwh;
    }

    observations
}

/// Seeded synthetic load series.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
    spec: SeriesSpec,
}

impl SyntheticSource {
    pub fn new(seed: u64, spec: SeriesSpec) -> Self {
        Self { seed, spec }
    }
}

impl Source for SyntheticSource {
    fn describe(&self) -> String {
        format!("synthetic(seed={}, periods={})", self.seed, self.spec.period_count)
    }

    fn observations(&self) -> Result<Vec<Observation>, PipelineError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        Ok(generate_series(&mut rng, &self.spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_spec(periods: usize) -> SeriesSpec {
        SeriesSpec::new(periods, datetime!(2024-01-01 00:00:00 UTC), Duration::HOUR)
            .and_then(|s| s.with_noise(0.0))
            .and_then(|s| s.with_spikes(0, 25.0))
            .expect("valid spec")
    }

    #[test]
    fn same_seed_same_series() {
        let spec = SeriesSpec::default();
        let a = generate_series(&mut StdRng::seed_from_u64(42), &spec);
        let b = generate_series(&mut StdRng::seed_from_u64(42), &spec);
        assert_eq!(a, b);
        assert_eq!(a.len(), 168);
    }

    #[test]
    fn different_seeds_differ() {
        let spec = SeriesSpec::default();
        let a = generate_series(&mut StdRng::seed_from_u64(1), &spec);
        let b = generate_series(&mut StdRng::seed_from_u64(2), &spec);
        assert_ne!(a, b);
    }

    #[test]
    fn noise_free_series_follows_profile() {
        let obs = generate_series(&mut StdRng::seed_from_u64(0), &quiet_spec(24));
        let profile = LoadProfile::default();
        for o in &obs {
            assert_eq!(o.actual_kwh, profile.base_kwh(o.hour));
        }
        assert_eq!(obs[3].actual_kwh, 20.0);
        assert_eq!(obs[12].actual_kwh, 50.0);
        assert_eq!(obs[20].actual_kwh, 35.0);
        assert_eq!(obs[23].actual_kwh, 20.0);
    }

    #[test]
    fn timestamps_are_contiguous() {
        let spec = SeriesSpec::new(5, datetime!(2024-03-04 06:00:00 UTC), Duration::minutes(30))
            .expect("valid spec");
        let obs = generate_series(&mut StdRng::seed_from_u64(3), &spec);
        for pair in obs.windows(2) {
            assert_eq!(pair[1].ts - pair[0].ts, Duration::minutes(30));
        }
        assert_eq!(obs[0].ts, datetime!(2024-03-04 06:00:00 UTC));
        assert_eq!(obs[0].day_of_week, 0);
    }

    #[test]
    fn spikes_land_on_distinct_indices() {
        let spec = quiet_spec(48)
            .with_profile(LoadProfile::flat(20.0))
            .with_spikes(5, 25.0)
            .expect("valid spikes");
        let obs = generate_series(&mut StdRng::seed_from_u64(42), &spec);
        let spiked = obs.iter().filter(|o| o.actual_kwh == 45.0).count();
        let flat = obs.iter().filter(|o| o.actual_kwh == 20.0).count();
        assert_eq!(spiked, 5);
        assert_eq!(flat, 43);
    }

    #[test]
    fn spike_count_is_clamped_to_length() {
        let spec = quiet_spec(3)
            .with_profile(LoadProfile::flat(20.0))
            .with_spikes(10, 25.0)
            .expect("valid spikes");
        let obs = generate_series(&mut StdRng::seed_from_u64(9), &spec);
        assert!(obs.iter().all(|o| o.actual_kwh == 45.0));
    }

    #[test]
    fn rejects_invalid_spec() {
        let start = datetime!(2024-01-01 00:00:00 UTC);
        assert!(SeriesSpec::new(0, start, Duration::HOUR).is_err());
        assert!(SeriesSpec::new(10, start, Duration::ZERO).is_err());
        assert!(SeriesSpec::default().with_noise(-1.0).is_err());
        assert!(SeriesSpec::default().with_noise(f64::INFINITY).is_err());
    }

    fn rejected_field(result: Result<SeriesSpec, PipelineError>) -> &'static str {
        match result {
            Err(PipelineError::InvalidConfiguration { field, .. }) => field,
            other => panic!("expected invalid configuration, got {other:?}"),
        }
    }

    #[test]
    fn rejects_series_whose_end_overflows() {
        let start = datetime!(2024-01-01 00:00:00 UTC);
        let huge = Duration::seconds(1_000_000_000_000);
        assert_eq!(
            rejected_field(SeriesSpec::new(3, start, huge)),
            "generator.interval_secs"
        );
        assert_eq!(
            rejected_field(SeriesSpec::new(usize::MAX, start, Duration::HOUR)),
            "generator.interval_secs"
        );
    }

    #[test]
    fn rejects_series_outside_validation_window() {
        assert_eq!(
            rejected_field(SeriesSpec::new(
                168,
                datetime!(2099-12-31 00:00:00 UTC),
                Duration::HOUR
            )),
            "generator.interval_secs"
        );
        assert_eq!(
            rejected_field(SeriesSpec::new(
                24,
                datetime!(1999-12-31 00:00:00 UTC),
                Duration::HOUR
            )),
            "generator.start"
        );
    }

    #[test]
    fn series_ending_on_window_edge_generates() {
        let spec = SeriesSpec::new(25, datetime!(2099-12-31 00:00:00 UTC), Duration::HOUR)
            .expect("last timestamp is the window edge");
        let obs = generate_series(&mut StdRng::seed_from_u64(1), &spec);
        assert_eq!(obs.last().map(|o| o.ts), Some(SERIES_MAX_TS));
        assert!(crate::transform::validate_series(&obs).is_ok());
    }

    #[test]
    fn single_period_ignores_interval_length() {
        let start = datetime!(2024-01-01 00:00:00 UTC);
        let spec = SeriesSpec::new(1, start, Duration::seconds(1_000_000_000_000))
            .expect("one period never advances");
        let obs = generate_series(&mut StdRng::seed_from_u64(3), &spec);
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].ts, start);
    }

    #[test]
    fn source_is_reproducible() {
        let source = SyntheticSource::new(42, SeriesSpec::default());
        assert_eq!(source.observations().unwrap(), source.observations().unwrap());
        assert_eq!(source.describe(), "synthetic(seed=42, periods=168)");
    }
}
