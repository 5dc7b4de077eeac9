use serde::Deserialize;
use std::{fs, path::PathBuf};
use time::{macros::datetime, Duration, OffsetDateTime};

use crate::{
    detect::DetectorParams,
    forecast::{self, BoostedTreesParams, Model, Statistic},
    pipeline::PipelineError,
    sources::synthetic::SeriesSpec,
};

pub const CONFIG_ENV: &str = "POWERMIND_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "powermind-config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub period_count: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    pub interval_secs: i64,
    pub noise_std_kwh: f64,
    pub spike_count: usize,
    pub spike_kwh: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            period_count: 24 * 7,
            start: datetime!(2024-01-01 00:00:00 UTC),
            interval_secs: 3600,
            noise_std_kwh: 5.0,
            spike_count: 5,
            spike_kwh: 25.0,
        }
    }
}

impl GeneratorConfig {
    pub fn series_spec(&self) -> Result<SeriesSpec, PipelineError> {
        SeriesSpec::new(
            self.period_count,
            self.start,
            Duration::seconds(self.interval_secs),
        )?
        .with_noise(self.noise_std_kwh)?
        .with_spikes(self.spike_count, self.spike_kwh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    Boosted,
    Linear,
    Naive,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoostedConfig {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub lambda: f64,
    pub min_child_weight: f64,
}

impl Default for BoostedConfig {
    fn default() -> Self {
        let p = BoostedTreesParams::default();
        Self {
            n_rounds: p.n_rounds,
            learning_rate: p.learning_rate,
            max_depth: p.max_depth,
            lambda: p.lambda,
            min_child_weight: p.min_child_weight,
        }
    }
}

impl BoostedConfig {
    pub fn params(&self) -> Result<BoostedTreesParams, PipelineError> {
        let params = BoostedTreesParams {
            n_rounds: self.n_rounds,
            learning_rate: self.learning_rate,
            max_depth: self.max_depth,
            lambda: self.lambda,
            min_child_weight: self.min_child_weight,
        };
        params.validate()?;
        Ok(params)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    pub ridge: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NaiveConfig {
    pub statistic: Statistic,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub model: ModelKind,
    pub train_fraction: f64,
    pub boosted: BoostedConfig,
    pub linear: LinearConfig,
    pub naive: NaiveConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            train_fraction: 0.8,
            boosted: BoostedConfig::default(),
            linear: LinearConfig::default(),
            naive: NaiveConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub threshold_kwh: f64,
    pub cost_rate_per_kwh: f64,
    pub emission_factor_kg_per_kwh: f64,
    /// Label for `money_saved` in reports.
    pub currency: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold_kwh: 10.0,
            cost_rate_per_kwh: 8.0,
            emission_factor_kg_per_kwh: 0.82,
            currency: "INR".to_string(),
        }
    }
}

impl DetectorConfig {
    pub fn params(&self) -> Result<DetectorParams, PipelineError> {
        DetectorParams::new(
            self.threshold_kwh,
            self.cost_rate_per_kwh,
            self.emission_factor_kg_per_kwh,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Write the observation series here as CSV.
    pub observations_csv: Option<PathBuf>,
    /// Write the JSON report here instead of stdout.
    pub report_json: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus text exposition is written here after each run.
    pub snapshot_path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub generator: GeneratorConfig,
    pub forecast: ForecastConfig,
    pub detector: DetectorConfig,
    pub export: ExportConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let cfg = match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_toml_str(&fs::read_to_string(&path)?)?,
            Err(_) => match fs::read_to_string(DEFAULT_CONFIG_PATH) {
                Ok(contents) => Self::from_toml_str(&contents)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::info!(path = DEFAULT_CONFIG_PATH, "no config file, using defaults");
                    Self::default()
                }
                Err(e) => return Err(e.into()),
            },
        };
        Ok(cfg)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }

    /// Checks every section once, before any pipeline is built.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.generator.series_spec()?;
        forecast::check_train_fraction(self.forecast.train_fraction)?;
        Model::from_config(&self.forecast)?;
        self.detector.params()?;
        Ok(())
    }
}
