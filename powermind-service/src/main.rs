use anyhow::{bail, Result};
use powermind_service::{
    config::AppConfig,
    forecast::Model,
    metrics_snapshot,
    observability,
    pipeline::{Pipeline, PipelineOutput, Sink, Source},
    sinks::{CsvObservationSink, JsonReportSink, WasteReport},
    sources::{CsvSeriesSource, SyntheticSource},
};
use std::env;

fn run<S: Source>(source: S, cfg: &AppConfig) -> Result<PipelineOutput> {
    let pipeline = Pipeline {
        source,
        regressor: Model::from_config(&cfg.forecast)?,
        train_fraction: cfg.forecast.train_fraction,
        detector: cfg.detector.params()?,
    };
    Ok(pipeline.run()?)
}

fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        bail!("usage: powermind [observations_csv]");
    }

    // Load and validate configuration before touching any data.
    let cfg = AppConfig::load()?;
    cfg.validate()?;

    if cfg.metrics.is_some() {
        metrics_snapshot::init()?;
    }

    let output = match args.get(1) {
        Some(path) => run(CsvSeriesSource::new(path), &cfg)?,
        None => {
            let spec = cfg.generator.series_spec()?;
            run(SyntheticSource::new(cfg.generator.seed, spec), &cfg)?
        }
    };

    if let Some(path) = &cfg.export.observations_csv {
        let mut sink = CsvObservationSink::create(path)?;
        sink.write(output.observations.as_slice())?;
        tracing::info!(
            path = %path.display(),
            rows = output.observations.len(),
            "observations exported"
        );
    }

    let report = WasteReport::from_output(&output, &cfg.detector.currency);
    let mut report_sink = JsonReportSink::to_path_or_stdout(cfg.export.report_json.as_deref())?;
    report_sink.write(&report)?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_snapshot::write_snapshot(&metrics_cfg.snapshot_path)?;
    }

    Ok(())
}
