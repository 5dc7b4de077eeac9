use anyhow::{bail, Result};
use powermind_service::{
    config::AppConfig,
    fingerprint::series_fingerprint,
    observability,
    pipeline::{Sink, Source},
    sinks::CsvObservationSink,
    sources::SyntheticSource,
};
use std::{env, path::Path};

fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: export_series <csv_path>");
    }
    let path = Path::new(&args[1]);

    // Generator settings come from the same config file as the main pipeline.
    let cfg = AppConfig::load()?;
    let source = SyntheticSource::new(cfg.generator.seed, cfg.generator.series_spec()?);
    let observations = source.observations()?;

    let mut sink = CsvObservationSink::create(path)?;
    sink.write(observations.as_slice())?;

    tracing::info!(
        path = %path.display(),
        rows = observations.len(),
        seed = cfg.generator.seed,
        fingerprint = %series_fingerprint(&observations),
        "synthetic series exported"
    );

    Ok(())
}
