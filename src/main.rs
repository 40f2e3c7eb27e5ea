//! Event Insights - CSV Event Analysis & Static Chart Report
//!
//! Usage: event-insights [config.json]

use anyhow::{bail, Context, Result};
use event_insights::data::LoaderOptions;
use event_insights::{DatasetCache, EventReport, HttpFetcher, Loader, ReportConfig};
use log::info;
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => ReportConfig::load(Path::new(&path))
            .with_context(|| format!("loading config from {}", path))?,
        None => ReportConfig::default(),
    };

    let [first, second] = config.windows.as_slice() else {
        bail!("expected two event windows, found {}", config.windows.len());
    };

    let cache = Arc::new(DatasetCache::new());
    let loader = Loader::with_options(
        HttpFetcher::new(),
        cache,
        LoaderOptions {
            timestamp_column: config.timestamp_column.clone(),
        },
    );

    let dataset = loader
        .load(&config.data_url)
        .with_context(|| format!("loading dataset from {}", config.data_url))?;

    let report = EventReport::build(&dataset, first, second);
    let written = report
        .write_all(&config.output_dir, config.render_charts)
        .context("writing report")?;

    for path in written {
        info!("Output: {}", path.display());
    }
    Ok(())
}
