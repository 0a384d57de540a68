//! Fault locator entry point: CLI wiring, model loading, batch run, export.

use std::io;
use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fault_locator::batch::Locator;
use fault_locator::cli::CliOptions;
use fault_locator::config::LocatorConfig;
use fault_locator::error::Result;
use fault_locator::io::{export_estimates, export_filtered, import_records};
use fault_locator::network::NetworkFile;
use fault_locator::report::AccuracyReport;

fn run(cli: &CliOptions) -> Result<()> {
    let config = match &cli.config {
        Some(path) => LocatorConfig::from_toml_file(path)?,
        None => LocatorConfig::from_preset(cli.preset_or_default())?,
    };
    let errors = config.validate();
    for e in &errors {
        error!("{e}");
    }
    if let Some(first) = errors.into_iter().next() {
        return Err(first.into());
    }

    let network = NetworkFile::from_toml_file(&cli.network)?;
    let locator = Locator::from_model(&network, &config)?;
    let format = config.csv_format();

    let imported = import_records(&cli.records, &locator.schema(), &format)?;
    info!(
        records = imported.records.len(),
        rejected = imported.failures.len(),
        "records imported"
    );
    for f in &imported.failures {
        error!("{f}");
    }

    let mut result = locator.run_with_threads(&imported.records, cli.threads.map(usize::from))?;
    result.failures.extend(imported.failures);

    if let Some(path) = &cli.estimates_out {
        export_estimates(&result, path, &format)?;
        info!(path = %path.display(), "estimator table written");
    }
    if let Some(path) = &cli.filtered_out {
        export_filtered(&result, path, &format)?;
        info!(path = %path.display(), "filtered table written");
    }

    println!("{}", AccuracyReport::from_batch(&result));
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = CliOptions::parse();
    if let Err(e) = run(&cli) {
        error!("{e}");
        process::exit(1);
    }
}
