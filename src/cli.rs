use std::path::PathBuf;

use clap::Parser;

/// Impedance-based fault locator for radial distribution feeders.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CliOptions {
    /// Network model exported from the circuit simulator (TOML)
    #[arg(long)]
    pub network: PathBuf,

    /// Fault-record table (CSV)
    #[arg(long)]
    pub records: PathBuf,

    /// Run configuration (TOML)
    #[arg(long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in configuration: ieee34 or generic
    #[arg(long)]
    pub preset: Option<String>,

    /// Write the per-path estimator table here
    #[arg(long)]
    pub estimates_out: Option<PathBuf>,

    /// Write the selected-branch table here
    #[arg(long)]
    pub filtered_out: Option<PathBuf>,

    /// Worker threads for the batch (default: all cores)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: Option<u16>,
}

impl CliOptions {
    /// Preset to use when no config file is given.
    pub fn preset_or_default(&self) -> &str {
        self.preset.as_deref().unwrap_or("ieee34")
    }
}
