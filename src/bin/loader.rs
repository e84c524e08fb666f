use anyhow::Result;
use chrono::NaiveDate;
use colored::*;
use frc_loader::xbrl::contexts::MultiDimensionPolicy;
use frc_loader::{BatchRunner, CsvSink, FilerDriver, JsonModelProvider, LoaderConfig, LocalArtifactStore, Register};
use std::path::PathBuf;
use std::sync::Arc;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "frc-loader", about = "Normalise XBRL filings into flat tables")]
struct Opt {
    /// Register the filing indexes come from: fca, fo or ch
    register: Register,

    /// Filing index JSON files, one per filer
    #[structopt(parse(from_os_str), required = true)]
    indexes: Vec<PathBuf>,

    /// Directory holding downloaded filing artifacts
    #[structopt(long, parse(from_os_str))]
    cache_dir: Option<PathBuf>,

    /// Directory the CSV tables and JSON bundles are written to
    #[structopt(long, parse(from_os_str))]
    output_dir: Option<PathBuf>,

    /// Maximum filings attempted per filer
    #[structopt(long)]
    limit: Option<usize>,

    /// Skip filings whose period ends before this date (YYYY-MM-DD)
    #[structopt(long)]
    after: Option<NaiveDate>,

    /// Skip filings from these countries
    #[structopt(long = "exclude-country")]
    exclude_countries: Vec<String>,

    /// Code multi-dimension contexts by their last dimension only
    #[structopt(long)]
    legacy_multi_dimension: bool,

    /// Process each filer's filings on parallel workers
    #[structopt(long)]
    parallel: bool,

    /// Disable the progress bar
    #[structopt(long)]
    no_progress: bool,
}

impl Opt {
    fn apply(&self, config: &mut LoaderConfig) {
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(limit) = self.limit {
            config.limit = limit;
        }
        if self.after.is_some() {
            config.after = self.after;
        }
        if !self.exclude_countries.is_empty() {
            config.exclude_countries = self.exclude_countries.clone();
        }
        if self.legacy_multi_dimension {
            config.options.multi_dimension = MultiDimensionPolicy::LastPairWins;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let mut config = LoaderConfig::from_env()?;
    opt.apply(&mut config);
    log::debug!("Loader config: {:?}", config);

    let driver = FilerDriver::new(
        opt.register,
        config.clone(),
        Arc::new(JsonModelProvider),
        Arc::new(LocalArtifactStore::new(&config.cache_dir)),
    );
    let mut sink = CsvSink::new(&config.output_dir)?;

    let summary = BatchRunner::new(&driver, &mut sink)
        .parallel(opt.parallel)
        .show_progress(!opt.no_progress)
        .run(&opt.indexes)
        .await;

    println!(
        "{} {} filings written to {:?}, {} skipped, {} unusable indexes",
        "Finished:".green().bold(),
        summary.written,
        sink.output_dir(),
        summary.skipped,
        summary.failed_indexes
    );
    Ok(())
}
