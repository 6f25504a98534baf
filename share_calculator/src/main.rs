use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;
use share_calculator::{run_pipeline, AreaMapper, PipelineConfig, ZeroTotalPolicy};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "share_calculator")]
#[command(about = "Build monthly fossil-share hour tables from ENTSO-E generation archives")]
struct Args {
    /// JSON pipeline configuration; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the ZIP archives
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the table as Parquet
    #[arg(long)]
    parquet: Option<PathBuf>,

    /// CSV with AreaCode,Country columns replacing the built-in EIC table
    #[arg(long)]
    area_map: Option<PathBuf>,

    /// Handling of readings whose total generation is zero
    #[arg(long, value_enum)]
    zero_total_policy: Option<ZeroTotalPolicy>,

    /// Worker threads for archive extraction (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,
}

impl Args {
    fn into_config(self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(input_dir) = self.input_dir {
            config.input_dir = input_dir;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if self.parquet.is_some() {
            config.parquet_path = self.parquet;
        }
        if self.area_map.is_some() {
            config.area_map_path = self.area_map;
        }
        if let Some(policy) = self.zero_total_policy {
            config.zero_total_policy = policy;
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let config = Args::parse().into_config()?;

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.thread_count())
        .build_global()?;

    info!("🚀 Fossil share pipeline");
    info!("Input: {:?}, output: {:?}", config.input_dir, config.output_path);
    info!("Rayon thread pool configured with {} threads", rayon::current_num_threads());

    let mapper = match &config.area_map_path {
        Some(path) => AreaMapper::from_csv(path)?,
        None => AreaMapper::builtin(),
    };

    let report = run_pipeline(&config, &mapper)?;

    info!(
        "Archives: {} found, {} read, {} skipped; {} tables",
        report.archives.archives_found,
        report.archives.archives_read,
        report.archives.archives_skipped,
        report.archives.tables_read
    );
    info!(
        "Rows: {} raw, {} resolved, {} written",
        report.counts.raw_rows, report.counts.resolved_records, report.counts.output_rows
    );

    Ok(())
}
