use crate::archive_reader::{ArchiveReader, ArchiveStats};
use crate::area_mapper::{resolve_records, AreaMapper};
use crate::bucketizer::aggregate;
use crate::calculator::calculate_shares;
use crate::config::{PipelineConfig, ZeroTotalPolicy};
use crate::fuel_aggregator::{aggregate_by_fuel, total_generation};
use crate::models::{FinalRow, GenerationRecord};
use crate::writer::{write_csv, write_parquet};
use anyhow::Result;
use log::info;
use polars::prelude::DataFrame;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageCounts {
    pub raw_rows: usize,
    pub resolved_records: usize,
    pub generation_keys: usize,
    pub share_records: usize,
    pub output_rows: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub archives: ArchiveStats,
    pub counts: StageCounts,
    pub elapsed: Duration,
}

/// Fuel aggregation through cumulative hours, over already resolved records.
/// `raw_rows` stays 0 since no raw table is involved.
pub fn build_from_records(records: &[GenerationRecord], policy: ZeroTotalPolicy) -> (Vec<FinalRow>, StageCounts) {
    let fuel_rows = aggregate_by_fuel(records);
    let totals = total_generation(records);
    let shares = calculate_shares(&totals, &fuel_rows);
    let rows = aggregate(&shares, policy);

    let counts = StageCounts {
        raw_rows: 0,
        resolved_records: records.len(),
        generation_keys: totals.len(),
        share_records: shares.len(),
        output_rows: rows.len(),
    };
    (rows, counts)
}

pub fn build_table(raw: &DataFrame, mapper: &AreaMapper, config: &PipelineConfig) -> Result<(Vec<FinalRow>, StageCounts)> {
    let records = resolve_records(raw, mapper, &config.country_area_type)?;
    info!("🌍 {} of {} rows resolved to a country", records.len(), raw.height());

    let (rows, mut counts) = build_from_records(&records, config.zero_total_policy);
    counts.raw_rows = raw.height();
    info!(
        "📊 {} generation keys, {} share records, {} output rows",
        counts.generation_keys, counts.share_records, counts.output_rows
    );

    Ok((rows, counts))
}

/// Reads the archives, builds the derived table, and writes it out.
pub fn run_pipeline(config: &PipelineConfig, mapper: &AreaMapper) -> Result<PipelineReport> {
    let start = Instant::now();

    let reader = ArchiveReader::new(config.input_dir.clone());
    let (raw, archives) = reader.read_all()?;

    let (rows, counts) = build_table(&raw, mapper, config)?;

    write_csv(&rows, &config.output_path)?;
    if let Some(parquet_path) = &config.parquet_path {
        write_parquet(&rows, parquet_path)?;
    }

    let elapsed = start.elapsed();
    info!("✅ Processing complete in {:?}", elapsed);

    Ok(PipelineReport {
        archives,
        counts,
        elapsed,
    })
}
