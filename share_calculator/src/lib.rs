pub mod archive_reader;
pub mod area_mapper;
pub mod bucketizer;
pub mod calculator;
pub mod config;
pub mod fuel_aggregator;
pub mod models;
pub mod pipeline;
pub mod writer;

pub use area_mapper::AreaMapper;
pub use config::{PipelineConfig, ZeroTotalPolicy};
pub use models::{FinalRow, FuelCategory, GenerationRecord, ShareBin};
pub use pipeline::{build_from_records, build_table, run_pipeline, PipelineReport};
