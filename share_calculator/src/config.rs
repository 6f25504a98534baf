use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What to do with share records whose total generation is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroTotalPolicy {
    /// Undefined shares contribute no hours.
    #[default]
    Exclude,
    /// Undefined shares are counted in the `<1%` bin.
    LowestBin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_path: PathBuf,
    pub parquet_path: Option<PathBuf>,
    /// CSV with `AreaCode,Country` columns replacing the built-in EIC table.
    pub area_map_path: Option<PathBuf>,
    pub country_area_type: String,
    pub zero_total_policy: ZeroTotalPolicy,
    pub threads: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data"),
            output_path: PathBuf::from("share_of_generation_monthly.csv"),
            parquet_path: None,
            area_map_path: None,
            country_area_type: "CTY".to_string(),
            zero_total_policy: ZeroTotalPolicy::default(),
            threads: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn thread_count(&self) -> usize {
        self.threads.filter(|&n| n > 0).unwrap_or_else(num_cpus::get)
    }
}
