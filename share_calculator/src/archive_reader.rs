use anyhow::{Context, Result};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use ::zip::ZipArchive;

pub const SOURCE_ARCHIVE: &str = "source_archive";
pub const SOURCE_TABLE: &str = "source_table";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub archives_found: usize,
    pub archives_read: usize,
    pub archives_skipped: usize,
    pub tables_read: usize,
}

/// Reads every tab-separated table nested in the ZIP archives of one directory.
pub struct ArchiveReader {
    input_dir: PathBuf,
}

impl ArchiveReader {
    pub fn new(input_dir: PathBuf) -> Self {
        Self { input_dir }
    }

    /// All tables of all archives, diagonally concatenated. Columns missing
    /// from a table are null for its rows.
    pub fn read_all(&self) -> Result<(DataFrame, ArchiveStats)> {
        let zip_files = self.find_zip_files()?;
        let mut stats = ArchiveStats {
            archives_found: zip_files.len(),
            ..ArchiveStats::default()
        };

        if zip_files.is_empty() {
            warn!("No ZIP files found in {:?}", self.input_dir);
            return Ok((DataFrame::empty(), stats));
        }
        info!("Found {} ZIP files in {:?}", zip_files.len(), self.input_dir);

        let archives_read = AtomicUsize::new(0);
        let archives_skipped = AtomicUsize::new(0);
        let tables_read = AtomicUsize::new(0);

        let pb = ProgressBar::new(zip_files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} Archives")?,
        );

        let per_archive: Vec<Vec<DataFrame>> = zip_files
            .par_iter()
            .map(|zip_path| {
                let tables = match self.read_archive(zip_path) {
                    Ok(tables) => {
                        archives_read.fetch_add(1, Ordering::SeqCst);
                        tables_read.fetch_add(tables.len(), Ordering::SeqCst);
                        tables
                    }
                    Err(e) => {
                        warn!("Skipping archive {:?}: {:#}", zip_path, e);
                        archives_skipped.fetch_add(1, Ordering::SeqCst);
                        Vec::new()
                    }
                };
                pb.inc(1);
                tables
            })
            .collect();

        pb.finish_and_clear();

        stats.archives_read = archives_read.into_inner();
        stats.archives_skipped = archives_skipped.into_inner();
        stats.tables_read = tables_read.into_inner();

        let frames: Vec<LazyFrame> = per_archive
            .into_iter()
            .flatten()
            .filter(|df| df.height() > 0)
            .map(|df| df.lazy())
            .collect();

        if frames.is_empty() {
            warn!("No tables were successfully read from {:?}", self.input_dir);
            return Ok((DataFrame::empty(), stats));
        }

        let combined = concat_lf_diagonal(frames, UnionArgs::default())?.collect()?;
        info!(
            "Read {} tables from {} archives ({} skipped): {} rows, {} columns",
            stats.tables_read,
            stats.archives_read,
            stats.archives_skipped,
            combined.height(),
            combined.width()
        );

        Ok((combined, stats))
    }

    fn find_zip_files(&self) -> Result<Vec<PathBuf>> {
        if !self.input_dir.is_dir() {
            anyhow::bail!("Input directory not found: {:?}", self.input_dir);
        }

        let pattern = self.input_dir.join("*.zip");
        let pattern = pattern
            .to_str()
            .with_context(|| format!("Input directory is not valid UTF-8: {:?}", self.input_dir))?;

        let mut zip_files: Vec<PathBuf> = glob(pattern)?
            .filter_map(Result::ok)
            .filter(|path| path.is_file())
            .collect();
        zip_files.sort();

        Ok(zip_files)
    }

    /// Every table in one archive, tagged with its origin. An archive with no
    /// readable table is an error so the caller can skip it.
    pub fn read_archive(&self, zip_path: &Path) -> Result<Vec<DataFrame>> {
        let file = fs::File::open(zip_path)
            .with_context(|| format!("Failed to open ZIP file: {:?}", zip_path))?;
        let mut archive = ZipArchive::new(file)
            .with_context(|| format!("Failed to read ZIP archive: {:?}", zip_path))?;

        let archive_name = zip_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut tables = Vec::new();

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() || !is_table_name(entry.name()) {
                continue;
            }

            let table_name = entry.name().to_string();
            let mut buffer = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut buffer)
                .with_context(|| format!("Failed to extract {} from {:?}", table_name, zip_path))?;

            match parse_table(buffer) {
                Ok(mut df) => {
                    tag_source(&mut df, &archive_name, &table_name)?;
                    debug!("  Added {} rows from {}/{}", df.height(), archive_name, table_name);
                    tables.push(df);
                }
                Err(e) => warn!("  Failed to parse {} in {}: {}", table_name, archive_name, e),
            }
        }

        if tables.is_empty() {
            anyhow::bail!("No tab-separated tables found in {}", archive_name);
        }

        Ok(tables)
    }
}

fn is_table_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".csv") || lower.ends_with(".tsv")
}

/// Parses one tab-separated table with every column read as a string, so that
/// tables from different archives always concatenate.
pub fn parse_table(bytes: Vec<u8>) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_separator(b'\t'))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df)
}

fn tag_source(df: &mut DataFrame, archive_name: &str, table_name: &str) -> Result<()> {
    let height = df.height();
    df.with_column(Series::new(SOURCE_ARCHIVE.into(), vec![archive_name.to_string(); height]))?;
    df.with_column(Series::new(SOURCE_TABLE.into(), vec![table_name.to_string(); height]))?;
    Ok(())
}

pub fn read_archive_dir(input_dir: &Path) -> Result<DataFrame> {
    let reader = ArchiveReader::new(input_dir.to_path_buf());
    let (df, _stats) = reader.read_all()?;
    Ok(df)
}
