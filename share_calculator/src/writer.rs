use crate::models::FinalRow;
use anyhow::{Context, Result};
use log::info;
use polars::prelude::*;
use std::fs;
use std::path::Path;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    Ok(())
}

pub const HEADER: [&str; 7] = ["Year", "Month", "Country", "Fuel", "Share_bins", "Hour", "Cumulative_Hours"];

/// The header is written even when there are no rows.
pub fn write_csv(rows: &[FinalRow], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {:?}", path))?;
    writer.write_record(HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().with_context(|| format!("Failed to write {:?}", path))?;

    info!("💾 Saved {} rows to {:?}", rows.len(), path);
    Ok(())
}

pub fn to_dataframe(rows: &[FinalRow]) -> Result<DataFrame> {
    let df = df!(
        HEADER[0] => rows.iter().map(|r| r.year).collect::<Vec<i32>>(),
        HEADER[1] => rows.iter().map(|r| r.month).collect::<Vec<u32>>(),
        HEADER[2] => rows.iter().map(|r| r.country.as_str()).collect::<Vec<&str>>(),
        HEADER[3] => rows.iter().map(|r| r.fuel.name()).collect::<Vec<&str>>(),
        HEADER[4] => rows.iter().map(|r| r.share_bin.label()).collect::<Vec<&str>>(),
        HEADER[5] => rows.iter().map(|r| r.hour).collect::<Vec<f64>>(),
        HEADER[6] => rows.iter().map(|r| r.cumulative_hours).collect::<Vec<f64>>()
    )?;
    Ok(df)
}

pub fn write_parquet(rows: &[FinalRow], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut df = to_dataframe(rows)?;
    ParquetWriter::new(fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))?)
        .finish(&mut df)?;

    info!("📦 Saved {} rows to {:?}", rows.len(), path);
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<Vec<FinalRow>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        let row: FinalRow = row.with_context(|| format!("Malformed row in {:?}", path))?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FuelCategory, ShareBin};
    use tempfile::TempDir;

    fn rows() -> Vec<FinalRow> {
        vec![
            FinalRow {
                year: 2020,
                month: 4,
                country: "Czech Republic".to_string(),
                fuel: FuelCategory::FossilFuel,
                share_bin: ShareBin::Below1,
                hour: 0.25,
                cumulative_hours: 0.25,
            },
            FinalRow {
                year: 2020,
                month: 4,
                country: "Czech Republic".to_string(),
                fuel: FuelCategory::FossilFuel,
                share_bin: ShareBin::AtLeast95,
                hour: 2.0,
                cumulative_hours: 2.25,
            },
        ]
    }

    #[test]
    fn test_csv_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("table.csv");

        write_csv(&rows(), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Year,Month,Country,Fuel,Share_bins,Hour,Cumulative_Hours");
        assert_eq!(lines[1], "2020,4,Czech Republic,Fossil fuel,<1%,0.25,0.25");
        assert_eq!(lines[2], "2020,4,Czech Republic,Fossil fuel,>=95%,2.0,2.25");

        assert_eq!(read_csv(&path).unwrap(), rows());
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");

        write_csv(&[], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", HEADER.join(",")));
        assert!(read_csv(&path).unwrap().is_empty());
    }

    #[test]
    fn test_dataframe_columns() {
        let df = to_dataframe(&rows()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 7);
        assert_eq!(df.column("Share_bins").unwrap().str().unwrap().get(1), Some(">=95%"));
    }

    #[test]
    fn test_parquet_is_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.parquet");
        write_parquet(&rows(), &path).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }
}
