use crate::models::GenerationRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use log::{debug, info};
use polars::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub const DATETIME: &str = "DateTime";
pub const AREA_CODE: &str = "AreaCode";
pub const AREA_TYPE_CODE: &str = "AreaTypeCode";
pub const RESOLUTION_CODE: &str = "ResolutionCode";
pub const PRODUCTION_TYPE: &str = "ProductionType";
pub const GENERATION: &str = "ActualGenerationOutput";

const REQUIRED_COLUMNS: [&str; 6] = [
    DATETIME,
    AREA_CODE,
    AREA_TYPE_CODE,
    RESOLUTION_CODE,
    PRODUCTION_TYPE,
    GENERATION,
];

/// ENTSO-E EIC codes of country bidding areas.
const COUNTRY_EIC: &[(&str, &str)] = &[
    ("10YAL-KESH-----5", "Albania"),
    ("10YAT-APG------L", "Austria"),
    ("10YBA-JPCC-----D", "Bosnia and Herzegovina"),
    ("10YBE----------2", "Belgium"),
    ("10YCA-BULGARIA-R", "Bulgaria"),
    ("10YCH-SWISSGRIDZ", "Switzerland"),
    ("10YCS-CG-TSO---S", "Montenegro"),
    ("10YCS-SERBIATSOV", "Serbia"),
    ("10YCY-1001A0003J", "Cyprus"),
    ("10YCZ-CEPS-----N", "Czech Republic"),
    ("10Y1001A1001A83F", "Germany"),
    ("10Y1001A1001A65H", "Denmark"),
    ("10Y1001A1001A39I", "Estonia"),
    ("10YES-REE------0", "Spain"),
    ("10YFI-1--------U", "Finland"),
    ("10YFR-RTE------C", "France"),
    ("10Y1001A1001A92E", "United Kingdom"),
    ("10YGR-HTSO-----Y", "Greece"),
    ("10YHR-HEP------M", "Croatia"),
    ("10YHU-MAVIR----U", "Hungary"),
    ("10YIE-1001A00010", "Ireland"),
    ("10YIT-GRTN-----B", "Italy"),
    ("10Y1001C--00100H", "Kosovo"),
    ("10YLT-1001A0008Q", "Lithuania"),
    ("10YLU-CEGEDEL-NQ", "Luxembourg"),
    ("10YLV-1001A00074", "Latvia"),
    ("10YMK-MEPSO----8", "North Macedonia"),
    ("10Y1001A1001A93C", "Malta"),
    ("10YNL----------L", "Netherlands"),
    ("10YNO-0--------C", "Norway"),
    ("10YPL-AREA-----S", "Poland"),
    ("10YPT-REN------W", "Portugal"),
    ("10YRO-TEL------P", "Romania"),
    ("10YSE-1--------K", "Sweden"),
    ("10YSI-ELES-----O", "Slovenia"),
    ("10YSK-SEPS-----K", "Slovakia"),
];

#[derive(Debug, Deserialize)]
struct AreaRow {
    #[serde(rename = "AreaCode")]
    area_code: String,
    #[serde(rename = "Country")]
    country: String,
}

/// Read-only lookup from area codes to country names.
#[derive(Debug, Clone)]
pub struct AreaMapper {
    countries: HashMap<String, String>,
}

impl AreaMapper {
    pub fn builtin() -> Self {
        COUNTRY_EIC.iter().copied().collect()
    }

    /// Load an `AreaCode,Country` table, replacing the built-in one.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open area map: {:?}", path))?;

        let mut countries = HashMap::new();
        for row in reader.deserialize() {
            let row: AreaRow = row.with_context(|| format!("Malformed area map row in {:?}", path))?;
            countries.insert(row.area_code.trim().to_string(), row.country.trim().to_string());
        }

        info!("Loaded {} area mappings from {:?}", countries.len(), path);
        Ok(Self { countries })
    }

    pub fn country_for(&self, area_code: &str) -> Option<&str> {
        self.countries.get(area_code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for AreaMapper {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self {
            countries: iter
                .into_iter()
                .map(|(code, country)| (code.to_string(), country.to_string()))
                .collect(),
        }
    }
}

/// Wall-clock time of an ENTSO-E `DateTime` value and its UTC offset in
/// seconds when one is given. The offset is kept, never applied.
pub fn parse_timestamp(value: &str) -> Option<(NaiveDateTime, Option<i32>)> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some((dt.naive_local(), Some(dt.offset().local_minus_utc())));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|timestamp| (timestamp, None))
}

/// Country-level rows of the raw table whose area resolves, as typed records.
pub fn resolve_records(raw: &DataFrame, mapper: &AreaMapper, country_marker: &str) -> Result<Vec<GenerationRecord>> {
    if raw.height() == 0 {
        return Ok(Vec::new());
    }

    for name in REQUIRED_COLUMNS {
        if raw.column(name).is_err() {
            anyhow::bail!("Required column {} not found in extracted tables", name);
        }
    }

    let df = raw
        .clone()
        .lazy()
        .filter(col(AREA_TYPE_CODE).eq(lit(country_marker)))
        .select([
            col(DATETIME),
            col(AREA_CODE),
            col(RESOLUTION_CODE),
            col(PRODUCTION_TYPE),
            col(GENERATION).cast(DataType::Float64),
        ])
        .collect()?;

    let timestamps = df.column(DATETIME)?.str()?;
    let areas = df.column(AREA_CODE)?.str()?;
    let resolutions = df.column(RESOLUTION_CODE)?.str()?;
    let production_types = df.column(PRODUCTION_TYPE)?.str()?;
    let generations = df.column(GENERATION)?.f64()?;

    let mut records = Vec::with_capacity(df.height());
    let mut unmapped = 0usize;
    let mut unparsable = 0usize;

    for idx in 0..df.height() {
        if let (Some(timestamp), Some(area), Some(resolution), Some(production_type)) = (
            timestamps.get(idx),
            areas.get(idx),
            resolutions.get(idx),
            production_types.get(idx),
        ) {
            let Some(country) = mapper.country_for(area) else {
                unmapped += 1;
                continue;
            };
            let Some((timestamp, utc_offset)) = parse_timestamp(timestamp) else {
                unparsable += 1;
                continue;
            };

            records.push(GenerationRecord {
                timestamp,
                utc_offset,
                country: country.to_string(),
                resolution: resolution.to_string(),
                production_type: production_type.to_string(),
                generation: generations.get(idx).unwrap_or(0.0),
            });
        }
    }

    debug!(
        "Area resolution kept {} of {} country-level rows ({} unmapped, {} bad timestamps)",
        records.len(),
        df.height(),
        unmapped,
        unparsable
    );

    Ok(records)
}
