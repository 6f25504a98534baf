use crate::models::{FuelCategory, FuelGeneration, GenerationKey, ShareRecord};
use chrono::Datelike;
use std::collections::{BTreeMap, HashMap};

/// Fuel assigned to keys that have no fossil generation at all.
pub const DEFAULT_FUEL: FuelCategory = FuelCategory::FossilFuel;

/// Fraction of an hour covered by one reading at the given resolution.
pub fn resolution_hours(resolution: &str) -> f64 {
    match resolution {
        "PT15M" => 0.25,
        "PT30M" => 0.5,
        _ => 1.0,
    }
}

/// Percentage of total generation, `None` when the total is zero.
pub fn share_of(generation: f64, total_generation: f64) -> Option<f64> {
    if total_generation == 0.0 {
        None
    } else {
        Some(generation / total_generation * 100.0)
    }
}

/// Left join of the category sums onto total generation.
///
/// Every key of `totals` yields one record per matching category row, or a
/// single zero-generation `Fossil fuel` record when no category matched.
pub fn calculate_shares(totals: &BTreeMap<GenerationKey, f64>, fuel_rows: &[FuelGeneration]) -> Vec<ShareRecord> {
    let mut by_key: HashMap<&GenerationKey, Vec<&FuelGeneration>> = HashMap::new();
    for row in fuel_rows {
        by_key.entry(&row.key).or_default().push(row);
    }

    let mut records = Vec::with_capacity(fuel_rows.len().max(totals.len()));

    for (key, &total) in totals {
        match by_key.get(key) {
            Some(rows) => {
                for row in rows {
                    records.push(share_record(key, row.fuel, row.generation, total));
                }
            }
            None => records.push(share_record(key, DEFAULT_FUEL, 0.0, total)),
        }
    }

    records
}

fn share_record(key: &GenerationKey, fuel: FuelCategory, generation: f64, total_generation: f64) -> ShareRecord {
    ShareRecord {
        key: key.clone(),
        fuel,
        generation,
        total_generation,
        share: share_of(generation, total_generation),
        year: key.timestamp.year(),
        month: key.timestamp.month(),
        hours: resolution_hours(&key.resolution),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn key(day: u32, resolution: &str) -> GenerationKey {
        GenerationKey {
            timestamp: NaiveDate::from_ymd_opt(2022, 11, day).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            utc_offset: None,
            country: "Spain".to_string(),
            resolution: resolution.to_string(),
        }
    }

    #[test]
    fn test_resolution_hours() {
        assert_eq!(resolution_hours("PT15M"), 0.25);
        assert_eq!(resolution_hours("PT30M"), 0.5);
        assert_eq!(resolution_hours("PT60M"), 1.0);
        assert_eq!(resolution_hours("P1D"), 1.0);
    }

    #[test]
    fn test_share_of_zero_total_is_undefined() {
        assert_eq!(share_of(0.0, 0.0), None);
        assert_eq!(share_of(25.0, 50.0), Some(50.0));
    }

    #[test]
    fn test_left_join_keeps_every_category_row() {
        let mut totals = BTreeMap::new();
        totals.insert(key(1, "PT15M"), 200.0);
        let fuel_rows = vec![
            FuelGeneration { key: key(1, "PT15M"), fuel: FuelCategory::FossilFuel, generation: 50.0 },
            FuelGeneration { key: key(1, "PT15M"), fuel: FuelCategory::Gas, generation: 50.0 },
        ];

        let records = calculate_shares(&totals, &fuel_rows);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.share == Some(25.0)));
        assert!(records.iter().all(|r| r.hours == 0.25 && r.year == 2022 && r.month == 11));
    }

    #[test]
    fn test_missing_key_synthesizes_fossil_row() {
        let mut totals = BTreeMap::new();
        totals.insert(key(2, "PT60M"), 120.0);
        totals.insert(key(3, "PT60M"), 0.0);

        let records = calculate_shares(&totals, &[]);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].fuel, FuelCategory::FossilFuel);
        assert_eq!(records[0].generation, 0.0);
        assert_eq!(records[0].share, Some(0.0));

        assert_eq!(records[1].total_generation, 0.0);
        assert_eq!(records[1].share, None);
    }
}
