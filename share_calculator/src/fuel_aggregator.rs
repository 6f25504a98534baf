use crate::models::{FuelCategory, FuelGeneration, GenerationKey, GenerationRecord};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Order in which the category tables are concatenated.
const CONCAT_ORDER: [FuelCategory; 3] = [FuelCategory::FossilFuel, FuelCategory::Coal, FuelCategory::Gas];

/// Sum generation per key over the records belonging to one fuel category.
pub fn category_generation(records: &[GenerationRecord], fuel: FuelCategory) -> Vec<FuelGeneration> {
    let mut sums: BTreeMap<GenerationKey, f64> = BTreeMap::new();

    for record in records.iter().filter(|r| fuel.includes(&r.production_type)) {
        *sums.entry(record.key()).or_insert(0.0) += record.generation;
    }

    sums.into_iter()
        .map(|(key, generation)| FuelGeneration { key, fuel, generation })
        .collect()
}

/// One independent pass per category; a record can land in several.
pub fn aggregate_by_fuel(records: &[GenerationRecord]) -> Vec<FuelGeneration> {
    let per_fuel: Vec<Vec<FuelGeneration>> = CONCAT_ORDER
        .par_iter()
        .map(|&fuel| category_generation(records, fuel))
        .collect();

    per_fuel.into_iter().flatten().collect()
}

/// Sum generation per key over every production type.
pub fn total_generation(records: &[GenerationRecord]) -> BTreeMap<GenerationKey, f64> {
    let mut totals = BTreeMap::new();
    for record in records {
        *totals.entry(record.key()).or_insert(0.0) += record.generation;
    }
    totals
}
