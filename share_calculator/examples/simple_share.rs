use chrono::NaiveDate;
use share_calculator::{build_from_records, FuelCategory, GenerationRecord, ZeroTotalPolicy};

fn main() {
    // One hour of French generation: 50 MW gas, 30 MW nuclear, 20 MW hard coal
    let timestamp = NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();

    let records: Vec<GenerationRecord> = [("Fossil Gas", 50.0), ("Nuclear", 30.0), ("Fossil Hard coal", 20.0)]
        .into_iter()
        .map(|(production_type, generation)| GenerationRecord {
            timestamp,
            utc_offset: None,
            country: "France".to_string(),
            resolution: "PT60M".to_string(),
            production_type: production_type.to_string(),
            generation,
        })
        .collect();

    let (rows, counts) = build_from_records(&records, ZeroTotalPolicy::Exclude);

    println!("Fossil Share Results");
    println!("====================");
    println!("Records: {}, keys: {}, output rows: {}", counts.resolved_records, counts.generation_keys, counts.output_rows);
    println!();

    for fuel in FuelCategory::ALL {
        if let Some(row) = rows.iter().find(|r| r.fuel == fuel && r.hour > 0.0) {
            println!(
                "{:<12} {:>6}  {:.2} h (cumulative {:.2} h)",
                fuel.name(),
                row.share_bin.label(),
                row.hour,
                row.cumulative_hours
            );
        }
    }
}
