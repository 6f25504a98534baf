use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fuel categories reported in the derived table, declared in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FuelCategory {
    Coal,
    Gas,
    #[serde(rename = "Fossil fuel")]
    FossilFuel,
}

impl FuelCategory {
    pub const ALL: [FuelCategory; 3] = [FuelCategory::Coal, FuelCategory::Gas, FuelCategory::FossilFuel];

    pub fn name(&self) -> &'static str {
        match self {
            FuelCategory::Coal => "Coal",
            FuelCategory::Gas => "Gas",
            FuelCategory::FossilFuel => "Fossil fuel",
        }
    }

    /// ENTSO-E production-type labels counted toward this category.
    ///
    /// The sets overlap: a "Fossil Gas" record belongs to both `Gas` and `FossilFuel`.
    pub fn production_types(&self) -> &'static [&'static str] {
        match self {
            FuelCategory::FossilFuel => &[
                "Fossil Gas",
                "Fossil Hard coal",
                "Fossil Oil",
                "Fossil Coal-derived gas",
                "Fossil Oil shale",
                "Fossil Brown coal/Lignite",
                "Fossil Peat",
            ],
            FuelCategory::Coal => &[
                "Fossil Hard coal",
                "Fossil Coal-derived gas",
                "Fossil Brown coal/Lignite",
            ],
            FuelCategory::Gas => &["Fossil Gas"],
        }
    }

    pub fn includes(&self, production_type: &str) -> bool {
        self.production_types().contains(&production_type)
    }
}

impl fmt::Display for FuelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FuelCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        FuelCategory::ALL
            .into_iter()
            .find(|fuel| fuel.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("unknown fuel '{}', expected one of Coal, Gas, Fossil fuel", s))
    }
}

/// Fossil-share ranges. Each bin is closed on its lower edge and open on its
/// upper edge; the last bin is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShareBin {
    #[serde(rename = "<1%")]
    Below1,
    #[serde(rename = "<5%")]
    Below5,
    #[serde(rename = "<10%")]
    Below10,
    #[serde(rename = "<15%")]
    Below15,
    #[serde(rename = "<20%")]
    Below20,
    #[serde(rename = "<25%")]
    Below25,
    #[serde(rename = "<30%")]
    Below30,
    #[serde(rename = "<35%")]
    Below35,
    #[serde(rename = "<40%")]
    Below40,
    #[serde(rename = "<45%")]
    Below45,
    #[serde(rename = "<50%")]
    Below50,
    #[serde(rename = "<55%")]
    Below55,
    #[serde(rename = "<60%")]
    Below60,
    #[serde(rename = "<65%")]
    Below65,
    #[serde(rename = "<70%")]
    Below70,
    #[serde(rename = "<75%")]
    Below75,
    #[serde(rename = "<80%")]
    Below80,
    #[serde(rename = "<85%")]
    Below85,
    #[serde(rename = "<90%")]
    Below90,
    #[serde(rename = "<95%")]
    Below95,
    #[serde(rename = ">=95%")]
    AtLeast95,
}

impl ShareBin {
    pub const COUNT: usize = 21;

    pub const ALL: [ShareBin; ShareBin::COUNT] = [
        ShareBin::Below1,
        ShareBin::Below5,
        ShareBin::Below10,
        ShareBin::Below15,
        ShareBin::Below20,
        ShareBin::Below25,
        ShareBin::Below30,
        ShareBin::Below35,
        ShareBin::Below40,
        ShareBin::Below45,
        ShareBin::Below50,
        ShareBin::Below55,
        ShareBin::Below60,
        ShareBin::Below65,
        ShareBin::Below70,
        ShareBin::Below75,
        ShareBin::Below80,
        ShareBin::Below85,
        ShareBin::Below90,
        ShareBin::Below95,
        ShareBin::AtLeast95,
    ];

    const LOWER_BOUNDS: [f64; ShareBin::COUNT] = [
        0.0, 1.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0,
        75.0, 80.0, 85.0, 90.0, 95.0,
    ];

    const LABELS: [&'static str; ShareBin::COUNT] = [
        "<1%", "<5%", "<10%", "<15%", "<20%", "<25%", "<30%", "<35%", "<40%", "<45%", "<50%",
        "<55%", "<60%", "<65%", "<70%", "<75%", "<80%", "<85%", "<90%", "<95%", ">=95%",
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn label(&self) -> &'static str {
        Self::LABELS[self.index()]
    }

    pub fn lower_bound(&self) -> f64 {
        Self::LOWER_BOUNDS[self.index()]
    }

    /// Exclusive upper bound, `f64::INFINITY` for the last bin.
    pub fn upper_bound(&self) -> f64 {
        Self::LOWER_BOUNDS
            .get(self.index() + 1)
            .copied()
            .unwrap_or(f64::INFINITY)
    }

    /// Returns `None` for shares that fall outside every bin (NaN or negative).
    pub fn classify(share: f64) -> Option<ShareBin> {
        if share.is_nan() || share < 0.0 {
            return None;
        }
        ShareBin::ALL
            .iter()
            .rev()
            .find(|bin| share >= bin.lower_bound())
            .copied()
    }
}

impl fmt::Display for ShareBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ShareBin {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        ShareBin::ALL
            .into_iter()
            .find(|bin| bin.label() == s)
            .ok_or_else(|| anyhow!("unknown share bin '{}'", s))
    }
}

/// A generation reading whose area resolved to a country.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRecord {
    pub timestamp: NaiveDateTime,
    pub utc_offset: Option<i32>,
    pub country: String,
    pub resolution: String,
    pub production_type: String,
    pub generation: f64,
}

impl GenerationRecord {
    pub fn key(&self) -> GenerationKey {
        GenerationKey {
            timestamp: self.timestamp,
            utc_offset: self.utc_offset,
            country: self.country.clone(),
            resolution: self.resolution.clone(),
        }
    }
}

/// `timestamp` is wall-clock time. `utc_offset` holds the reported offset in
/// seconds, so the repeated hour of a DST fall-back stays a separate key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationKey {
    pub timestamp: NaiveDateTime,
    pub utc_offset: Option<i32>,
    pub country: String,
    pub resolution: String,
}

/// Summed generation of one fuel category for one key.
#[derive(Debug, Clone, PartialEq)]
pub struct FuelGeneration {
    pub key: GenerationKey,
    pub fuel: FuelCategory,
    pub generation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShareRecord {
    pub key: GenerationKey,
    pub fuel: FuelCategory,
    pub generation: f64,
    pub total_generation: f64,
    /// `None` when total generation is zero.
    pub share: Option<f64>,
    pub year: i32,
    pub month: u32,
    pub hours: f64,
}

/// One row of the derived table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalRow {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Fuel")]
    pub fuel: FuelCategory,
    #[serde(rename = "Share_bins")]
    pub share_bin: ShareBin,
    #[serde(rename = "Hour")]
    pub hour: f64,
    #[serde(rename = "Cumulative_Hours")]
    pub cumulative_hours: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_boundaries_are_closed_on_lower_edge() {
        assert_eq!(ShareBin::classify(0.0), Some(ShareBin::Below1));
        assert_eq!(ShareBin::classify(0.999), Some(ShareBin::Below1));
        assert_eq!(ShareBin::classify(1.0), Some(ShareBin::Below5));
        assert_eq!(ShareBin::classify(50.0), Some(ShareBin::Below55));
        assert_eq!(ShareBin::classify(94.99), Some(ShareBin::Below95));
        assert_eq!(ShareBin::classify(95.0), Some(ShareBin::AtLeast95));
        assert_eq!(ShareBin::classify(100.0), Some(ShareBin::AtLeast95));
        assert_eq!(ShareBin::classify(250.0), Some(ShareBin::AtLeast95));
    }

    #[test]
    fn test_unclassifiable_shares() {
        assert_eq!(ShareBin::classify(f64::NAN), None);
        assert_eq!(ShareBin::classify(-0.5), None);
    }

    #[test]
    fn test_bin_labels_round_trip_through_from_str() {
        for bin in ShareBin::ALL {
            assert_eq!(bin.label().parse::<ShareBin>().unwrap(), bin);
        }
        assert_eq!(ShareBin::ALL[0].label(), "<1%");
        assert_eq!(ShareBin::ALL[20].label(), ">=95%");
        assert_eq!(ShareBin::Below25.upper_bound(), 25.0);
        assert!(ShareBin::AtLeast95.upper_bound().is_infinite());
    }

    #[test]
    fn test_fuel_order_and_membership() {
        assert!(FuelCategory::Coal < FuelCategory::Gas);
        assert!(FuelCategory::Gas < FuelCategory::FossilFuel);
        assert!(FuelCategory::Gas.includes("Fossil Gas"));
        assert!(FuelCategory::FossilFuel.includes("Fossil Gas"));
        assert!(FuelCategory::Coal.includes("Fossil Brown coal/Lignite"));
        assert!(!FuelCategory::Coal.includes("Fossil Gas"));
        assert!(!FuelCategory::FossilFuel.includes("Nuclear"));
        assert_eq!("fossil fuel".parse::<FuelCategory>().unwrap(), FuelCategory::FossilFuel);
        assert!("Biomass".parse::<FuelCategory>().is_err());
    }
}
