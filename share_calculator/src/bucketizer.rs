use crate::config::ZeroTotalPolicy;
use crate::models::{FinalRow, FuelCategory, ShareBin, ShareRecord};
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};

/// (year, month, country, fuel); its derived ordering is the output row order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub year: i32,
    pub month: u32,
    pub country: String,
    pub fuel: FuelCategory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BucketedRecord {
    pub group: GroupKey,
    pub bin: Option<ShareBin>,
    pub hours: f64,
}

pub fn assign_bin(share: Option<f64>, policy: ZeroTotalPolicy) -> Option<ShareBin> {
    match (share, policy) {
        (Some(share), _) => ShareBin::classify(share),
        (None, ZeroTotalPolicy::LowestBin) => Some(ShareBin::Below1),
        (None, ZeroTotalPolicy::Exclude) => None,
    }
}

pub fn bucketize(records: &[ShareRecord], policy: ZeroTotalPolicy) -> Vec<BucketedRecord> {
    records
        .iter()
        .map(|record| BucketedRecord {
            group: GroupKey {
                year: record.year,
                month: record.month,
                country: record.key.country.clone(),
                fuel: record.fuel,
            },
            bin: assign_bin(record.share, policy),
            hours: record.hours,
        })
        .collect()
}

/// Hours per (group, bin), dense over all 21 bins, with the running
/// cumulative sum restarted for every group.
///
/// Every (year, month, country) seen in `records` gets a group for each of
/// the three fuels, even if a fuel never appeared there.
pub fn aggregate(records: &[ShareRecord], policy: ZeroTotalPolicy) -> Vec<FinalRow> {
    let bucketed = bucketize(records, policy);

    let mut periods: BTreeSet<(i32, u32, String)> = BTreeSet::new();
    let mut sums: HashMap<(GroupKey, ShareBin), f64> = HashMap::new();
    let mut unclassified = 0usize;
    let mut unclassified_hours = 0.0;

    for record in bucketed {
        periods.insert((record.group.year, record.group.month, record.group.country.clone()));
        match record.bin {
            Some(bin) => *sums.entry((record.group, bin)).or_insert(0.0) += record.hours,
            None => {
                unclassified += 1;
                unclassified_hours += record.hours;
            }
        }
    }

    if unclassified > 0 {
        warn!(
            "{} share records ({} hours) had no defined share bin and were left out",
            unclassified, unclassified_hours
        );
    }

    let groups: BTreeSet<GroupKey> = periods
        .into_iter()
        .flat_map(|(year, month, country)| {
            FuelCategory::ALL.into_iter().map(move |fuel| GroupKey {
                year,
                month,
                country: country.clone(),
                fuel,
            })
        })
        .collect();

    let mut rows = Vec::with_capacity(groups.len() * ShareBin::COUNT);

    for group in groups {
        let mut cumulative = 0.0;
        for bin in ShareBin::ALL {
            let hour = sums.get(&(group.clone(), bin)).copied().unwrap_or(0.0);
            cumulative += hour;
            rows.push(FinalRow {
                year: group.year,
                month: group.month,
                country: group.country.clone(),
                fuel: group.fuel,
                share_bin: bin,
                hour,
                cumulative_hours: cumulative,
            });
        }
    }

    debug!("Aggregated {} rows over {} groups", rows.len(), rows.len() / ShareBin::COUNT);
    rows
}
