use anyhow::Result;
use log::{info, warn};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use share_calculator::writer::write_csv;
use share_calculator::{FinalRow, FuelCategory, ShareBin};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Most hours a calendar month can hold; fixed top of the color scale.
pub const MAX_MONTH_HOURS: f64 = 744.0;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September", "October",
    "November", "December",
];

const LOW_COLOR: RGBColor = RGBColor(255, 0, 0);
const HIGH_COLOR: RGBColor = RGBColor(0, 128, 0);
const EMPTY_COLOR: RGBColor = RGBColor(235, 235, 235);

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapFilter {
    pub fuel: FuelCategory,
    pub share_bin: ShareBin,
    pub country: String,
}

impl HeatmapFilter {
    pub fn matches(&self, row: &FinalRow) -> bool {
        row.fuel == self.fuel && row.share_bin == self.share_bin && row.country == self.country
    }

    pub fn export_file_name(&self) -> String {
        format!("filtered_data_{}_{}.csv", self.fuel.name(), self.share_bin.label())
    }

    pub fn title(&self) -> String {
        let level = if self.share_bin.upper_bound().is_infinite() {
            format!("at least {}%", self.share_bin.lower_bound())
        } else {
            format!("less than {}%", self.share_bin.upper_bound())
        };
        format!(
            "Hours when {} represents {} of total {} generation",
            self.fuel.name(),
            level,
            self.country
        )
    }
}

/// Cumulative hours with years as rows and months as columns. Cells without
/// data stay `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapGrid {
    pub years: Vec<i32>,
    pub months: Vec<u32>,
    pub cells: Vec<Vec<Option<f64>>>,
}

pub fn available_fuels(rows: &[FinalRow]) -> Vec<FuelCategory> {
    let mut fuels: Vec<FuelCategory> = rows.iter().map(|r| r.fuel).collect::<BTreeSet<_>>().into_iter().collect();
    fuels.sort_by_key(|fuel| fuel.name());
    fuels
}

pub fn available_countries(rows: &[FinalRow]) -> Vec<String> {
    rows.iter()
        .map(|r| r.country.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn available_years(rows: &[FinalRow]) -> Vec<i32> {
    rows.iter().map(|r| r.year).collect::<BTreeSet<_>>().into_iter().collect()
}

pub fn filter_rows(rows: &[FinalRow], filter: &HeatmapFilter) -> Vec<FinalRow> {
    rows.iter().filter(|row| filter.matches(row)).cloned().collect()
}

pub fn pivot(rows: &[FinalRow]) -> HeatmapGrid {
    let mut sums: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for row in rows {
        *sums.entry((row.year, row.month)).or_insert(0.0) += row.cumulative_hours;
    }

    let years: Vec<i32> = sums.keys().map(|(year, _)| *year).collect::<BTreeSet<_>>().into_iter().collect();
    let months: Vec<u32> = sums.keys().map(|(_, month)| *month).collect::<BTreeSet<_>>().into_iter().collect();

    let cells = years
        .iter()
        .map(|year| months.iter().map(|month| sums.get(&(*year, *month)).copied()).collect())
        .collect();

    HeatmapGrid { years, months, cells }
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
        .unwrap_or("")
}

/// Linear red-to-green scale over `[0, MAX_MONTH_HOURS]`.
pub fn scale_color(hours: f64) -> RGBColor {
    let t = (hours / MAX_MONTH_HOURS).clamp(0.0, 1.0);
    let mix = |low: u8, high: u8| (low as f64 + (high as f64 - low as f64) * t).round() as u8;
    RGBColor(
        mix(LOW_COLOR.0, HIGH_COLOR.0),
        mix(LOW_COLOR.1, HIGH_COLOR.1),
        mix(LOW_COLOR.2, HIGH_COLOR.2),
    )
}

pub fn render_png(grid: &HeatmapGrid, title: &str, output_path: &Path) -> Result<()> {
    let n_months = grid.months.len() as i32;
    let n_years = grid.years.len() as i32;

    let root = BitMapBackend::new(output_path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let (chart_area, footer) = root.split_vertically(570);

    let mut chart = ChartBuilder::on(&chart_area)
        .caption(title, ("sans-serif", 22).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..n_months).into_segmented(), (0..n_years).into_segmented())?;

    let x_formatter = |value: &SegmentValue<i32>| match value {
        SegmentValue::CenterOf(idx) => grid
            .months
            .get(*idx as usize)
            .map(|month| month_name(*month).to_string())
            .unwrap_or_default(),
        _ => String::new(),
    };
    let y_formatter = |value: &SegmentValue<i32>| match value {
        SegmentValue::CenterOf(idx) => grid
            .years
            .get(*idx as usize)
            .map(|year| year.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Month")
        .y_desc("Year")
        .x_labels(grid.months.len())
        .y_labels(grid.years.len())
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter)
        .draw()?;

    chart.draw_series(grid.cells.iter().enumerate().flat_map(|(y, row)| {
        row.iter().enumerate().map(move |(x, value)| {
            let color = value.map(scale_color).unwrap_or(EMPTY_COLOR);
            let (x, y) = (x as i32, y as i32);
            Rectangle::new(
                [
                    (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                ],
                color.filled(),
            )
        })
    }))?;

    footer.draw(&Text::new(
        format!("Color scale 0 (red) to {} (green) hours. Source: ENTSO-E Transparency Platform data", MAX_MONTH_HOURS),
        (10, 5),
        ("sans-serif", 14).into_font(),
    ))?;

    root.present()?;
    info!("🖼️  Saved heatmap to {:?}", output_path);
    Ok(())
}

pub struct HeatmapOutputs {
    pub chart: PathBuf,
    pub export: Option<PathBuf>,
}

/// Filters, pivots, renders, and optionally exports. Returns `None` without
/// writing anything when the filtered view is empty.
pub fn generate_heatmap(rows: &[FinalRow], filter: &HeatmapFilter, outputs: &HeatmapOutputs) -> Result<Option<HeatmapGrid>> {
    let filtered = filter_rows(rows, filter);
    if filtered.is_empty() {
        warn!("⚠️  No data available for the selected filters. Please adjust your selections.");
        return Ok(None);
    }

    let grid = pivot(&filtered);
    render_png(&grid, &filter.title(), &outputs.chart)?;

    if let Some(export_path) = &outputs.export {
        write_csv(&filtered, export_path)?;
    }

    Ok(Some(grid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32, month: u32, country: &str, fuel: FuelCategory, bin: ShareBin, cumulative: f64) -> FinalRow {
        FinalRow {
            year,
            month,
            country: country.to_string(),
            fuel,
            share_bin: bin,
            hour: 0.0,
            cumulative_hours: cumulative,
        }
    }

    fn sample() -> Vec<FinalRow> {
        vec![
            row(2022, 1, "Italy", FuelCategory::Gas, ShareBin::Below50, 300.0),
            row(2022, 3, "Italy", FuelCategory::Gas, ShareBin::Below50, 410.0),
            row(2023, 1, "Italy", FuelCategory::Gas, ShareBin::Below50, 500.0),
            row(2023, 1, "Italy", FuelCategory::Coal, ShareBin::Below50, 744.0),
            row(2023, 1, "Spain", FuelCategory::Gas, ShareBin::Below50, 12.0),
            row(2023, 1, "Italy", FuelCategory::Gas, ShareBin::Below45, 100.0),
        ]
    }

    fn italy_gas() -> HeatmapFilter {
        HeatmapFilter {
            fuel: FuelCategory::Gas,
            share_bin: ShareBin::Below50,
            country: "Italy".to_string(),
        }
    }

    #[test]
    fn test_filter_and_pivot() {
        let filtered = filter_rows(&sample(), &italy_gas());
        assert_eq!(filtered.len(), 3);

        let grid = pivot(&filtered);
        assert_eq!(grid.years, vec![2022, 2023]);
        assert_eq!(grid.months, vec![1, 3]);
        assert_eq!(grid.cells[0], vec![Some(300.0), Some(410.0)]);
        assert_eq!(grid.cells[1], vec![Some(500.0), None]);
    }

    #[test]
    fn test_available_choices_are_sorted() {
        let rows = sample();
        assert_eq!(available_fuels(&rows), vec![FuelCategory::Coal, FuelCategory::Gas]);
        assert_eq!(available_countries(&rows), vec!["Italy".to_string(), "Spain".to_string()]);
        assert_eq!(available_years(&rows), vec![2022, 2023]);
    }

    #[test]
    fn test_color_scale_is_clamped() {
        assert_eq!(scale_color(0.0), LOW_COLOR);
        assert_eq!(scale_color(MAX_MONTH_HOURS), HIGH_COLOR);
        assert_eq!(scale_color(5000.0), HIGH_COLOR);
        assert_eq!(scale_color(-3.0), LOW_COLOR);
    }

    #[test]
    fn test_labels() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(0), "");
        assert_eq!(italy_gas().export_file_name(), "filtered_data_Gas_<50%.csv");
        assert_eq!(italy_gas().title(), "Hours when Gas represents less than 50% of total Italy generation");
        let top = HeatmapFilter {
            share_bin: ShareBin::AtLeast95,
            ..italy_gas()
        };
        assert_eq!(top.title(), "Hours when Gas represents at least 95% of total Italy generation");
    }

    #[test]
    fn test_empty_view_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let outputs = HeatmapOutputs {
            chart: dir.path().join("heatmap.png"),
            export: Some(dir.path().join("filtered.csv")),
        };
        let filter = HeatmapFilter {
            country: "Portugal".to_string(),
            ..italy_gas()
        };

        assert!(generate_heatmap(&sample(), &filter, &outputs).unwrap().is_none());
        assert!(!outputs.chart.exists());
        assert!(!outputs.export.unwrap().exists());
    }
}
