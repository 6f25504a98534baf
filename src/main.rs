use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;
use share_calculator::writer::read_csv;
use share_calculator::{FuelCategory, ShareBin};
use std::path::PathBuf;

mod heatmap;

use heatmap::{available_countries, available_fuels, available_years, generate_heatmap, HeatmapFilter, HeatmapOutputs};

#[derive(Parser)]
#[command(name = "fossil_heatmap")]
#[command(about = "Render the monthly fossil-share heatmap from the derived hours table")]
struct Args {
    /// Derived table written by share_calculator
    #[arg(short, long, default_value = "share_of_generation_monthly.csv")]
    input: PathBuf,

    /// Fuel to show (Coal, Gas, Fossil fuel); defaults to the first available
    #[arg(short, long)]
    fuel: Option<String>,

    /// Share bin label, e.g. "<30%"
    #[arg(short, long, default_value = "<1%")]
    share_bin: String,

    /// Country to show; defaults to the first available
    #[arg(short, long)]
    country: Option<String>,

    /// PNG output path
    #[arg(short, long, default_value = "heatmap.png")]
    output: PathBuf,

    /// Export the filtered rows as CSV, optionally to the given path
    #[arg(long)]
    export: Option<Option<PathBuf>>,

    /// Print the available fuels, countries and years and exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let rows = read_csv(&args.input).with_context(|| format!("Failed to load derived table {:?}", args.input))?;
    info!("Loaded {} rows from {:?}", rows.len(), args.input);

    let fuels = available_fuels(&rows);
    let countries = available_countries(&rows);

    if args.list {
        let fuel_names: Vec<&str> = fuels.iter().map(|f| f.name()).collect();
        let bin_labels: Vec<&str> = ShareBin::ALL.iter().map(|b| b.label()).collect();
        println!("Fuels:      {}", fuel_names.join(", "));
        println!("Share bins: {}", bin_labels.join(", "));
        println!("Countries:  {}", countries.join(", "));
        println!("Years:      {:?}", available_years(&rows));
        return Ok(());
    }

    let fuel = match &args.fuel {
        Some(name) => name.parse::<FuelCategory>()?,
        None => match fuels.first() {
            Some(fuel) => *fuel,
            None => anyhow::bail!("Derived table {:?} has no rows", args.input),
        },
    };
    let country = match args.country.or_else(|| countries.first().cloned()) {
        Some(country) => country,
        None => anyhow::bail!("Derived table {:?} has no rows", args.input),
    };

    let filter = HeatmapFilter {
        fuel,
        share_bin: args.share_bin.parse()?,
        country,
    };
    let outputs = HeatmapOutputs {
        chart: args.output,
        export: args
            .export
            .map(|path| path.unwrap_or_else(|| PathBuf::from(filter.export_file_name()))),
    };

    info!("📊 {}", filter.title());
    if let Some(grid) = generate_heatmap(&rows, &filter, &outputs)? {
        info!("Heatmap covers {} years x {} months", grid.years.len(), grid.months.len());
    }

    Ok(())
}
