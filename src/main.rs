use std::env;
use std::fs::File;

use tracing_subscriber::EnvFilter;

use floodrisk::configuration::Configuration;
use floodrisk::combination::combinefragilitycurves::{
    CombinationKind,
    CombineFragilityCurves
};
use floodrisk::curve::curve::HYDRAULICLOAD;
use floodrisk::curve::exceedancefrequencycurve::PROBABILITY_EXCEEDANCE;
use floodrisk::curve::fragilitycurve::FAILURE_PROBABILITY;
use floodrisk::data::dataadapter::DataAdapter;
use floodrisk::data::memorydataadapter::MemoryDataAdapter;
use floodrisk::data::table::{
    Column,
    Table
};
use floodrisk::error::toolboxerror::Result;
use floodrisk::integration::integratefragilitycurve::IntegrateFragilityCurve;

const EXCEEDANCE: &str = "exceedance_frequency";
const FRAGILITY: &str = "fragility_curve";

fn curve_table(probability_column: &str, loads: Vec<f64>, probabilities: Vec<f64>) -> Result<Table> {
    Table::new()
        .with_column(HYDRAULICLOAD, Column::Float64(loads))?
        .with_column(probability_column, Column::Float64(probabilities))
}

// 內建示範資料：兩個破壞機制合併後，再與水位超越機率積分
fn demo_adapter(configuration: &Configuration) -> Result<MemoryDataAdapter> {
    let mut adapter = MemoryDataAdapter::new()
        .with_table(EXCEEDANCE, curve_table(
            PROBABILITY_EXCEEDANCE,
            vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0],
            vec![1e-1, 3e-2, 1e-2, 3e-3, 1e-3, 3e-4, 1e-4]
        )?)
        .with_table("overtopping", curve_table(
            FAILURE_PROBABILITY,
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![1e-6, 1e-4, 1e-2, 0.3, 0.9]
        )?)
        .with_table("piping", curve_table(
            FAILURE_PROBABILITY,
            vec![0.0, 1.8, 1.8, 4.0],
            vec![1e-5, 1e-4, 5e-2, 0.2]
        )?);

    let mut combine = CombineFragilityCurves::new(CombinationKind::Independent, configuration.clone());
    combine.run(&mut adapter, &["overtopping", "piping"], FRAGILITY)?;
    Ok(adapter)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let configuration = match args.get(2) {
        Some(path) => Configuration::from_reader(File::open(path)?)?,
        None => Configuration::default()
    };
    let mut adapter = match args.get(1) {
        Some(path) => MemoryDataAdapter::from_reader(File::open(path)?)?,
        None => demo_adapter(&configuration)?
    };

    let mut integrate = IntegrateFragilityCurve::new(configuration);
    integrate.run(&mut adapter, &[EXCEEDANCE, FRAGILITY], "probability_contribution")?;

    let bins = adapter.read("probability_contribution")?;
    let loads = bins.float_column(HYDRAULICLOAD)?;
    let contributions = bins.float_column("probability_contribution")?;
    for (load, contribution) in loads.iter().zip(&contributions) {
        println!("{:>8.3}, {:.6e}", load, contribution);
    }
    if let Some(result) = integrate.result() {
        println!("failure probability: {:.6e}", result.total());
    }
    Ok(())
}
