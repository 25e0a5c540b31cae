use tracing::debug;

use crate::configuration::Configuration;
use crate::curve::curve::{
    DEFAULT_LOWER_LIMIT,
    HYDRAULICLOAD,
    LoadCurve,
    refine_values,
    validate_curve,
    validate_lower_limit
};
use crate::data::dataadapter::DataAdapter;
use crate::data::schema::{
    ColumnType,
    Schema
};
use crate::data::table::{
    Column,
    Table
};
use crate::error::toolboxerror::{
    Result,
    ToolboxError
};
use crate::math::interpolation::InterpolationMethod;

pub const PROBABILITY_EXCEEDANCE: &str = "probability_exceedance";

fn validate_exceedance(hydraulicload: &[f64], probability_exceedance: &[f64]) -> Result<()> {
    if let Some(p) = probability_exceedance.iter().find(|&&p| p <= 0.0) {
        return Err(ToolboxError::numeric_domain(format!(
            "exceedance probability {} must be positive", p
        )));
    }
    if let Some(i) = probability_exceedance.windows(2).position(|w| w[1] > w[0]) {
        return Err(ToolboxError::numeric_domain(format!(
            "exceedance probability increases from {} to {} at load {}",
            probability_exceedance[i], probability_exceedance[i + 1], hydraulicload[i + 1]
        )));
    }
    Ok(())
}

/// Probability that the hydraulic load exceeds a level, non-increasing in
/// load.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceedanceFrequencyCurve {
    hydraulicload: Vec<f64>,
    probability_exceedance: Vec<f64>,
    lower_limit: f64
}

impl ExceedanceFrequencyCurve {
    pub fn new(hydraulicload: Vec<f64>, probability_exceedance: Vec<f64>) -> Result<ExceedanceFrequencyCurve> {
        validate_curve(&hydraulicload, &probability_exceedance, DEFAULT_LOWER_LIMIT)?;
        validate_exceedance(&hydraulicload, &probability_exceedance)?;
        Ok(ExceedanceFrequencyCurve {
            hydraulicload,
            probability_exceedance,
            lower_limit: DEFAULT_LOWER_LIMIT
        })
    }

    pub fn with_lower_limit(mut self, lower_limit: f64) -> Result<ExceedanceFrequencyCurve> {
        validate_lower_limit(lower_limit)?;
        self.lower_limit = lower_limit;
        Ok(self)
    }

    pub fn schema() -> Schema {
        Schema::new()
            .with(HYDRAULICLOAD, ColumnType::Float64)
            .with(PROBABILITY_EXCEEDANCE, ColumnType::Float64)
    }

    pub fn from_table(table: &Table, configuration: &Configuration) -> Result<ExceedanceFrequencyCurve> {
        let loads = table.float_column(HYDRAULICLOAD)?;
        let probabilities = table.float_column(PROBABILITY_EXCEEDANCE)?;
        let mut order: Vec<usize> = (0..loads.len()).collect();
        order.sort_by(|&a, &b| loads[a].total_cmp(&loads[b]));
        ExceedanceFrequencyCurve::new(
            order.iter().map(|&i| loads[i]).collect(),
            order.iter().map(|&i| probabilities[i]).collect()
        )?
        .with_lower_limit(configuration.lower_limit())
    }

    pub fn load<A>(adapter: &A, curve_name: &str, configuration: &Configuration) -> Result<ExceedanceFrequencyCurve>
        where A: DataAdapter + ?Sized {
        let table = adapter.input(curve_name, &ExceedanceFrequencyCurve::schema())?;
        let curve = ExceedanceFrequencyCurve::from_table(&table, configuration)?;
        debug!(curve_name, points = curve.len(), "exceedance frequency curve loaded");
        Ok(curve)
    }

    pub fn to_table(&self) -> Result<Table> {
        Table::new()
            .with_column(HYDRAULICLOAD, Column::Float64(self.hydraulicload.clone()))?
            .with_column(PROBABILITY_EXCEEDANCE, Column::Float64(self.probability_exceedance.clone()))
    }

    pub fn probability_exceedance(&self) -> &[f64] {
        &self.probability_exceedance
    }

    /// Resample onto `new_hydraulicload` with log interpolation, clipped to
    /// [0, 1].
    pub fn refine(&mut self, new_hydraulicload: &[f64]) -> Result<()> {
        let probability_exceedance = refine_values(
            InterpolationMethod::Log,
            new_hydraulicload,
            &self.hydraulicload,
            &self.probability_exceedance,
            self.lower_limit,
            true
        )?;
        self.hydraulicload = new_hydraulicload.to_vec();
        self.probability_exceedance = probability_exceedance;
        Ok(())
    }

    pub fn refined(&self, new_hydraulicload: &[f64]) -> Result<ExceedanceFrequencyCurve> {
        let mut curve = self.clone();
        curve.refine(new_hydraulicload)?;
        Ok(curve)
    }

    pub fn probability_exceedance_at(&self, hydraulicload: f64) -> Result<f64> {
        self.value(hydraulicload)
    }
}

impl LoadCurve for ExceedanceFrequencyCurve {
    fn hydraulicload(&self) -> &[f64] {
        &self.hydraulicload
    }

    fn probability(&self) -> &[f64] {
        &self.probability_exceedance
    }

    fn lower_limit(&self) -> f64 {
        self.lower_limit
    }

    fn value(&self, hydraulicload: f64) -> Result<f64> {
        let values = InterpolationMethod::Log
            .interpolate(&[hydraulicload], &self.hydraulicload, &self.probability_exceedance, self.lower_limit, true)?;
        Ok(values[0])
    }
}
