use std::collections::BTreeMap;

use tracing::{
    debug,
    info
};

use crate::configuration::Configuration;
use crate::curve::curve::HYDRAULICLOAD;
use crate::curve::exceedancefrequencycurve::ExceedanceFrequencyCurve;
use crate::curve::fragilitycurve::{
    FAILURE_PROBABILITY,
    FragilityCurve
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
use crate::integration::integratefragilitycurve::{
    IntegrationResult,
    PROBABILITY_CONTRIBUTION,
    integrate,
    total_table_name
};

pub const SECTION_ID: &str = "section_id";

/// Row indices per section id, in row order.
fn group_rows(section_ids: &[i64]) -> BTreeMap<i64, Vec<usize>> {
    let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (row, &section_id) in section_ids.iter().enumerate() {
        groups.entry(section_id).or_default().push(row);
    }
    groups
}

enum SectionExceedance {
    Shared(ExceedanceFrequencyCurve),
    PerSection(BTreeMap<i64, ExceedanceFrequencyCurve>)
}

impl SectionExceedance {
    fn from_table(table: &Table, configuration: &Configuration) -> Result<SectionExceedance> {
        if !table.has_column(SECTION_ID) {
            return Ok(SectionExceedance::Shared(ExceedanceFrequencyCurve::from_table(table, configuration)?));
        }
        let curves = group_rows(&table.int_column(SECTION_ID)?)
            .into_iter()
            .map(|(section_id, rows)| {
                ExceedanceFrequencyCurve::from_table(&table.select_rows(&rows), configuration)
                    .map(|curve| (section_id, curve))
            })
            .collect::<Result<BTreeMap<i64, ExceedanceFrequencyCurve>>>()?;
        Ok(SectionExceedance::PerSection(curves))
    }

    fn get(&self, section_id: i64) -> Result<&ExceedanceFrequencyCurve> {
        match self {
            SectionExceedance::Shared(curve) => Ok(curve),
            SectionExceedance::PerSection(curves) => curves
                .get(&section_id)
                .ok_or(ToolboxError::MissingSection(section_id))
        }
    }
}

pub fn fragility_schema() -> Schema {
    FragilityCurve::schema().with(SECTION_ID, ColumnType::Int64)
}

/// Integrate every section of `fragility_table` against the exceedance curve
/// of the same section.
///
/// When `exceedance_table` has no `section_id` column, its single curve is
/// used for every section. Sections never share probability mass.
pub fn integrate_per_section(fragility_table: &Table,
                             exceedance_table: &Table,
                             configuration: &Configuration) -> Result<BTreeMap<i64, IntegrationResult>> {
    let exceedance = SectionExceedance::from_table(exceedance_table, configuration)?;
    let mut results = BTreeMap::new();
    for (section_id, rows) in group_rows(&fragility_table.int_column(SECTION_ID)?) {
        let fragility = FragilityCurve::from_table(&fragility_table.select_rows(&rows), configuration)?;
        let result = integrate(&fragility, exceedance.get(section_id)?, configuration)?;
        debug!(section_id, failure_probability = result.total(), "section integrated");
        results.insert(section_id, result);
    }
    Ok(results)
}

/// Bin table with a `section_id` column, sections in ascending order.
pub fn section_bin_table(results: &BTreeMap<i64, IntegrationResult>, contribution_floor: f64) -> Result<Table> {
    let mut section_ids = Vec::new();
    let mut loads = Vec::new();
    let mut contributions = Vec::new();
    for (&section_id, result) in results {
        for bin in result.significant_bins(contribution_floor) {
            section_ids.push(section_id);
            loads.push(bin.hydraulicload());
            contributions.push(bin.probability_contribution());
        }
    }
    Table::new()
        .with_column(SECTION_ID, Column::Int64(section_ids))?
        .with_column(HYDRAULICLOAD, Column::Float64(loads))?
        .with_column(PROBABILITY_CONTRIBUTION, Column::Float64(contributions))
}

/// One row per section: `section_id`, `failure_probability`.
pub fn section_total_table(results: &BTreeMap<i64, IntegrationResult>) -> Result<Table> {
    Table::new()
        .with_column(SECTION_ID, Column::Int64(results.keys().copied().collect()))?
        .with_column(
            FAILURE_PROBABILITY,
            Column::Float64(results.values().map(IntegrationResult::total).collect())
        )
}

fn read_section_tables<A>(adapter: &A, inputs: &[&str]) -> Result<(Table, Table)>
    where A: DataAdapter + ?Sized {
    let [exceedance_name, fragility_name] = inputs else {
        return Err(ToolboxError::numeric_domain(format!(
            "expected an exceedance and a fragility input, got {} inputs", inputs.len()
        )));
    };
    let exceedance_table = adapter.input(exceedance_name, &ExceedanceFrequencyCurve::schema())?;
    let fragility_table = adapter.input(fragility_name, &fragility_schema())?;
    Ok((exceedance_table, fragility_table))
}

/// Per-section integration writing the contribution of every bin, and the
/// section totals to [`total_table_name`]`(output)`.
pub struct IntegrateFragilityCurveMultiple {
    configuration: Configuration,
    results: BTreeMap<i64, IntegrationResult>
}

impl IntegrateFragilityCurveMultiple {
    pub fn new(configuration: Configuration) -> IntegrateFragilityCurveMultiple {
        IntegrateFragilityCurveMultiple { configuration, results: BTreeMap::new() }
    }

    /// `inputs`: exceedance table, then fragility table with `section_id`.
    pub fn run<A>(&mut self, adapter: &mut A, inputs: &[&str], output: &str) -> Result<()>
        where A: DataAdapter + ?Sized {
        let (exceedance_table, fragility_table) = read_section_tables(&*adapter, inputs)?;
        let results = integrate_per_section(&fragility_table, &exceedance_table, &self.configuration)?;
        info!(output, sections = results.len(), "per-section integration finished");
        adapter.output(output, section_bin_table(&results, self.configuration.contribution_floor())?)?;
        adapter.output(&total_table_name(output), section_total_table(&results)?)?;
        self.results = results;
        Ok(())
    }

    pub fn results(&self) -> &BTreeMap<i64, IntegrationResult> {
        &self.results
    }
}

/// Per-section integration writing only the total failure probability of
/// each section.
pub struct IntegrateStatistics {
    configuration: Configuration,
    results: BTreeMap<i64, IntegrationResult>
}

impl IntegrateStatistics {
    pub fn new(configuration: Configuration) -> IntegrateStatistics {
        IntegrateStatistics { configuration, results: BTreeMap::new() }
    }

    pub fn run<A>(&mut self, adapter: &mut A, inputs: &[&str], output: &str) -> Result<()>
        where A: DataAdapter + ?Sized {
        let (exceedance_table, fragility_table) = read_section_tables(&*adapter, inputs)?;
        let results = integrate_per_section(&fragility_table, &exceedance_table, &self.configuration)?;
        info!(output, sections = results.len(), "section statistics written");
        adapter.output(output, section_total_table(&results)?)?;
        self.results = results;
        Ok(())
    }

    pub fn results(&self) -> &BTreeMap<i64, IntegrationResult> {
        &self.results
    }
}
