use tracing::{
    debug,
    info
};

use crate::configuration::Configuration;
use crate::curve::curve::{
    HYDRAULICLOAD,
    LoadCurve
};
use crate::curve::exceedancefrequencycurve::ExceedanceFrequencyCurve;
use crate::curve::fragilitycurve::{
    FAILURE_PROBABILITY,
    FragilityCurve
};
use crate::curve::loadgrid::{
    clamp_grid,
    union_grid,
    uniform_grid
};
use crate::data::dataadapter::DataAdapter;
use crate::data::table::{
    Column,
    Table
};
use crate::error::toolboxerror::{
    Result,
    ToolboxError
};

pub const PROBABILITY_CONTRIBUTION: &str = "probability_contribution";

/// Uniform intervals laid over the exceedance range when no refine step size
/// is configured.
pub const DEFAULT_INTEGRATION_INTERVALS: usize = 1000;

/// Name of the one-row table holding the total next to the bin table
/// `output`.
pub fn total_table_name(output: &str) -> String {
    format!("{}_{}", output, FAILURE_PROBABILITY)
}

/// Failure probability carried by one load bin, reported at the bin's upper
/// load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationBin {
    hydraulicload: f64,
    probability_mass: f64,
    failure_probability: f64,
    probability_contribution: f64
}

impl IntegrationBin {
    pub fn new(hydraulicload: f64, probability_mass: f64, failure_probability: f64) -> IntegrationBin {
        IntegrationBin {
            hydraulicload,
            probability_mass,
            failure_probability,
            probability_contribution: probability_mass * failure_probability
        }
    }

    pub fn hydraulicload(&self) -> f64 {
        self.hydraulicload
    }

    /// Probability that the load falls in the bin.
    pub fn probability_mass(&self) -> f64 {
        self.probability_mass
    }

    pub fn failure_probability(&self) -> f64 {
        self.failure_probability
    }

    pub fn probability_contribution(&self) -> f64 {
        self.probability_contribution
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationResult {
    bins: Vec<IntegrationBin>,
    total: f64
}

impl IntegrationResult {
    pub fn bins(&self) -> &[IntegrationBin] {
        &self.bins
    }

    /// Failure probability summed over every bin.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Bins whose contribution reaches `contribution_floor`.
    pub fn significant_bins(&self, contribution_floor: f64) -> Vec<IntegrationBin> {
        self.bins
            .iter()
            .filter(|bin| bin.probability_contribution >= contribution_floor)
            .copied()
            .collect()
    }

    pub fn to_table(&self, contribution_floor: f64) -> Result<Table> {
        let bins = self.significant_bins(contribution_floor);
        Table::new()
            .with_column(HYDRAULICLOAD, Column::Float64(bins.iter().map(|b| b.hydraulicload).collect()))?
            .with_column(
                PROBABILITY_CONTRIBUTION,
                Column::Float64(bins.iter().map(|b| b.probability_contribution).collect())
            )
    }

    /// One row, one `failure_probability` column.
    pub fn total_table(&self) -> Result<Table> {
        Table::new().with_column(FAILURE_PROBABILITY, Column::Float64(vec![self.total]))
    }
}

/// Common load range of the two curves, or a range violation naming both.
pub fn check_overlap(fragility: &FragilityCurve, exceedance: &ExceedanceFrequencyCurve) -> Result<(f64, f64)> {
    let (f_min, f_max) = fragility.load_range();
    let (e_min, e_max) = exceedance.load_range();
    let lo = f_min.max(e_min);
    let hi = f_max.min(e_max);
    if lo < hi {
        Ok((lo, hi))
    } else {
        Err(ToolboxError::RangeViolation {
            fragility: (f_min, f_max),
            exceedance: (e_min, e_max)
        })
    }
}

/// Exceedance loads, plus fragility loads inside the exceedance range (steps
/// kept), plus uniform points over the exceedance range. The uniform step is
/// the configured refine step size, or the range split into
/// [`DEFAULT_INTEGRATION_INTERVALS`] intervals.
pub fn integration_grid(fragility: &FragilityCurve,
                        exceedance: &ExceedanceFrequencyCurve,
                        configuration: &Configuration) -> Result<Vec<f64>> {
    let (e_min, e_max) = exceedance.load_range();
    let fragility_loads = clamp_grid(fragility.hydraulicload(), e_min, e_max);
    let uniform = if e_max > e_min {
        let step = configuration
            .refine_step_size()
            .unwrap_or((e_max - e_min) / DEFAULT_INTEGRATION_INTERVALS as f64);
        uniform_grid(e_min, e_max, step)?
    } else {
        Vec::new()
    };
    Ok(union_grid(&[exceedance.hydraulicload(), &fragility_loads, &uniform]))
}

// ─────────────────────────────────────────────────────────────────────────────
// Integration
// ─────────────────────────────────────────────────────────────────────────────
//
//   P_f = Σ_i max(pe_i − pe_{i+1}, 0) · p_f(g_{i+1})  +  pe_n · p_f(g_n)
//
//   pe 為超越機率，g 為合併後的載重網格。最後一項為最高載重以上的尾端質量。

/// Integrate a fragility curve against an exceedance frequency curve.
pub fn integrate(fragility: &FragilityCurve,
                 exceedance: &ExceedanceFrequencyCurve,
                 configuration: &Configuration) -> Result<IntegrationResult> {
    check_overlap(fragility, exceedance)?;
    let grid = integration_grid(fragility, exceedance, configuration)?;

    let fragility = fragility.refined(&grid, configuration.add_steps())?;
    let exceedance = exceedance.refined(fragility.hydraulicload())?;
    let loads = fragility.hydraulicload();
    let pf = fragility.failure_probability();
    let pe = exceedance.probability_exceedance();
    let n = loads.len();

    let mut bins: Vec<IntegrationBin> = (0..n - 1)
        .map(|i| {
            let mass = (pe[i] - pe[i + 1]).max(0.0);
            IntegrationBin::new(loads[i + 1], mass, pf[i + 1])
        })
        .collect();
    if configuration.include_tail() {
        bins.push(IntegrationBin::new(loads[n - 1], pe[n - 1], pf[n - 1]));
    }
    let total = bins.iter().map(|bin| bin.probability_contribution).sum();
    debug!(points = n, bins = bins.len(), total, "fragility curve integrated");

    Ok(IntegrationResult { bins, total })
}

/// Integrate one fragility curve table against one exceedance table.
///
/// `inputs` names the exceedance table first, then the fragility table. The
/// output table lists the contribution of every bin at or above the
/// configured contribution floor; the total goes to
/// [`total_table_name`]`(output)`.
pub struct IntegrateFragilityCurve {
    configuration: Configuration,
    result: Option<IntegrationResult>
}

impl IntegrateFragilityCurve {
    pub fn new(configuration: Configuration) -> IntegrateFragilityCurve {
        IntegrateFragilityCurve { configuration, result: None }
    }

    pub fn run<A>(&mut self, adapter: &mut A, inputs: &[&str], output: &str) -> Result<()>
        where A: DataAdapter + ?Sized {
        let [exceedance_name, fragility_name] = inputs else {
            return Err(ToolboxError::numeric_domain(format!(
                "expected an exceedance and a fragility input, got {} inputs", inputs.len()
            )));
        };
        let exceedance = ExceedanceFrequencyCurve::load(&*adapter, exceedance_name, &self.configuration)?;
        let fragility = FragilityCurve::load(&*adapter, fragility_name, &self.configuration)?;

        let result = integrate(&fragility, &exceedance, &self.configuration)?;
        info!(output, failure_probability = result.total(), "integration finished");
        adapter.output(output, result.to_table(self.configuration.contribution_floor())?)?;
        adapter.output(&total_table_name(output), result.total_table()?)?;
        self.result = Some(result);
        Ok(())
    }

    pub fn result(&self) -> Option<&IntegrationResult> {
        self.result.as_ref()
    }
}
