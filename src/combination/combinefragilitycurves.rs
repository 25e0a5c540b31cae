use nalgebra::{
    DMatrix,
    DVector
};
use serde::{
    Deserialize,
    Serialize
};
use tracing::{
    debug,
    info
};

use crate::configuration::Configuration;
use crate::curve::curve::LoadCurve;
use crate::curve::fragilitycurve::FragilityCurve;
use crate::curve::loadgrid::{
    union_grid,
    uniform_grid
};
use crate::data::dataadapter::DataAdapter;
use crate::data::schema::{
    ColumnType,
    Schema
};
use crate::error::toolboxerror::{
    Result,
    ToolboxError
};

pub const WEIGHT: &str = "weight";

/// Allowed deviation of the weight sum from one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-8;

// ─────────────────────────────────────────────────────────────────────────────
// Combination policies
// ─────────────────────────────────────────────────────────────────────────────
//
//   Independent : 1 - Π(1 - p_k)   互相獨立的失效機制，以 -expm1(Σ ln1p(-p_k)) 計算
//                                  避免 p_k 極小時 1 - p_k 捨入為 1
//   Dependent   : max(p_k)         完全相關，最弱機制主導
//   WeightedSum : Σ w_k·p_k        Σ w_k = 1，例如不同措施或情境的加權

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombinationPolicy {
    Independent,
    Dependent,
    WeightedSum(Vec<f64>)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombinationKind {
    Independent,
    Dependent,
    WeightedSum
}

pub fn validate_weights(weights: &[f64], curve_count: usize) -> Result<()> {
    if weights.len() != curve_count {
        return Err(ToolboxError::numeric_domain(format!(
            "{} weights given for {} curves", weights.len(), curve_count
        )));
    }
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(ToolboxError::numeric_domain(format!(
            "weights must be finite and non-negative, got {}", w
        )));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ToolboxError::numeric_domain(format!(
            "weights must sum to 1, got {}", sum
        )));
    }
    Ok(())
}

/// Union of the loads of all curves (steps kept), optionally densified with
/// a uniform grid over the full range.
pub fn common_grid(curves: &[FragilityCurve], refine_step_size: Option<f64>) -> Result<Vec<f64>> {
    let mut grids: Vec<&[f64]> = curves.iter()
        .map(|curve| curve.hydraulicload())
        .collect();
    let uniform = match refine_step_size {
        Some(step) => {
            let lo = curves.iter().map(|c| c.min_load()).fold(f64::INFINITY, f64::min);
            let hi = curves.iter().map(|c| c.max_load()).fold(f64::NEG_INFINITY, f64::max);
            uniform_grid(lo, hi, step)?
        },
        None => Vec::new()
    };
    grids.push(&uniform);
    Ok(union_grid(&grids))
}

/// K×N matrix of the curves' probabilities on `grid`, one row per curve.
pub fn stack_probabilities(curves: &[FragilityCurve], grid: &[f64]) -> Result<DMatrix<f64>> {
    let rows = curves.iter()
        .map(|curve| curve.refined(grid, false))
        .collect::<Result<Vec<FragilityCurve>>>()?;
    Ok(DMatrix::from_fn(rows.len(), grid.len(), |k, i| rows[k].failure_probability()[i]))
}

fn combine_independent(probabilities: &DMatrix<f64>) -> Vec<f64> {
    probabilities
        .column_iter()
        .map(|column| -f64::exp_m1(column.iter().map(|p| (-p).ln_1p()).sum::<f64>()))
        .collect()
}

fn combine_dependent(probabilities: &DMatrix<f64>) -> Vec<f64> {
    probabilities
        .column_iter()
        .map(|column| column.max())
        .collect()
}

fn combine_weighted_sum(probabilities: &DMatrix<f64>, weights: &[f64]) -> Vec<f64> {
    let weights = DVector::from_column_slice(weights);
    (probabilities.transpose() * weights).iter().copied().collect()
}

/// Combine curves of several failure mechanisms into one curve on their
/// common load grid.
pub fn combine_fragility_curves(curves: &[FragilityCurve],
                                policy: &CombinationPolicy,
                                configuration: &Configuration) -> Result<FragilityCurve> {
    if curves.is_empty() {
        return Err(ToolboxError::numeric_domain("no fragility curves to combine"));
    }
    if let CombinationPolicy::WeightedSum(weights) = policy {
        validate_weights(weights, curves.len())?;
    }

    let grid = common_grid(curves, configuration.refine_step_size())?;
    let probabilities = stack_probabilities(curves, &grid)?;
    let combined = match policy {
        CombinationPolicy::Independent => combine_independent(&probabilities),
        CombinationPolicy::Dependent => combine_dependent(&probabilities),
        CombinationPolicy::WeightedSum(weights) => combine_weighted_sum(&probabilities, weights)
    };
    let combined: Vec<f64> = combined.into_iter()
        .map(|p| p.clamp(0.0, 1.0))
        .collect();
    debug!(curves = curves.len(), points = grid.len(), ?policy, "fragility curves combined");

    let lower_limit = curves.iter()
        .map(|c| c.lower_limit())
        .fold(f64::INFINITY, f64::min);
    FragilityCurve::new(grid, combined)?.with_lower_limit(lower_limit)
}

/// Combine named fragility curve tables into one output table.
///
/// For [`CombinationKind::WeightedSum`] the last input names a table with a
/// `weight` column holding one row per curve, in input order.
pub struct CombineFragilityCurves {
    kind: CombinationKind,
    configuration: Configuration,
    result: Option<FragilityCurve>
}

impl CombineFragilityCurves {
    pub fn new(kind: CombinationKind, configuration: Configuration) -> CombineFragilityCurves {
        CombineFragilityCurves { kind, configuration, result: None }
    }

    pub fn weights_schema() -> Schema {
        Schema::new().with(WEIGHT, ColumnType::Float64)
    }

    pub fn run<A>(&mut self, adapter: &mut A, inputs: &[&str], output: &str) -> Result<()>
        where A: DataAdapter + ?Sized {
        let (curve_names, policy) = match self.kind {
            CombinationKind::Independent => (inputs, CombinationPolicy::Independent),
            CombinationKind::Dependent => (inputs, CombinationPolicy::Dependent),
            CombinationKind::WeightedSum => {
                let (weights_name, curve_names) = inputs
                    .split_last()
                    .ok_or_else(|| ToolboxError::numeric_domain("weighted sum needs a weights input"))?;
                let weights = adapter
                    .input(weights_name, &CombineFragilityCurves::weights_schema())?
                    .float_column(WEIGHT)?;
                (curve_names, CombinationPolicy::WeightedSum(weights))
            }
        };

        let curves = curve_names.iter()
            .map(|name| FragilityCurve::load(&*adapter, name, &self.configuration))
            .collect::<Result<Vec<FragilityCurve>>>()?;
        let combined = combine_fragility_curves(&curves, &policy, &self.configuration)?;
        info!(output, kind = ?self.kind, points = combined.len(), "combined fragility curve written");
        adapter.output(output, combined.to_table()?)?;
        self.result = Some(combined);
        Ok(())
    }

    pub fn result(&self) -> Option<&FragilityCurve> {
        self.result.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memorydataadapter::MemoryDataAdapter;
    use crate::data::table::{
        Column,
        Table
    };

    fn flat(p: f64) -> FragilityCurve {
        FragilityCurve::new(vec![0.0, 10.0], vec![p, p]).unwrap()
    }

    #[test]
    fn test_independent_formula() {
        let combined = combine_fragility_curves(
            &[flat(0.5), flat(0.4)],
            &CombinationPolicy::Independent,
            &Configuration::default()
        ).unwrap();
        for p in combined.failure_probability() {
            assert!((p - 0.7).abs() < 1e-12);
        }
    }

    #[test]
    fn test_independent_keeps_tiny_probabilities() {
        let configuration = Configuration::default();
        let curves = [flat(1e-17), flat(1e-17)];
        let independent = combine_fragility_curves(&curves, &CombinationPolicy::Independent, &configuration).unwrap();
        let dependent = combine_fragility_curves(&curves, &CombinationPolicy::Dependent, &configuration).unwrap();
        for (i, d) in independent.failure_probability().iter().zip(dependent.failure_probability()) {
            assert!((i / 2e-17 - 1.0).abs() < 1e-12);
            assert!(i >= d);
        }
    }

    #[test]
    fn test_dependent_takes_maximum() {
        let a = FragilityCurve::new(vec![0.0, 1.0, 2.0], vec![0.1, 0.2, 0.9]).unwrap();
        let b = FragilityCurve::new(vec![0.0, 2.0], vec![0.15, 0.5]).unwrap();
        let combined = combine_fragility_curves(&[a, b], &CombinationPolicy::Dependent, &Configuration::default())
            .unwrap();
        assert_eq!(combined.hydraulicload(), &[0.0, 1.0, 2.0]);
        let p = combined.failure_probability();
        assert!((p[0] - 0.15).abs() < 1e-12);
        // b 在 1.0 處以對數內插：sqrt(0.15 * 0.5)
        assert!((p[1] - (0.15f64 * 0.5).sqrt()).abs() < 1e-12);
        assert!((p[2] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_sum() {
        let combined = combine_fragility_curves(
            &[flat(0.2), flat(0.6)],
            &CombinationPolicy::WeightedSum(vec![0.25, 0.75]),
            &Configuration::default()
        ).unwrap();
        for p in combined.failure_probability() {
            assert!((p - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let result = combine_fragility_curves(
            &[flat(0.2), flat(0.6)],
            &CombinationPolicy::WeightedSum(vec![0.5, 0.6]),
            &Configuration::default()
        );
        assert!(matches!(result, Err(ToolboxError::NumericDomain(_))));
        assert!(validate_weights(&[1.0], 2).is_err());
        assert!(validate_weights(&[1.5, -0.5], 2).is_err());
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let result = combine_fragility_curves(&[], &CombinationPolicy::Dependent, &Configuration::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_steps_survive_combination() {
        let stepped = FragilityCurve::new(vec![1.0, 2.0, 2.0, 3.0], vec![0.0, 0.1, 0.3, 0.3]).unwrap();
        let smooth = FragilityCurve::new(vec![1.0, 3.0], vec![0.0, 0.0]).unwrap();
        let combined = combine_fragility_curves(
            &[stepped, smooth],
            &CombinationPolicy::Independent,
            &Configuration::default()
        ).unwrap();
        assert_eq!(combined.hydraulicload(), &[1.0, 2.0, 2.0, 3.0]);
        let p = combined.failure_probability();
        assert!((p[1] - 0.1).abs() < 1e-12);
        assert!((p[2] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_refine_step_size_densifies_grid() {
        let configuration = Configuration::default().with_refine_step_size(Some(0.5));
        let combined = combine_fragility_curves(&[flat(0.1)], &CombinationPolicy::Dependent, &configuration)
            .unwrap();
        assert_eq!(combined.len(), 21);
    }

    #[test]
    fn test_run_weighted_sum_through_adapter() {
        let curve_table = |p: f64| Table::new()
            .with_column("hydraulicload", Column::Float64(vec![0.0, 1.0]))
            .unwrap()
            .with_column("failure_probability", Column::Float64(vec![p, p]))
            .unwrap();
        let weights = Table::new()
            .with_column(WEIGHT, Column::Float64(vec![0.5, 0.5]))
            .unwrap();
        let mut adapter = MemoryDataAdapter::new()
            .with_table("piping", curve_table(0.2))
            .with_table("overtopping", curve_table(0.4))
            .with_table("weights", weights);

        let mut operation = CombineFragilityCurves::new(CombinationKind::WeightedSum, Configuration::default());
        operation.run(&mut adapter, &["piping", "overtopping", "weights"], "combined").unwrap();

        let output = adapter.read("combined").unwrap();
        for p in output.float_column("failure_probability").unwrap() {
            assert!((p - 0.3).abs() < 1e-12);
        }
        assert!(operation.result().is_some());
    }

    #[test]
    fn test_run_reports_missing_table() {
        let mut adapter = MemoryDataAdapter::new();
        let mut operation = CombineFragilityCurves::new(CombinationKind::Independent, Configuration::default());
        let result = operation.run(&mut adapter, &["missing"], "combined");
        assert!(matches!(result, Err(ToolboxError::TableNotFound(_))));
        assert!(!adapter.contains("combined"));
    }
}
