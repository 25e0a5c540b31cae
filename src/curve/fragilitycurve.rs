use tracing::{
    debug,
    warn
};

use crate::configuration::Configuration;
use crate::curve::curve::{
    DEFAULT_LOWER_LIMIT,
    HYDRAULICLOAD,
    LoadCurve,
    refine_values,
    validate_curve,
    validate_lower_limit
};
use crate::curve::loadgrid::{
    Step,
    find_steps,
    insert_steps,
    validate_grid
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
use crate::error::toolboxerror::Result;
use crate::math::interpolation::InterpolationMethod;

pub const FAILURE_PROBABILITY: &str = "failure_probability";

/// Failure probability of a dike section as a function of hydraulic load.
///
/// Loads are non-decreasing. Two consecutive points with the same load form a
/// step: the probability jumps from the first to the second value at that
/// load.
#[derive(Debug, Clone, PartialEq)]
pub struct FragilityCurve {
    hydraulicload: Vec<f64>,
    failure_probability: Vec<f64>,
    lower_limit: f64,
    interpolation: InterpolationMethod
}

impl FragilityCurve {
    pub fn new(hydraulicload: Vec<f64>, failure_probability: Vec<f64>) -> Result<FragilityCurve> {
        validate_curve(&hydraulicload, &failure_probability, DEFAULT_LOWER_LIMIT)?;
        Ok(FragilityCurve {
            hydraulicload,
            failure_probability,
            lower_limit: DEFAULT_LOWER_LIMIT,
            interpolation: InterpolationMethod::Log
        })
    }

    pub fn with_lower_limit(mut self, lower_limit: f64) -> Result<FragilityCurve> {
        validate_lower_limit(lower_limit)?;
        self.lower_limit = lower_limit;
        Ok(self)
    }

    pub fn with_interpolation(mut self, interpolation: InterpolationMethod) -> FragilityCurve {
        self.interpolation = interpolation;
        self
    }

    pub fn schema() -> Schema {
        Schema::new()
            .with(HYDRAULICLOAD, ColumnType::Float64)
            .with(FAILURE_PROBABILITY, ColumnType::Float64)
    }

    /// Build a curve from table rows (any order); rows are sorted by load,
    /// keeping the input order among equal loads.
    pub fn from_table(table: &Table, configuration: &Configuration) -> Result<FragilityCurve> {
        let loads = table.float_column(HYDRAULICLOAD)?;
        let probabilities = table.float_column(FAILURE_PROBABILITY)?;
        let mut order: Vec<usize> = (0..loads.len()).collect();
        order.sort_by(|&a, &b| loads[a].total_cmp(&loads[b]));

        let mut curve = FragilityCurve::new(
            order.iter().map(|&i| loads[i]).collect(),
            order.iter().map(|&i| probabilities[i]).collect()
        )?
        .with_lower_limit(configuration.lower_limit())?
        .with_interpolation(configuration.fragility_interpolation());

        if configuration.enforce_monotonic() {
            curve.enforce_monotonic_curve();
        }
        Ok(curve)
    }

    /// Read the named table through `adapter`.
    pub fn load<A>(adapter: &A, curve_name: &str, configuration: &Configuration) -> Result<FragilityCurve>
        where A: DataAdapter + ?Sized {
        let table = adapter.input(curve_name, &FragilityCurve::schema())?;
        let curve = FragilityCurve::from_table(&table, configuration)?;
        debug!(curve_name, points = curve.len(), "fragility curve loaded");
        Ok(curve)
    }

    pub fn to_table(&self) -> Result<Table> {
        Table::new()
            .with_column(HYDRAULICLOAD, Column::Float64(self.hydraulicload.clone()))?
            .with_column(FAILURE_PROBABILITY, Column::Float64(self.failure_probability.clone()))
    }

    pub fn failure_probability(&self) -> &[f64] {
        &self.failure_probability
    }

    pub fn interpolation(&self) -> InterpolationMethod {
        self.interpolation
    }

    /// First index of every step.
    pub fn find_jump_indices(&self) -> Vec<usize> {
        find_steps(&self.hydraulicload)
            .iter()
            .map(|step| step.first)
            .collect()
    }

    pub fn steps(&self) -> Vec<Step> {
        find_steps(&self.hydraulicload)
    }

    /// Resample the curve onto `new_hydraulicload`.
    ///
    /// With `add_steps`, every step of the current curve lying strictly inside
    /// the new load range is kept as a pair of points at the step load (value
    /// before the jump, then after). Without it, a step only survives where a
    /// new load coincides with it.
    pub fn refine(&mut self, new_hydraulicload: &[f64], add_steps: bool) -> Result<()> {
        validate_grid(new_hydraulicload)?;
        let grid = if add_steps {
            insert_steps(new_hydraulicload, &self.steps())
        } else {
            new_hydraulicload.to_vec()
        };
        let failure_probability = refine_values(
            self.interpolation,
            &grid,
            &self.hydraulicload,
            &self.failure_probability,
            self.lower_limit,
            true
        )?;
        debug!(from = self.len(), to = grid.len(), add_steps, "fragility curve refined");
        self.hydraulicload = grid;
        self.failure_probability = failure_probability;
        Ok(())
    }

    /// Refined copy, leaving `self` untouched.
    pub fn refined(&self, new_hydraulicload: &[f64], add_steps: bool) -> Result<FragilityCurve> {
        let mut curve = self.clone();
        curve.refine(new_hydraulicload, add_steps)?;
        Ok(curve)
    }

    /// Whether the probability never drops between consecutive points with
    /// increasing load. Drops at a step are exempt.
    pub fn check_monotonic_curve(&self) -> bool {
        self.hydraulicload
            .windows(2)
            .zip(self.failure_probability.windows(2))
            .all(|(x, p)| x[0] == x[1] || p[0] <= p[1])
    }

    /// Make the curve non-decreasing in load with a running maximum.
    ///
    /// Points sharing a load are first ordered by probability. A point with
    /// the same load as its predecessor keeps its value; every other point is
    /// raised to the largest probability seen so far. Returns whether any
    /// value changed.
    pub fn enforce_monotonic_curve(&mut self) -> bool {
        let original = self.failure_probability.clone();

        for step in find_steps(&self.hydraulicload) {
            self.failure_probability[step.first..=step.last].sort_by(f64::total_cmp);
        }

        let mut running_max = f64::NEG_INFINITY;
        for i in 0..self.len() {
            let on_step = i > 0 && self.hydraulicload[i] == self.hydraulicload[i - 1];
            if !on_step {
                self.failure_probability[i] = self.failure_probability[i].max(running_max);
            }
            running_max = running_max.max(self.failure_probability[i]);
        }

        let changed = self.failure_probability != original;
        if changed {
            let raised = self.failure_probability
                .iter()
                .zip(&original)
                .filter(|(a, b)| a != b)
                .count();
            warn!(raised, "fragility curve was not monotonic, values adjusted");
        }
        changed
    }

    /// Move the curve along the load axis, e.g. for a measure that raises the
    /// crest.
    pub fn shift(&mut self, effect: f64) {
        for x in &mut self.hydraulicload {
            *x += effect;
        }
    }

    pub fn failure_probability_at(&self, hydraulicload: f64) -> Result<f64> {
        self.value(hydraulicload)
    }
}

impl LoadCurve for FragilityCurve {
    fn hydraulicload(&self) -> &[f64] {
        &self.hydraulicload
    }

    fn probability(&self) -> &[f64] {
        &self.failure_probability
    }

    fn lower_limit(&self) -> f64 {
        self.lower_limit
    }

    fn value(&self, hydraulicload: f64) -> Result<f64> {
        let values = self.interpolation
            .interpolate(&[hydraulicload], &self.hydraulicload, &self.failure_probability, self.lower_limit, true)?;
        Ok(values[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memorydataadapter::MemoryDataAdapter;
    use crate::error::toolboxerror::ToolboxError;

    fn step_curve() -> FragilityCurve {
        FragilityCurve::new(vec![1.0, 2.0, 2.0, 3.0], vec![0.0, 1e-8, 1e-6, 1e-6]).unwrap()
    }

    fn assert_relative(actual: f64, expected: f64) {
        assert!(
            ((actual - expected) / expected).abs() < 1e-9,
            "actual {} expected {}", actual, expected
        );
    }

    #[test]
    fn test_empty_and_single_point_curves_are_rejected() {
        assert!(matches!(FragilityCurve::new(vec![], vec![]), Err(ToolboxError::NumericDomain(_))));
        assert!(FragilityCurve::new(vec![1.0], vec![0.1]).is_err());
        assert!(FragilityCurve::new(vec![1.0, 2.0], vec![0.1]).is_err());
        assert!(FragilityCurve::new(vec![2.0, 1.0], vec![0.1, 0.2]).is_err());
    }

    #[test]
    fn test_lower_limit_must_be_small_and_positive() {
        let curve = FragilityCurve::new(vec![1.0, 2.0], vec![0.1, 0.2]).unwrap();
        assert!(curve.clone().with_lower_limit(0.0).is_err());
        assert!(curve.clone().with_lower_limit(0.01).is_err());
        assert_eq!(curve.with_lower_limit(1e-100).unwrap().lower_limit(), 1e-100);
    }

    #[test]
    fn test_refine_with_steps_keeps_both_sides_of_jump() {
        let mut curve = step_curve();
        curve.refine(&[1.0, 1.5, 2.5, 3.0], true).unwrap();
        assert_eq!(curve.hydraulicload(), &[1.0, 1.5, 2.0, 2.0, 2.5, 3.0]);
        let p = curve.failure_probability();
        assert_eq!(p[2], 1e-8);
        assert_eq!(p[3], 1e-6);
        assert_relative(p[1], 1e-104);
        assert_relative(p[4], 1e-6);
    }

    #[test]
    fn test_refine_without_steps_smooths_jump() {
        let mut curve = step_curve();
        curve.refine(&[1.0, 1.5, 2.5, 3.0], false).unwrap();
        assert_eq!(curve.hydraulicload(), &[1.0, 1.5, 2.5, 3.0]);
        assert!(curve.steps().is_empty());
    }

    #[test]
    fn test_refine_without_steps_on_step_load_takes_later_value() {
        let mut curve = step_curve();
        curve.refine(&[1.0, 2.0, 3.0], false).unwrap();
        assert_relative(curve.failure_probability()[1], 1e-6);
    }

    #[test]
    fn test_step_at_range_boundary_is_not_inserted() {
        let mut curve = step_curve();
        curve.refine(&[2.0, 2.5, 3.0], true).unwrap();
        assert_eq!(curve.hydraulicload(), &[2.0, 2.5, 3.0]);
        assert_relative(curve.failure_probability()[0], 1e-6);
    }

    #[test]
    fn test_refine_onto_own_grid_is_idempotent() {
        let mut curve = FragilityCurve::new(
            vec![4.0, 4.5, 5.0, 5.0, 6.0],
            vec![1e-12, 3e-9, 1e-6, 4e-4, 0.9]
        ).unwrap();
        let grid = curve.hydraulicload().to_vec();
        let expected = curve.failure_probability().to_vec();
        curve.refine(&grid, false).unwrap();
        for (a, e) in curve.failure_probability().iter().zip(&expected) {
            assert_relative(*a, *e);
        }
    }

    #[test]
    fn test_refine_rejects_bad_grids() {
        let mut curve = step_curve();
        assert!(curve.refine(&[], true).is_err());
        assert!(curve.refine(&[2.0, 1.0], true).is_err());
        assert_eq!(curve, step_curve());
    }

    #[test]
    fn test_check_monotonic_curve() {
        assert!(step_curve().check_monotonic_curve());
        let curve = FragilityCurve::new(vec![1.0, 2.0, 3.0], vec![0.1, 0.05, 0.2]).unwrap();
        assert!(!curve.check_monotonic_curve());
        // 階梯上的下降不算違反
        let curve = FragilityCurve::new(vec![1.0, 2.0, 2.0, 3.0], vec![0.1, 0.3, 0.2, 0.4]).unwrap();
        assert!(curve.check_monotonic_curve());
    }

    #[test]
    fn test_enforce_monotonic_running_maximum() {
        let mut curve = FragilityCurve::new(
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
            vec![0.1, 0.3, 0.2, 0.25, 0.5]
        ).unwrap();
        assert!(curve.enforce_monotonic_curve());
        assert_eq!(curve.failure_probability(), &[0.1, 0.3, 0.3, 0.3, 0.5]);
        assert!(curve.check_monotonic_curve());
        assert!(!curve.enforce_monotonic_curve());
    }

    #[test]
    fn test_enforce_monotonic_orders_ties_and_keeps_both_values() {
        let mut curve = FragilityCurve::new(
            vec![1.0, 2.0, 2.0, 3.0],
            vec![0.1, 0.4, 0.2, 0.3]
        ).unwrap();
        curve.enforce_monotonic_curve();
        assert_eq!(curve.failure_probability(), &[0.1, 0.2, 0.4, 0.4]);
    }

    #[test]
    fn test_enforce_monotonic_does_not_ratchet_across_step() {
        let mut curve = FragilityCurve::new(
            vec![1.0, 2.0, 3.0, 3.0, 4.0],
            vec![0.1, 0.5, 0.2, 0.3, 0.6]
        ).unwrap();
        curve.enforce_monotonic_curve();
        assert_eq!(curve.failure_probability(), &[0.1, 0.5, 0.5, 0.3, 0.6]);
        assert!(curve.check_monotonic_curve());
    }

    #[test]
    fn test_shift_moves_loads() {
        let mut curve = step_curve();
        curve.shift(0.5);
        assert_eq!(curve.hydraulicload(), &[1.5, 2.5, 2.5, 3.5]);
        assert_eq!(curve.failure_probability(), step_curve().failure_probability());
    }

    #[test]
    fn test_find_jump_indices() {
        assert_eq!(step_curve().find_jump_indices(), vec![1]);
    }

    #[test]
    fn test_failure_probability_at() {
        let curve = step_curve();
        assert_relative(curve.failure_probability_at(2.0).unwrap(), 1e-6);
        assert_relative(curve.failure_probability_at(5.0).unwrap(), 1e-6);
        assert_relative(curve.failure_probability_at(1.5).unwrap(), 1e-104);
    }

    #[test]
    fn test_failure_probability_at_reports_interpolation_errors() {
        let curve = FragilityCurve::new(vec![-1.0, 2.0], vec![1e-4, 1e-2])
            .unwrap()
            .with_interpolation(InterpolationMethod::LogX);
        assert!(matches!(curve.failure_probability_at(1.0), Err(ToolboxError::NumericDomain(_))));
    }

    #[test]
    fn test_load_sorts_and_enforces() {
        let table = Table::new()
            .with_column(HYDRAULICLOAD, Column::Float64(vec![3.0, 1.0, 2.0]))
            .unwrap()
            .with_column(FAILURE_PROBABILITY, Column::Float64(vec![0.2, 0.1, 0.3]))
            .unwrap();
        let adapter = MemoryDataAdapter::new().with_table("fc", table);

        let curve = FragilityCurve::load(&adapter, "fc", &Configuration::default()).unwrap();
        assert_eq!(curve.hydraulicload(), &[1.0, 2.0, 3.0]);
        assert_eq!(curve.failure_probability(), &[0.1, 0.3, 0.3]);

        let configuration = Configuration::default().with_enforce_monotonic(false);
        let curve = FragilityCurve::load(&adapter, "fc", &configuration).unwrap();
        assert_eq!(curve.failure_probability(), &[0.1, 0.3, 0.2]);
    }

    #[test]
    fn test_load_reports_missing_columns() {
        let table = Table::new()
            .with_column(HYDRAULICLOAD, Column::Float64(vec![1.0, 2.0]))
            .unwrap();
        let adapter = MemoryDataAdapter::new().with_table("fc", table);
        let result = FragilityCurve::load(&adapter, "fc", &Configuration::default());
        assert!(matches!(result, Err(ToolboxError::SchemaViolation { .. })));
    }

    #[test]
    fn test_table_and_array_exports() {
        let curve = step_curve();
        let table = curve.to_table().unwrap();
        assert_eq!(table.float_column(HYDRAULICLOAD).unwrap(), vec![1.0, 2.0, 2.0, 3.0]);
        assert_eq!(curve.as_array()[2], [2.0, 1e-6]);
        let back = FragilityCurve::from_table(&table, &Configuration::default()).unwrap();
        assert_eq!(back, curve);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn raw_curve() -> impl Strategy<Value = FragilityCurve> {
        prop::collection::vec((0i32..20, 0.0f64..1.0), 2..30).prop_map(|mut pairs| {
            // 整數載重讓重複值（階梯）經常出現
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            let (x, p): (Vec<f64>, Vec<f64>) = pairs
                .into_iter()
                .map(|(x, p)| (x as f64 * 0.25, p))
                .unzip();
            FragilityCurve::new(x, p).unwrap()
        })
    }

    proptest! {
        /// After enforcement probability never drops between increasing loads
        #[test]
        fn test_enforcement_postcondition(mut curve in raw_curve()) {
            curve.enforce_monotonic_curve();
            let x = curve.hydraulicload();
            let p = curve.failure_probability();
            for i in 0..(x.len() - 1) {
                if x[i] < x[i + 1] {
                    prop_assert!(p[i] <= p[i + 1], "p[{}]={} > p[{}]={}", i, p[i], i + 1, p[i + 1]);
                }
            }
            prop_assert!(curve.check_monotonic_curve());
        }

        /// Refining onto the existing grid reproduces the curve
        #[test]
        fn test_refine_idempotent(curve in raw_curve()) {
            let grid = curve.hydraulicload().to_vec();
            let refined = curve.refined(&grid, false).unwrap();
            for (a, e) in refined.failure_probability().iter().zip(curve.failure_probability()) {
                let tolerance = 1e-12 + 1e-9 * e.abs();
                prop_assert!((a - e).abs() <= tolerance, "{} vs {}", a, e);
            }
        }
    }
}
