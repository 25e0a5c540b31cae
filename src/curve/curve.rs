use nalgebra::DMatrix;

use crate::curve::loadgrid::{
    find_steps,
    validate_grid
};
use crate::error::toolboxerror::{
    Result,
    ToolboxError
};
use crate::math::interpolation::{
    InterpolationMethod,
    validate_samples
};

pub const HYDRAULICLOAD: &str = "hydraulicload";

/// Floor applied to probabilities before any logarithm or quantile transform.
pub const DEFAULT_LOWER_LIMIT: f64 = 1e-200;

/// Largest accepted floor; anything above would distort realistic
/// probabilities.
pub const MAX_LOWER_LIMIT: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    hydraulicload: f64,
    probability: f64
}

impl CurvePoint {
    pub fn new(hydraulicload: f64, probability: f64) -> CurvePoint {
        CurvePoint { hydraulicload, probability }
    }

    pub fn hydraulicload(&self) -> f64 {
        self.hydraulicload
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

/// A probability given as a function of hydraulic load, stored as points.
pub trait LoadCurve {
    fn hydraulicload(&self) -> &[f64];

    fn probability(&self) -> &[f64];

    fn lower_limit(&self) -> f64;

    /// Probability at a single load.
    fn value(&self, hydraulicload: f64) -> Result<f64>;

    fn len(&self) -> usize {
        self.hydraulicload().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn min_load(&self) -> f64 {
        self.hydraulicload()[0]
    }

    fn max_load(&self) -> f64 {
        self.hydraulicload()[self.len() - 1]
    }

    fn load_range(&self) -> (f64, f64) {
        (self.min_load(), self.max_load())
    }

    fn points(&self) -> Vec<CurvePoint> {
        self.hydraulicload()
            .iter()
            .zip(self.probability())
            .map(|(&x, &p)| CurvePoint::new(x, p))
            .collect()
    }

    /// `(load, probability)` pairs, one per point.
    fn as_array(&self) -> Vec<[f64; 2]> {
        self.hydraulicload()
            .iter()
            .zip(self.probability())
            .map(|(&x, &p)| [x, p])
            .collect()
    }

    /// n×2 matrix: loads in column 0, probabilities in column 1.
    fn as_matrix(&self) -> DMatrix<f64> {
        let n = self.len();
        DMatrix::from_fn(n, 2, |i, j| {
            if j == 0 { self.hydraulicload()[i] } else { self.probability()[i] }
        })
    }
}

pub fn validate_lower_limit(lower_limit: f64) -> Result<()> {
    if lower_limit > 0.0 && lower_limit <= MAX_LOWER_LIMIT {
        Ok(())
    } else {
        Err(ToolboxError::numeric_domain(format!(
            "lower limit must lie in (0, {}], got {}", MAX_LOWER_LIMIT, lower_limit
        )))
    }
}

/// Shared checks for any load/probability curve.
pub fn validate_curve(hydraulicload: &[f64], probability: &[f64], lower_limit: f64) -> Result<()> {
    if hydraulicload.is_empty() || probability.is_empty() {
        return Err(ToolboxError::numeric_domain("curve has no points"));
    }
    validate_samples(hydraulicload, probability)?;
    validate_lower_limit(lower_limit)?;
    if let Some(p) = probability.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(ToolboxError::numeric_domain(format!(
            "probability {} outside [0, 1]", p
        )));
    }
    Ok(())
}

/// Evaluate a curve on `grid` (non-decreasing).
///
/// A run of repeated grid loads that sits on a step of the source curve is
/// filled with the step's own values in order; the last repeated load always
/// gets the value after the jump. Every other point is interpolated with
/// `method`.
pub fn refine_values(method: InterpolationMethod,
                     grid: &[f64],
                     hydraulicload: &[f64],
                     probability: &[f64],
                     lower_limit: f64,
                     clip01: bool) -> Result<Vec<f64>> {
    validate_grid(grid)?;
    let mut values = method.interpolate(grid, hydraulicload, probability, lower_limit, clip01)?;
    let steps = find_steps(hydraulicload);
    if steps.is_empty() {
        return Ok(values);
    }

    let mut i = 0;
    while i < grid.len() {
        let j = i + grid[i..].iter().take_while(|&&v| v == grid[i]).count();
        if j - i >= 2 {
            if let Some(step) = steps.iter().find(|s| s.hydraulicload == grid[i]) {
                let k = j - i;
                for (offset, value) in values[i..j].iter_mut().enumerate() {
                    let source = if offset == k - 1 {
                        step.last
                    } else {
                        (step.first + offset).min(step.last)
                    };
                    *value = probability[source];
                }
            }
        }
        i = j;
    }
    Ok(values)
}
