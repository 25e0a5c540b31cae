use crate::error::toolboxerror::{
    Result,
    ToolboxError
};

/// Upper bound on the points of a uniform grid.
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// A run of equal loads in a curve: the jump goes from the probability at
/// `first` to the probability at `last`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub hydraulicload: f64,
    pub first: usize,
    pub last: usize
}

pub fn find_steps(hydraulicload: &[f64]) -> Vec<Step> {
    let mut steps = Vec::new();
    let mut i = 0;
    while i < hydraulicload.len() {
        let run = hydraulicload[i..]
            .iter()
            .take_while(|&&v| v == hydraulicload[i])
            .count();
        if run >= 2 {
            steps.push(Step {
                hydraulicload: hydraulicload[i],
                first: i,
                last: i + run - 1
            });
        }
        i += run;
    }
    steps
}

pub fn validate_grid(grid: &[f64]) -> Result<()> {
    if grid.is_empty() {
        return Err(ToolboxError::numeric_domain("load grid is empty"));
    }
    if grid.iter().any(|v| !v.is_finite()) {
        return Err(ToolboxError::numeric_domain("load grid contains non-finite values"));
    }
    if let Some(i) = grid.windows(2).position(|w| w[1] < w[0]) {
        return Err(ToolboxError::numeric_domain(format!(
            "load grid must be non-decreasing: {} follows {} at index {}", grid[i + 1], grid[i], i + 1
        )));
    }
    Ok(())
}

/// Make sure every step load strictly inside the grid range appears at least
/// twice, so both sides of the jump can be represented.
pub fn insert_steps(grid: &[f64], steps: &[Step]) -> Vec<f64> {
    let mut result = grid.to_vec();
    if result.is_empty() {
        return result;
    }
    let (lo, hi) = (result[0], result[result.len() - 1]);
    for step in steps {
        let x = step.hydraulicload;
        if x <= lo || x >= hi {
            continue;
        }
        let start = result.partition_point(|&v| v < x);
        let end = result.partition_point(|&v| v <= x);
        if end - start < 2 {
            result.splice(start..end, [x, x]);
        }
    }
    result
}

fn runs(grid: &[f64]) -> Vec<(f64, usize)> {
    let mut result: Vec<(f64, usize)> = Vec::new();
    for &x in grid {
        match result.last_mut() {
            Some((value, count)) if *value == x => *count += 1,
            _ => result.push((x, 1))
        }
    }
    result
}

/// Sorted union of several non-decreasing grids. A load repeated in any input
/// (a step) keeps its largest multiplicity.
pub fn union_grid(grids: &[&[f64]]) -> Vec<f64> {
    let mut all_runs: Vec<(f64, usize)> = grids.iter()
        .flat_map(|grid| runs(grid))
        .collect();
    all_runs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f64, usize)> = Vec::with_capacity(all_runs.len());
    for (x, count) in all_runs {
        match merged.last_mut() {
            Some((value, max_count)) if *value == x => *max_count = (*max_count).max(count),
            _ => merged.push((x, count))
        }
    }
    merged.into_iter()
        .flat_map(|(x, count)| std::iter::repeat_n(x, count))
        .collect()
}

/// `start, start + step, ...` up to and including `end`.
pub fn uniform_grid(start: f64, end: f64, step: f64) -> Result<Vec<f64>> {
    if !(step > 0.0) || !step.is_finite() {
        return Err(ToolboxError::numeric_domain(format!(
            "refine step size must be positive, got {}", step
        )));
    }
    if !start.is_finite() || !end.is_finite() || end < start {
        return Err(ToolboxError::numeric_domain(format!(
            "invalid grid range [{}, {}]", start, end
        )));
    }
    let intervals = ((end - start) / step).floor();
    if intervals >= MAX_GRID_POINTS as f64 {
        return Err(ToolboxError::numeric_domain(format!(
            "step {} over [{}, {}] needs more than {} points", step, start, end, MAX_GRID_POINTS
        )));
    }
    let n = intervals as usize;
    let mut grid: Vec<f64> = (0..=n)
        .map(|i| f64::mul_add(i as f64, step, start))
        .filter(|&x| x < end)
        .collect();
    grid.push(end);
    Ok(grid)
}

/// Part of `grid` inside `[lo, hi]`.
pub fn clamp_grid(grid: &[f64], lo: f64, hi: f64) -> Vec<f64> {
    grid.iter()
        .copied()
        .filter(|&x| x >= lo && x <= hi)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_steps() {
        let steps = find_steps(&[1.0, 2.0, 2.0, 3.0, 4.0, 4.0, 4.0]);
        assert_eq!(steps, vec![
            Step { hydraulicload: 2.0, first: 1, last: 2 },
            Step { hydraulicload: 4.0, first: 4, last: 6 },
        ]);
        assert!(find_steps(&[1.0, 2.0, 3.0]).is_empty());
    }

    #[test]
    fn test_insert_steps_only_inside_range() {
        let steps = find_steps(&[0.0, 2.0, 2.0, 5.0, 5.0]);
        let grid = insert_steps(&[1.0, 1.5, 2.0, 2.5, 5.0], &steps);
        assert_eq!(grid, vec![1.0, 1.5, 2.0, 2.0, 2.5, 5.0]);

        let grid = insert_steps(&[1.0, 3.0], &steps);
        assert_eq!(grid, vec![1.0, 2.0, 2.0, 3.0]);
    }

    #[test]
    fn test_union_grid_keeps_step_multiplicity() {
        let a = [1.0, 2.0, 2.0, 3.0];
        let b = [0.5, 2.0, 3.0, 3.5];
        assert_eq!(union_grid(&[&a, &b]), vec![0.5, 1.0, 2.0, 2.0, 3.0, 3.5]);
    }

    #[test]
    fn test_uniform_grid_includes_end() {
        let grid = uniform_grid(0.0, 1.0, 0.3).unwrap();
        assert_eq!(grid.len(), 5);
        assert_eq!(grid[4], 1.0);
        assert!((grid[3] - 0.9).abs() < 1e-12);

        let grid = uniform_grid(0.0, 1.0, 0.5).unwrap();
        assert_eq!(grid, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_uniform_grid_rejects_bad_step() {
        assert!(uniform_grid(0.0, 1.0, 0.0).is_err());
        assert!(uniform_grid(0.0, 1.0, -0.1).is_err());
        assert!(uniform_grid(1.0, 0.0, 0.1).is_err());
    }

    #[test]
    fn test_uniform_grid_rejects_excessive_point_count() {
        assert!(matches!(uniform_grid(0.0, 10.0, 1e-12), Err(ToolboxError::NumericDomain(_))));
        assert!(uniform_grid(0.0, 10.0, 1e-4).is_ok());
    }

    #[test]
    fn test_validate_grid() {
        assert!(validate_grid(&[]).is_err());
        assert!(validate_grid(&[1.0, 0.5]).is_err());
        assert!(validate_grid(&[0.5, 0.5, 1.0]).is_ok());
    }
}
