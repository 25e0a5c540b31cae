use serde::{
    Deserialize,
    Serialize
};

use crate::error::toolboxerror::{
    Result,
    ToolboxError
};
use crate::math::normaldistribution::{
    beta_from_probability,
    probability_from_beta
};

// ─────────────────────────────────────────────────────────────────────────────
// 1D interpolation
// ─────────────────────────────────────────────────────────────────────────────
//
// 所有變體共用同一個線性核心，差別只在進入核心前後的座標轉換：
//
//   Linear        : (x, f)
//   Log           : (x, ln max(f, ll))                → exp
//   LogComplement : (x, ln max(1 - f, ll))            → 1 - exp
//   LogX          : (ln x, ln max(f, ll))             → exp，x 必須為正
//   Beta          : (x, -Φ⁻¹(clamp(f, ll, 1 - ε)))    → Φ(-β)
//
// 重複的 xp（階梯）採右連續：查詢點恰好落在階梯上時取較後面的 fp，
// 查詢點在階梯左側時朝較前面的 fp 內插。範圍外採平坦外插。

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationMethod {
    Linear,
    #[default]
    Log,
    LogComplement,
    LogX,
    Beta,
}

impl InterpolationMethod {
    pub fn interpolate(&self,
                       x: &[f64],
                       xp: &[f64],
                       fp: &[f64],
                       lower_limit: f64,
                       clip01: bool) -> Result<Vec<f64>> {
        match self {
            InterpolationMethod::Linear => {
                let f = interpolate_1d(x, xp, fp)?;
                Ok(if clip01 { clip_unit(f) } else { f })
            },
            InterpolationMethod::Log => log_interpolate_1d(x, xp, fp, lower_limit, clip01),
            InterpolationMethod::LogComplement => {
                log_complement_interpolate_1d(x, xp, fp, lower_limit, clip01)
            },
            InterpolationMethod::LogX => log_x_interpolate_1d(x, xp, fp, lower_limit, clip01),
            InterpolationMethod::Beta => beta_x_interpolate_1d(x, xp, fp, lower_limit)
        }
    }
}

pub fn validate_samples(xp: &[f64], fp: &[f64]) -> Result<()> {
    if xp.len() != fp.len() {
        return Err(ToolboxError::numeric_domain(format!(
            "sample lengths differ: {} abscissas, {} ordinates", xp.len(), fp.len()
        )));
    }
    if xp.len() < 2 {
        return Err(ToolboxError::numeric_domain(format!(
            "at least 2 sample points are required, got {}", xp.len()
        )));
    }
    if xp.iter().chain(fp.iter()).any(|v| !v.is_finite()) {
        return Err(ToolboxError::numeric_domain("sample points must be finite"));
    }
    if let Some(i) = xp.windows(2).position(|w| w[1] < w[0]) {
        return Err(ToolboxError::numeric_domain(format!(
            "abscissas must be non-decreasing: {} follows {} at index {}", xp[i + 1], xp[i], i + 1
        )));
    }
    Ok(())
}

fn validate_lower_limit(lower_limit: f64) -> Result<()> {
    if lower_limit > 0.0 && lower_limit < 1.0 {
        Ok(())
    } else {
        Err(ToolboxError::numeric_domain(format!(
            "lower limit must lie strictly between 0 and 1, got {}", lower_limit
        )))
    }
}

/// Interpolate a single point on already validated samples.
fn interpolate_one(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len();
    if x.is_nan() {
        return f64::NAN;
    }
    if x < xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }

    // 第一個 xp > x 的位置；階梯上會跳到最後一個重複點之後
    let hi = xp.partition_point(|&v| v <= x);
    let lo = hi - 1;
    if xp[lo] == x {
        return fp[lo];
    }
    let t = (x - xp[lo]) / (xp[hi] - xp[lo]);
    f64::mul_add(t, fp[hi] - fp[lo], fp[lo])
}

fn interpolate_unchecked(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    x.iter()
        .map(|&xi| interpolate_one(xi, xp, fp))
        .collect()
}

fn clip_unit(f: Vec<f64>) -> Vec<f64> {
    f.into_iter()
        .map(|v| v.clamp(0.0, 1.0))
        .collect()
}

fn floored_ln(values: &[f64], lower_limit: f64) -> Vec<f64> {
    values.iter()
        .map(|&v| v.max(lower_limit).ln())
        .collect()
}

/// Linear interpolation with flat extrapolation.
pub fn interpolate_1d(x: &[f64], xp: &[f64], fp: &[f64]) -> Result<Vec<f64>> {
    validate_samples(xp, fp)?;
    Ok(interpolate_unchecked(x, xp, fp))
}

/// Linear interpolation of `ln f`, with `f` floored at `lower_limit`.
pub fn log_interpolate_1d(x: &[f64],
                          xp: &[f64],
                          fp: &[f64],
                          lower_limit: f64,
                          clip01: bool) -> Result<Vec<f64>> {
    validate_samples(xp, fp)?;
    validate_lower_limit(lower_limit)?;
    let log_fp = floored_ln(fp, lower_limit);
    let f: Vec<f64> = interpolate_unchecked(x, xp, &log_fp)
        .into_iter()
        .map(f64::exp)
        .collect();
    Ok(if clip01 { clip_unit(f) } else { f })
}

/// Linear interpolation of `ln(1 - f)`; suited to probabilities close to one.
pub fn log_complement_interpolate_1d(x: &[f64],
                                     xp: &[f64],
                                     fp: &[f64],
                                     lower_limit: f64,
                                     clip01: bool) -> Result<Vec<f64>> {
    validate_samples(xp, fp)?;
    validate_lower_limit(lower_limit)?;
    let log_complement: Vec<f64> = fp.iter()
        .map(|&v| (1.0 - v).max(lower_limit).ln())
        .collect();
    let f: Vec<f64> = interpolate_unchecked(x, xp, &log_complement)
        .into_iter()
        .map(|v| -f64::exp_m1(v))
        .collect();
    Ok(if clip01 { clip_unit(f) } else { f })
}

/// Log-log interpolation: `ln f` linear in `ln x`. Loads must be strictly
/// positive; loads below a datum have no logarithm.
pub fn log_x_interpolate_1d(x: &[f64],
                            xp: &[f64],
                            fp: &[f64],
                            lower_limit: f64,
                            clip01: bool) -> Result<Vec<f64>> {
    validate_samples(xp, fp)?;
    validate_lower_limit(lower_limit)?;
    if let Some(v) = xp.iter().chain(x.iter()).find(|&&v| v <= 0.0) {
        return Err(ToolboxError::numeric_domain(format!(
            "log-log interpolation needs positive loads, got {}", v
        )));
    }
    let log_xp: Vec<f64> = xp.iter().map(|v| v.ln()).collect();
    let log_x: Vec<f64> = x.iter().map(|v| v.ln()).collect();
    let log_fp = floored_ln(fp, lower_limit);
    let f: Vec<f64> = interpolate_unchecked(&log_x, &log_xp, &log_fp)
        .into_iter()
        .map(f64::exp)
        .collect();
    Ok(if clip01 { clip_unit(f) } else { f })
}

/// Interpolation of the reliability index β = −Φ⁻¹(f). Results always lie in
/// [0, 1].
pub fn beta_x_interpolate_1d(x: &[f64],
                             xp: &[f64],
                             fp: &[f64],
                             lower_limit: f64) -> Result<Vec<f64>> {
    validate_samples(xp, fp)?;
    validate_lower_limit(lower_limit)?;
    let upper_limit = 1.0 - f64::EPSILON;
    let beta: Vec<f64> = fp.iter()
        .map(|&v| beta_from_probability(v.clamp(lower_limit, upper_limit)))
        .collect();
    Ok(interpolate_unchecked(x, xp, &beta)
        .into_iter()
        .map(|b| probability_from_beta(b).clamp(0.0, 1.0))
        .collect())
}
