// ─────────────────────────────────────────────────────────────────────────────
// Standard normal distribution
// ─────────────────────────────────────────────────────────────────────────────
//
// erfc 使用 Chebyshev 擬合（Numerical Recipes erfcc），全域相對誤差 < 1.2e-7，
// 尾端同樣保持相對精度，適合 1e-200 等級的失效機率。
//
// ppf 使用 Acklam 有理逼近，相對誤差約 1.15e-9：
//   p < P_LOW            : 下尾，q = sqrt(-2 ln p)
//   P_LOW <= p <= P_HIGH : 中央區，r = (p - 0.5)^2
//   p > P_HIGH           : 上尾，以對稱性處理

const P_LOW: f64 = 0.02425;
const P_HIGH: f64 = 1.0 - P_LOW;

const A: [f64; 6] = [
    -3.969683028665376e+01,
     2.209460984245205e+02,
    -2.759285104469687e+02,
     1.383577518672690e+02,
    -3.066479806614716e+01,
     2.506628277459239e+00,
];

const B: [f64; 5] = [
    -5.447609879822406e+01,
     1.615858368580409e+02,
    -1.556989798598866e+02,
     6.680131188771972e+01,
    -1.328068155288572e+01,
];

const C: [f64; 6] = [
    -7.784894002430293e-03,
    -3.223964580411365e-01,
    -2.400758277161838e+00,
    -2.549732539343734e+00,
     4.374664141464968e+00,
     2.938163982698783e+00,
];

const D: [f64; 4] = [
    7.784695709041462e-03,
    3.224671290700398e-01,
    2.445134137142996e+00,
    3.754408661907416e+00,
];

const ERFC_COEFS: [f64; 10] = [
    -1.26551223,
     1.00002368,
     0.37409196,
     0.09678418,
    -0.18628806,
     0.27886807,
    -1.13520398,
     1.48851587,
    -0.82215223,
     0.17087277,
];

fn horner(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().fold(0.0, |acc, &c| f64::mul_add(acc, x, c))
}

/// Complementary error function.
pub fn erfc(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    // ERFC_COEFS 由低次到高次排列，Horner 需反向
    let poly = ERFC_COEFS
        .iter()
        .rev()
        .fold(0.0, |acc, &c| f64::mul_add(acc, t, c));
    let ans = t * (-z * z + poly).exp();
    if x >= 0.0 { ans } else { 2.0 - ans }
}

/// Φ(x)
pub fn cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// 1 − Φ(x), without cancellation in the upper tail.
pub fn survival(x: f64) -> f64 {
    0.5 * erfc(x / std::f64::consts::SQRT_2)
}

/// Φ⁻¹(p). Returns `-inf` at 0, `+inf` at 1 and NaN outside [0, 1].
pub fn ppf(p: f64) -> f64 {
    if p.is_nan() || p < 0.0 || p > 1.0 {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        horner(&C, q) / f64::mul_add(horner(&D, q), q, 1.0)
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        horner(&A, r) * q / f64::mul_add(horner(&B, r), r, 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -horner(&C, q) / f64::mul_add(horner(&D, q), q, 1.0)
    }
}

/// Reliability index β = −Φ⁻¹(p).
pub fn beta_from_probability(p: f64) -> f64 {
    -ppf(p)
}

/// Failure probability Φ(−β) for a reliability index β.
pub fn probability_from_beta(beta: f64) -> f64 {
    survival(beta)
}
