//! Shared numeric helpers: descriptive statistics, OLS, Pearson
//! correlation, sigmoid/logit, percentile. Every analytics module routes
//! through here instead of re-deriving the same formulas, matching the
//! host project's preference for small standalone math helper modules
//! (`vault::belief_vol::{sigmoid, logit}`, `risk::VaRCalculator`).

use statrs::statistics::Statistics;

/// Logistic function, mapping log-odds to a probability in (0, 1).
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Inverse of [`sigmoid`]. Input clamped to avoid infinities at the bounds.
#[inline]
pub fn logit(p: f64) -> f64 {
    let p = p.clamp(1e-4, 1.0 - 1e-4);
    (p / (1.0 - p)).ln()
}

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().copied().mean()
    }
}

pub fn stddev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        0.0
    } else {
        xs.iter().copied().std_dev()
    }
}

/// Z-score of `x` against the sample `history`. Returns `None` when there
/// isn't enough history or the history has zero spread (callers fall back
/// to the raw value per the shock-score spec).
pub fn z_score(x: f64, history: &[f64]) -> Option<f64> {
    if history.len() < 2 {
        return None;
    }
    let sd = stddev(history);
    if sd <= 0.0 {
        return None;
    }
    Some((x - mean(history)) / sd)
}

/// Percentile (linear interpolation disabled — nearest-rank) of a slice.
/// `q` in `[0, 1]`. Input need not be pre-sorted.
pub fn percentile(xs: &[f64], q: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = xs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q = q.clamp(0.0, 1.0);
    let idx = ((q * sorted.len() as f64) as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// Pearson correlation coefficient between two equal-length series.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return 0.0;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx <= 0.0 || vy <= 0.0 {
        return 0.0;
    }
    cov / (vx.sqrt() * vy.sqrt())
}

/// Result of a simple ordinary-least-squares regression of `y` on `x`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OlsResult {
    pub beta: f64,
    pub alpha: f64,
    pub r_squared: f64,
}

/// OLS of `ys` on `xs` (single predictor, with intercept): `y = alpha + beta*x`.
pub fn ols(xs: &[f64], ys: &[f64]) -> OlsResult {
    if xs.len() != ys.len() || xs.len() < 2 {
        return OlsResult::default();
    }
    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        cov += (x - mx) * (y - my);
        var_x += (x - mx) * (x - mx);
    }
    if var_x <= 0.0 {
        return OlsResult::default();
    }
    let beta = cov / var_x;
    let alpha = my - beta * mx;
    let rho = pearson(xs, ys);
    OlsResult {
        beta,
        alpha,
        r_squared: rho * rho,
    }
}

/// Covariance-over-variance hedge beta, same as `ols(xs, ys).beta` but
/// named separately since several modules (hedge ratio, microstructure
/// convergence speed) call it without needing the intercept/R².
pub fn beta(xs: &[f64], ys: &[f64]) -> f64 {
    ols(xs, ys).beta
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sigmoid_logit_are_inverses() {
        for p in [0.01, 0.25, 0.5, 0.75, 0.99] {
            let x = logit(p);
            assert_relative_eq!(sigmoid(x), p, epsilon = 1e-6);
        }
    }

    #[test]
    fn perfect_linear_relationship_has_r_squared_one() {
        let xs = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();
        let fit = ols(&xs, &ys);
        assert_relative_eq!(fit.beta, 2.0, epsilon = 1e-9);
        assert_relative_eq!(fit.alpha, 1.0, epsilon = 1e-9);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn z_score_none_without_enough_history() {
        assert_eq!(z_score(1.0, &[1.0]), None);
        assert_eq!(z_score(1.0, &[]), None);
    }

    #[test]
    fn percentile_bounds() {
        let xs = vec![5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(percentile(&xs, 0.0), 1.0);
        assert_eq!(percentile(&xs, 1.0), 5.0);
    }
}
