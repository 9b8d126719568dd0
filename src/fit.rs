/*
 * Robust fit of the two-term infiltration law
 *
 *     I(t) = C1·t + C2·√t
 *
 * to cumulative infiltration, with automatic exclusion of early samples
 * while the fitted C1 is negative.
 *
 * This program is free software; you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation; either version 2 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 */

#![allow(clippy::cast_precision_loss, clippy::many_single_char_names)]

use nalgebra::{Matrix2, Vector2};
use serde::Serialize;
use tracing::debug;

use crate::error::{InfiltrometerError, Result};

/// Relative determinant below which the normal equations are singular.
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Fitted coefficients of the infiltration law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitResult {
    /// Linear term [cm/s].
    pub c1: f64,
    /// Square-root term [cm/s^0.5].
    pub c2: f64,
    /// Parameter covariance, `[[var C1, cov], [cov, var C2]]`. Infinite when
    /// the fit has no residual degrees of freedom.
    pub covariance: [[f64; 2]; 2],
}

impl FitResult {
    /// Cumulative infiltration I(t) [cm] at `t` seconds.
    #[must_use]
    pub fn cumulative(&self, t: f64) -> f64 {
        self.c1 * t + self.c2 * t.sqrt()
    }

    /// Infiltration rate dI/dt [cm/s] at `t` seconds; undefined at `t <= 0`.
    #[must_use]
    pub fn rate(&self, t: f64) -> Option<f64> {
        (t > 0.0).then(|| self.c2 / (2.0 * t.sqrt()) + self.c1)
    }
}

/// Ordinary least squares of `y` on the design columns `[t, √t]`.
///
/// The model is linear in (C1, C2), so the normal equations give the
/// minimiser directly. The covariance is `s²·(JᵀJ)⁻¹` with
/// `s² = SSR / (m − 2)`.
///
/// # Errors
///
/// [`InfiltrometerError::Unfittable`] for non-finite input, fewer than two
/// samples, or a singular design (fewer than two distinct positive times).
pub fn least_squares(t: &[f64], y: &[f64]) -> Result<FitResult> {
    if t.len() != y.len() {
        return Err(InfiltrometerError::Unfittable(format!(
            "{} times for {} values",
            t.len(),
            y.len()
        )));
    }
    if t.len() < 2 {
        return Err(InfiltrometerError::Unfittable(format!(
            "need at least 2 samples, got {}",
            t.len()
        )));
    }
    if t.iter().chain(y).any(|v| !v.is_finite()) || t.iter().any(|v| *v < 0.0) {
        return Err(InfiltrometerError::Unfittable(
            "non-finite value or negative time".to_string(),
        ));
    }

    let mut jtj = Matrix2::<f64>::zeros();
    let mut jty = Vector2::<f64>::zeros();
    for (&ti, &yi) in t.iter().zip(y) {
        let row = Vector2::new(ti, ti.sqrt());
        jtj += row * row.transpose();
        jty += row * yi;
    }

    let scale = jtj[(0, 0)] * jtj[(1, 1)];
    if scale <= 0.0 || jtj.determinant().abs() <= SINGULAR_TOLERANCE * scale {
        return Err(InfiltrometerError::Unfittable(
            "singular normal equations".to_string(),
        ));
    }
    let inv = jtj.try_inverse().ok_or_else(|| {
        InfiltrometerError::Unfittable("singular normal equations".to_string())
    })?;
    let beta = inv * jty;
    let (c1, c2) = (beta[0], beta[1]);

    let ssr: f64 = t
        .iter()
        .zip(y)
        .map(|(&ti, &yi)| {
            let r = yi - (c1 * ti + c2 * ti.sqrt());
            r * r
        })
        .sum();
    let dof = t.len() - 2;
    let covariance = if dof == 0 {
        [[f64::INFINITY; 2]; 2]
    } else {
        let cov = inv * (ssr / dof as f64);
        [[cov[(0, 0)], cov[(0, 1)]], [cov[(1, 0)], cov[(1, 1)]]]
    };

    Ok(FitResult { c1, c2, covariance })
}

/// States of the exclusion loop. Each pass owns its mask.
#[derive(Debug, Clone)]
enum FitState {
    Fitting { mask: Vec<bool> },
    Rejected { mask: Vec<bool> },
    Accepted { mask: Vec<bool>, fit: FitResult },
    Exhausted,
}

/// An accepted fit with the samples that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobustFit {
    pub fit: FitResult,
    /// Final inclusion mask over the reading schedule.
    pub mask: Vec<bool>,
    /// Samples dropped before C1 became non-negative.
    pub exclusions: usize,
}

/// Cumulative infiltrated depth [cm] of the included samples, relative to
/// the first included reading.
fn infiltrated(
    times: &[f64],
    readings: &[f64],
    mask: &[bool],
    disk_area: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut included = times
        .iter()
        .zip(readings)
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|((t, v), _)| (*t, *v));
    let Some((t0, v0)) = included.next() else {
        return (Vec::new(), Vec::new());
    };
    std::iter::once((t0, v0))
        .chain(included)
        .map(|(t, v)| (t, (v0 - v) / disk_area))
        .unzip()
}

/// Drop the earliest included sample after the first one. `None` when that
/// would leave fewer than two samples.
fn shrink(mask: &[bool]) -> Option<Vec<bool>> {
    if mask.iter().filter(|m| **m).count() <= 2 {
        return None;
    }
    let first = mask.iter().position(|m| *m)?;
    let next = first + 1 + mask[first + 1..].iter().position(|m| *m)?;
    let mut shrunk = mask.to_vec();
    shrunk[next] = false;
    Some(shrunk)
}

/// Fit the infiltration law to a reading series, excluding early samples
/// while C1 is negative.
///
/// `times` are elapsed seconds, `readings` reservoir volumes [mL] and
/// `valid` the samples eligible for fitting. At most `max_exclusions`
/// samples are dropped.
///
/// # Errors
///
/// [`InfiltrometerError::Unfittable`] when the initial mask cannot be
/// solved and [`InfiltrometerError::NoAdmissibleFit`] when C1 is still
/// negative once no further sample can be dropped.
pub fn fit_robust(
    times: &[f64],
    readings: &[f64],
    valid: &[bool],
    disk_area: f64,
    max_exclusions: usize,
) -> Result<RobustFit> {
    let mut state = FitState::Fitting {
        mask: valid.to_vec(),
    };
    let mut exclusions = 0;

    loop {
        state = match state {
            FitState::Fitting { mask } => {
                let (t, y) = infiltrated(times, readings, &mask, disk_area);
                match least_squares(&t, &y) {
                    Ok(fit) if fit.c1 >= 0.0 => FitState::Accepted { mask, fit },
                    Ok(fit) => {
                        debug!(c1 = fit.c1, exclusions, "negative C1, excluding next sample");
                        FitState::Rejected { mask }
                    }
                    // Shrinking left too few distinct times to solve.
                    Err(_) if exclusions > 0 => FitState::Exhausted,
                    Err(e) => return Err(e),
                }
            }
            FitState::Rejected { mask } => {
                if exclusions >= max_exclusions {
                    FitState::Exhausted
                } else {
                    match shrink(&mask) {
                        Some(mask) => {
                            exclusions += 1;
                            FitState::Fitting { mask }
                        }
                        None => FitState::Exhausted,
                    }
                }
            }
            FitState::Accepted { mask, fit } => {
                return Ok(RobustFit {
                    fit,
                    mask,
                    exclusions,
                });
            }
            FitState::Exhausted => {
                return Err(InfiltrometerError::NoAdmissibleFit { exclusions });
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_exact_model() {
        let t: Vec<f64> = (1..=10).map(|i| f64::from(i) * 30.0).collect();
        let y: Vec<f64> = t.iter().map(|&t| 0.002 * t + 0.05 * t.sqrt()).collect();
        let fit = least_squares(&t, &y).unwrap();
        assert!((fit.c1 - 0.002).abs() < 1e-12, "c1 = {}", fit.c1);
        assert!((fit.c2 - 0.05).abs() < 1e-12, "c2 = {}", fit.c2);
        assert!(fit.covariance[0][0].abs() < 1e-20);
    }

    #[test]
    fn least_squares_rejects_degenerate_design() {
        assert!(least_squares(&[0.0, 30.0], &[0.0, 1.0]).is_err());
        assert!(least_squares(&[30.0, 30.0, 30.0], &[1.0, 1.0, 1.0]).is_err());
        assert!(least_squares(&[30.0], &[1.0]).is_err());
        assert!(least_squares(&[30.0, 60.0], &[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn two_samples_have_infinite_covariance() {
        let fit = least_squares(&[30.0, 60.0], &[1.0, 1.5]).unwrap();
        assert!(fit.covariance[0][0].is_infinite());
    }

    #[test]
    fn shrink_skips_excluded_samples() {
        let mask = vec![true, false, true, true, true];
        assert_eq!(shrink(&mask), Some(vec![true, false, false, true, true]));
        assert_eq!(shrink(&[true, false, true]), None);
    }

    #[test]
    fn rate_is_undefined_at_zero() {
        let fit = FitResult {
            c1: 1.0,
            c2: 2.0,
            covariance: [[0.0; 2]; 2],
        };
        assert_eq!(fit.rate(0.0), None);
        assert!((fit.rate(4.0).unwrap() - 1.5).abs() < 1e-12);
        assert!((fit.cumulative(4.0) - 8.0).abs() < 1e-12);
    }
}
