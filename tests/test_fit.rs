#![allow(clippy::float_cmp)]

use approx::assert_relative_eq;
use infiltrometer_toolbox::schedule::{elapsed_seconds, N_READINGS};
use infiltrometer_toolbox::{fit_robust, repair, InfiltrometerError, Instrument};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reservoir readings [mL] produced by the infiltration law with known
/// coefficients.
fn synthetic_readings(c1: f64, c2: f64, v0: f64, disk_area: f64) -> Vec<f64> {
    elapsed_seconds()
        .iter()
        .map(|&t| v0 - disk_area * (c2 * t.sqrt() + c1 * t))
        .collect()
}

fn disk_area() -> f64 {
    Instrument::default().disk_area()
}

// ---------------------------------------------------------------------------
// Exact model data
// ---------------------------------------------------------------------------

#[test]
fn test_recovers_known_coefficients() {
    let area = disk_area();
    let readings = synthetic_readings(0.001, 0.02, 90.0, area);
    let valid = vec![true; N_READINGS];

    let result = fit_robust(&elapsed_seconds(), &readings, &valid, area, 19).unwrap();

    assert_relative_eq!(result.fit.c1, 0.001, max_relative = 1e-6);
    assert_relative_eq!(result.fit.c2, 0.02, max_relative = 1e-6);
    assert_eq!(result.exclusions, 0, "clean data needs no exclusions");
    assert!(result.mask.iter().all(|m| *m));
}

#[test]
fn test_covariance_vanishes_on_exact_data() {
    let area = disk_area();
    let readings = synthetic_readings(0.003, 0.05, 80.0, area);
    let valid = vec![true; N_READINGS];

    let result = fit_robust(&elapsed_seconds(), &readings, &valid, area, 19).unwrap();
    let cov = result.fit.covariance;

    assert!(cov[0][0].abs() < 1e-18, "var C1 = {}", cov[0][0]);
    assert!(cov[1][1].abs() < 1e-14, "var C2 = {}", cov[1][1]);
    assert_relative_eq!(cov[0][1], cov[1][0]);
}

#[test]
fn test_fit_uses_only_valid_samples() {
    let area = disk_area();
    let mut readings = synthetic_readings(0.002, 0.03, 90.0, area);
    // Reservoir empties at 07:00; the tail is noise.
    readings[14] = 0.0;
    readings[15] = 55.0;
    readings[16] = f64::NAN;

    let series = repair(&readings).unwrap();
    assert_eq!(series.truncated_at, Some(14));
    assert!(series.values[15..].iter().all(|v| *v == 0.0));

    // Fitting only the part before the reservoir emptied recovers the law.
    let mut valid = series.valid.clone();
    valid[14] = false;
    let result = fit_robust(&elapsed_seconds(), &series.values, &valid, area, 19).unwrap();
    assert_relative_eq!(result.fit.c1, 0.002, max_relative = 1e-6);
    assert_relative_eq!(result.fit.c2, 0.03, max_relative = 1e-6);
}

// ---------------------------------------------------------------------------
// Exclusion loop
// ---------------------------------------------------------------------------

#[test]
fn test_early_noise_triggers_exclusion() {
    let area = disk_area();
    let mut readings = synthetic_readings(0.001, 0.02, 90.0, area);
    // A spurious 5 cm drop at the first step makes C1 negative.
    readings[1] = readings[0] - 5.0 * area;
    let valid = vec![true; N_READINGS];

    let result = fit_robust(&elapsed_seconds(), &readings, &valid, area, 19).unwrap();

    assert!(result.exclusions >= 1, "expected at least one exclusion");
    assert!(result.fit.c1 >= 0.0, "accepted C1 must be non-negative");
    assert!(result.mask[0], "the first sample is never dropped");
    assert!(!result.mask[1], "the noisy sample must be dropped");
    assert_relative_eq!(result.fit.c1, 0.001, max_relative = 1e-6);
    assert_relative_eq!(result.fit.c2, 0.02, max_relative = 1e-6);
}

#[test]
fn test_exclusion_budget_is_respected() {
    let area = disk_area();
    let mut readings = synthetic_readings(0.001, 0.02, 90.0, area);
    readings[1] = readings[0] - 5.0 * area;
    let valid = vec![true; N_READINGS];

    let err = fit_robust(&elapsed_seconds(), &readings, &valid, area, 0).unwrap_err();
    assert!(
        matches!(err, InfiltrometerError::NoAdmissibleFit { exclusions: 0 }),
        "unexpected error: {err}"
    );
}

#[test]
fn test_concave_series_exhausts_the_mask() {
    let area = disk_area();
    // Pure square-root decay with a plateau: every pass fits C1 < 0.
    let readings: Vec<f64> = elapsed_seconds()
        .iter()
        .map(|&t| 90.0 - area * 0.05 * t.sqrt().min(12.0))
        .collect();
    let valid = vec![true; N_READINGS];

    let err = fit_robust(&elapsed_seconds(), &readings, &valid, area, 19).unwrap_err();
    assert!(matches!(err, InfiltrometerError::NoAdmissibleFit { .. }));
}

#[test]
fn test_flat_series_and_single_time_mask() {
    let area = disk_area();
    let readings = vec![50.0; N_READINGS];
    let valid = vec![true; N_READINGS];

    let result = fit_robust(&elapsed_seconds(), &readings, &valid, area, 19);
    // Zero infiltration fits exactly with C1 = C2 = 0.
    let fit = result.unwrap().fit;
    assert!(fit.c1.abs() < 1e-12 && fit.c2.abs() < 1e-12);

    let mut lonely = vec![false; N_READINGS];
    lonely[0] = true;
    lonely[3] = true;
    let err = fit_robust(&elapsed_seconds(), &readings, &lonely, area, 19).unwrap_err();
    assert!(matches!(err, InfiltrometerError::Unfittable(_)), "{err}");
}

#[test]
fn test_rate_is_undefined_at_time_zero() {
    let area = disk_area();
    let readings = synthetic_readings(0.001, 0.02, 90.0, area);
    let valid = vec![true; N_READINGS];
    let fit = fit_robust(&elapsed_seconds(), &readings, &valid, area, 19)
        .unwrap()
        .fit;

    assert!(fit.rate(0.0).is_none());
    assert_relative_eq!(fit.rate(100.0).unwrap(), 0.001 + 0.02 / 20.0, max_relative = 1e-6);
    assert_relative_eq!(fit.cumulative(400.0), 0.4 + 0.4, max_relative = 1e-6);
}
