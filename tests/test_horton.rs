#![allow(clippy::float_cmp)]

use infiltrometer_toolbox::horton::{horton_rate, objective, rate_series, rate_times, PENALTY};
use infiltrometer_toolbox::{fit_horton, InfiltrometerError, Instrument, SwarmConfig};

fn swarm(particles: usize, iterations: u64) -> SwarmConfig {
    SwarmConfig {
        particles,
        iterations,
        ..SwarmConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Objective
// ---------------------------------------------------------------------------

#[test]
fn test_non_finite_position_is_penalised() {
    let times = rate_times();
    let observed = vec![3.0; times.len()];

    // 0 * exp(inf) is NaN.
    let cost = objective(&[vec![0.0, 0.0, f64::NEG_INFINITY]], &observed, &times);
    assert!((cost[0] - PENALTY).abs() < f64::EPSILON, "cost = {}", cost[0]);
}

#[test]
fn test_zero_parameters_give_a_finite_error() {
    let times = rate_times();
    let observed = vec![3.0; times.len()];

    let cost = objective(&[vec![0.0, 0.0, 0.0]], &observed, &times);
    assert!(cost[0].is_finite());
    assert!((cost[0] - 3.0).abs() < 1e-12, "cost = {}", cost[0]);
}

// ---------------------------------------------------------------------------
// Rate series
// ---------------------------------------------------------------------------

#[test]
fn test_rate_series_from_constant_drop() {
    let area = Instrument::default().reservoir_area();
    // A drop giving exactly 3 cm/h per 30 s step.
    let step = 3.0 * area * 30.0 / 3600.0;
    let readings: Vec<f64> = (0..21).map(|i| 90.0 - step * f64::from(i)).collect();

    let rates = rate_series(&readings, area);
    assert_eq!(rates.len(), 20);
    for r in &rates {
        assert!((r - 3.0).abs() < 1e-9, "rate = {r}");
    }
}

// ---------------------------------------------------------------------------
// Swarm fit
// ---------------------------------------------------------------------------

#[test]
fn test_constant_rate_fits_a_flat_curve() {
    let c = 3.0;
    let times = rate_times();
    let rates = vec![c; times.len()];

    let params = fit_horton(&rates, &times, &swarm(100, 300), 42).unwrap();

    assert!(params.rmse < 1e-2 * c, "rmse = {}", params.rmse);
    assert!(
        params.k < 0.05 || (params.fo - params.fc).abs() < 0.05 * c,
        "curve not flat: {params:?}"
    );
    for &t in &times {
        let r = horton_rate(t, params.fo, params.fc, params.k);
        assert!((r - c).abs() < 0.05 * c, "rate {r} at {t} min");
    }
}

#[test]
fn test_decaying_rate_is_recovered() {
    let times = rate_times();
    let rates: Vec<f64> = times.iter().map(|&t| horton_rate(t, 20.0, 4.0, 0.8)).collect();

    let params = fit_horton(&rates, &times, &swarm(200, 500), 7).unwrap();

    assert!(params.rmse < 0.1, "rmse = {}", params.rmse);
    assert!((params.fc - 4.0).abs() < 0.5, "fc = {}", params.fc);
    assert!((params.k - 0.8).abs() < 0.2, "k = {}", params.k);
}

#[test]
fn test_fit_is_reproducible_with_a_seed() {
    let times = rate_times();
    let rates: Vec<f64> = times.iter().map(|&t| horton_rate(t, 12.0, 2.0, 0.5)).collect();
    let config = swarm(30, 40);

    let a = fit_horton(&rates, &times, &config, 1).unwrap();
    let b = fit_horton(&rates, &times, &config, 1).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_non_positive_first_rate_is_rejected() {
    let times = rate_times();
    let mut rates = vec![2.0; times.len()];
    rates[0] = 0.0;

    let err = fit_horton(&rates, &times, &swarm(10, 5), 3).unwrap_err();
    assert!(matches!(
        err,
        InfiltrometerError::DegenerateRateBounds { first_rate } if first_rate == 0.0
    ));
}

#[test]
fn test_negative_swarm_factor_is_an_optimizer_error() {
    let times = rate_times();
    let rates = vec![2.0; times.len()];
    let config = SwarmConfig {
        inertia: -0.5,
        ..swarm(10, 5)
    };

    let err = fit_horton(&rates, &times, &config, 3).unwrap_err();
    assert!(matches!(err, InfiltrometerError::Optimizer(_)), "{err}");
}

#[test]
fn test_fit_stays_in_the_search_box() {
    let times = rate_times();
    let rates: Vec<f64> = times.iter().map(|&t| horton_rate(t, 8.0, 1.0, 2.5)).collect();

    let params = fit_horton(&rates, &times, &swarm(40, 80), 19).unwrap();

    let mean = rates.iter().sum::<f64>() / 20.0;
    assert!(params.fo >= rates[0] && params.fo <= 100.0 * rates[0], "fo = {}", params.fo);
    assert!(params.fc >= 0.0 && params.fc <= mean, "fc = {}", params.fc);
    assert!((0.0..=4.0).contains(&params.k), "k = {}", params.k);
}
