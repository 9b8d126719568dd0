/*
 * Horton infiltration-rate decay fitted with a particle swarm (argmin).
 *
 *     f(t) = fc + (fo − fc)·exp(−k·t)
 *
 * fo is the initial rate, fc the final rate (both cm/h) and k the decay
 * constant per unit of the time axis.
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

#![allow(clippy::cast_precision_loss)]

use std::borrow::Borrow;

use argmin::core::{CostFunction, Error as ArgminError, Executor, SendAlias, State, SyncAlias};
use argmin::solver::particleswarm::ParticleSwarm;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InfiltrometerError, Result};
use crate::schedule::{elapsed_minutes, STEP_SECONDS};

/// Cost assigned to particles whose error is not finite.
pub const PENALTY: f64 = 1e12;

/// Upper bound of the decay constant.
pub const K_MAX: f64 = 4.0;

/// Ratio between the upper and lower bound of fo.
const FO_SPAN: f64 = 100.0;

/// Swarm hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwarmConfig {
    pub particles: usize,
    pub iterations: u64,
    /// Velocity carried over between iterations (w).
    pub inertia: f64,
    /// Pull towards each particle's own best (c1).
    pub cognitive: f64,
    /// Pull towards the swarm's best (c2).
    pub social: f64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            particles: 1000,
            iterations: 1000,
            inertia: 0.8,
            cognitive: 1.5,
            social: 1.2,
        }
    }
}

/// Lower and upper corners of the (fo, fc, k) search box.
pub type Bounds = (Vec<f64>, Vec<f64>);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HortonParams {
    /// Initial rate [cm/h].
    pub fo: f64,
    /// Final rate [cm/h].
    pub fc: f64,
    /// Decay constant [1/min].
    pub k: f64,
    /// Root-mean-square error of the fit [cm/h].
    pub rmse: f64,
}

/// Horton rate at time `t`.
#[must_use]
pub fn horton_rate(t: f64, fo: f64, fc: f64, k: f64) -> f64 {
    fc + (fo - fc) * (-k * t).exp()
}

/// Infiltration rates [cm/h] between consecutive readings [mL].
///
/// A 30 s volume drop over the reservoir cross-section `reservoir_area`
/// [cm²] gives a depth, scaled to one hour. The result is one shorter than
/// `readings`.
#[must_use]
pub fn rate_series(readings: &[f64], reservoir_area: f64) -> Vec<f64> {
    let step_hours = STEP_SECONDS as f64 / 3600.0;
    readings
        .windows(2)
        .map(|w| (w[0] - w[1]) / reservoir_area / step_hours)
        .collect()
}

/// Time axis [min] matching [`rate_series`] over the full schedule: each
/// rate is stamped at the end of its step.
#[must_use]
pub fn rate_times() -> Vec<f64> {
    elapsed_minutes()[1..].to_vec()
}

/// Search box for (fo, fc, k) derived from the observed rates.
///
/// fo ∈ [I0, 100·I0], fc ∈ [0, mean(I)], k ∈ [0, 4], where I0 is the first
/// observed rate. A negative mean collapses the fc range to zero.
///
/// # Errors
///
/// [`InfiltrometerError::DegenerateRateBounds`] when I0 is not a positive
/// finite number, since the fo range would be empty or inverted.
pub fn search_bounds(rates: &[f64]) -> Result<Bounds> {
    let first_rate = rates.first().copied().unwrap_or(f64::NAN);
    if !(first_rate.is_finite() && first_rate > 0.0) {
        return Err(InfiltrometerError::DegenerateRateBounds { first_rate });
    }
    let mean = rates.iter().sum::<f64>() / rates.len() as f64;
    Ok((
        vec![first_rate, 0.0, 0.0],
        vec![FO_SPAN * first_rate, mean.max(0.0), K_MAX],
    ))
}

/// Root-mean-square error of every particle `[fo, fc, k]` against the
/// observed rates. Non-finite errors are replaced by [`PENALTY`].
#[must_use]
pub fn objective<P>(positions: &[P], observed: &[f64], times: &[f64]) -> Vec<f64>
where
    P: Borrow<Vec<f64>>,
{
    let m = observed.len().max(1) as f64;
    positions
        .iter()
        .map(|p| {
            let p = p.borrow();
            let (fo, fc, k) = (p[0], p[1], p[2]);
            let sse: f64 = observed
                .iter()
                .zip(times)
                .map(|(obs, &t)| (obs - horton_rate(t, fo, fc, k)).powi(2))
                .sum();
            let rmse = (sse / m).sqrt();
            if rmse.is_finite() {
                rmse
            } else {
                PENALTY
            }
        })
        .collect()
}

/// Horton misfit of a rate series, as seen by the swarm.
struct HortonCost<'a> {
    observed: &'a [f64],
    times: &'a [f64],
}

impl CostFunction for HortonCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<Self::Output, ArgminError> {
        Ok(objective(std::slice::from_ref(param), self.observed, self.times)[0])
    }

    fn bulk_cost<P>(&self, params: &[P]) -> std::result::Result<Vec<Self::Output>, ArgminError>
    where
        P: Borrow<Self::Param> + SyncAlias,
        Self::Output: SendAlias,
        Self: SyncAlias,
    {
        Ok(objective(params, self.observed, self.times))
    }
}

fn optimizer_error(e: &ArgminError) -> InfiltrometerError {
    InfiltrometerError::Optimizer(e.to_string())
}

/// Fit the Horton model to a rate series.
///
/// The swarm draws from a `StdRng` seeded with `seed`, so equal seeds give
/// equal fits. There is no convergence test: the best particle after the
/// configured iterations is the answer.
///
/// # Errors
///
/// Propagates [`search_bounds`] errors, and returns
/// [`InfiltrometerError::Optimizer`] when the swarm rejects its settings.
pub fn fit_horton(
    rates: &[f64],
    times: &[f64],
    config: &SwarmConfig,
    seed: u64,
) -> Result<HortonParams> {
    let bounds = search_bounds(rates)?;
    let solver = ParticleSwarm::new(bounds, config.particles.max(1))
        .with_rng_generator(StdRng::seed_from_u64(seed))
        .with_inertia_factor(config.inertia)
        .and_then(|s| s.with_cognitive_factor(config.cognitive))
        .and_then(|s| s.with_social_factor(config.social))
        .map_err(|e| optimizer_error(&e))?;
    let problem = HortonCost {
        observed: rates,
        times,
    };

    let result = Executor::new(problem, solver)
        .configure(|state| state.max_iters(config.iterations))
        .run()
        .map_err(|e| optimizer_error(&e))?;
    let state = result.state();
    let best = state
        .get_best_param()
        .ok_or_else(|| InfiltrometerError::Optimizer("swarm holds no particle".into()))?;
    let rmse = state.get_best_cost();
    debug!(rmse, iterations = state.get_iter(), "swarm finished");

    Ok(HortonParams {
        fo: best.position[0],
        fc: best.position[1],
        k: best.position[2],
        rmse,
    })
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn rate_from_volume_drop() {
        // 1 mL over 1 cm² in 30 s is 120 cm/h.
        let rates = rate_series(&[10.0, 9.0, 9.0], 1.0);
        assert_eq!(rates.len(), 2);
        assert!((rates[0] - 120.0).abs() < 1e-9);
        assert_eq!(rates[1], 0.0);
    }

    #[test]
    fn rate_times_skip_the_first_reading() {
        let t = rate_times();
        assert_eq!(t.len(), 20);
        assert_eq!(t[0], 0.5);
        assert_eq!(t[19], 10.0);
    }

    #[test]
    fn bounds_follow_the_data() {
        let b = search_bounds(&[4.0, 3.0, 2.0]).unwrap();
        assert_eq!(b.0, vec![4.0, 0.0, 0.0]);
        assert_eq!(b.1, vec![400.0, 3.0, 4.0]);
    }

    #[test]
    fn non_positive_first_rate_is_rejected() {
        assert!(matches!(
            search_bounds(&[0.0, 3.0]),
            Err(InfiltrometerError::DegenerateRateBounds { .. })
        ));
        assert!(search_bounds(&[-1.0, 3.0]).is_err());
        assert!(search_bounds(&[]).is_err());
    }

    #[test]
    fn objective_is_zero_on_the_model() {
        let times = rate_times();
        let observed: Vec<f64> = times.iter().map(|&t| horton_rate(t, 9.0, 2.0, 0.4)).collect();
        let cost = objective(&[vec![9.0, 2.0, 0.4], vec![9.0, 2.0, 0.5]], &observed, &times);
        assert!(cost[0] < 1e-12);
        assert!(cost[1] > 0.0);
    }

    #[test]
    fn bulk_cost_scores_the_whole_population() {
        let times = rate_times();
        let observed = vec![3.0; times.len()];
        let problem = HortonCost {
            observed: &observed,
            times: &times,
        };
        let population = vec![vec![3.0, 3.0, 0.0], vec![0.0, 0.0, f64::NEG_INFINITY]];

        let costs = problem.bulk_cost(&population).unwrap();
        assert_eq!(costs, objective(&population, &observed, &times));
        assert_eq!(costs[0], 0.0);
        assert_eq!(costs[1], PENALTY);
        assert_eq!(problem.cost(&population[1]).unwrap(), PENALTY);
    }
}
