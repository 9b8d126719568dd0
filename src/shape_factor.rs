/*
 * Closed-form shape factors A relating the infiltration law coefficients
 * to sorptivity and hydraulic conductivity.
 *
 * A1 follows Zhang (1997) with b = 0.55 (Warrick and Broadbridge, 1992);
 * A2 follows Zhang (1997) and Dohnal et al. (2010).
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

use serde::Serialize;

use crate::van_genuchten::VanGenuchtenEntry;

/// Empirical constant of the A1 approximation.
pub const B: f64 = 0.55;

/// Dohnal's A2 holds only below this n.
pub const DOHNAL_N_LIMIT: f64 = 1.35;

/// Zhang's A2 switches exponent regime at this n.
const ZHANG_N_PIVOT: f64 = 1.9;

/// Shape factors of one record. `None` marks a term that is undefined for
/// the record, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShapeFactors {
    pub a1: Option<f64>,
    pub a2_zhang: f64,
    pub a2_dohnal: Option<f64>,
}

/// A1 for sorptivity.
///
/// `theta_0 - theta_i` is the change in volumetric water content over the
/// run. Returns `None` unless the result is finite and strictly positive,
/// so equal water contents leave A1 undefined.
#[must_use]
pub fn a1(alpha: f64, n: f64, h0: f64, r0: f64, theta_0: f64, theta_i: f64) -> Option<f64> {
    let p1 = 1.4 * B.sqrt() * (theta_0 - theta_i).powf(0.25);
    let p2 = (3.0 * (n - 1.9) * alpha * h0).exp();
    let den = (alpha * r0).powf(0.15);
    let a = p1 * p2 / den;
    (a.is_finite() && a > 0.0).then_some(a)
}

/// A2 after Zhang (1997), defined for every n.
#[must_use]
pub fn a2_zhang(alpha: f64, n: f64, h0: f64, r0: f64) -> f64 {
    let v = if n < ZHANG_N_PIVOT { 7.5 } else { 2.92 };
    let p1 = 11.65 * (n.powf(0.1) - 1.0);
    let p2 = (v * (n - 1.9) * alpha * h0).exp();
    let den = (alpha * r0).powf(0.91);
    p1 * p2 / den
}

/// A2 after Dohnal et al. (2010); `None` when `n >= 1.35`.
#[must_use]
pub fn a2_dohnal(alpha: f64, n: f64, h0: f64, r0: f64) -> Option<f64> {
    if n >= DOHNAL_N_LIMIT {
        return None;
    }
    let p1 = 11.65 * (n.powf(0.82) - 1.0);
    let p2 = (34.65 * (n - 1.19) * alpha * h0).exp();
    let den = (alpha * r0).powf(0.6);
    Some(p1 * p2 / den)
}

impl ShapeFactors {
    /// All shape factors for a soil row, suction `h0` [cm] and disk radius
    /// `r0` [cm]. A1 needs both water contents.
    #[must_use]
    pub fn compute(
        soil: &VanGenuchtenEntry,
        h0: f64,
        r0: f64,
        theta: Option<(f64, f64)>,
    ) -> Self {
        let (alpha, n) = (soil.alpha, soil.n);
        Self {
            a1: theta.and_then(|(theta_0, theta_i)| a1(alpha, n, h0, r0, theta_0, theta_i)),
            a2_zhang: a2_zhang(alpha, n, h0, r0),
            a2_dohnal: a2_dohnal(alpha, n, h0, r0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::SoilTexture;
    use crate::van_genuchten::lookup;

    #[test]
    fn dohnal_is_undefined_from_the_limit() {
        assert!(a2_dohnal(0.02, 1.35, 2.0, 2.25).is_none());
        assert!(a2_dohnal(0.02, 1.56, 2.0, 2.25).is_none());
        assert!(a2_dohnal(0.02, 1.34, 2.0, 2.25).is_some());
    }

    #[test]
    fn zhang_regime_switch() {
        // At n = 1.9 the exponent vanishes whichever regime applies.
        let a = a2_zhang(0.075, 1.9, 2.0, 2.25);
        let expected = 11.65 * (1.9_f64.powf(0.1) - 1.0) / (0.075_f64 * 2.25).powf(0.91);
        assert!((a - expected).abs() < 1e-12);
    }

    #[test]
    fn a1_requires_a_positive_water_content_change() {
        assert!(a1(0.075, 1.89, 2.0, 2.25, 0.1, 0.3).is_none());
        assert!(a1(0.075, 1.89, 2.0, 2.25, 0.3, 0.3).is_none());
        assert!(a1(0.075, 1.89, 2.0, 2.25, 0.3, 0.1).is_some());
    }

    #[test]
    fn factors_per_texture() {
        let clay = ShapeFactors::compute(lookup(SoilTexture::Clay), 2.0, 2.25, None);
        assert!(clay.a1.is_none());
        assert!(clay.a2_dohnal.is_some());

        let loam = ShapeFactors::compute(lookup(SoilTexture::Loam), 2.0, 2.25, Some((0.4, 0.1)));
        assert!(loam.a1.is_some());
        assert!(loam.a2_dohnal.is_none());
        assert!(loam.a2_zhang > 0.0);
    }
}
