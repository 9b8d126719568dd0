/*
 * van Genuchten parameters per USDA texture class.
 *
 * Shape parameters (alpha, n) of Carsel & Parrish (1988) and the tabulated
 * A coefficients of the mini disk infiltrometer manual for suction heads of
 * 0.5 to 6 cm.
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

use crate::error::{InfiltrometerError, Result};
use crate::texture::SoilTexture;

/// Suction heads [cm] of the tabulated A coefficients.
pub const A_SUCTIONS: [f64; 7] = [0.5, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

/// One row of the table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VanGenuchtenEntry {
    pub texture: SoilTexture,
    /// [1/cm]
    pub alpha: f64,
    /// [-]
    pub n: f64,
    /// A at each of [`A_SUCTIONS`].
    pub a: [f64; 7],
}

const fn entry(texture: SoilTexture, alpha: f64, n: f64, a: [f64; 7]) -> VanGenuchtenEntry {
    VanGenuchtenEntry { texture, alpha, n, a }
}

pub static VAN_GENUCHTEN: [VanGenuchtenEntry; 12] = [
    entry(SoilTexture::Sand, 0.145, 2.68, [2.84, 2.40, 1.73, 1.24, 0.89, 0.64, 0.46]),
    entry(SoilTexture::LoamySand, 0.124, 2.28, [2.99, 2.79, 2.43, 2.12, 1.84, 1.61, 1.40]),
    entry(SoilTexture::SandyLoam, 0.075, 1.89, [3.88, 3.89, 3.91, 3.93, 3.95, 3.98, 4.00]),
    entry(SoilTexture::Loam, 0.036, 1.56, [5.46, 5.72, 6.27, 6.87, 7.53, 8.25, 9.05]),
    entry(SoilTexture::Silt, 0.016, 1.37, [7.92, 8.18, 8.71, 9.29, 9.90, 10.55, 11.24]),
    entry(SoilTexture::SiltLoam, 0.020, 1.41, [7.10, 7.37, 7.93, 8.53, 9.19, 9.89, 10.64]),
    entry(SoilTexture::SandyClayLoam, 0.059, 1.48, [3.21, 3.52, 3.24, 5.11, 6.15, 7.41, 8.92]),
    entry(SoilTexture::ClayLoam, 0.019, 1.31, [5.86, 6.11, 6.64, 7.23, 7.86, 8.55, 9.30]),
    entry(SoilTexture::SiltyClayLoam, 0.010, 1.23, [7.89, 8.09, 8.51, 8.95, 9.41, 9.90, 10.41]),
    entry(SoilTexture::SandyClay, 0.027, 1.23, [3.34, 3.57, 4.09, 4.68, 5.36, 6.14, 7.04]),
    entry(SoilTexture::SiltyClay, 0.005, 1.09, [6.08, 6.17, 6.36, 6.56, 6.76, 6.97, 7.18]),
    entry(SoilTexture::Clay, 0.008, 1.09, [4.00, 4.10, 4.30, 4.51, 4.74, 4.98, 5.22]),
];

/// Row for a texture class.
#[must_use]
pub fn lookup(texture: SoilTexture) -> &'static VanGenuchtenEntry {
    // One row per class, in declaration order.
    &VAN_GENUCHTEN[texture as usize]
}

/// Row for a texture class name such as `"Sandy Loam"`.
///
/// # Errors
///
/// Returns [`InfiltrometerError::UnknownTexture`] when the name matches no row.
pub fn lookup_by_name(name: &str) -> Result<&'static VanGenuchtenEntry> {
    let texture = SoilTexture::try_from(name)
        .map_err(|_| InfiltrometerError::UnknownTexture(name.to_string()))?;
    Ok(lookup(texture))
}

impl VanGenuchtenEntry {
    /// Tabulated A at suction `h0`, linearly interpolated between table
    /// suctions. `None` outside 0.5..=6 cm.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn tabulated_a(&self, h0: f64) -> Option<f64> {
        if !(A_SUCTIONS[0]..=A_SUCTIONS[6]).contains(&h0) {
            return None;
        }
        let upper = A_SUCTIONS.iter().position(|&s| s >= h0)?;
        if upper == 0 || A_SUCTIONS[upper] == h0 {
            return Some(self.a[upper]);
        }
        let (s0, s1) = (A_SUCTIONS[upper - 1], A_SUCTIONS[upper]);
        let w = (h0 - s0) / (s1 - s0);
        Some(self.a[upper - 1] + w * (self.a[upper] - self.a[upper - 1]))
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn table_is_in_class_order() {
        for (row, texture) in VAN_GENUCHTEN.iter().zip(SoilTexture::ALL) {
            assert_eq!(row.texture, texture);
            assert_eq!(lookup(texture).texture, texture);
        }
    }

    #[test]
    fn sandy_loam_row() {
        let row = lookup_by_name("Sandy Loam").unwrap();
        assert_eq!(row.alpha, 0.075);
        assert_eq!(row.n, 1.89);
    }

    #[test]
    fn unknown_name_is_a_lookup_miss() {
        let err = lookup_by_name("Peat").unwrap_err();
        assert!(matches!(err, InfiltrometerError::UnknownTexture(ref n) if n == "Peat"));
    }

    #[test]
    fn tabulated_a_interpolates() {
        let loam = lookup(SoilTexture::Loam);
        assert_eq!(loam.tabulated_a(2.0), Some(6.27));
        let mid = loam.tabulated_a(2.5).unwrap();
        assert!((mid - (6.27 + 6.87) / 2.0).abs() < 1e-12);
        assert_eq!(loam.tabulated_a(0.5), Some(5.46));
        assert_eq!(loam.tabulated_a(7.0), None);
    }
}
