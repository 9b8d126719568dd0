/*
 * Sorptivity and hydraulic conductivity from the fitted infiltration law.
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

use std::fmt;

use serde::{Serialize, Serializer};

use crate::fit::FitResult;
use crate::shape_factor::ShapeFactors;

/// Which A2 approximation produced K.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approximation {
    Dohnal,
    Zhang,
}

impl Approximation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Approximation::Dohnal => "Dohnal",
            Approximation::Zhang => "Zhang",
        }
    }
}

impl fmt::Display for Approximation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Approximation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Hydraulic conductivity with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Conductivity {
    /// [cm/s]
    pub k: f64,
    pub approximation: Approximation,
}

/// S = C1 / A1, where A1 is defined.
#[must_use]
pub fn sorptivity(fit: &FitResult, factors: &ShapeFactors) -> Option<f64> {
    factors.a1.map(|a1| fit.c1 / a1)
}

/// K = C2 / A2, with Dohnal's A2 when it is defined and Zhang's otherwise.
#[must_use]
pub fn conductivity(fit: &FitResult, factors: &ShapeFactors) -> Conductivity {
    match factors.a2_dohnal {
        Some(a) => Conductivity {
            k: fit.c2 / a,
            approximation: Approximation::Dohnal,
        },
        None => Conductivity {
            k: fit.c2 / factors.a2_zhang,
            approximation: Approximation::Zhang,
        },
    }
}
