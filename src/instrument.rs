/*
 * Mini disk infiltrometer geometry.
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

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Physical dimensions of the instrument. Lengths in cm, volumes in mL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Instrument {
    pub total_height: f64,
    /// Inner diameter of the water reservoir tube.
    pub tube_diameter: f64,
    pub disk_height: f64,
    pub disk_diameter: f64,
    pub mariotte_volume: f64,
    pub reservoir_volume: f64,
    pub suction_min: f64,
    pub suction_max: f64,
}

impl Default for Instrument {
    fn default() -> Self {
        Self {
            total_height: 32.7,
            tube_diameter: 3.1,
            disk_height: 0.3,
            disk_diameter: 4.5,
            mariotte_volume: 40.0,
            reservoir_volume: 95.0,
            suction_min: 0.5,
            suction_max: 7.0,
        }
    }
}

impl Instrument {
    /// Disk radius r0 [cm].
    #[must_use]
    pub fn disk_radius(&self) -> f64 {
        self.disk_diameter / 2.0
    }

    /// Disk cross-section [cm²].
    #[must_use]
    pub fn disk_area(&self) -> f64 {
        PI * self.disk_radius().powi(2)
    }

    /// Reservoir tube cross-section [cm²].
    #[must_use]
    pub fn reservoir_area(&self) -> f64 {
        PI * (self.tube_diameter / 2.0).powi(2)
    }

    #[must_use]
    pub fn suction_in_range(&self, h0: f64) -> bool {
        (self.suction_min..=self.suction_max).contains(&h0)
    }
}
