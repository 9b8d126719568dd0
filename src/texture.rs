/*
 * USDA soil texture classification.
 *
 * Classifies a (sand, clay) composition into one of the twelve classes of
 * the USDA texture triangle. Silt is implied as 100 - sand - clay.
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

/// Tolerance on sand + clay exceeding 100 % from rounding in field sheets.
const SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoilTexture {
    Sand,
    LoamySand,
    SandyLoam,
    Loam,
    Silt,
    SiltLoam,
    SandyClayLoam,
    ClayLoam,
    SiltyClayLoam,
    SandyClay,
    SiltyClay,
    Clay,
}

impl SoilTexture {
    pub const ALL: [SoilTexture; 12] = [
        SoilTexture::Sand,
        SoilTexture::LoamySand,
        SoilTexture::SandyLoam,
        SoilTexture::Loam,
        SoilTexture::Silt,
        SoilTexture::SiltLoam,
        SoilTexture::SandyClayLoam,
        SoilTexture::ClayLoam,
        SoilTexture::SiltyClayLoam,
        SoilTexture::SandyClay,
        SoilTexture::SiltyClay,
        SoilTexture::Clay,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SoilTexture::Sand => "Sand",
            SoilTexture::LoamySand => "Loamy Sand",
            SoilTexture::SandyLoam => "Sandy Loam",
            SoilTexture::Loam => "Loam",
            SoilTexture::Silt => "Silt",
            SoilTexture::SiltLoam => "Silt Loam",
            SoilTexture::SandyClayLoam => "Sandy Clay Loam",
            SoilTexture::ClayLoam => "Clay Loam",
            SoilTexture::SiltyClayLoam => "Silty Clay Loam",
            SoilTexture::SandyClay => "Sandy Clay",
            SoilTexture::SiltyClay => "Silty Clay",
            SoilTexture::Clay => "Clay",
        }
    }
}

impl fmt::Display for SoilTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SoilTexture {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl TryFrom<&str> for SoilTexture {
    type Error = String;

    /// Case-insensitive; `sandy_loam`, `sandy-loam` and `Sandy Loam` are equal.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let wanted: String = value
            .trim()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c.to_ascii_lowercase() })
            .collect();
        SoilTexture::ALL
            .into_iter()
            .find(|t| t.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| format!("Unknown soil texture: {value}"))
    }
}

/// USDA class of a composition given in percent.
///
/// Returns `None` for compositions that cannot be placed on the triangle:
/// non-finite values, percentages outside 0..=100, or sand + clay above 100.
#[must_use]
pub fn classify(sand: f64, clay: f64) -> Option<SoilTexture> {
    if !sand.is_finite() || !clay.is_finite() {
        return None;
    }
    if !(0.0..=100.0).contains(&sand) || !(0.0..=100.0).contains(&clay) {
        return None;
    }
    if sand + clay > 100.0 + SUM_TOLERANCE {
        return None;
    }
    let silt = (100.0 - sand - clay).max(0.0);

    let texture = if silt + 1.5 * clay < 15.0 {
        SoilTexture::Sand
    } else if silt + 2.0 * clay < 30.0 {
        SoilTexture::LoamySand
    } else if ((7.0..20.0).contains(&clay) && sand > 52.0) || (clay < 7.0 && silt < 50.0) {
        SoilTexture::SandyLoam
    } else if (7.0..27.0).contains(&clay) && (28.0..50.0).contains(&silt) && sand <= 52.0 {
        SoilTexture::Loam
    } else if silt >= 80.0 && clay < 12.0 {
        SoilTexture::Silt
    } else if silt >= 50.0 && clay < 27.0 {
        SoilTexture::SiltLoam
    } else if (20.0..35.0).contains(&clay) && silt < 28.0 && sand > 45.0 {
        SoilTexture::SandyClayLoam
    } else if (27.0..40.0).contains(&clay) && sand > 20.0 && sand <= 45.0 {
        SoilTexture::ClayLoam
    } else if (27.0..40.0).contains(&clay) && sand <= 20.0 {
        SoilTexture::SiltyClayLoam
    } else if clay >= 35.0 && sand > 45.0 {
        SoilTexture::SandyClay
    } else if clay >= 40.0 && silt >= 40.0 {
        SoilTexture::SiltyClay
    } else if clay >= 40.0 {
        SoilTexture::Clay
    } else {
        return None;
    };
    Some(texture)
}

/// Element-wise [`classify`]; the output has the length of the shorter input.
#[must_use]
pub fn classify_all(sand: &[f64], clay: &[f64]) -> Vec<Option<SoilTexture>> {
    sand.iter()
        .zip(clay)
        .map(|(&s, &c)| classify(s, c))
        .collect()
}
