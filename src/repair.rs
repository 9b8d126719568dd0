/*
 * Repair of raw infiltrometer reading series.
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

/// Reading series after repair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairedSeries {
    /// Gap-free readings [mL].
    pub values: Vec<f64>,
    /// `true` where the reading was observed and usable.
    pub valid: Vec<bool>,
    /// Index of the first non-positive reading, if any. Readings after it
    /// are frozen at the last valid value.
    pub truncated_at: Option<usize>,
}

impl RepairedSeries {
    #[must_use]
    pub fn n_valid(&self) -> usize {
        self.valid.iter().filter(|v| **v).count()
    }

    /// First usable reading.
    #[must_use]
    pub fn first_valid(&self) -> Option<f64> {
        self.valid_pairs().next().map(|(_, v)| v)
    }

    /// Last usable reading.
    #[must_use]
    pub fn last_valid(&self) -> Option<f64> {
        self.valid_pairs().last().map(|(_, v)| v)
    }

    /// `(index, value)` of every usable reading, in time order.
    pub fn valid_pairs(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .zip(&self.valid)
            .enumerate()
            .filter(|(_, (_, ok))| **ok)
            .map(|(i, (v, _))| (i, *v))
    }
}

/// Numeric coercion of a raw cell: blanks and non-numbers become NaN.
#[must_use]
pub fn coerce(cell: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Repair a raw series.
///
/// Missing readings are NaN. The first reading `<= 0` means the reservoir
/// emptied or the sensor reset, so every reading after it is discarded.
/// All discarded or missing readings are then replaced by the last valid
/// reading, not by a rolling fill.
///
/// Returns `None` when the series has no valid reading at all.
#[must_use]
pub fn repair(raw: &[f64]) -> Option<RepairedSeries> {
    let mut valid: Vec<bool> = raw.iter().map(|v| v.is_finite()).collect();

    let truncated_at = raw
        .iter()
        .zip(&valid)
        .position(|(v, ok)| *ok && *v <= 0.0);
    if let Some(idx) = truncated_at {
        for ok in &mut valid[idx + 1..] {
            *ok = false;
        }
    }

    let fill = raw
        .iter()
        .zip(&valid)
        .filter(|(_, ok)| **ok)
        .map(|(v, _)| *v)
        .last()?;

    let values = raw
        .iter()
        .zip(&valid)
        .map(|(v, ok)| if *ok { *v } else { fill })
        .collect();

    Some(RepairedSeries {
        values,
        valid,
        truncated_at,
    })
}
