/*
 * Reading schedule of a mini disk infiltrometer run.
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

use chrono::TimeDelta;

use crate::error::{InfiltrometerError, Result};

/// Number of readings per record.
pub const N_READINGS: usize = 21;

/// Seconds between two consecutive readings.
pub const STEP_SECONDS: i64 = 30;

/// Column labels of the readings, `MM_SS` of elapsed time.
pub const READING_LABELS: [&str; N_READINGS] = [
    "00_00", "00_30", "01_00", "01_30", "02_00", "02_30", "03_00", "03_30", "04_00", "04_30",
    "05_00", "05_30", "06_00", "06_30", "07_00", "07_30", "08_00", "08_30", "09_00", "09_30",
    "10_00",
];

/// Canonical form of a reading label; `05:30` and `05_30` are the same column.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    label.trim().replace(':', "_")
}

/// Elapsed time encoded by a `MM_SS` label.
///
/// # Errors
///
/// Returns [`InfiltrometerError::InvalidLabel`] if the label is not two
/// integer fields separated by `_` or `:` with seconds below 60.
pub fn elapsed(label: &str) -> Result<TimeDelta> {
    let normalized = normalize_label(label);
    let invalid = || InfiltrometerError::InvalidLabel(label.to_string());

    let (minutes, seconds) = normalized.split_once('_').ok_or_else(invalid)?;
    let minutes: i64 = minutes.parse().map_err(|_| invalid())?;
    let seconds: i64 = seconds.parse().map_err(|_| invalid())?;
    if minutes < 0 || !(0..60).contains(&seconds) {
        return Err(invalid());
    }

    Ok(TimeDelta::minutes(minutes) + TimeDelta::seconds(seconds))
}

/// Elapsed time of reading `index` on the fixed 30 s cadence.
#[must_use]
pub fn elapsed_at(index: usize) -> TimeDelta {
    TimeDelta::seconds(index as i64 * STEP_SECONDS)
}

/// Elapsed seconds of every reading: 0, 30, ..., 600.
#[must_use]
pub fn elapsed_seconds() -> [f64; N_READINGS] {
    std::array::from_fn(|i| elapsed_at(i).num_seconds() as f64)
}

/// Elapsed minutes of every reading: 0.0, 0.5, ..., 10.0.
#[must_use]
pub fn elapsed_minutes() -> [f64; N_READINGS] {
    std::array::from_fn(|i| elapsed_at(i).num_seconds() as f64 / 60.0)
}

/// Index of a reading label in the schedule, if it is one.
#[must_use]
pub fn label_index(label: &str) -> Option<usize> {
    let t = elapsed(label).ok()?;
    (0..N_READINGS).find(|&i| elapsed_at(i) == t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_the_cadence() {
        for (i, label) in READING_LABELS.iter().enumerate() {
            assert_eq!(elapsed(label).unwrap(), elapsed_at(i), "label {label}");
        }
    }

    #[test]
    fn colon_labels_are_accepted() {
        assert_eq!(elapsed("05:30").unwrap().num_seconds(), 330);
        assert_eq!(label_index("05:30"), Some(11));
        assert_eq!(label_index("5:30"), Some(11));
    }

    #[test]
    fn off_schedule_labels_have_no_index() {
        assert_eq!(label_index("00_15"), None);
        assert_eq!(label_index("11_00"), None);
        assert_eq!(label_index("Sand"), None);
    }

    #[test]
    fn bad_labels_are_rejected() {
        for bad in ["", "0530", "05_75", "aa_00", "-1_00"] {
            assert!(elapsed(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn time_axes() {
        let s = elapsed_seconds();
        let m = elapsed_minutes();
        assert!((s[20] - 600.0).abs() < f64::EPSILON);
        assert!((m[1] - 0.5).abs() < f64::EPSILON);
        assert!((m[20] - 10.0).abs() < f64::EPSILON);
    }
}
