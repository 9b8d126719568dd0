/*
 * Error types for the infiltrometer toolbox.
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

use std::path::PathBuf;

/// Error type for all fallible operations in the toolbox.
///
/// Schema and configuration errors are fatal for a batch. The per-record
/// variants (`Unfittable`, `NoAdmissibleFit`, `DegenerateRateBounds`,
/// `Optimizer`) are carried as [`crate::analysis::RecordIssue`] values so
/// a batch can continue past them.
#[derive(Debug, thiserror::Error)]
pub enum InfiltrometerError {
    /// Required input columns are absent.
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A reading label is not of the form `MM_SS`.
    #[error("invalid reading label {0:?}, expected MM_SS")]
    InvalidLabel(String),

    /// The soil texture class has no van Genuchten row.
    #[error("no van Genuchten parameters for soil texture {0:?}")]
    UnknownTexture(String),

    /// The least-squares system could not be solved.
    #[error("infiltration fit did not converge: {0}")]
    Unfittable(String),

    /// Every admissible exclusion left C1 negative.
    #[error("no admissible fit: C1 stayed negative after {exclusions} exclusion(s)")]
    NoAdmissibleFit {
        /// Number of samples dropped before giving up.
        exclusions: usize,
    },

    /// The rate series cannot bound the Horton search.
    #[error("first rate {first_rate} cm/h is not positive, Horton bounds are degenerate")]
    DegenerateRateBounds {
        /// First observed rate [cm/h].
        first_rate: f64,
    },

    /// The particle swarm rejected its settings or failed to run.
    #[error("swarm optimizer failed: {0}")]
    Optimizer(String),

    /// No record carries the requested point identifier.
    #[error("unknown point {0:?}")]
    UnknownPoint(String),

    /// Configuration file could not be parsed.
    #[error("invalid configuration in {}: {source}", .path.display())]
    Config {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// Underlying CSV error.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, InfiltrometerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_lists_every_column() {
        let err = InfiltrometerError::MissingColumns(vec!["Sand".into(), "05_30".into()]);
        assert_eq!(err.to_string(), "missing required column(s): Sand, 05_30");
    }

    #[test]
    fn no_admissible_fit_message() {
        let err = InfiltrometerError::NoAdmissibleFit { exclusions: 3 };
        assert_eq!(
            err.to_string(),
            "no admissible fit: C1 stayed negative after 3 exclusion(s)"
        );
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<InfiltrometerError>();
    }
}
