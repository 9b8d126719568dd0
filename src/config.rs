/*
 * Analysis configuration, read from TOML.
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

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InfiltrometerError, Result};
use crate::horton::SwarmConfig;
use crate::instrument::Instrument;
use crate::schedule::N_READINGS;

/// Top-level analysis configuration. Every field has a default, so an
/// empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Seed of the Horton swarms. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Process records on the rayon pool.
    pub parallel: bool,
    pub instrument: Instrument,
    pub fit: FitConfig,
    pub horton: SwarmConfig,
    pub soil: SoilConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            seed: None,
            parallel: true,
            instrument: Instrument::default(),
            fit: FitConfig::default(),
            horton: SwarmConfig::default(),
            soil: SoilConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitConfig {
    /// Most samples the exclusion loop may drop.
    pub max_exclusions: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_exclusions: N_READINGS - 2,
        }
    }
}

/// Fallback water contents for records that carry none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoilConfig {
    pub theta_0: Option<f64>,
    pub theta_i: Option<f64>,
}

impl AnalysisConfig {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for syntax errors, type mismatches or
    /// unknown keys.
    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// I/O errors reading `path` and [`InfiltrometerError::Config`] for
    /// invalid contents.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text).map_err(|source| InfiltrometerError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}
