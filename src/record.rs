/*
 * Infiltrometer field records and their CSV ingestion.
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

use std::collections::HashMap;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{InfiltrometerError, Result};
use crate::repair::coerce;
use crate::schedule::{elapsed, N_READINGS, READING_LABELS};

pub const POINT: &str = "Point";
pub const SAND: &str = "Sand";
pub const SILT: &str = "Silt";
pub const CLAY: &str = "Clay";
pub const SUCTION: &str = "Suction";
pub const LAT: &str = "Lat";
pub const LON: &str = "Lon";
pub const ALT: &str = "Alt";
pub const THETA_0: &str = "Theta 0";
pub const THETA_I: &str = "Theta I";

/// One measurement point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfiltrationRecord {
    pub point: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt: Option<f64>,
    /// Composition [%]; NaN when missing.
    pub sand: f64,
    pub silt: f64,
    pub clay: f64,
    /// Suction head h0 [cm].
    pub suction: f64,
    /// Volumetric water content at the end of the run.
    pub theta_0: Option<f64>,
    /// Volumetric water content before the run.
    pub theta_i: Option<f64>,
    /// Reservoir volume [mL] at each reading label; NaN when missing.
    pub readings: Vec<f64>,
}

impl InfiltrationRecord {
    /// Record with the mandatory fields; optional ones unset.
    #[must_use]
    pub fn new(
        point: &str,
        sand: f64,
        silt: f64,
        clay: f64,
        suction: f64,
        readings: Vec<f64>,
    ) -> Self {
        Self {
            point: point.to_string(),
            lat: None,
            lon: None,
            alt: None,
            sand,
            silt,
            clay,
            suction,
            theta_0: None,
            theta_i: None,
            readings,
        }
    }

    /// (θ0, θi) when both are known.
    #[must_use]
    pub fn theta(&self) -> Option<(f64, f64)> {
        self.theta_0.zip(self.theta_i)
    }
}

fn optional(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Lookup key of a header: reading labels become their `MM_SS` form, so
/// `5:30` and `05_30` name the same column. Other headers are trimmed.
fn header_key(header: &str) -> String {
    match elapsed(header) {
        Ok(t) => format!("{:02}_{:02}", t.num_minutes(), t.num_seconds() % 60),
        Err(_) => header.trim().to_string(),
    }
}

/// Positions of the known columns in a header row.
struct Columns {
    point: usize,
    sand: usize,
    silt: usize,
    clay: usize,
    suction: usize,
    readings: [usize; N_READINGS],
    lat: Option<usize>,
    lon: Option<usize>,
    alt: Option<usize>,
    theta_0: Option<usize>,
    theta_i: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (header_key(h), i))
            .collect();

        let mut missing = Vec::new();
        let mut required = |name: &str| -> usize {
            index.get(name).copied().unwrap_or_else(|| {
                missing.push(name.to_string());
                0
            })
        };

        let point = required(POINT);
        let readings = READING_LABELS.map(&mut required);
        let sand = required(SAND);
        let silt = required(SILT);
        let clay = required(CLAY);
        let suction = required(SUCTION);

        if !missing.is_empty() {
            return Err(InfiltrometerError::MissingColumns(missing));
        }

        Ok(Self {
            point,
            sand,
            silt,
            clay,
            suction,
            readings,
            lat: index.get(LAT).copied(),
            lon: index.get(LON).copied(),
            alt: index.get(ALT).copied(),
            theta_0: index.get(THETA_0).copied(),
            theta_i: index.get(THETA_I).copied(),
        })
    }

    fn parse(&self, row: &StringRecord) -> InfiltrationRecord {
        let cell = |i: usize| row.get(i).map_or(f64::NAN, coerce);
        let optional_cell = |i: Option<usize>| i.map(cell).and_then(optional);

        InfiltrationRecord {
            point: row.get(self.point).unwrap_or_default().trim().to_string(),
            lat: optional_cell(self.lat),
            lon: optional_cell(self.lon),
            alt: optional_cell(self.alt),
            sand: cell(self.sand),
            silt: cell(self.silt),
            clay: cell(self.clay),
            suction: cell(self.suction),
            theta_0: optional_cell(self.theta_0),
            theta_i: optional_cell(self.theta_i),
            readings: self.readings.iter().map(|&i| cell(i)).collect(),
        }
    }
}

/// Read records from any CSV source with a header row.
///
/// # Errors
///
/// [`InfiltrometerError::MissingColumns`] before any row is read if a
/// required column is absent, or a CSV error for malformed rows.
pub fn read_records_from<R: io::Read>(
    reader: R,
    delimiter: u8,
) -> Result<Vec<InfiltrationRecord>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut out = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let record = columns.parse(&row);
        debug!(point = %record.point, "record read");
        out.push(record);
    }
    Ok(out)
}

/// Read records from a CSV file.
///
/// # Errors
///
/// I/O errors opening `path`, plus everything [`read_records_from`] reports.
pub fn read_records(path: impl AsRef<Path>, delimiter: u8) -> Result<Vec<InfiltrationRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let records = read_records_from(file, delimiter)?;
    info!(path = %path.display(), n_records = records.len(), "records loaded");
    Ok(records)
}
