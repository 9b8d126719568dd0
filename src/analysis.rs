/*
 * Per-record analysis pipeline and the augmented result table.
 *
 * Each record is reduced independently: repair, texture, robust fit,
 * shape factors, S and K, Horton decay and mean rate. Records can be
 * mapped on the rayon pool; results keep input order.
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

use rayon::prelude::*;
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::error::{InfiltrometerError, Result};
use crate::fit::{fit_robust, RobustFit};
use crate::horton::{fit_horton, rate_series, rate_times, HortonParams};
use crate::hydraulic::{conductivity, sorptivity, Conductivity};
use crate::record::InfiltrationRecord;
use crate::repair::{repair, RepairedSeries};
use crate::schedule::{elapsed_seconds, label_index, N_READINGS};
use crate::shape_factor::ShapeFactors;
use crate::texture::{classify, SoilTexture};
use crate::van_genuchten::{lookup, VanGenuchtenEntry};

/// Multiplier spreading the batch seed over record indices.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Why part of a record could not be computed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordIssue {
    #[error("no valid readings")]
    NoReadings,
    #[error("soil composition does not classify")]
    UnclassifiedTexture,
    #[error("{0}")]
    Fit(String),
    #[error("no water contents, sorptivity not computed")]
    MissingWaterContent,
    #[error("suction {0} cm outside the instrument range")]
    SuctionOutOfRange(f64),
    #[error("Horton fit skipped: {0}")]
    Horton(String),
    #[error("{found} readings on a {schedule}-reading schedule, extra readings ignored")]
    ExtraReadings { found: usize, schedule: usize },
}

impl Serialize for RecordIssue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Overall state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    /// S, K and Horton parameters are all available.
    Computed,
    /// Some derived values are available.
    Partial,
    /// Neither K nor Horton parameters could be derived.
    Excluded,
}

/// Everything derived from one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointResult {
    pub point: String,
    pub repair: Option<RepairedSeries>,
    pub texture: Option<SoilTexture>,
    pub soil: Option<VanGenuchtenEntry>,
    pub fit: Option<RobustFit>,
    pub factors: Option<ShapeFactors>,
    /// S [cm/s^0.5].
    pub sorptivity: Option<f64>,
    pub conductivity: Option<Conductivity>,
    pub horton: Option<HortonParams>,
    /// Mean infiltration rate over the valid readings [mL/s].
    pub mean_rate: Option<f64>,
    pub issues: Vec<RecordIssue>,
}

impl PointResult {
    fn empty(point: &str) -> Self {
        Self {
            point: point.to_string(),
            repair: None,
            texture: None,
            soil: None,
            fit: None,
            factors: None,
            sorptivity: None,
            conductivity: None,
            horton: None,
            mean_rate: None,
            issues: Vec::new(),
        }
    }

    #[must_use]
    pub fn status(&self) -> Status {
        match (self.conductivity, self.horton, self.sorptivity) {
            (Some(_), Some(_), Some(_)) => Status::Computed,
            (None, None, _) => Status::Excluded,
            _ => Status::Partial,
        }
    }
}

/// Mean rate [mL/s] between the first and last valid readings.
fn mean_rate(series: &RepairedSeries, times: &[f64]) -> Option<f64> {
    let mut valid = series.valid_pairs();
    let (i0, v0) = valid.next()?;
    let (i1, v1) = valid.last()?;
    let span = times.get(i1)? - times.get(i0)?;
    (span > 0.0).then(|| (v0 - v1) / span)
}

/// Reduce one record. Pure apart from logging; `seed` drives the Horton
/// swarm.
#[must_use]
pub fn process(record: &InfiltrationRecord, config: &AnalysisConfig, seed: u64) -> PointResult {
    let mut result = PointResult::empty(&record.point);
    let instrument = &config.instrument;
    let times = elapsed_seconds();

    if !instrument.suction_in_range(record.suction) {
        result.issues.push(RecordIssue::SuctionOutOfRange(record.suction));
    }

    result.texture = classify(record.sand, record.clay);
    result.soil = result.texture.map(|t| *lookup(t));
    if result.texture.is_none() {
        result.issues.push(RecordIssue::UnclassifiedTexture);
    }

    let mut readings = record.readings.clone();
    if readings.len() > N_READINGS {
        result.issues.push(RecordIssue::ExtraReadings {
            found: readings.len(),
            schedule: N_READINGS,
        });
    }
    // Missing trailing readings are treated like blank cells.
    readings.resize(N_READINGS, f64::NAN);

    let Some(series) = repair(&readings) else {
        result.issues.push(RecordIssue::NoReadings);
        return result;
    };
    debug!(
        point = %record.point,
        n_valid = series.n_valid(),
        truncated_at = ?series.truncated_at,
        "series repaired"
    );
    result.mean_rate = mean_rate(&series, &times);

    match fit_robust(
        &times,
        &series.values,
        &series.valid,
        instrument.disk_area(),
        config.fit.max_exclusions,
    ) {
        Ok(fit) => {
            debug!(
                point = %record.point,
                c1 = fit.fit.c1,
                c2 = fit.fit.c2,
                exclusions = fit.exclusions,
                "fit accepted"
            );
            result.fit = Some(fit);
        }
        Err(e) => result.issues.push(RecordIssue::Fit(e.to_string())),
    }

    if let (Some(fit), Some(soil)) = (&result.fit, &result.soil) {
        let theta = record
            .theta()
            .or_else(|| config.soil.theta_0.zip(config.soil.theta_i));
        if theta.is_none() {
            result.issues.push(RecordIssue::MissingWaterContent);
        }
        let factors = ShapeFactors::compute(soil, record.suction, instrument.disk_radius(), theta);
        result.sorptivity = sorptivity(&fit.fit, &factors).filter(|s| s.is_finite());
        let k = conductivity(&fit.fit, &factors);
        result.conductivity = k.k.is_finite().then_some(k);
        result.factors = Some(factors);
    }

    let rates = rate_series(&series.values, instrument.reservoir_area());
    match fit_horton(&rates, &rate_times(), &config.horton, seed) {
        Ok(h) => result.horton = Some(h),
        Err(e) => result.issues.push(RecordIssue::Horton(e.to_string())),
    }

    result.repair = Some(series);
    result
}

/// Counts over an analysed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub records: usize,
    pub fitted: usize,
    pub with_sorptivity: usize,
    pub with_conductivity: usize,
    pub with_horton: usize,
    pub excluded: usize,
}

/// One row of a query over the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRow {
    pub point: String,
    /// Record passes the query mask.
    pub included: bool,
    /// Value for included records; `None` where undefined.
    pub value: Option<f64>,
}

/// Analysed batch: repaired records and their results, in input order.
#[derive(Debug, Clone)]
pub struct Analysis {
    records: Vec<InfiltrationRecord>,
    results: Vec<PointResult>,
}

/// Analyse every record. Per-record failures are reported in
/// [`PointResult::issues`] and never stop the batch.
#[must_use]
pub fn analyze(mut records: Vec<InfiltrationRecord>, config: &AnalysisConfig) -> Analysis {
    let base_seed = config.seed.unwrap_or_else(rand::random);
    let seed_for = |index: usize| base_seed ^ (index as u64).wrapping_mul(SEED_STRIDE);

    info!(
        n_records = records.len(),
        parallel = config.parallel,
        "analysing records"
    );
    let results: Vec<PointResult> = if config.parallel {
        records
            .par_iter()
            .enumerate()
            .map(|(i, r)| process(r, config, seed_for(i)))
            .collect()
    } else {
        records
            .iter()
            .enumerate()
            .map(|(i, r)| process(r, config, seed_for(i)))
            .collect()
    };

    for (record, result) in records.iter_mut().zip(&results) {
        if let Some(series) = &result.repair {
            record.readings.clone_from(&series.values);
        }
        for issue in &result.issues {
            warn!(point = %result.point, %issue, "record issue");
        }
    }

    let analysis = Analysis { records, results };
    let summary = analysis.summary();
    info!(
        fitted = summary.fitted,
        with_conductivity = summary.with_conductivity,
        with_horton = summary.with_horton,
        excluded = summary.excluded,
        "analysis complete"
    );
    analysis
}

impl Analysis {
    /// Records with repaired reading series.
    #[must_use]
    pub fn records(&self) -> &[InfiltrationRecord] {
        &self.records
    }

    #[must_use]
    pub fn results(&self) -> &[PointResult] {
        &self.results
    }

    /// Result of the first record with this point identifier.
    #[must_use]
    pub fn get(&self, point: &str) -> Option<&PointResult> {
        self.results.iter().find(|r| r.point == point)
    }

    /// Records paired with their results.
    pub fn iter(&self) -> impl Iterator<Item = (&InfiltrationRecord, &PointResult)> {
        self.records.iter().zip(&self.results)
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        let count = |f: fn(&PointResult) -> bool| self.results.iter().filter(|r| f(r)).count();
        Summary {
            records: self.results.len(),
            fitted: count(|r| r.fit.is_some()),
            with_sorptivity: count(|r| r.sorptivity.is_some()),
            with_conductivity: count(|r| r.conductivity.is_some()),
            with_horton: count(|r| r.horton.is_some()),
            excluded: count(|r| r.status() == Status::Excluded),
        }
    }

    fn check_point(&self, point: Option<&str>) -> Result<()> {
        match point {
            Some(p) if self.get(p).is_none() => {
                Err(InfiltrometerError::UnknownPoint(p.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn query<F>(&self, point: Option<&str>, value: F) -> Result<Vec<QueryRow>>
    where
        F: Fn(&PointResult) -> Option<Option<f64>>,
    {
        self.check_point(point)?;
        Ok(self
            .results
            .iter()
            .map(|r| {
                let selected = !matches!(point, Some(p) if p != r.point);
                let v = if selected { value(r) } else { None };
                QueryRow {
                    point: r.point.clone(),
                    included: v.is_some(),
                    value: v.flatten(),
                }
            })
            .collect())
    }

    /// Cumulative infiltration I(t) [cm] at `t` seconds for every fitted
    /// record, or only `point`.
    ///
    /// # Errors
    ///
    /// [`InfiltrometerError::UnknownPoint`] if `point` matches no record.
    pub fn infiltration_at(&self, t: f64, point: Option<&str>) -> Result<Vec<QueryRow>> {
        self.query(point, |r| r.fit.as_ref().map(|f| Some(f.fit.cumulative(t))))
    }

    /// Infiltration rate dI/dt [cm/s] at `t` seconds; undefined at `t <= 0`.
    ///
    /// # Errors
    ///
    /// [`InfiltrometerError::UnknownPoint`] if `point` matches no record.
    pub fn infiltration_rate_at(&self, t: f64, point: Option<&str>) -> Result<Vec<QueryRow>> {
        self.query(point, |r| r.fit.as_ref().map(|f| f.fit.rate(t)))
    }

    /// Volume [mL] infiltrated between the first reading and `label`, on
    /// the repaired series.
    ///
    /// # Errors
    ///
    /// [`InfiltrometerError::InvalidLabel`] if `label` is not a reading of
    /// the schedule and [`InfiltrometerError::UnknownPoint`] if `point`
    /// matches no record.
    pub fn infiltrated_volume(&self, label: &str, point: Option<&str>) -> Result<Vec<QueryRow>> {
        let index =
            label_index(label).ok_or_else(|| InfiltrometerError::InvalidLabel(label.to_string()))?;
        self.query(point, |r| {
            r.repair.as_ref().map(|s| {
                let first = s.values.first()?;
                s.values.get(index).map(|v| first - v)
            })
        })
    }
}
