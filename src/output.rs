/*
 * CSV export of the augmented record table.
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

use std::io;
use std::path::Path;

use csv::WriterBuilder;
use tracing::info;

use crate::analysis::{Analysis, PointResult, Status};
use crate::error::Result;
use crate::record::{
    InfiltrationRecord, ALT, CLAY, LAT, LON, POINT, SAND, SILT, SUCTION, THETA_0, THETA_I,
};
use crate::schedule::READING_LABELS;

/// Fixed columns before the reading columns.
const HEAD: [&str; 10] = [
    POINT, LAT, LON, ALT, SAND, SILT, CLAY, SUCTION, THETA_0, THETA_I,
];

/// Derived columns after the reading columns.
const TAIL: [&str; 24] = [
    "Soil Type",
    "C1",
    "C2",
    "Var C1",
    "Cov C1 C2",
    "Var C2",
    "Excluded Samples",
    "Alpha",
    "N",
    "A1",
    "A2 Zhang",
    "A2 Dohnal",
    "S",
    "K",
    "K Approximation",
    "Horton fo",
    "Horton fc",
    "Horton k",
    "Horton RMSE",
    "Mean Rate",
    "Truncated At",
    "Status",
    "Issues",
    "Valid Readings",
];

fn num(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn status(s: Status) -> &'static str {
    match s {
        Status::Computed => "computed",
        Status::Partial => "partial",
        Status::Excluded => "excluded",
    }
}

fn row(record: &InfiltrationRecord, result: &PointResult) -> Vec<String> {
    let mut out = vec![
        record.point.clone(),
        opt(record.lat),
        opt(record.lon),
        opt(record.alt),
        num(record.sand),
        num(record.silt),
        num(record.clay),
        num(record.suction),
        opt(record.theta_0),
        opt(record.theta_i),
    ];
    out.extend(record.readings.iter().map(|v| num(*v)));

    let fit = result.fit.as_ref();
    let cov = fit.map(|f| f.fit.covariance);
    let horton = result.horton.as_ref();
    let k = result.conductivity.as_ref();
    let factors = result.factors.as_ref();
    let repair = result.repair.as_ref();

    out.extend([
        opt(result.texture),
        opt(fit.map(|f| f.fit.c1)),
        opt(fit.map(|f| f.fit.c2)),
        opt(cov.map(|c| c[0][0])),
        opt(cov.map(|c| c[0][1])),
        opt(cov.map(|c| c[1][1])),
        opt(fit.map(|f| f.exclusions)),
        opt(result.soil.map(|s| s.alpha)),
        opt(result.soil.map(|s| s.n)),
        opt(factors.and_then(|f| f.a1)),
        opt(factors.map(|f| f.a2_zhang)),
        opt(factors.and_then(|f| f.a2_dohnal)),
        opt(result.sorptivity),
        opt(k.map(|k| k.k)),
        opt(k.map(|k| k.approximation)),
        opt(horton.map(|h| h.fo)),
        opt(horton.map(|h| h.fc)),
        opt(horton.map(|h| h.k)),
        opt(horton.map(|h| h.rmse)),
        opt(result.mean_rate),
        opt(repair.and_then(|r| r.truncated_at)),
        status(result.status()).to_string(),
        result
            .issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "),
        opt(repair.map(|r| r.n_valid())),
    ]);
    out
}

/// Write the table to any sink.
///
/// # Errors
///
/// CSV or I/O errors from the sink.
pub fn write_table_to<W: io::Write>(analysis: &Analysis, writer: W, delimiter: u8) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(writer);
    let header: Vec<&str> = HEAD
        .iter()
        .chain(READING_LABELS.iter())
        .chain(TAIL.iter())
        .copied()
        .collect();
    wtr.write_record(&header)?;
    for (record, result) in analysis.iter() {
        wtr.write_record(row(record, result))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the table to a CSV file.
///
/// # Errors
///
/// I/O errors creating `path` and CSV errors while writing.
pub fn write_table(analysis: &Analysis, path: impl AsRef<Path>, delimiter: u8) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    write_table_to(analysis, file, delimiter)?;
    info!(path = %path.display(), rows = analysis.results().len(), "table written");
    Ok(())
}
