//! Reduction of mini disk infiltrometer field measurements into soil
//! hydraulic parameters: sorptivity S, hydraulic conductivity K and the
//! Horton decay parameters (fo, fc, k).
//!
//! ```no_run
//! use infiltrometer_toolbox::{analyze, read_records, AnalysisConfig};
//!
//! let records = read_records("points.csv", b',')?;
//! let analysis = analyze(records, &AnalysisConfig::default());
//! for result in analysis.results() {
//!     println!("{}: K = {:?}", result.point, result.conductivity.map(|k| k.k));
//! }
//! # Ok::<(), infiltrometer_toolbox::InfiltrometerError>(())
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod fit;
pub mod horton;
pub mod hydraulic;
pub mod instrument;
pub mod output;
pub mod record;
pub mod repair;
pub mod schedule;
pub mod shape_factor;
pub mod texture;
pub mod van_genuchten;

pub use analysis::{
    analyze, process, Analysis, PointResult, QueryRow, RecordIssue, Status, Summary,
};
pub use config::AnalysisConfig;
pub use error::{InfiltrometerError, Result};
pub use fit::{fit_robust, least_squares, FitResult, RobustFit};
pub use horton::{fit_horton, HortonParams, SwarmConfig};
pub use hydraulic::{conductivity, sorptivity, Approximation, Conductivity};
pub use instrument::Instrument;
pub use output::{write_table, write_table_to};
pub use record::{read_records, read_records_from, InfiltrationRecord};
pub use repair::{repair, RepairedSeries};
pub use shape_factor::ShapeFactors;
pub use texture::{classify, classify_all, SoilTexture};
pub use van_genuchten::{lookup, lookup_by_name, VanGenuchtenEntry};
