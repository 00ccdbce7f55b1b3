//! Fitted climatology — per-order, per-month, per-pixel parameter grids.
//!
//! Purpose
//! -------
//! Represent the immutable result of fitting climatology on a reference
//! period: for each filter order and calendar month, a set of parameter grids
//! of one distribution family plus the sufficiency diagnostics that produced
//! the NaN mask.
//!
//! Key behaviors
//! -------------
//! - [`FamilyParams`] is the tagged variant holding either z-score grids
//!   (`mean`, `std`) or gamma grids (`k`, `theta`, `zero_prob`).
//! - [`MonthlyClimatology`] adds `count_ratio`, `count_all` and the number of
//!   masked pixels to the family parameters.
//! - [`ClimatologyParams`] maps `order → month → MonthlyClimatology` and is
//!   only built bottom-up by the estimator; it exposes no mutating methods.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every grid of one [`MonthlyClimatology`] shares the series shape.
//! - All parameters are NaN wherever `count_ratio < threshold`.
//! - Gamma `k` and `theta` are either NaN or finite and strictly positive.
//! - All entries of one [`ClimatologyParams`] use the same family.
//!
//! Conventions
//! -----------
//! - Months are 1-based.
//! - Parameter grids are `rows × cols` `Array2<f64>`.
use crate::climatology::{
    core::options::IndexKind,
    errors::{ClimError, ClimResult},
};
use ndarray::Array2;
use std::collections::BTreeMap;

/// FamilyParams — per-pixel parameters of one distribution family.
///
/// Variants
/// --------
/// - `ZScore { mean, std }`
///   NaN-ignoring mean and population standard deviation.
/// - `Gamma { k, theta, zero_prob }`
///   Method-of-moments shape and scale, and the fraction of valid samples
///   `<= 0` used for the zero-mass adjustment.
#[derive(Debug, Clone, PartialEq)]
pub enum FamilyParams {
    ZScore { mean: Array2<f64>, std: Array2<f64> },
    Gamma { k: Array2<f64>, theta: Array2<f64>, zero_prob: Array2<f64> },
}

impl FamilyParams {
    /// Family of these parameters.
    pub fn kind(&self) -> IndexKind {
        match self {
            FamilyParams::ZScore { .. } => IndexKind::ZScore,
            FamilyParams::Gamma { .. } => IndexKind::Gamma,
        }
    }

    /// Spatial shape of the parameter grids.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            FamilyParams::ZScore { mean, .. } => mean.dim(),
            FamilyParams::Gamma { k, .. } => k.dim(),
        }
    }

    /// Common shape of every parameter grid.
    ///
    /// Errors
    /// ------
    /// - `ClimError::ShapeMismatch` naming the first grid that differs from
    ///   the leading one (`mean` or `k`).
    pub fn checked_shape(&self) -> ClimResult<(usize, usize)> {
        let expected = self.shape();
        let grids: Vec<(&'static str, &Array2<f64>)> = match self {
            FamilyParams::ZScore { std, .. } => vec![("std", std)],
            FamilyParams::Gamma { theta, zero_prob, .. } => {
                vec![("theta", theta), ("zero_prob", zero_prob)]
            }
        };
        for (what, grid) in grids {
            if grid.dim() != expected {
                return Err(ClimError::ShapeMismatch { what, expected, actual: grid.dim() });
            }
        }
        Ok(expected)
    }

    /// Set every parameter at `(row, col)` to NaN.
    pub(crate) fn mask_pixel(&mut self, row: usize, col: usize) {
        match self {
            FamilyParams::ZScore { mean, std } => {
                mean[[row, col]] = f64::NAN;
                std[[row, col]] = f64::NAN;
            }
            FamilyParams::Gamma { k, theta, zero_prob } => {
                k[[row, col]] = f64::NAN;
                theta[[row, col]] = f64::NAN;
                zero_prob[[row, col]] = f64::NAN;
            }
        }
    }

    /// Whether every parameter at `(row, col)` is usable.
    pub fn is_valid_at(&self, row: usize, col: usize) -> bool {
        match self {
            FamilyParams::ZScore { mean, std } => {
                mean[[row, col]].is_finite() && std[[row, col]].is_finite()
            }
            FamilyParams::Gamma { k, theta, .. } => {
                k[[row, col]].is_finite() && theta[[row, col]].is_finite()
            }
        }
    }
}

/// MonthlyClimatology — climatology of one `(order, month)` group.
///
/// Fields
/// ------
/// - `params`: [`FamilyParams`]
/// - `count_ratio`: `Array2<f64>`
///   Valid filtered samples divided by `count_all`, per pixel; 0 where
///   `count_all` is 0.
/// - `count_all`: `Array2<usize>`
///   Valid (finite) raw samples of this calendar month in the window, per
///   pixel.
/// - `masked`: `usize`
///   Pixels masked because `count_ratio < threshold`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyClimatology {
    pub params: FamilyParams,
    pub count_ratio: Array2<f64>,
    pub count_all: Array2<usize>,
    pub masked: usize,
}

impl MonthlyClimatology {
    /// Family of this entry.
    pub fn kind(&self) -> IndexKind {
        self.params.kind()
    }

    /// Spatial shape of the parameter grids.
    pub fn shape(&self) -> (usize, usize) {
        self.params.shape()
    }
}

/// ClimatologyParams — `order → month → MonthlyClimatology`.
///
/// Fields
/// ------
/// - `kind`: [`IndexKind`]
///   Family shared by every entry.
/// - `threshold`: `f64`
///   Sufficiency threshold used when fitting.
/// - `shape`: `(usize, usize)`
///   Spatial shape of every parameter grid.
/// - `entries`: `BTreeMap<usize, BTreeMap<u32, MonthlyClimatology>>`
///
/// Notes
/// -----
/// - Built once by [`fit`](crate::climatology::estimator::fit) and shared as
///   `Arc<ClimatologyParams>`; a refit produces a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimatologyParams {
    kind: IndexKind,
    threshold: f64,
    shape: (usize, usize),
    entries: BTreeMap<usize, BTreeMap<u32, MonthlyClimatology>>,
}

impl ClimatologyParams {
    pub(crate) fn new(
        kind: IndexKind, threshold: f64, shape: (usize, usize),
        entries: BTreeMap<usize, BTreeMap<u32, MonthlyClimatology>>,
    ) -> Self {
        ClimatologyParams { kind, threshold, shape, entries }
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Fitted orders in ascending order.
    pub fn orders(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }

    /// Entry for `(order, month)`, if fitted.
    pub fn entry(&self, order: usize, month: u32) -> Option<&MonthlyClimatology> {
        self.entries.get(&order).and_then(|months| months.get(&month))
    }

    /// All months of one order.
    pub fn months(&self, order: usize) -> Option<&BTreeMap<u32, MonthlyClimatology>> {
        self.entries.get(&order)
    }

    /// Total number of masked pixels over all `(order, month)` groups.
    pub fn total_masked(&self) -> usize {
        self.entries.values().flat_map(|m| m.values()).map(|e| e.masked).sum()
    }
}
