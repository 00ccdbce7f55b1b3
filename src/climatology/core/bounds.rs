//! Deficit-bound transform inputs.
//!
//! Purpose
//! -------
//! Hold the soil-water bounds (field capacity and wilting point) needed by
//! the relative-deficit variant of the index, and apply the pixel-wise
//! transform `(v - fc) / (fc - wp)` to raw grids before temporal filtering.
//!
//! Invariants & assumptions
//! ------------------------
//! - Both grids are present and share one shape; this is checked once in
//!   [`DeficitBounds::new`] and against the series in
//!   [`DeficitBounds::check_shape`].
//! - Pixels where `fc == wp` (or either bound is NaN) produce a non-finite
//!   ratio; those are written as NaN rather than ±∞.
use crate::climatology::errors::{ClimError, ClimResult};
use ndarray::{Array2, Array3, ArrayView3, Axis, Zip};

/// `DeficitBounds` — field-capacity and wilting-point grids.
///
/// Fields
/// ------
/// - `field_capacity`: `Array2<f64>`
///   Upper soil-water bound per pixel.
/// - `wilting_point`: `Array2<f64>`
///   Lower soil-water bound per pixel.
///
/// Invariants
/// ----------
/// - `field_capacity.dim() == wilting_point.dim()`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeficitBounds {
    field_capacity: Array2<f64>,
    wilting_point: Array2<f64>,
}

impl DeficitBounds {
    /// Construct bounds from grids supplied by the loader.
    ///
    /// Parameters
    /// ----------
    /// - `field_capacity`: `Option<Array2<f64>>`
    /// - `wilting_point`: `Option<Array2<f64>>`
    ///   Both are optional at the loader boundary so that a missing file can
    ///   be reported as a configuration error rather than a panic.
    ///
    /// Errors
    /// ------
    /// - `ClimError::MissingBounds` naming the first absent grid.
    /// - `ClimError::ShapeMismatch` when the two grids differ in shape.
    pub fn new(
        field_capacity: Option<Array2<f64>>, wilting_point: Option<Array2<f64>>,
    ) -> ClimResult<Self> {
        let field_capacity =
            field_capacity.ok_or(ClimError::MissingBounds { missing: "field_capacity" })?;
        let wilting_point =
            wilting_point.ok_or(ClimError::MissingBounds { missing: "wilting_point" })?;
        if field_capacity.dim() != wilting_point.dim() {
            return Err(ClimError::ShapeMismatch {
                what: "wilting_point",
                expected: field_capacity.dim(),
                actual: wilting_point.dim(),
            });
        }
        Ok(DeficitBounds { field_capacity, wilting_point })
    }

    pub fn field_capacity(&self) -> &Array2<f64> {
        &self.field_capacity
    }

    pub fn wilting_point(&self) -> &Array2<f64> {
        &self.wilting_point
    }

    /// Spatial shape `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.field_capacity.dim()
    }

    /// Check the bounds against a series shape.
    ///
    /// Errors
    /// ------
    /// - `ClimError::ShapeMismatch` when the shapes differ.
    pub fn check_shape(&self, expected: (usize, usize)) -> ClimResult<()> {
        if self.shape() != expected {
            return Err(ClimError::ShapeMismatch {
                what: "deficit bounds",
                expected,
                actual: self.shape(),
            });
        }
        Ok(())
    }

    /// Apply `(v - fc) / (fc - wp)` to every grid of a `time × rows × cols`
    /// cube, returning a new cube. Non-finite results become NaN.
    ///
    /// Callers must have checked the shape via [`check_shape`](Self::check_shape).
    pub fn apply(&self, raw: ArrayView3<f64>) -> Array3<f64> {
        let mut out = raw.to_owned();
        for mut grid in out.axis_iter_mut(Axis(0)) {
            Zip::from(&mut grid).and(&self.field_capacity).and(&self.wilting_point).for_each(
                |v, &fc, &wp| {
                    let ratio = (*v - fc) / (fc - wp);
                    *v = if ratio.is_finite() { ratio } else { f64::NAN };
                },
            );
        }
        out
    }
}
