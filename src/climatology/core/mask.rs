//! Geographic domain mask.
//!
//! A [`GeoMask`] restricts standardized output to the modelled domain: pixels
//! with mask value 1 are kept, pixels with value 0 are excluded. Excluded
//! pixels are always written as NaN by the normalizer, never 0, so that a
//! downstream writer cannot confuse "outside the domain" with "exactly
//! normal conditions".
use crate::climatology::errors::{ClimError, ClimResult};
use ndarray::{Array2, ArrayView2};

/// Binary domain mask (`true` = inside the domain).
#[derive(Debug, Clone, PartialEq)]
pub struct GeoMask {
    inside: Array2<bool>,
}

impl GeoMask {
    /// Build a mask from a numeric 0/1 grid as read from a raster.
    ///
    /// Errors
    /// ------
    /// - `ClimError::InvalidMaskValue` for the first pixel holding anything
    ///   other than exactly 0 or 1 (NaN included).
    pub fn from_binary(grid: ArrayView2<f64>) -> ClimResult<Self> {
        for ((row, col), &value) in grid.indexed_iter() {
            if value != 0.0 && value != 1.0 {
                return Err(ClimError::InvalidMaskValue { row, col, value });
            }
        }
        Ok(GeoMask { inside: grid.mapv(|v| v == 1.0) })
    }

    /// Build a mask directly from booleans.
    pub fn from_bools(inside: Array2<bool>) -> Self {
        GeoMask { inside }
    }

    /// Spatial shape `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.inside.dim()
    }

    /// Whether pixel `(row, col)` lies inside the domain.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.inside[[row, col]]
    }

    pub fn inside(&self) -> ArrayView2<'_, bool> {
        self.inside.view()
    }

    /// Number of pixels inside the domain.
    pub fn count_inside(&self) -> usize {
        self.inside.iter().filter(|&&b| b).count()
    }
}
