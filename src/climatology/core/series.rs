//! Gridded time-series container for the drought-index engine.
//!
//! Purpose
//! -------
//! Provide a small, validated container for a stack of 2-D grids indexed by
//! calendar date. Loader collaborators build a [`GriddedSeries`] once per run
//! and every engine stage (filtering, fitting, normalizing) reads it without
//! mutation.
//!
//! Key behaviors
//! -------------
//! - [`GriddedSeries::new`] validates a `time × rows × cols` cube against its
//!   date vector (non-empty, equal lengths, strictly increasing dates).
//! - [`GriddedSeries::from_grids`] assembles the cube from individually loaded
//!   grids and rejects shape mismatches.
//! - [`GriddedSeries::between`] cuts a closed date range (the reference
//!   period used for fitting) into a new series.
//!
//! Invariants & assumptions
//! ------------------------
//! - `dates.len() == values.len_of(Axis(0)) > 0`.
//! - Dates are strictly increasing.
//! - Missing data is NaN; the container never rejects NaN or ±∞ values.
//!
//! Conventions
//! -----------
//! - Axis 0 is time, axis 1 rows, axis 2 columns.
//! - Months are 1-based as returned by [`chrono::Datelike::month`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover the construction error branches and date-range cuts.
use crate::climatology::errors::{ClimError, ClimResult};
use chrono::{Datelike, NaiveDate};
use ndarray::{Array2, Array3, ArrayView2, Axis, Slice, stack};

/// `GriddedSeries` — validated stack of grids keyed by strictly increasing
/// dates.
///
/// Fields
/// ------
/// - `dates`: `Vec<NaiveDate>`
///   Timestamps of each grid, strictly increasing.
/// - `values`: `Array3<f64>`
///   Grid cube `time × rows × cols`; NaN marks missing data.
///
/// Invariants
/// ----------
/// - `dates.len() == values.len_of(Axis(0))` and the series is non-empty.
///
/// Performance
/// -----------
/// - Validation is O(T) over the date vector; grid values are never scanned.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedSeries {
    dates: Vec<NaiveDate>,
    values: Array3<f64>,
}

impl GriddedSeries {
    /// Construct a validated series from a date vector and a grid cube.
    ///
    /// Parameters
    /// ----------
    /// - `dates`: `Vec<NaiveDate>`
    ///   One timestamp per grid; must be strictly increasing.
    /// - `values`: `Array3<f64>`
    ///   Cube `time × rows × cols`.
    ///
    /// Returns
    /// -------
    /// `ClimResult<GriddedSeries>`
    ///
    /// Errors
    /// ------
    /// - `ClimError::EmptySeries` when there are no timesteps.
    /// - `ClimError::LengthMismatch` when `dates.len()` differs from the time
    ///   axis length.
    /// - `ClimError::NonIncreasingTimestamps` at the first duplicate or
    ///   out-of-order date.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use chrono::NaiveDate;
    /// # use ndarray::Array3;
    /// # use drought_index::climatology::core::series::GriddedSeries;
    /// let dates = vec![
    ///     NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
    ///     NaiveDate::from_ymd_opt(2000, 2, 1).unwrap(),
    /// ];
    /// let series = GriddedSeries::new(dates, Array3::zeros((2, 3, 4))).unwrap();
    /// assert_eq!(series.shape(), (3, 4));
    /// ```
    pub fn new(dates: Vec<NaiveDate>, values: Array3<f64>) -> ClimResult<Self> {
        let grids = values.len_of(Axis(0));
        if dates.is_empty() || grids == 0 {
            return Err(ClimError::EmptySeries);
        }
        if dates.len() != grids {
            return Err(ClimError::LengthMismatch { dates: dates.len(), grids });
        }
        for (index, pair) in dates.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(ClimError::NonIncreasingTimestamps {
                    index: index + 1,
                    previous: pair[0],
                    current: pair[1],
                });
            }
        }

        Ok(GriddedSeries { dates, values })
    }

    /// Assemble a series from `(date, grid)` pairs as produced by a loader.
    ///
    /// Errors
    /// ------
    /// - `ClimError::EmptySeries` for an empty input.
    /// - `ClimError::ShapeMismatch` when a grid differs from the first grid's
    ///   shape.
    /// - Any error of [`GriddedSeries::new`].
    pub fn from_grids(grids: Vec<(NaiveDate, Array2<f64>)>) -> ClimResult<Self> {
        let Some((_, first)) = grids.first() else {
            return Err(ClimError::EmptySeries);
        };
        let expected = first.dim();
        for (_, grid) in &grids {
            if grid.dim() != expected {
                return Err(ClimError::ShapeMismatch {
                    what: "series grid",
                    expected,
                    actual: grid.dim(),
                });
            }
        }

        let views: Vec<ArrayView2<f64>> = grids.iter().map(|(_, g)| g.view()).collect();
        let values = stack(Axis(0), &views)
            .map_err(|e| ClimError::InvalidConfig { reason: e.to_string() })?;
        let dates = grids.iter().map(|(d, _)| *d).collect();
        GriddedSeries::new(dates, values)
    }

    /// Timestamps of the series.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Grid cube `time × rows × cols`.
    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    /// Number of timesteps.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always `false` for a constructed series; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Spatial shape `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.values.dim();
        (rows, cols)
    }

    /// Grid at timestep `index`.
    ///
    /// Panics
    /// ------
    /// - Panics if `index >= self.len()`.
    pub fn grid(&self, index: usize) -> ArrayView2<'_, f64> {
        self.values.index_axis(Axis(0), index)
    }

    /// Index of `date` in the series, if present.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Indices of all timesteps falling in calendar month `month` (1–12).
    pub fn month_indices(&self, month: u32) -> Vec<usize> {
        self.dates
            .iter()
            .enumerate()
            .filter(|(_, d)| d.month() == month)
            .map(|(i, _)| i)
            .collect()
    }

    /// Sub-series covering the closed range `[start, end]`.
    ///
    /// Errors
    /// ------
    /// - `ClimError::InvalidReferencePeriod` when `start > end`.
    /// - `ClimError::EmptyReferencePeriod` when no timestep lies in range.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> ClimResult<Self> {
        if start > end {
            return Err(ClimError::InvalidReferencePeriod { start, end });
        }
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end);
        if lo >= hi {
            return Err(ClimError::EmptyReferencePeriod { start, end });
        }

        Ok(GriddedSeries {
            dates: self.dates[lo..hi].to_vec(),
            values: self.values.slice_axis(Axis(0), Slice::from(lo..hi)).to_owned(),
        })
    }

    /// Build a series sharing these timestamps with a new cube of equal
    /// time length. Used by engine stages that derive grids from `self`.
    pub(crate) fn with_values(&self, values: Array3<f64>) -> Self {
        debug_assert_eq!(values.len_of(Axis(0)), self.dates.len());
        GriddedSeries { dates: self.dates.clone(), values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `GriddedSeries::new` error branches (empty, length mismatch,
    //   non-increasing dates).
    // - `from_grids` shape checks.
    // - Closed-range cuts via `between` and month lookups.
    // -------------------------------------------------------------------------

    fn monthly_dates(n: usize) -> Vec<NaiveDate> {
        (0..n)
            .map(|i| {
                NaiveDate::from_ymd_opt(2000 + (i / 12) as i32, (i % 12) as u32 + 1, 1).unwrap()
            })
            .collect()
    }

    #[test]
    // Purpose
    // -------
    // Ensure an empty cube is rejected.
    //
    // Given
    // -----
    // - No dates and a 0×2×2 cube.
    //
    // Expect
    // ------
    // - `Err(ClimError::EmptySeries)`.
    fn new_rejects_empty_series() {
        let result = GriddedSeries::new(Vec::new(), Array3::zeros((0, 2, 2)));

        assert_eq!(result.unwrap_err(), ClimError::EmptySeries);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a date vector shorter than the time axis is rejected.
    //
    // Given
    // -----
    // - 2 dates and a 3×2×2 cube.
    //
    // Expect
    // ------
    // - `Err(ClimError::LengthMismatch { dates: 2, grids: 3 })`.
    fn new_rejects_length_mismatch() {
        let result = GriddedSeries::new(monthly_dates(2), Array3::zeros((3, 2, 2)));

        assert_eq!(result.unwrap_err(), ClimError::LengthMismatch { dates: 2, grids: 3 });
    }

    #[test]
    // Purpose
    // -------
    // Ensure duplicate timestamps are rejected with the offending index.
    //
    // Given
    // -----
    // - Dates [Jan, Feb, Feb].
    //
    // Expect
    // ------
    // - `NonIncreasingTimestamps { index: 2, .. }`.
    fn new_rejects_duplicate_timestamps() {
        let mut dates = monthly_dates(2);
        dates.push(dates[1]);

        let result = GriddedSeries::new(dates.clone(), Array3::zeros((3, 1, 1)));

        assert_eq!(
            result.unwrap_err(),
            ClimError::NonIncreasingTimestamps { index: 2, previous: dates[1], current: dates[2] }
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify that `from_grids` rejects a grid whose shape differs from the
    // first grid.
    //
    // Given
    // -----
    // - A 2×2 grid followed by a 2×3 grid.
    //
    // Expect
    // ------
    // - `ShapeMismatch { expected: (2, 2), actual: (2, 3), .. }`.
    fn from_grids_rejects_mismatched_shapes() {
        let dates = monthly_dates(2);
        let grids = vec![(dates[0], Array2::zeros((2, 2))), (dates[1], Array2::zeros((2, 3)))];

        let result = GriddedSeries::from_grids(grids);

        assert_eq!(
            result.unwrap_err(),
            ClimError::ShapeMismatch { what: "series grid", expected: (2, 2), actual: (2, 3) }
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify that `from_grids` stacks grids in order.
    //
    // Given
    // -----
    // - Two 1×2 grids filled with 1.0 and 2.0.
    //
    // Expect
    // ------
    // - A series of length 2 whose second grid is all 2.0.
    fn from_grids_stacks_in_order() {
        let dates = monthly_dates(2);
        let grids =
            vec![(dates[0], Array2::from_elem((1, 2), 1.0)), (dates[1], Array2::from_elem((1, 2), 2.0))];

        let series = GriddedSeries::from_grids(grids).unwrap();

        assert_eq!(series.len(), 2);
        assert!(series.grid(1).iter().all(|&v| v == 2.0));
    }

    #[test]
    // Purpose
    // -------
    // Verify closed-range semantics of `between`.
    //
    // Given
    // -----
    // - 24 monthly dates starting 2000-01-01.
    // - Range 2000-03-01 ..= 2000-05-01.
    //
    // Expect
    // ------
    // - Three timesteps, first 2000-03-01, last 2000-05-01.
    fn between_selects_closed_range() {
        let dates = monthly_dates(24);
        let series = GriddedSeries::new(dates.clone(), Array3::zeros((24, 1, 1))).unwrap();

        let cut = series.between(dates[2], dates[4]).unwrap();

        assert_eq!(cut.dates(), &dates[2..=4]);
        assert_eq!(cut.values().dim(), (3, 1, 1));
    }

    #[test]
    // Purpose
    // -------
    // Ensure `between` reports empty and inverted ranges.
    //
    // Given
    // -----
    // - A series covering 2000.
    //
    // Expect
    // ------
    // - A 1990 range yields `EmptyReferencePeriod`; an inverted range yields
    //   `InvalidReferencePeriod`.
    fn between_rejects_empty_and_inverted_ranges() {
        let dates = monthly_dates(12);
        let series = GriddedSeries::new(dates.clone(), Array3::zeros((12, 1, 1))).unwrap();
        let a = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(1990, 12, 1).unwrap();

        assert_eq!(
            series.between(a, b).unwrap_err(),
            ClimError::EmptyReferencePeriod { start: a, end: b }
        );
        assert_eq!(
            series.between(dates[5], dates[1]).unwrap_err(),
            ClimError::InvalidReferencePeriod { start: dates[5], end: dates[1] }
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify month grouping and date lookup.
    //
    // Given
    // -----
    // - 24 monthly dates starting in January.
    //
    // Expect
    // ------
    // - March indices are [2, 14]; the position of the 15th date is 14.
    fn month_indices_and_position_locate_timesteps() {
        let dates = monthly_dates(24);
        let series = GriddedSeries::new(dates.clone(), Array3::zeros((24, 1, 1))).unwrap();

        assert_eq!(series.month_indices(3), vec![2, 14]);
        assert_eq!(series.position(dates[14]), Some(14));
        assert_eq!(series.position(NaiveDate::from_ymd_opt(1999, 1, 1).unwrap()), None);
    }
}
