//! climatology::filter — causal multi-order moving-average filter bank.
//!
//! Purpose
//! -------
//! Aggregate a raw gridded series over trailing windows of several lengths
//! ("orders", in months) so that the climatology can be fitted and evaluated
//! at multiple timescales.
//!
//! Key behaviors
//! -------------
//! - Optionally apply the relative-deficit transform to every raw grid
//!   before any temporal filtering.
//! - For each order `n`, compute the unweighted mean of timesteps
//!   `i - n + 1 ..= i` per pixel. Outputs at `i < n - 1` are NaN.
//! - A NaN anywhere in a window makes that output NaN; partial windows are
//!   never averaged.
//! - Order 1 returns the (possibly transformed) input unchanged.
//!
//! Invariants & assumptions
//! ------------------------
//! - Strictly causal: output `i` never reads timesteps `> i`.
//! - Every filtered series shares the raw timestamps and shape.
//! - An order longer than the series yields an all-NaN series, not an error.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the constant-series property, the order-6 warm-up on
//!   an increasing series, order-1 identity, NaN propagation, orders longer
//!   than the series and the bound transform.
use crate::climatology::{
    core::{bounds::DeficitBounds, options::validate_orders, series::GriddedSeries},
    errors::ClimResult,
};
use ndarray::{Array3, ArrayView3, Axis, Slice};
use std::collections::BTreeMap;

/// Filtered series keyed by order, ascending.
pub type FilteredBank = BTreeMap<usize, GriddedSeries>;

/// Apply the filter bank to a raw series.
///
/// Parameters
/// ----------
/// - `series`: `&GriddedSeries`
///   Raw series; never mutated.
/// - `orders`: `&[usize]`
///   Window lengths; must be non-empty and positive. Duplicates collapse.
/// - `bounds`: `Option<&DeficitBounds>`
///   When present, the relative-deficit transform is applied before
///   filtering.
///
/// Returns
/// -------
/// `ClimResult<FilteredBank>`
///   One filtered series per distinct order.
///
/// Errors
/// ------
/// - `ClimError::EmptyOrders`, `ClimError::NonPositiveOrder`.
/// - `ClimError::ShapeMismatch` when `bounds` differ from the series shape.
///
/// Examples
/// --------
/// ```rust
/// # use chrono::NaiveDate;
/// # use ndarray::Array3;
/// # use drought_index::climatology::core::series::GriddedSeries;
/// # use drought_index::climatology::filter::apply;
/// let dates: Vec<NaiveDate> =
///     (1..=3).map(|m| NaiveDate::from_ymd_opt(2000, m, 1).unwrap()).collect();
/// let series = GriddedSeries::new(dates, Array3::from_elem((3, 1, 1), 2.0)).unwrap();
/// let bank = apply(&series, &[2], None).unwrap();
/// assert!(bank[&2].values()[[0, 0, 0]].is_nan());
/// assert_eq!(bank[&2].values()[[1, 0, 0]], 2.0);
/// ```
pub fn apply(
    series: &GriddedSeries, orders: &[usize], bounds: Option<&DeficitBounds>,
) -> ClimResult<FilteredBank> {
    let orders = validate_orders(orders)?;

    let base: Array3<f64> = match bounds {
        Some(b) => {
            b.check_shape(series.shape())?;
            b.apply(series.values().view())
        }
        None => series.values().clone(),
    };

    let mut bank = FilteredBank::new();
    for order in orders {
        let filtered = if order == 1 { base.clone() } else { moving_mean(base.view(), order) };
        let defined = series.len().saturating_sub(order - 1);
        tracing::debug!(order, defined, total = series.len(), "filtered series");
        bank.insert(order, series.with_values(filtered));
    }
    Ok(bank)
}

/// Trailing unweighted mean of `order` timesteps along axis 0.
///
/// The sum is accumulated without NaN skipping, so any NaN in the window
/// yields NaN. Timesteps `< order - 1` are NaN.
fn moving_mean(values: ArrayView3<f64>, order: usize) -> Array3<f64> {
    let len = values.len_of(Axis(0));
    let mut out = Array3::from_elem(values.raw_dim(), f64::NAN);
    if order > len {
        return out;
    }

    let n = order as f64;
    for i in (order - 1)..len {
        let window = values.slice_axis(Axis(0), Slice::from((i + 1 - order)..=i));
        let mean = window.sum_axis(Axis(0)) / n;
        out.index_axis_mut(Axis(0), i).assign(&mean);
    }
    out
}
