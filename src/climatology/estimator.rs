//! climatology::estimator — per-pixel, per-calendar-month climatology fitting.
//!
//! Purpose
//! -------
//! Fit the historical "normal" distribution of each filtered series for every
//! calendar month and pixel, guarding against sparse data with a sufficiency
//! mask. One implementation serves both index families; the family only
//! changes how lane moments are turned into parameters.
//!
//! Key behaviors
//! -------------
//! - Group the timesteps of each filtered series by calendar month and stack
//!   them into a `samples × rows × cols` cube.
//! - Compute NaN-aware moments per pixel and derive:
//!   - z-score: `mean`, population `std`;
//!   - gamma: `k = mean² / var`, `theta = var / mean`, `zero_prob`.
//! - Mask (set NaN) every parameter of pixels whose
//!   `count_ratio = count_filtered / count_all` falls below the threshold.
//!
//! Invariants & assumptions
//! ------------------------
//! - `count_all` counts, per pixel, the finite raw samples of the month in
//!   the fitting window; `count_filtered` counts the finite filtered samples
//!   of the same pixel. Raw gaps therefore shrink both counts, and the ratio
//!   only measures what filtering lost (warm-up, broken windows).
//! - Gamma `k` and `theta` are NaN wherever `mean <= 0`, `var == 0` or the
//!   ratio is non-finite; infinities are never stored.
//! - Filtered series share the raw timestamps; this is checked, not assumed.
//!
//! Conventions
//! -----------
//! - The caller selects the fitting window by passing series already cut to
//!   the reference period (see `pipeline`).
//! - Aggregate masking counts are logged per `(order, month)` at `debug`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover parameter recovery on a seasonal signal, the
//!   sufficiency mask, gamma degeneracy (non-positive mean, zero variance),
//!   zero-probability estimation and the consistency checks.
use crate::climatology::{
    core::{
        options::{IndexKind, validate_threshold},
        params::{ClimatologyParams, FamilyParams, MonthlyClimatology},
        series::GriddedSeries,
        stats::{LaneMoments, lane_moments},
    },
    errors::{ClimError, ClimResult},
    filter::FilteredBank,
};
use ndarray::{Array2, Array3, ArrayView3, Axis, Zip};
use std::collections::BTreeMap;

/// Fit climatology for every filtered order and calendar month.
///
/// Parameters
/// ----------
/// - `filtered`: `&FilteredBank`
///   Filtered series per order, restricted to the fitting window.
/// - `raw`: `&GriddedSeries`
///   Raw series over the same window; its finite values per pixel give
///   `count_all`, and its timestamps must match every filtered series.
/// - `kind`: [`IndexKind`]
///   Distribution family.
/// - `threshold`: `f64`
///   Sufficiency threshold in `[0, 1]`.
///
/// Returns
/// -------
/// `ClimResult<ClimatologyParams>`
///   Entries for all 12 months of every order. Months absent from the
///   window get all-NaN parameters and zero `count_all`.
///
/// Errors
/// ------
/// - `ClimError::InvalidThreshold` for a threshold outside `[0, 1]`.
/// - `ClimError::EmptyOrders` for an empty bank.
/// - `ClimError::ShapeMismatch` when a filtered series differs in shape.
/// - `ClimError::TimestampMismatch` when a filtered series has other dates.
///
/// Notes
/// -----
/// - Per-pixel problems never fail the call; they produce NaN parameters.
pub fn fit(
    filtered: &FilteredBank, raw: &GriddedSeries, kind: IndexKind, threshold: f64,
) -> ClimResult<ClimatologyParams> {
    validate_threshold(threshold)?;
    if filtered.is_empty() {
        return Err(ClimError::EmptyOrders);
    }
    for (&order, series) in filtered {
        if series.shape() != raw.shape() {
            return Err(ClimError::ShapeMismatch {
                what: "filtered series",
                expected: raw.shape(),
                actual: series.shape(),
            });
        }
        if series.dates() != raw.dates() {
            return Err(ClimError::TimestampMismatch { order });
        }
    }

    let shape = raw.shape();
    let mut entries = BTreeMap::new();
    for (&order, series) in filtered {
        let mut months = BTreeMap::new();
        for month in 1..=12u32 {
            let indices = raw.month_indices(month);
            let entry = fit_month(series, raw, &indices, kind, threshold);
            let raw_valid: usize = entry.count_all.sum();
            if raw_valid > 0 && entry.masked == shape.0 * shape.1 {
                tracing::warn!(order, month, raw_valid, "every pixel masked");
            } else if entry.masked > 0 {
                tracing::debug!(
                    order,
                    month,
                    masked = entry.masked,
                    raw_valid,
                    "pixels below sufficiency threshold"
                );
            }
            months.insert(month, entry);
        }
        entries.insert(order, months);
    }

    let clim = ClimatologyParams::new(kind, threshold, shape, entries);
    tracing::info!(
        kind = %kind,
        orders = filtered.len(),
        timesteps = raw.len(),
        masked = clim.total_masked(),
        "fitted climatology"
    );
    Ok(clim)
}

/// Fit one `(order, month)` group from the timesteps at `indices`.
fn fit_month(
    series: &GriddedSeries, raw: &GriddedSeries, indices: &[usize], kind: IndexKind,
    threshold: f64,
) -> MonthlyClimatology {
    let samples = month_samples(series, indices);
    let moments: Array2<LaneMoments> = lane_moments(samples.view());
    let count_all = finite_counts(month_samples(raw, indices).view());

    let count_ratio = Zip::from(&moments).and(&count_all).map_collect(|m, &all| {
        if all == 0 { 0.0 } else { m.count as f64 / all as f64 }
    });

    let mut params = match kind {
        IndexKind::ZScore => FamilyParams::ZScore {
            mean: moments.mapv(|m| m.mean),
            std: moments.mapv(|m| m.std()),
        },
        IndexKind::Gamma => {
            let fitted = moments.mapv(gamma_moments);
            FamilyParams::Gamma {
                k: fitted.mapv(|(k, _)| k),
                theta: fitted.mapv(|(_, theta)| theta),
                zero_prob: moments.mapv(|m| {
                    if m.count == 0 { f64::NAN } else { m.non_positive as f64 / m.count as f64 }
                }),
            }
        }
    };

    let mut masked = 0;
    for ((row, col), &ratio) in count_ratio.indexed_iter() {
        if ratio < threshold {
            params.mask_pixel(row, col);
            masked += 1;
        }
    }

    MonthlyClimatology { params, count_ratio, count_all, masked }
}

/// Timesteps at `indices` stacked as `samples × rows × cols`.
fn month_samples(series: &GriddedSeries, indices: &[usize]) -> Array3<f64> {
    if indices.is_empty() {
        let (rows, cols) = series.shape();
        Array3::from_elem((0, rows, cols), f64::NAN)
    } else {
        series.values().select(Axis(0), indices)
    }
}

/// Finite samples per pixel along axis 0.
fn finite_counts(samples: ArrayView3<f64>) -> Array2<usize> {
    Zip::from(samples.lanes(Axis(0)))
        .map_collect(|lane| lane.iter().filter(|v| v.is_finite()).count())
}

/// Method-of-moments gamma shape and scale; `(NaN, NaN)` when degenerate.
fn gamma_moments(m: LaneMoments) -> (f64, f64) {
    if m.mean.is_nan() || m.variance.is_nan() || m.mean <= 0.0 || m.variance <= 0.0 {
        return (f64::NAN, f64::NAN);
    }
    let k = m.mean * m.mean / m.variance;
    let theta = m.variance / m.mean;
    if k.is_finite() && theta.is_finite() && k > 0.0 && theta > 0.0 {
        (k, theta)
    } else {
        (f64::NAN, f64::NAN)
    }
}
