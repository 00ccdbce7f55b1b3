//! climatology::normalize — standardize filtered grids against climatology.
//!
//! Purpose
//! -------
//! Turn one filtered grid and the climatology entry of its `(order, month)`
//! into a standardized index grid.
//!
//! Key behaviors
//! -------------
//! - z-score family: `(x - mean) / std`.
//! - gamma family: `H(x) = q + (1 - q) · G(x; k, theta)` with `q` the fitted
//!   zero probability and `G = 0` for `x <= 0`; the index is `Φ⁻¹(H)`,
//!   clamped to `[-INDEX_BOUND, INDEX_BOUND]`.
//! - Pixels outside an optional [`GeoMask`] are NaN.
//!
//! Invariants & assumptions
//! ------------------------
//! - Never divides by zero and never returns ±∞: `std <= 0`, non-finite
//!   parameters, invalid gamma parameters and non-finite inputs all yield
//!   NaN.
//! - Masked-out pixels are NaN, never 0.
//! - Inputs are not mutated; the result is a new grid.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the zero-at-mean property, zero-std handling, the
//!   gamma median mapping to 0, the zero-mass adjustment, clamping, invalid
//!   gamma parameters, quadrant masking and the consistency checks.
use crate::climatology::{
    core::{
        mask::GeoMask,
        options::IndexKind,
        params::{FamilyParams, MonthlyClimatology},
    },
    errors::{ClimError, ClimResult},
};
use ndarray::{Array2, ArrayView2, Zip};
use statrs::distribution::{ContinuousCDF, Gamma, Normal};

/// Absolute bound of gamma-family index values.
pub const INDEX_BOUND: f64 = 3.09;

/// Smallest probability passed to the inverse normal CDF.
const PROB_FLOOR: f64 = 1e-12;

/// Standardize one filtered grid.
///
/// Parameters
/// ----------
/// - `filtered`: `ArrayView2<f64>`
///   Filtered values at one evaluation timestep.
/// - `entry`: `&MonthlyClimatology`
///   Climatology for the grid's order and calendar month.
/// - `kind`: [`IndexKind`]
///   Requested family; must match the entry.
/// - `mask`: `Option<&GeoMask>`
///   Optional domain mask; excluded pixels are NaN.
///
/// Returns
/// -------
/// `ClimResult<Array2<f64>>`
///   Standardized grid of the input shape.
///
/// Errors
/// ------
/// - `ClimError::FamilyMismatch` when `kind` differs from the entry family.
/// - `ClimError::ShapeMismatch` when the entry's parameter grids disagree
///   with each other, or when the entry or mask shape differs from
///   `filtered`.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use drought_index::climatology::core::options::IndexKind;
/// # use drought_index::climatology::core::params::{FamilyParams, MonthlyClimatology};
/// # use drought_index::climatology::normalize::normalize;
/// let entry = MonthlyClimatology {
///     params: FamilyParams::ZScore { mean: array![[2.0]], std: array![[0.5]] },
///     count_ratio: array![[1.0]],
///     count_all: array![[10]],
///     masked: 0,
/// };
/// let out = normalize(array![[3.0]].view(), &entry, IndexKind::ZScore, None).unwrap();
/// assert_eq!(out[[0, 0]], 2.0);
/// ```
pub fn normalize(
    filtered: ArrayView2<f64>, entry: &MonthlyClimatology, kind: IndexKind,
    mask: Option<&GeoMask>,
) -> ClimResult<Array2<f64>> {
    if entry.kind() != kind {
        return Err(ClimError::FamilyMismatch { expected: kind.name(), actual: entry.kind().name() });
    }
    let shape = filtered.dim();
    let params_shape = entry.params.checked_shape()?;
    if params_shape != shape {
        return Err(ClimError::ShapeMismatch {
            what: "climatology entry",
            expected: shape,
            actual: params_shape,
        });
    }
    if let Some(m) = mask {
        if m.shape() != shape {
            return Err(ClimError::ShapeMismatch { what: "geo mask", expected: shape, actual: m.shape() });
        }
    }

    let mut out = match &entry.params {
        FamilyParams::ZScore { mean, std } => {
            Zip::from(&filtered).and(mean).and(std).map_collect(|&x, &mu, &sd| zscore_value(x, mu, sd))
        }
        FamilyParams::Gamma { k, theta, zero_prob } => {
            let normal = standard_normal()?;
            Zip::from(&filtered)
                .and(k)
                .and(theta)
                .and(zero_prob)
                .map_collect(|&x, &k, &theta, &q| gamma_value(x, k, theta, q, &normal))
        }
    };

    if let Some(m) = mask {
        Zip::from(&mut out).and(m.inside()).for_each(|v, &inside| {
            if !inside {
                *v = f64::NAN;
            }
        });
    }
    Ok(out)
}

fn standard_normal() -> ClimResult<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| ClimError::InvalidConfig { reason: e.to_string() })
}

/// `(x - mean) / std`, NaN unless all inputs are finite and `std > 0`.
pub fn zscore_value(x: f64, mean: f64, std: f64) -> f64 {
    if !(x.is_finite() && mean.is_finite() && std.is_finite()) || std <= 0.0 {
        return f64::NAN;
    }
    (x - mean) / std
}

/// Inverse-normal transform of the zero-adjusted gamma CDF.
///
/// NaN when `x` is not finite, when `k`/`theta` are not finite and
/// positive, or when `zero_prob` is not a probability.
pub fn gamma_value(x: f64, k: f64, theta: f64, zero_prob: f64, normal: &Normal) -> f64 {
    if !x.is_finite() || !(0.0..=1.0).contains(&zero_prob) {
        return f64::NAN;
    }
    if !(k.is_finite() && theta.is_finite() && k > 0.0 && theta > 0.0) {
        return f64::NAN;
    }
    let Ok(gamma) = Gamma::new(k, 1.0 / theta) else {
        return f64::NAN;
    };

    let g = if x <= 0.0 { 0.0 } else { gamma.cdf(x) };
    let h = zero_prob + (1.0 - zero_prob) * g;
    if !h.is_finite() {
        return f64::NAN;
    }
    let z = normal.inverse_cdf(h.clamp(PROB_FLOOR, 1.0 - PROB_FLOOR));
    z.clamp(-INDEX_BOUND, INDEX_BOUND)
}
