//! Engine options — index family, filter orders, sufficiency threshold and
//! reference period.
//!
//! Purpose
//! -------
//! Collect the configuration knobs consumed by the drought-index engine in
//! one place, so that call sites pass explicit, validated options instead of
//! ad-hoc flags.
//!
//! Key behaviors
//! -------------
//! - [`IndexKind`] selects the distribution family (z-score or gamma) and
//!   parses from strings via `FromStr`.
//! - [`EngineConfig`] bundles filter orders, the sufficiency threshold, the
//!   index family and the deficit-bound switch. It validates itself in
//!   [`EngineConfig::new`] and can be loaded from TOML.
//! - [`ReferencePeriod`] names the historical window used for fitting and is
//!   the key under which climatology is stored.
//!
//! Invariants & assumptions
//! ------------------------
//! - Orders are positive, de-duplicated and sorted ascending after
//!   validation.
//! - The sufficiency threshold is finite and lies in `[0, 1]`.
//! - `ReferencePeriod::start <= ReferencePeriod::end`.
//!
//! Conventions
//! -----------
//! - TOML keys mirror the field names: `orders`, `sufficiency_threshold`,
//!   `index_kind` (`"zscore"` or `"gamma"`) and `deficit_bounds`. Missing
//!   keys take the documented defaults.
//!
//! Testing notes
//! -------------
//! - Unit tests cover defaults, each validation branch, `FromStr` aliases,
//!   and TOML loading including rejection of unknown index kinds.
use crate::climatology::errors::{ClimError, ClimResult};
use chrono::NaiveDate;
use serde::Deserialize;
use std::{path::Path, str::FromStr};

/// Default filter orders in months.
pub const DEFAULT_ORDERS: [usize; 4] = [1, 2, 3, 6];

/// Default minimum fraction of valid filtered samples per pixel and month.
pub const DEFAULT_SUFFICIENCY_THRESHOLD: f64 = 0.2;

/// IndexKind — distribution family used to standardize filtered values.
///
/// - `ZScore`: per-month mean and population standard deviation;
///   standardized value `(x - mean) / std`.
/// - `Gamma`: per-month gamma distribution fitted by the method of moments;
///   standardized value is the inverse normal CDF of the gamma CDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum IndexKind {
    ZScore,
    Gamma,
}

impl IndexKind {
    /// Short lowercase name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            IndexKind::ZScore => "zscore",
            IndexKind::Gamma => "gamma",
        }
    }
}

impl FromStr for IndexKind {
    type Err = ClimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zscore" | "z-score" | "z_score" => Ok(IndexKind::ZScore),
            "gamma" => Ok(IndexKind::Gamma),
            other => Err(ClimError::UnknownIndexKind { name: other.to_string() }),
        }
    }
}

impl TryFrom<String> for IndexKind {
    type Error = ClimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// EngineConfig — validated configuration of the drought-index engine.
///
/// Fields
/// ------
/// - `orders`: `Vec<usize>`
///   Filter window lengths in months; positive, sorted, unique.
/// - `sufficiency_threshold`: `f64`
///   Pixels whose valid-sample ratio falls below this value receive NaN
///   climatology.
/// - `index_kind`: [`IndexKind`]
///   Distribution family.
/// - `deficit_bounds`: `bool`
///   Whether the relative-deficit transform is applied before filtering.
///   When `true`, the pipeline requires field-capacity and wilting-point
///   grids.
///
/// Notes
/// -----
/// - Construct through [`EngineConfig::new`], [`EngineConfig::default`] or
///   the TOML loaders; all of them validate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub orders: Vec<usize>,
    pub sufficiency_threshold: f64,
    pub index_kind: IndexKind,
    pub deficit_bounds: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            orders: DEFAULT_ORDERS.to_vec(),
            sufficiency_threshold: DEFAULT_SUFFICIENCY_THRESHOLD,
            index_kind: IndexKind::ZScore,
            deficit_bounds: false,
        }
    }
}

impl EngineConfig {
    /// Construct a validated configuration.
    ///
    /// Parameters
    /// ----------
    /// - `orders`: `&[usize]`
    ///   Requested filter orders. Duplicates are collapsed and the result is
    ///   sorted ascending.
    /// - `sufficiency_threshold`: `f64`
    ///   Must be finite and in `[0, 1]`.
    /// - `index_kind`: [`IndexKind`]
    /// - `deficit_bounds`: `bool`
    ///
    /// Errors
    /// ------
    /// - `ClimError::EmptyOrders`, `ClimError::NonPositiveOrder`,
    ///   `ClimError::InvalidThreshold`.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use drought_index::climatology::core::options::{EngineConfig, IndexKind};
    /// let cfg = EngineConfig::new(&[3, 1, 3], 0.2, IndexKind::Gamma, false).unwrap();
    /// assert_eq!(cfg.orders, vec![1, 3]);
    /// ```
    pub fn new(
        orders: &[usize], sufficiency_threshold: f64, index_kind: IndexKind, deficit_bounds: bool,
    ) -> ClimResult<Self> {
        let cfg = EngineConfig {
            orders: orders.to_vec(),
            sufficiency_threshold,
            index_kind,
            deficit_bounds,
        };
        cfg.validated()
    }

    /// Parse and validate a TOML document.
    ///
    /// Errors
    /// ------
    /// - `ClimError::InvalidConfig` for TOML syntax errors, unknown keys and
    ///   unknown index kinds.
    /// - Any validation error of [`EngineConfig::new`].
    pub fn from_toml_str(text: &str) -> ClimResult<Self> {
        let cfg: EngineConfig =
            toml::from_str(text).map_err(|e| ClimError::InvalidConfig { reason: e.to_string() })?;
        cfg.validated()
    }

    /// Read, parse and validate a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> ClimResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ClimError::InvalidConfig {
            reason: format!("cannot read {}: {e}", path.display()),
        })?;
        EngineConfig::from_toml_str(&text)
    }

    fn validated(mut self) -> ClimResult<Self> {
        self.orders = validate_orders(&self.orders)?;
        validate_threshold(self.sufficiency_threshold)?;
        Ok(self)
    }
}

/// Check filter orders and return them sorted and de-duplicated.
///
/// Errors
/// ------
/// - `ClimError::EmptyOrders` for an empty slice.
/// - `ClimError::NonPositiveOrder` for a zero order.
pub fn validate_orders(orders: &[usize]) -> ClimResult<Vec<usize>> {
    if orders.is_empty() {
        return Err(ClimError::EmptyOrders);
    }
    if let Some(&order) = orders.iter().find(|&&o| o == 0) {
        return Err(ClimError::NonPositiveOrder { order });
    }
    let mut out = orders.to_vec();
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

/// Check that a sufficiency threshold is finite and in `[0, 1]`.
pub fn validate_threshold(value: f64) -> ClimResult<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ClimError::InvalidThreshold { value });
    }
    Ok(())
}

/// ReferencePeriod — closed date range of the historical fitting window.
///
/// Invariants
/// ----------
/// - `start <= end`, enforced by [`ReferencePeriod::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferencePeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl ReferencePeriod {
    /// Errors
    /// ------
    /// - `ClimError::InvalidReferencePeriod` when `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> ClimResult<Self> {
        if start > end {
            return Err(ClimError::InvalidReferencePeriod { start, end });
        }
        Ok(ReferencePeriod { start, end })
    }

    /// Whole calendar years `first_year ..= last_year`.
    pub fn years(first_year: i32, last_year: i32) -> ClimResult<Self> {
        let bad = || ClimError::InvalidConfig {
            reason: format!("invalid reference years {first_year}..={last_year}"),
        };
        let start = NaiveDate::from_ymd_opt(first_year, 1, 1).ok_or_else(bad)?;
        let end = NaiveDate::from_ymd_opt(last_year, 12, 31).ok_or_else(bad)?;
        ReferencePeriod::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl std::fmt::Display for ReferencePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Defaults and normalization of `EngineConfig`.
    // - Each validation branch (empty orders, zero order, bad threshold).
    // - `IndexKind` parsing and TOML loading.
    // - `ReferencePeriod` construction.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify the documented defaults.
    //
    // Given
    // -----
    // - `EngineConfig::default()`.
    //
    // Expect
    // ------
    // - orders [1, 2, 3, 6], threshold 0.2, z-score, no deficit bounds.
    fn default_config_matches_documented_values() {
        let cfg = EngineConfig::default();

        assert_eq!(cfg.orders, vec![1, 2, 3, 6]);
        assert_eq!(cfg.sufficiency_threshold, 0.2);
        assert_eq!(cfg.index_kind, IndexKind::ZScore);
        assert!(!cfg.deficit_bounds);
    }

    #[test]
    // Purpose
    // -------
    // Ensure zero and empty order sets are rejected.
    //
    // Given
    // -----
    // - orders [1, 0] and [].
    //
    // Expect
    // ------
    // - `NonPositiveOrder { order: 0 }` and `EmptyOrders`.
    fn new_rejects_invalid_orders() {
        assert_eq!(
            EngineConfig::new(&[1, 0], 0.2, IndexKind::ZScore, false).unwrap_err(),
            ClimError::NonPositiveOrder { order: 0 }
        );
        assert_eq!(
            EngineConfig::new(&[], 0.2, IndexKind::ZScore, false).unwrap_err(),
            ClimError::EmptyOrders
        );
    }

    #[test]
    // Purpose
    // -------
    // Ensure thresholds outside [0, 1] and NaN are rejected.
    //
    // Given
    // -----
    // - thresholds 1.5, -0.1, NaN.
    //
    // Expect
    // ------
    // - `InvalidThreshold` for each.
    fn new_rejects_out_of_range_threshold() {
        for value in [1.5, -0.1, f64::NAN] {
            match EngineConfig::new(&[1], value, IndexKind::ZScore, false) {
                Err(ClimError::InvalidThreshold { .. }) => (),
                other => panic!("expected InvalidThreshold for {value}, got {other:?}"),
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify `IndexKind` parsing aliases and rejection of unknown names.
    //
    // Given
    // -----
    // - "Z-Score", "gamma", "weibull".
    //
    // Expect
    // ------
    // - ZScore, Gamma, `UnknownIndexKind`.
    fn index_kind_parses_aliases() {
        assert_eq!("Z-Score".parse::<IndexKind>().unwrap(), IndexKind::ZScore);
        assert_eq!("gamma".parse::<IndexKind>().unwrap(), IndexKind::Gamma);
        assert_eq!(
            "weibull".parse::<IndexKind>().unwrap_err(),
            ClimError::UnknownIndexKind { name: "weibull".to_string() }
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify TOML loading with partial keys falls back to defaults.
    //
    // Given
    // -----
    // - A document setting only index_kind and orders.
    //
    // Expect
    // ------
    // - Gamma family, orders sorted, default threshold.
    fn from_toml_str_fills_defaults() {
        let text = "index_kind = \"gamma\"\norders = [6, 1, 3]\n";

        let cfg = EngineConfig::from_toml_str(text).unwrap();

        assert_eq!(cfg.index_kind, IndexKind::Gamma);
        assert_eq!(cfg.orders, vec![1, 3, 6]);
        assert_eq!(cfg.sufficiency_threshold, DEFAULT_SUFFICIENCY_THRESHOLD);
    }

    #[test]
    // Purpose
    // -------
    // Ensure an unknown index kind in TOML is a configuration error.
    //
    // Given
    // -----
    // - index_kind = "pearson3".
    //
    // Expect
    // ------
    // - `InvalidConfig` whose reason mentions the rejected name.
    fn from_toml_str_rejects_unknown_index_kind() {
        match EngineConfig::from_toml_str("index_kind = \"pearson3\"") {
            Err(ClimError::InvalidConfig { reason }) => assert!(reason.contains("pearson3")),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure validation also runs on TOML input.
    //
    // Given
    // -----
    // - orders = [0].
    //
    // Expect
    // ------
    // - `NonPositiveOrder { order: 0 }`.
    fn from_toml_str_validates_orders() {
        assert_eq!(
            EngineConfig::from_toml_str("orders = [0]").unwrap_err(),
            ClimError::NonPositiveOrder { order: 0 }
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify year-based reference periods and inverted-range rejection.
    //
    // Given
    // -----
    // - years 1991..=2020 and 2020..=1991.
    //
    // Expect
    // ------
    // - 1991-01-01 ..= 2020-12-31; inverted range is an error.
    fn reference_period_years_covers_whole_years() {
        let period = ReferencePeriod::years(1991, 2020).unwrap();

        assert_eq!(period.start(), NaiveDate::from_ymd_opt(1991, 1, 1).unwrap());
        assert_eq!(period.end(), NaiveDate::from_ymd_opt(2020, 12, 31).unwrap());
        assert!(matches!(
            ReferencePeriod::years(2020, 1991),
            Err(ClimError::InvalidReferencePeriod { .. })
        ));
    }
}
