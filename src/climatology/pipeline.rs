//! climatology::pipeline — filter → fit → normalize orchestration.
//!
//! Purpose
//! -------
//! Tie the engine stages together for one configured run. Calibration fits a
//! climatology on a reference period and publishes it to a
//! [`ClimatologyStore`]; evaluation loads it back and produces standardized
//! grids for the requested dates at every configured order.
//!
//! Key behaviors
//! -------------
//! - [`IndexPipeline::new`] validates the configuration before any work,
//!   including the requirement that the deficit variant carries bounds.
//! - [`IndexPipeline::calibrate`] filters the *full* series so early
//!   reference-period months see their prior history, then cuts the filtered
//!   and raw series to the period before fitting.
//! - [`IndexPipeline::evaluate`] never fits; a missing climatology is an
//!   error.
//!
//! Invariants & assumptions
//! ------------------------
//! - Fitted parameters are shared as `Arc<ClimatologyParams>` and never
//!   mutated; a refit replaces the stored `Arc` wholesale.
//! - A fatal error aborts the call with no partial result.
//!
//! Testing notes
//! -------------
//! - Unit tests cover store round-trips, configuration checks and the
//!   error branches of `evaluate`. End-to-end scenarios live in
//!   `tests/integration_drought_pipeline.rs`.
use crate::climatology::{
    core::{
        bounds::DeficitBounds,
        mask::GeoMask,
        options::{EngineConfig, ReferencePeriod, validate_orders, validate_threshold},
        params::ClimatologyParams,
        series::GriddedSeries,
    },
    errors::{ClimError, ClimResult},
    estimator::fit,
    filter,
    normalize::normalize,
};
use chrono::{Datelike, NaiveDate};
use ndarray::Array2;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

/// Persistence seam for fitted climatologies, keyed by reference period.
pub trait ClimatologyStore {
    /// Publish `params` for `period`, replacing any previous value.
    fn save(&mut self, period: ReferencePeriod, params: Arc<ClimatologyParams>) -> ClimResult<()>;

    /// Fetch the climatology for `period`; `Ok(None)` when never saved.
    fn load(&self, period: &ReferencePeriod) -> ClimResult<Option<Arc<ClimatologyParams>>>;
}

/// Process-local store backed by a `HashMap`.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    entries: HashMap<ReferencePeriod, Arc<ClimatologyParams>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ClimatologyStore for InMemoryStore {
    fn save(&mut self, period: ReferencePeriod, params: Arc<ClimatologyParams>) -> ClimResult<()> {
        self.entries.insert(period, params);
        Ok(())
    }

    fn load(&self, period: &ReferencePeriod) -> ClimResult<Option<Arc<ClimatologyParams>>> {
        Ok(self.entries.get(period).cloned())
    }
}

/// StandardizedIndex — standardized grids keyed by `(order, date)`.
///
/// Iteration is ascending by order, then by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardizedIndex {
    grids: BTreeMap<(usize, NaiveDate), Array2<f64>>,
}

impl StandardizedIndex {
    pub fn get(&self, order: usize, date: NaiveDate) -> Option<&Array2<f64>> {
        self.grids.get(&(order, date))
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(usize, NaiveDate), &Array2<f64>)> {
        self.grids.iter()
    }

    pub fn into_inner(self) -> BTreeMap<(usize, NaiveDate), Array2<f64>> {
        self.grids
    }
}

/// IndexPipeline — configured engine run over one store.
///
/// Fields
/// ------
/// - `config`: [`EngineConfig`], validated at construction.
/// - `bounds`: `Option<DeficitBounds>`, present iff `config.deficit_bounds`.
/// - `store`: the [`ClimatologyStore`] holding fitted climatologies.
#[derive(Debug)]
pub struct IndexPipeline<S: ClimatologyStore> {
    config: EngineConfig,
    bounds: Option<DeficitBounds>,
    store: S,
}

impl<S: ClimatologyStore> IndexPipeline<S> {
    /// Validate the configuration and build a pipeline.
    ///
    /// Errors
    /// ------
    /// - `ClimError::EmptyOrders`, `ClimError::NonPositiveOrder`,
    ///   `ClimError::InvalidThreshold`.
    /// - `ClimError::MissingBounds` when `config.deficit_bounds` is set and
    ///   `bounds` is `None`.
    ///
    /// Notes
    /// -----
    /// - Bounds supplied without `deficit_bounds` are ignored.
    pub fn new(
        mut config: EngineConfig, bounds: Option<DeficitBounds>, store: S,
    ) -> ClimResult<Self> {
        config.orders = validate_orders(&config.orders)?;
        validate_threshold(config.sufficiency_threshold)?;
        let bounds = match (config.deficit_bounds, bounds) {
            (true, None) => return Err(ClimError::MissingBounds { missing: "field_capacity" }),
            (true, b) => b,
            (false, _) => None,
        };
        Ok(IndexPipeline { config, bounds, store })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Fit the climatology on `period` and publish it to the store.
    ///
    /// Errors
    /// ------
    /// - `ClimError::EmptyReferencePeriod` when no timestep lies in `period`.
    /// - Filter and fit errors, and store failures.
    pub fn calibrate(
        &mut self, series: &GriddedSeries, period: ReferencePeriod,
    ) -> ClimResult<Arc<ClimatologyParams>> {
        let bank = filter::apply(series, &self.config.orders, self.bounds.as_ref())?;
        let raw = series.between(period.start(), period.end())?;
        let reference = bank
            .iter()
            .map(|(&order, s)| -> ClimResult<(usize, GriddedSeries)> {
                Ok((order, s.between(period.start(), period.end())?))
            })
            .collect::<ClimResult<filter::FilteredBank>>()?;

        let params = Arc::new(fit(
            &reference,
            &raw,
            self.config.index_kind,
            self.config.sufficiency_threshold,
        )?);
        self.store.save(period, Arc::clone(&params))?;
        tracing::info!(%period, timesteps = raw.len(), "calibrated climatology");
        Ok(params)
    }

    /// Standardize `dates` of `series` against the stored climatology.
    ///
    /// Errors
    /// ------
    /// - `ClimError::StoreFailure` when nothing is stored for `period`.
    /// - `ClimError::DateNotInSeries` for a date absent from `series`.
    /// - `ClimError::MissingOrder` / `ClimError::MissingClimatology` when the
    ///   stored climatology lacks an order or month.
    /// - Shape or family mismatches from [`normalize`].
    pub fn evaluate(
        &self, series: &GriddedSeries, dates: &[NaiveDate], period: ReferencePeriod,
        mask: Option<&GeoMask>,
    ) -> ClimResult<StandardizedIndex> {
        let params = self.store.load(&period)?.ok_or_else(|| ClimError::StoreFailure {
            reason: format!("no climatology stored for {period}"),
        })?;
        let positions = dates
            .iter()
            .map(|&date| series.position(date).ok_or(ClimError::DateNotInSeries { date }))
            .collect::<ClimResult<Vec<_>>>()?;

        let bank = filter::apply(series, &self.config.orders, self.bounds.as_ref())?;
        let mut grids = BTreeMap::new();
        for (&order, filtered) in &bank {
            if params.months(order).is_none() {
                return Err(ClimError::MissingOrder { order });
            }
            for (&date, &i) in dates.iter().zip(&positions) {
                let month = date.month();
                let entry =
                    params.entry(order, month).ok_or(ClimError::MissingClimatology { order, month })?;
                let grid = normalize(filtered.grid(i), entry, self.config.index_kind, mask)?;
                grids.insert((order, date), grid);
            }
        }

        tracing::debug!(%period, dates = dates.len(), grids = grids.len(), "evaluated index");
        Ok(StandardizedIndex { grids })
    }

    /// Calibrate on `period`, then evaluate `dates`.
    pub fn run(
        &mut self, series: &GriddedSeries, period: ReferencePeriod, dates: &[NaiveDate],
        mask: Option<&GeoMask>,
    ) -> ClimResult<StandardizedIndex> {
        self.calibrate(series, period)?;
        self.evaluate(series, dates, period, mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climatology::core::options::IndexKind;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array3, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Configuration checks in `IndexPipeline::new`.
    // - Store publication on calibrate and lookups on evaluate.
    // - Error branches for missing climatologies and unknown dates.
    // -------------------------------------------------------------------------

    fn monthly_series(years: usize, rows: usize, cols: usize) -> GriddedSeries {
        let n = years * 12;
        let dates = (0..n)
            .map(|i| NaiveDate::from_ymd_opt(2000 + (i / 12) as i32, (i % 12) as u32 + 1, 1).unwrap())
            .collect();
        let values =
            Array3::from_shape_fn((n, rows, cols), |(t, r, c)| (t % 7) as f64 + r as f64 + c as f64);
        GriddedSeries::new(dates, values).unwrap()
    }

    fn zscore_config(orders: &[usize]) -> EngineConfig {
        EngineConfig::new(orders, 0.2, IndexKind::ZScore, false).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Ensure the deficit variant refuses to start without bounds.
    //
    // Given
    // -----
    // - `deficit_bounds = true`, no bounds.
    //
    // Expect
    // ------
    // - `MissingBounds`.
    fn deficit_variant_requires_bounds() {
        let cfg = EngineConfig::new(&[1], 0.2, IndexKind::ZScore, true).unwrap();

        let err = IndexPipeline::new(cfg, None, InMemoryStore::new()).unwrap_err();

        assert!(matches!(err, ClimError::MissingBounds { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Ensure configs mutated after construction are re-validated.
    //
    // Given
    // -----
    // - A default config whose orders were cleared.
    //
    // Expect
    // ------
    // - `EmptyOrders`.
    fn empty_orders_are_rejected_on_construction() {
        let mut cfg = EngineConfig::default();
        cfg.orders.clear();

        let err = IndexPipeline::new(cfg, None, InMemoryStore::new()).unwrap_err();

        assert_eq!(err, ClimError::EmptyOrders);
    }

    #[test]
    // Purpose
    // -------
    // Verify calibrate publishes the same `Arc` the store returns.
    //
    // Given
    // -----
    // - Three years of 2×2 grids, reference period the first two years.
    //
    // Expect
    // ------
    // - One stored entry, pointer-equal to the returned params, with every
    //   configured order fitted.
    fn calibrate_publishes_to_store() {
        let series = monthly_series(3, 2, 2);
        let period = ReferencePeriod::years(2000, 2001).unwrap();
        let mut pipeline = IndexPipeline::new(zscore_config(&[1, 3]), None, InMemoryStore::new()).unwrap();

        let params = pipeline.calibrate(&series, period).unwrap();

        let stored = pipeline.store().load(&period).unwrap().unwrap();
        assert!(Arc::ptr_eq(&params, &stored));
        assert_eq!(pipeline.store().len(), 1);
        assert_eq!(stored.orders().collect::<Vec<_>>(), vec![1, 3]);
        assert!(stored.entry(1, 1).unwrap().count_all.iter().all(|&n| n == 2));
    }

    #[test]
    // Purpose
    // -------
    // Verify filtering uses history before the reference period.
    //
    // Given
    // -----
    // - Three years; period starts in 2001; order 3.
    //
    // Expect
    // ------
    // - January 2001 averages Nov 2000 to Jan 2001, so its single sample is
    //   valid and count_ratio is 1 rather than 0.
    fn calibration_filters_before_cutting() {
        let series = monthly_series(3, 1, 1);
        let period = ReferencePeriod::years(2001, 2001).unwrap();
        let mut pipeline = IndexPipeline::new(zscore_config(&[3]), None, InMemoryStore::new()).unwrap();

        let params = pipeline.calibrate(&series, period).unwrap();

        let january = params.entry(3, 1).unwrap();
        assert_eq!(january.count_all[[0, 0]], 1);
        assert_abs_diff_eq!(january.count_ratio[[0, 0]], 1.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Ensure evaluate never fits on its own.
    //
    // Given
    // -----
    // - A fresh pipeline with an empty store.
    //
    // Expect
    // ------
    // - `StoreFailure`.
    fn evaluate_without_calibration_fails() {
        let series = monthly_series(1, 1, 1);
        let period = ReferencePeriod::years(2000, 2000).unwrap();
        let pipeline = IndexPipeline::new(zscore_config(&[1]), None, InMemoryStore::new()).unwrap();

        let err = pipeline.evaluate(&series, &[series.dates()[0]], period, None).unwrap_err();

        assert!(matches!(err, ClimError::StoreFailure { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Ensure an evaluation date outside the series is a configuration error.
    //
    // Given
    // -----
    // - A calibrated pipeline; date 1999-01-01.
    //
    // Expect
    // ------
    // - `DateNotInSeries`.
    fn unknown_date_is_rejected() {
        let series = monthly_series(2, 1, 1);
        let period = ReferencePeriod::years(2000, 2001).unwrap();
        let mut pipeline = IndexPipeline::new(zscore_config(&[1]), None, InMemoryStore::new()).unwrap();
        pipeline.calibrate(&series, period).unwrap();
        let date = NaiveDate::from_ymd_opt(1999, 1, 1).unwrap();

        let err = pipeline.evaluate(&series, &[date], period, None).unwrap_err();

        assert_eq!(err, ClimError::DateNotInSeries { date });
    }

    #[test]
    // Purpose
    // -------
    // Verify run produces one grid per (order, date), masked where asked.
    //
    // Given
    // -----
    // - Two years of 1×2 grids, orders [1, 2], two dates, mask excluding
    //   column 1.
    //
    // Expect
    // ------
    // - Four grids; column 1 NaN everywhere.
    fn run_yields_one_grid_per_order_and_date() {
        let series = monthly_series(2, 1, 2);
        let period = ReferencePeriod::years(2000, 2001).unwrap();
        let dates = [series.dates()[13], series.dates()[20]];
        let mask = GeoMask::from_binary(array![[1.0, 0.0]].view()).unwrap();
        let mut pipeline = IndexPipeline::new(zscore_config(&[1, 2]), None, InMemoryStore::new()).unwrap();

        let index = pipeline.run(&series, period, &dates, Some(&mask)).unwrap();

        assert_eq!(index.len(), 4);
        for (_, grid) in index.iter() {
            assert!(grid[[0, 1]].is_nan());
        }
        assert!(index.get(2, dates[0]).is_some());
    }
}
