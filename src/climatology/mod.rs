//! climatology — standardized anomaly indices over gridded monthly series.
//!
//! Purpose
//! -------
//! Turn a stack of monthly grids (precipitation, soil moisture, ...) into
//! standardized drought/wetness indices at several aggregation timescales.
//! A climatology (per-order, per-month, per-pixel distribution parameters) is
//! fitted on a reference period and used to express any month as a
//! standard-normal-like anomaly.
//!
//! Key behaviors
//! -------------
//! - [`filter`] aggregates the raw series over trailing windows of each
//!   configured order, optionally after the relative-deficit transform.
//! - [`estimator`] fits z-score or gamma parameters per `(order, month)`,
//!   masking pixels with too few valid samples.
//! - [`normalize`] maps one filtered grid onto the standardized scale.
//! - [`pipeline`] chains the three stages and publishes fitted climatologies
//!   to a [`ClimatologyStore`].
//! - [`classify`] buckets standardized values into drought classes.
//!
//! Invariants & assumptions
//! ------------------------
//! - Missing data is NaN everywhere; per-pixel problems degrade to NaN and
//!   never fail a call.
//! - Configuration problems surface as [`ClimError`] before any computation.
//! - Fitted parameters are immutable and shared as `Arc<ClimatologyParams>`.
//!
//! Downstream usage
//! ----------------
//! - Typical flow:
//!   1. Build a [`GriddedSeries`] from loaded grids.
//!   2. Load an [`EngineConfig`] (defaults, TOML or [`EngineConfig::new`]).
//!   3. Construct an [`IndexPipeline`] with an [`InMemoryStore`] or another
//!      [`ClimatologyStore`].
//!   4. `calibrate` on a [`ReferencePeriod`], then `evaluate` the dates of
//!      interest, or call `run` for both.
//! - Python bindings import from [`prelude`].
//!
//! Testing notes
//! -------------
//! - Each stage carries its own unit tests; end-to-end scenarios run through
//!   the public API in `tests/integration_drought_pipeline.rs`.

pub mod classify;
pub mod core;
pub mod errors;
pub mod estimator;
pub mod filter;
pub mod normalize;
pub mod pipeline;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    bounds::DeficitBounds,
    mask::GeoMask,
    options::{EngineConfig, IndexKind, ReferencePeriod},
    params::{ClimatologyParams, FamilyParams, MonthlyClimatology},
    series::GriddedSeries,
};

pub use self::classify::{ClassCounts, DroughtClass, classify_grid};
pub use self::errors::{ClimError, ClimResult};
pub use self::pipeline::{ClimatologyStore, InMemoryStore, IndexPipeline, StandardizedIndex};

pub mod prelude {
    pub use super::{
        ClassCounts, ClimError, ClimResult, ClimatologyParams, ClimatologyStore, DeficitBounds,
        DroughtClass, EngineConfig, FamilyParams, GeoMask, GriddedSeries, IndexKind,
        IndexPipeline, InMemoryStore, MonthlyClimatology, ReferencePeriod, StandardizedIndex,
        classify_grid,
    };
}
