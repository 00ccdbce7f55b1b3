//! climatology::core — data model and shared numerics for the engine.
//!
//! Purpose
//! -------
//! Group the validated containers and helpers that the filter bank, the
//! estimator and the normalizer build on. Each submodule owns one concept:
//!
//! - [`series`]: `GriddedSeries`, the date-indexed grid cube.
//! - [`mask`]: `GeoMask`, the binary domain mask.
//! - [`bounds`]: `DeficitBounds`, the relative-deficit transform inputs.
//! - [`options`]: `IndexKind`, `EngineConfig`, `ReferencePeriod`.
//! - [`params`]: `ClimatologyParams` and its per-month entries.
//! - [`stats`]: NaN-aware moments along the sample axis.
//!
//! Invariants & assumptions
//! ------------------------
//! - Containers validate at construction and are read-only afterwards;
//!   engine stages may rely on those invariants without re-checking.
//! - Missing data is NaN throughout.
pub mod bounds;
pub mod mask;
pub mod options;
pub mod params;
pub mod series;
pub mod stats;
