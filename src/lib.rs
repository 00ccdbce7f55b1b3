//! drought_index — per-pixel climatology fitting and standardized drought
//! indices over gridded monthly series, with optional Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the climatology engine to Python via the `_drought_index` extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the engine ([`climatology`]) and boundary helpers ([`utils`]).
//! - With `python-bindings`, define the `standardized_index` and `classify`
//!   functions and the `#[pymodule]` initializer.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in [`climatology`]; this file performs only FFI
//!   glue, input conversion and error mapping.
//! - `ClimError` values become `ValueError` at the boundary.
//!
//! Conventions
//! -----------
//! - Dates cross the boundary as ISO `YYYY-MM-DD` strings.
//! - Grids cross the boundary as float64 numpy arrays with NaN for missing
//!   data; cubes are `(time, rows, cols)`.
//!
//! Testing notes
//! -------------
//! - Engine behavior is covered by unit tests in the inner modules and by
//!   `tests/integration_drought_pipeline.rs`; the bindings only forward.

pub mod climatology;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::IntoPyArray;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyDict};

#[cfg(feature = "python-bindings")]
use crate::{
    climatology::prelude::*,
    utils::{extract_f64_cube, extract_f64_grid, parse_iso_date, parse_iso_dates},
};

/// Standardized index grids for the requested dates.
///
/// Parameters
/// ----------
/// - `values`: 3-D float64 array `(time, rows, cols)`.
/// - `dates`: ISO dates, one per timestep, strictly increasing.
/// - `reference_start`, `reference_end`: closed reference period.
/// - `eval_dates`: dates to standardize; each must occur in `dates`.
/// - `orders`: filter orders, default `[1, 2, 3, 6]`.
/// - `index_kind`: `"zscore"` or `"gamma"`.
/// - `sufficiency_threshold`: minimum valid-sample ratio in `[0, 1]`.
/// - `geo_mask`: optional binary `(rows, cols)` grid; 0 pixels become NaN.
/// - `field_capacity`, `wilting_point`: when given, the relative-deficit
///   transform is applied before filtering; both are required together.
///
/// Returns
/// -------
/// `dict[(int, str), numpy.ndarray]` keyed by `(order, "YYYY-MM-DD")`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (
    values, dates, reference_start, reference_end, eval_dates, orders = None,
    index_kind = "zscore", sufficiency_threshold = 0.2, geo_mask = None,
    field_capacity = None, wilting_point = None
))]
#[allow(clippy::too_many_arguments)]
pub fn standardized_index<'py>(
    py: Python<'py>, values: &Bound<'py, PyAny>, dates: Vec<String>, reference_start: &str,
    reference_end: &str, eval_dates: Vec<String>, orders: Option<Vec<usize>>, index_kind: &str,
    sufficiency_threshold: f64, geo_mask: Option<&Bound<'py, PyAny>>,
    field_capacity: Option<&Bound<'py, PyAny>>, wilting_point: Option<&Bound<'py, PyAny>>,
) -> PyResult<Bound<'py, PyDict>> {
    let cube = extract_f64_cube(values)?;
    let series = GriddedSeries::new(parse_iso_dates(&dates)?, cube)?;
    let period =
        ReferencePeriod::new(parse_iso_date(reference_start)?, parse_iso_date(reference_end)?)?;
    let eval_dates = parse_iso_dates(&eval_dates)?;

    let mask = geo_mask.map(extract_f64_grid).transpose()?;
    let mask = mask.map(|m| GeoMask::from_binary(m.view())).transpose()?;

    let fc = field_capacity.map(extract_f64_grid).transpose()?;
    let wp = wilting_point.map(extract_f64_grid).transpose()?;
    let deficit = fc.is_some() || wp.is_some();
    let bounds = if deficit { Some(DeficitBounds::new(fc, wp)?) } else { None };

    let orders = orders.unwrap_or_else(|| EngineConfig::default().orders);
    let config =
        EngineConfig::new(&orders, sufficiency_threshold, index_kind.parse::<IndexKind>()?, deficit)?;

    let mut pipeline = IndexPipeline::new(config, bounds, InMemoryStore::new())?;
    let index = pipeline.run(&series, period, &eval_dates, mask.as_ref())?;

    let out = PyDict::new(py);
    for ((order, date), grid) in index.into_inner() {
        out.set_item((order, date.format("%Y-%m-%d").to_string()), grid.into_pyarray(py))?;
    }
    Ok(out)
}

/// Drought class names for a standardized grid; `None` where NaN.
#[cfg(feature = "python-bindings")]
#[pyfunction]
pub fn classify(index: &Bound<'_, PyAny>) -> PyResult<Vec<Vec<Option<&'static str>>>> {
    let grid = extract_f64_grid(index)?;
    Ok(grid
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|&v| DroughtClass::from_index(v).map(|c| c.name())).collect())
        .collect())
}

#[cfg(feature = "python-bindings")]
#[pymodule]
fn _drought_index<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(standardized_index, m)?)?;
    m.add_function(wrap_pyfunction!(classify, m)?)?;
    Ok(())
}
