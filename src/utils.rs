//! utils — boundary helpers shared by the Python bindings.
//!
//! Date parsing is plain Rust and always available; array extraction is
//! compiled only with the `python-bindings` feature.
use crate::climatology::errors::{ClimError, ClimResult};
use chrono::NaiveDate;

#[cfg(feature = "python-bindings")]
use ndarray::{Array2, Array3};

#[cfg(feature = "python-bindings")]
use numpy::{PyReadonlyArray2, PyReadonlyArray3};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyAny};

/// Parse an ISO `YYYY-MM-DD` date.
///
/// Errors
/// ------
/// - `ClimError::InvalidConfig` naming the offending text.
pub fn parse_iso_date(text: &str) -> ClimResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|e| ClimError::InvalidConfig { reason: format!("invalid date {text:?}: {e}") })
}

/// Parse every entry of `texts` with [`parse_iso_date`].
pub fn parse_iso_dates<S: AsRef<str>>(texts: &[S]) -> ClimResult<Vec<NaiveDate>> {
    texts.iter().map(|t| parse_iso_date(t.as_ref())).collect()
}

/// Copy a `time × rows × cols` float64 cube out of a numpy array or any
/// object with a `to_numpy()` method (xarray, pandas).
#[cfg(feature = "python-bindings")]
pub fn extract_f64_cube<'py>(raw: &Bound<'py, PyAny>) -> PyResult<Array3<f64>> {
    if let Ok(arr_ro) = raw.extract::<PyReadonlyArray3<f64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }

    if let Ok(obj) = raw.call_method0("to_numpy") {
        if let Ok(arr_ro) = obj.extract::<PyReadonlyArray3<f64>>() {
            return Ok(arr_ro.as_array().to_owned());
        }
    }

    Err(PyTypeError::new_err("expected a 3-D float64 numpy.ndarray (time, rows, cols)"))
}

/// Copy a `rows × cols` float64 grid out of a numpy array or any object with
/// a `to_numpy()` method.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_grid<'py>(raw: &Bound<'py, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr_ro) = raw.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }

    if let Ok(obj) = raw.call_method0("to_numpy") {
        if let Ok(arr_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(arr_ro.as_array().to_owned());
        }
    }

    Err(PyTypeError::new_err("expected a 2-D float64 numpy.ndarray (rows, cols)"))
}
