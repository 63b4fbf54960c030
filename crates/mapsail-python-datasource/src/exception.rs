use log::warn;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyString};
use pyo3::{intern, PyErr};

/// Formats a Python exception into a single diagnostic message.
///
/// The message contains the traceback as produced by `traceback.format_exception()`,
/// optionally limited to `limit` stack entries.
/// If the traceback cannot be formatted, the message falls back to the
/// name of the exception type.
///
/// The Python error indicator is left cleared after the call.
pub fn format_exception(py: Python<'_>, err: &PyErr, limit: Option<usize>) -> String {
    match format_traceback(py, err, limit) {
        Ok(message) if !message.is_empty() => message,
        Ok(_) => exception_identity(py, err),
        Err(e) => {
            warn!("failed to format Python traceback: {e}");
            exception_identity(py, err)
        }
    }
}

fn format_traceback(py: Python<'_>, err: &PyErr, limit: Option<usize>) -> PyResult<String> {
    let traceback = py.import(intern!(py, "traceback"))?;
    let kwargs = PyDict::new(py);
    if let Some(limit) = limit {
        kwargs.set_item(intern!(py, "limit"), limit)?;
    }
    let lines = traceback.getattr(intern!(py, "format_exception"))?.call(
        (err.get_type(py), err.value(py), err.traceback(py)),
        Some(&kwargs),
    )?;
    PyString::new(py, "")
        .call_method1(intern!(py, "join"), (lines,))?
        .extract()
}

fn exception_identity(py: Python<'_>, err: &PyErr) -> String {
    err.get_type(py)
        .name()
        .map(|name| name.to_string())
        .unwrap_or_else(|_| err.to_string())
}
