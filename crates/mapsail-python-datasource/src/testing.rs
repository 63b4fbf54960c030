use std::ffi::CString;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyModule;

use crate::conversion::register_module;

/// Creates a Python module from source code.
/// The `mapsail` module is importable from the source code.
pub(crate) fn load_module<'py>(
    py: Python<'py>,
    name: &str,
    code: &str,
) -> PyResult<Bound<'py, PyModule>> {
    let sys = py.import("sys")?;
    let modules = sys.getattr("modules")?;
    if !modules.contains("mapsail")? {
        modules.set_item("mapsail", register_module(py)?)?;
    }
    let code = CString::new(code).map_err(|err| PyValueError::new_err(err.to_string()))?;
    let filename =
        CString::new(format!("{name}.py")).map_err(|err| PyValueError::new_err(err.to_string()))?;
    let module_name = CString::new(name).map_err(|err| PyValueError::new_err(err.to_string()))?;
    PyModule::from_code(
        py,
        code.as_c_str(),
        filename.as_c_str(),
        module_name.as_c_str(),
    )
}
