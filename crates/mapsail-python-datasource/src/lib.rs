//! A datasource plugin whose behavior is implemented by a Python object.
//!
//! All access to the Python runtime goes through [`with_runtime`], which holds
//! an [`ExclusiveGuard`] for the duration of each call into Python.
//! Python exceptions are reported to the host as [`mapsail_datasource::DatasourceError`]
//! values that carry the formatted traceback.

mod conversion;
mod datasource;
pub mod error;
mod exception;
mod factory;
mod featureset;
mod guard;
mod object;
#[cfg(test)]
mod testing;

pub use conversion::{register_module, PyBox2d, PyCoord2d, PyQuery, PYTHON_MODULE_NAME};
pub use datasource::{PythonDatasource, PythonDatasourceOptions};
pub use error::{PythonDatasourceError, PythonDatasourceResult};
pub use exception::format_exception;
pub use factory::PythonDatasourceFactory;
pub use featureset::PythonFeatureset;
pub use guard::{with_runtime, ExclusiveGuard};
