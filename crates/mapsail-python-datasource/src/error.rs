use log::debug;
use mapsail_datasource::DatasourceError;
use pyo3::{PyErr, Python};
use thiserror::Error;

use crate::exception::format_exception;

pub type PythonDatasourceResult<T> = Result<T, PythonDatasourceError>;

#[derive(Debug, Error)]
pub enum PythonDatasourceError {
    #[error("Python: could not access {0} property")]
    MissingAttribute(String),
    #[error("Python: {0} property is None")]
    NullAttribute(String),
    #[error("Python: could not convert {0}")]
    InvalidValue(String),
    #[error("error in Python: {0}")]
    PythonError(#[from] PyErr),
}

impl PythonDatasourceError {
    pub fn missing(name: impl Into<String>) -> Self {
        PythonDatasourceError::MissingAttribute(name.into())
    }

    pub fn null(name: impl Into<String>) -> Self {
        PythonDatasourceError::NullAttribute(name.into())
    }

    pub fn invalid(name: impl Into<String>) -> Self {
        PythonDatasourceError::InvalidValue(name.into())
    }

    /// Converts the error into the host datasource error.
    /// Python exceptions are formatted with their traceback, which requires the GIL.
    pub fn into_datasource_error(
        self,
        py: Python<'_>,
        traceback_limit: Option<usize>,
    ) -> DatasourceError {
        match self {
            PythonDatasourceError::PythonError(e) => {
                let message = format_exception(py, &e, traceback_limit);
                debug!("Python datasource raised an exception: {message}");
                DatasourceError::new(message)
            }
            e => DatasourceError::new(e.to_string()),
        }
    }
}
