use std::sync::Arc;

use mapsail_datasource::{Datasource, DatasourceFactory, DatasourceResult, Parameters};
use pyo3::{PyObject, PyResult, Python};

use crate::datasource::{PythonDatasource, PythonDatasourceOptions};
use crate::error::PythonDatasourceError;
use crate::guard::with_runtime;

type PythonObjectProvider = dyn Fn(Python<'_>, &Parameters) -> PyResult<PyObject> + Send + Sync;

/// The `python` datasource plugin.
///
/// The Python object for each datasource is obtained from a provider
/// supplied by the embedding application.
pub struct PythonDatasourceFactory {
    provider: Box<PythonObjectProvider>,
    options: PythonDatasourceOptions,
}

impl PythonDatasourceFactory {
    pub fn new<F>(provider: F) -> Self
    where
        F: Fn(Python<'_>, &Parameters) -> PyResult<PyObject> + Send + Sync + 'static,
    {
        Self {
            provider: Box::new(provider),
            options: PythonDatasourceOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PythonDatasourceOptions) -> Self {
        self.options = options;
        self
    }
}

impl DatasourceFactory for PythonDatasourceFactory {
    fn name(&self) -> &str {
        PythonDatasource::NAME
    }

    fn create(&self, params: &Parameters) -> DatasourceResult<Arc<dyn Datasource>> {
        let object = with_runtime(|guard| {
            (self.provider)(guard.py(), params).map_err(|e| {
                PythonDatasourceError::from(e)
                    .into_datasource_error(guard.py(), self.options.traceback_limit)
            })
        })?;
        Ok(Arc::new(PythonDatasource::with_options(
            object,
            self.options.clone(),
        )))
    }
}
