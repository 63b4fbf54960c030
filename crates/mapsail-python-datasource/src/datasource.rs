use log::debug;
use mapsail_common::config::PythonConfig;
use mapsail_datasource::{
    Box2d, Coord2d, Datasource, DatasourceKind, DatasourceResult, FeaturesetPtr, GeometryKind,
    LayerDescriptor, Parameters, Query,
};
use pyo3::PyObject;

use crate::error::PythonDatasourceResult;
use crate::featureset::PythonFeatureset;
use crate::guard::{with_runtime, ExclusiveGuard};
use crate::object::DatasourceObject;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PythonDatasourceOptions {
    /// The maximum number of stack entries in translated Python tracebacks.
    pub traceback_limit: Option<usize>,
}

impl From<&PythonConfig> for PythonDatasourceOptions {
    fn from(config: &PythonConfig) -> Self {
        Self {
            traceback_limit: (config.traceback_limit > 0).then_some(config.traceback_limit),
        }
    }
}

/// A datasource implemented by a Python object.
///
/// Every operation that touches the Python object holds the [`ExclusiveGuard`],
/// and every Python exception is translated into a [`mapsail_datasource::DatasourceError`]
/// that carries the formatted traceback.
pub struct PythonDatasource {
    object: DatasourceObject,
    params: Parameters,
    descriptor: LayerDescriptor,
    options: PythonDatasourceOptions,
}

impl PythonDatasource {
    pub const NAME: &'static str = "python";
    pub const ENCODING: &'static str = "utf-8";

    pub fn new(object: PyObject) -> Self {
        Self::with_options(object, PythonDatasourceOptions::default())
    }

    pub fn with_options(object: PyObject, options: PythonDatasourceOptions) -> Self {
        let mut params = Parameters::new();
        params.insert(Parameters::TYPE, Self::NAME);
        debug!("creating Python datasource");
        Self {
            object: DatasourceObject::new(object),
            params,
            descriptor: LayerDescriptor::new(Self::NAME, Self::ENCODING),
            options,
        }
    }

    fn run<F, T>(&self, f: F) -> DatasourceResult<T>
    where
        F: for<'py> FnOnce(&ExclusiveGuard<'py>) -> PythonDatasourceResult<T>,
    {
        with_runtime(|guard| {
            f(guard).map_err(|e| e.into_datasource_error(guard.py(), self.options.traceback_limit))
        })
    }
}

impl Datasource for PythonDatasource {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn data_type(&self) -> DatasourceResult<DatasourceKind> {
        self.run(|guard| self.object.data_type(guard))
    }

    fn envelope(&self) -> DatasourceResult<Box2d> {
        self.run(|guard| self.object.envelope(guard))
    }

    fn geometry_type(&self) -> DatasourceResult<Option<GeometryKind>> {
        self.run(|guard| self.object.geometry_type(guard))
    }

    fn descriptor(&self) -> LayerDescriptor {
        self.descriptor.clone()
    }

    /// Queries the Python object for features only if the query
    /// intersects the envelope of the datasource.
    fn features(&self, query: &Query) -> DatasourceResult<Option<FeaturesetPtr>> {
        let envelope = self.envelope()?;
        if !envelope.intersects(query.bbox()) {
            debug!(
                "query {} does not intersect the Python datasource envelope {envelope}",
                query.bbox()
            );
            return Ok(None);
        }
        self.run(|guard| {
            let Some(features) = self.object.features(guard, query)? else {
                return Ok(None);
            };
            let featureset = PythonFeatureset::try_new(guard, &features, self.options.clone())?;
            Ok(Some(Box::new(featureset) as FeaturesetPtr))
        })
    }

    /// Queries the Python object for features at the point.
    /// The tolerance is not passed to the Python object.
    fn features_at_point(
        &self,
        point: Coord2d,
        _tolerance: f64,
    ) -> DatasourceResult<Option<FeaturesetPtr>> {
        self.run(|guard| {
            let Some(features) = self.object.features_at_point(guard, point)? else {
                return Ok(None);
            };
            let featureset = PythonFeatureset::try_new(guard, &features, self.options.clone())?;
            Ok(Some(Box::new(featureset) as FeaturesetPtr))
        })
    }
}

impl Drop for PythonDatasource {
    fn drop(&mut self) {
        debug!("releasing Python datasource");
        with_runtime(|guard| self.object.release(guard));
    }
}
