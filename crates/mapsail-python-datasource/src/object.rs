use mapsail_datasource::{Box2d, Coord2d, DatasourceKind, GeometryKind, Query};
use pyo3::exceptions::PyAttributeError;
use pyo3::intern;
use pyo3::prelude::*;

use crate::conversion::{PyCoord2d, PyQuery};
use crate::error::{PythonDatasourceError, PythonDatasourceResult};
use crate::guard::ExclusiveGuard;

/// The result of looking up an attribute of a Python object.
/// A missing attribute and an attribute whose value is `None` both mean
/// that the value is not provided.
pub(crate) enum Attribute<'py> {
    Absent,
    Null,
    Present(Bound<'py, PyAny>),
}

impl<'py> Attribute<'py> {
    /// Looks up an attribute without raising `AttributeError`.
    /// Other exceptions raised by the lookup (e.g. in a property getter) are propagated.
    pub fn lookup(object: &Bound<'py, PyAny>, name: &str) -> PyResult<Self> {
        match object.getattr(name) {
            Ok(value) if value.is_none() => Ok(Attribute::Null),
            Ok(value) => Ok(Attribute::Present(value)),
            Err(e) if e.is_instance_of::<PyAttributeError>(object.py()) => Ok(Attribute::Absent),
            Err(e) => Err(e),
        }
    }

    pub fn into_option(self) -> Option<Bound<'py, PyAny>> {
        match self {
            Attribute::Present(value) => Some(value),
            Attribute::Absent | Attribute::Null => None,
        }
    }

    pub fn require(self, name: &str) -> PythonDatasourceResult<Bound<'py, PyAny>> {
        match self {
            Attribute::Present(value) => Ok(value),
            Attribute::Absent => Err(PythonDatasourceError::missing(name)),
            Attribute::Null => Err(PythonDatasourceError::null(name)),
        }
    }
}

/// Extracts an integer from a value that supports `__index__` or `__int__`,
/// so that e.g. `3.0` is accepted as `3`.
fn extract_i64(value: &Bound<'_, PyAny>, name: &str) -> PythonDatasourceResult<i64> {
    if let Ok(x) = value.extract::<i64>() {
        return Ok(x);
    }
    value
        .call_method0(intern!(value.py(), "__int__"))
        .and_then(|x| x.extract::<i64>())
        .map_err(|_| PythonDatasourceError::invalid(name))
}

fn extract_coordinate(envelope: &Bound<'_, PyAny>, name: &str) -> PythonDatasourceResult<f64> {
    let field = format!("envelope.{name}");
    match Attribute::lookup(envelope, name)? {
        Attribute::Present(value) => value
            .extract::<f64>()
            .map_err(|_| PythonDatasourceError::invalid(field)),
        Attribute::Null => Err(PythonDatasourceError::invalid(field)),
        Attribute::Absent => Err(PythonDatasourceError::missing(field)),
    }
}

/// The Python object that implements a datasource.
///
/// This is the only place that knows the attributes the Python object is
/// expected to provide: `data_type`, `envelope` (with `minx`, `miny`, `maxx`,
/// and `maxy`), the optional `geometry_type`, and the `features(query)`
/// and `features_at_point(point)` callables.
pub(crate) struct DatasourceObject {
    object: Py<PyAny>,
}

impl DatasourceObject {
    pub fn new(object: Py<PyAny>) -> Self {
        Self { object }
    }

    fn bind<'a, 'py>(&'a self, guard: &ExclusiveGuard<'py>) -> &'a Bound<'py, PyAny> {
        self.object.bind(guard.py())
    }

    pub fn data_type(&self, guard: &ExclusiveGuard<'_>) -> PythonDatasourceResult<DatasourceKind> {
        let value = Attribute::lookup(self.bind(guard), "data_type")?.require("data_type")?;
        DatasourceKind::try_from(extract_i64(&value, "data_type")?)
            .map_err(|_| PythonDatasourceError::invalid("data_type"))
    }

    /// Returns the envelope once all of its coordinates are extracted.
    /// The coordinates are extracted in order and the first failure is reported.
    pub fn envelope(&self, guard: &ExclusiveGuard<'_>) -> PythonDatasourceResult<Box2d> {
        let envelope = Attribute::lookup(self.bind(guard), "envelope")?.require("envelope")?;
        let minx = extract_coordinate(&envelope, "minx")?;
        let miny = extract_coordinate(&envelope, "miny")?;
        let maxx = extract_coordinate(&envelope, "maxx")?;
        let maxy = extract_coordinate(&envelope, "maxy")?;
        Ok(Box2d::new(minx, miny, maxx, maxy))
    }

    pub fn geometry_type(
        &self,
        guard: &ExclusiveGuard<'_>,
    ) -> PythonDatasourceResult<Option<GeometryKind>> {
        let Some(value) = Attribute::lookup(self.bind(guard), "geometry_type")?.into_option()
        else {
            return Ok(None);
        };
        GeometryKind::try_from(extract_i64(&value, "geometry_type")?)
            .map(Some)
            .map_err(|_| PythonDatasourceError::invalid("geometry_type"))
    }

    /// Calls `features(query)` and returns the iterable, or `None` if the call returned `None`.
    pub fn features<'py>(
        &self,
        guard: &ExclusiveGuard<'py>,
        query: &Query,
    ) -> PythonDatasourceResult<Option<Bound<'py, PyAny>>> {
        let callable = Attribute::lookup(self.bind(guard), "features")?.require("features")?;
        let query = Bound::new(guard.py(), PyQuery::from(query.clone()))?;
        let features = callable.call1((query,))?;
        Ok((!features.is_none()).then_some(features))
    }

    /// Calls `features_at_point(point)` and returns the iterable,
    /// or `None` if the call returned `None`.
    pub fn features_at_point<'py>(
        &self,
        guard: &ExclusiveGuard<'py>,
        point: Coord2d,
    ) -> PythonDatasourceResult<Option<Bound<'py, PyAny>>> {
        let callable = Attribute::lookup(self.bind(guard), "features_at_point")?
            .require("features_at_point")?;
        let point = Bound::new(guard.py(), PyCoord2d::from(point))?;
        let features = callable.call1((point,))?;
        Ok((!features.is_none()).then_some(features))
    }

    /// Drops the reference to the Python object.
    /// This may run finalizers defined in Python.
    pub fn release(&mut self, guard: &ExclusiveGuard<'_>) {
        let object = std::mem::replace(&mut self.object, guard.py().None());
        drop(object);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::with_runtime;
    use crate::testing::load_module;

    const MODULE_SOURCE_CODE: &str = r#"
class Record:
    present = 1
    nothing = None

    @property
    def broken(self):
        raise ValueError("broken getter")
"#;

    #[test]
    fn test_attribute_lookup() -> PyResult<()> {
        pyo3::prepare_freethreaded_python();

        with_runtime(|guard| {
            let py = guard.py();
            let module = load_module(py, "test_attribute_lookup", MODULE_SOURCE_CODE)?;
            let record = module.getattr("Record")?.call0()?;

            assert!(matches!(
                Attribute::lookup(&record, "present")?,
                Attribute::Present(_)
            ));
            assert!(matches!(
                Attribute::lookup(&record, "nothing")?,
                Attribute::Null
            ));
            assert!(matches!(
                Attribute::lookup(&record, "missing")?,
                Attribute::Absent
            ));
            assert!(!PyErr::occurred(py));

            let err = match Attribute::lookup(&record, "broken") {
                Ok(_) => return Err(PyAttributeError::new_err("expected an exception")),
                Err(e) => e,
            };
            assert!(err.to_string().contains("broken getter"));

            assert!(Attribute::lookup(&record, "nothing")?.into_option().is_none());
            assert!(matches!(
                Attribute::lookup(&record, "missing")?.require("missing"),
                Err(PythonDatasourceError::MissingAttribute(name)) if name == "missing"
            ));
            assert!(matches!(
                Attribute::lookup(&record, "nothing")?.require("nothing"),
                Err(PythonDatasourceError::NullAttribute(name)) if name == "nothing"
            ));
            Ok(())
        })
    }
}
