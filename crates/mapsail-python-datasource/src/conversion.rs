//! Conversion between host values and Python objects.
//!
//! Host values passed to Python are exposed as immutable classes of the `mapsail` module.
//! Features yielded by Python are duck-typed objects with an integer `id`,
//! an optional `geometry` (WKT `str` or WKB `bytes`), and an optional
//! `properties` mapping of `str` keys to `None`, `bool`, `int`, `float`, or `str` values.

use mapsail_datasource::{Box2d, Coord2d, Feature, Geometry, Query, Value};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyBytes, PyFloat, PyInt, PyMapping, PyModule, PyString};

use crate::error::{PythonDatasourceError, PythonDatasourceResult};
use crate::object::Attribute;

pub const PYTHON_MODULE_NAME: &str = "mapsail";

#[pyclass(name = "Box2d", module = "mapsail", frozen)]
#[derive(Debug, Clone, Copy)]
pub struct PyBox2d(Box2d);

#[pymethods]
impl PyBox2d {
    #[new]
    fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self(Box2d::new(minx, miny, maxx, maxy))
    }

    #[getter]
    fn minx(&self) -> f64 {
        self.0.minx()
    }

    #[getter]
    fn miny(&self) -> f64 {
        self.0.miny()
    }

    #[getter]
    fn maxx(&self) -> f64 {
        self.0.maxx()
    }

    #[getter]
    fn maxy(&self) -> f64 {
        self.0.maxy()
    }

    fn width(&self) -> f64 {
        self.0.width()
    }

    fn height(&self) -> f64 {
        self.0.height()
    }

    fn intersects(&self, other: PyRef<'_, PyBox2d>) -> bool {
        self.0.intersects(&other.0)
    }

    fn __repr__(&self) -> String {
        self.0.to_string()
    }
}

impl From<Box2d> for PyBox2d {
    fn from(value: Box2d) -> Self {
        Self(value)
    }
}

#[pyclass(name = "Coord2d", module = "mapsail", frozen)]
#[derive(Debug, Clone, Copy)]
pub struct PyCoord2d(Coord2d);

#[pymethods]
impl PyCoord2d {
    #[new]
    fn new(x: f64, y: f64) -> Self {
        Self(Coord2d::new(x, y))
    }

    #[getter]
    fn x(&self) -> f64 {
        self.0.x
    }

    #[getter]
    fn y(&self) -> f64 {
        self.0.y
    }

    fn __repr__(&self) -> String {
        format!("coord2d({}, {})", self.0.x, self.0.y)
    }
}

impl From<Coord2d> for PyCoord2d {
    fn from(value: Coord2d) -> Self {
        Self(value)
    }
}

#[pyclass(name = "Query", module = "mapsail", frozen)]
#[derive(Debug, Clone)]
pub struct PyQuery(Query);

#[pymethods]
impl PyQuery {
    #[getter]
    fn bbox(&self) -> PyBox2d {
        PyBox2d(*self.0.bbox())
    }

    #[getter]
    fn resolution(&self) -> (f64, f64) {
        self.0.resolution()
    }

    #[getter]
    fn scale_denominator(&self) -> f64 {
        self.0.scale_denominator()
    }

    #[getter]
    fn property_names(&self) -> Vec<String> {
        self.0.property_names().iter().cloned().collect()
    }

    fn __repr__(&self) -> String {
        format!("query({})", self.0.bbox())
    }
}

impl From<Query> for PyQuery {
    fn from(value: Query) -> Self {
        Self(value)
    }
}

/// Creates the `mapsail` Python module that contains the host value classes.
pub fn register_module(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let module = PyModule::new(py, PYTHON_MODULE_NAME)?;
    module.add_class::<PyBox2d>()?;
    module.add_class::<PyCoord2d>()?;
    module.add_class::<PyQuery>()?;
    Ok(module)
}

pub(crate) fn feature_from_py(value: &Bound<'_, PyAny>) -> PythonDatasourceResult<Feature> {
    let id = Attribute::lookup(value, "id")?.require("feature.id")?;
    let id = id
        .extract::<i64>()
        .map_err(|_| PythonDatasourceError::invalid("feature.id"))?;
    let mut feature = Feature::new(id);
    if let Some(geometry) = Attribute::lookup(value, "geometry")?.into_option() {
        feature = feature.with_geometry(geometry_from_py(&geometry)?);
    }
    if let Some(properties) = Attribute::lookup(value, "properties")?.into_option() {
        let properties = properties
            .downcast::<PyMapping>()
            .map_err(|_| PythonDatasourceError::invalid("feature.properties"))?;
        for item in properties.items()?.iter() {
            let (key, value) = item
                .extract::<(String, Bound<PyAny>)>()
                .map_err(|_| PythonDatasourceError::invalid("feature.properties"))?;
            let value = value_from_py(&value, &key)?;
            feature = feature.with_property(key, value);
        }
    }
    Ok(feature)
}

fn geometry_from_py(value: &Bound<'_, PyAny>) -> PythonDatasourceResult<Geometry> {
    if value.is_instance_of::<PyString>() {
        Ok(Geometry::Wkt(value.extract()?))
    } else if let Ok(wkb) = value.downcast::<PyBytes>() {
        Ok(Geometry::Wkb(wkb.as_bytes().to_vec()))
    } else {
        Err(PythonDatasourceError::invalid("feature.geometry"))
    }
}

fn value_from_py(value: &Bound<'_, PyAny>, key: &str) -> PythonDatasourceResult<Value> {
    let invalid = || PythonDatasourceError::invalid(format!("feature.properties.{key}"));
    // `bool` is a subclass of `int` and is checked before `int`.
    if value.is_none() {
        Ok(Value::Null)
    } else if let Ok(value) = value.downcast::<PyBool>() {
        Ok(Value::Bool(value.is_true()))
    } else if value.is_instance_of::<PyInt>() {
        value.extract().map(Value::Integer).map_err(|_| invalid())
    } else if value.is_instance_of::<PyFloat>() {
        value.extract().map(Value::Double).map_err(|_| invalid())
    } else if value.is_instance_of::<PyString>() {
        Ok(Value::String(value.extract()?))
    } else {
        Err(invalid())
    }
}
