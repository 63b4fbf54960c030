use std::collections::BTreeMap;
use std::fmt;

/// An attribute value attached to a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
        }
    }
}

/// An encoded geometry.
/// The geometry is opaque to datasources and is decoded by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Geometry {
    Wkt(String),
    Wkb(Vec<u8>),
}

/// A single record yielded by a datasource.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    id: i64,
    geometry: Option<Geometry>,
    properties: BTreeMap<String, Value>,
}

impl Feature {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            geometry: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}
