use std::collections::BTreeMap;
use std::fmt::Display;

use num_enum::TryFromPrimitive;

use crate::error::{DatasourceError, DatasourceResult};
use crate::feature::Feature;
use crate::geometry::{Box2d, Coord2d};
use crate::query::Query;

/// The kind of data a datasource provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive)]
#[num_enum(error_type(name = DatasourceError, constructor = DatasourceKind::invalid))]
#[repr(i64)]
pub enum DatasourceKind {
    Vector = 0,
    Raster = 1,
}

impl DatasourceKind {
    fn invalid(value: i64) -> DatasourceError {
        DatasourceError::new(format!("invalid datasource type: {value}"))
    }
}

/// The kind of geometries a datasource yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive)]
#[num_enum(error_type(name = DatasourceError, constructor = GeometryKind::invalid))]
#[repr(i64)]
pub enum GeometryKind {
    Unknown = 0,
    Point = 1,
    LineString = 2,
    Polygon = 3,
    /// Mixed geometry types.
    Collection = 4,
}

impl GeometryKind {
    fn invalid(value: i64) -> DatasourceError {
        DatasourceError::new(format!("invalid geometry type: {value}"))
    }
}

/// Metadata describing the layer a datasource provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDescriptor {
    name: String,
    encoding: String,
    fields: Vec<String>,
}

impl LayerDescriptor {
    pub fn new(name: impl Into<String>, encoding: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            encoding: encoding.into(),
            fields: vec![],
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// String parameters used to instantiate a datasource.
/// The `type` parameter selects the datasource plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(BTreeMap<String, String>);

impl Parameters {
    pub const TYPE: &'static str = "type";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Display) {
        self.0.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|x| x.as_str())
    }

    pub fn datasource_type(&self) -> Option<&str> {
        self.get(Self::TYPE)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Display> FromIterator<(K, V)> for Parameters {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Parameters::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// A lazy, single-pass sequence of features.
///
/// The host calls [`Featureset::next`] until it returns `Ok(None)`,
/// and any later call returns `Ok(None)` as well.
pub trait Featureset: Send {
    fn next(&mut self) -> DatasourceResult<Option<Feature>>;
}

pub type FeaturesetPtr = Box<dyn Featureset>;

pub trait Datasource: Send + Sync {
    /// The parameters the datasource was created with.
    fn params(&self) -> &Parameters;

    fn data_type(&self) -> DatasourceResult<DatasourceKind>;

    /// The extent of all features in the datasource.
    fn envelope(&self) -> DatasourceResult<Box2d>;

    /// The geometry type of the datasource, or `None` if it is not known.
    fn geometry_type(&self) -> DatasourceResult<Option<GeometryKind>>;

    fn descriptor(&self) -> LayerDescriptor;

    /// Returns the features matching the query, or `None` if there are no features.
    fn features(&self, query: &Query) -> DatasourceResult<Option<FeaturesetPtr>>;

    /// Returns the features at the point, or `None` if there are no features.
    fn features_at_point(
        &self,
        point: Coord2d,
        tolerance: f64,
    ) -> DatasourceResult<Option<FeaturesetPtr>>;
}
