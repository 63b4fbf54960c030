use std::collections::BTreeSet;

use crate::geometry::Box2d;

/// A spatial query issued by the host against a datasource.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    bbox: Box2d,
    resolution: (f64, f64),
    scale_denominator: f64,
    property_names: BTreeSet<String>,
}

impl Query {
    pub fn new(bbox: Box2d) -> Self {
        Self {
            bbox,
            resolution: (1.0, 1.0),
            scale_denominator: 1.0,
            property_names: BTreeSet::new(),
        }
    }

    pub fn with_resolution(mut self, resolution: (f64, f64)) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_scale_denominator(mut self, scale_denominator: f64) -> Self {
        self.scale_denominator = scale_denominator;
        self
    }

    pub fn add_property_name(&mut self, name: impl Into<String>) {
        self.property_names.insert(name.into());
    }

    pub fn bbox(&self) -> &Box2d {
        &self.bbox
    }

    pub fn resolution(&self) -> (f64, f64) {
        self.resolution
    }

    pub fn scale_denominator(&self) -> f64 {
        self.scale_denominator
    }

    pub fn property_names(&self) -> &BTreeSet<String> {
        &self.property_names
    }
}
