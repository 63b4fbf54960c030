//! The host side of the datasource plugin interface.
//!
//! A datasource reports its extent, kind and geometry type,
//! and answers spatial queries with a pull-based [`Featureset`].
//! Plugins are looked up by type name through a [`DatasourceRegistry`].

mod datasource;
pub mod error;
mod feature;
mod geometry;
mod query;
mod registry;

pub use datasource::*;
pub use error::{DatasourceError, DatasourceResult};
pub use feature::*;
pub use geometry::*;
pub use query::*;
pub use registry::*;
