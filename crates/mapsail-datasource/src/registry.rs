use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::debug;

use crate::datasource::{Datasource, Parameters};
use crate::error::{DatasourceError, DatasourceResult};

/// Creates datasources of a single plugin type.
pub trait DatasourceFactory: Send + Sync {
    /// The type name the host dispatches on.
    /// The name must be unique among the registered factories.
    fn name(&self) -> &str;

    fn create(&self, params: &Parameters) -> DatasourceResult<Arc<dyn Datasource>>;
}

#[derive(Default)]
pub struct DatasourceRegistry {
    factories: RwLock<HashMap<String, Arc<dyn DatasourceFactory>>>,
}

impl DatasourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, factory: Arc<dyn DatasourceFactory>) -> DatasourceResult<()> {
        let mut factories = self
            .factories
            .write()
            .map_err(|e| DatasourceError::new(e.to_string()))?;
        let name = factory.name().to_string();
        if factories.contains_key(&name) {
            return Err(DatasourceError::new(format!(
                "datasource plugin already registered: {name}"
            )));
        }
        debug!("registering datasource plugin: {name}");
        factories.insert(name, factory);
        Ok(())
    }

    pub fn names(&self) -> DatasourceResult<Vec<String>> {
        let factories = self
            .factories
            .read()
            .map_err(|e| DatasourceError::new(e.to_string()))?;
        let mut names = factories.keys().cloned().collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }

    /// Creates a datasource with the factory selected by the `type` parameter.
    pub fn create(&self, params: &Parameters) -> DatasourceResult<Arc<dyn Datasource>> {
        let Some(name) = params.datasource_type() else {
            return Err(DatasourceError::new("missing datasource parameter: type"));
        };
        let factory = {
            let factories = self
                .factories
                .read()
                .map_err(|e| DatasourceError::new(e.to_string()))?;
            factories.get(name).cloned()
        };
        match factory {
            Some(factory) => factory.create(params),
            None => Err(DatasourceError::new(format!(
                "could not create datasource for type: {name}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{DatasourceKind, FeaturesetPtr, GeometryKind, LayerDescriptor};
    use crate::geometry::{Box2d, Coord2d};
    use crate::query::Query;

    struct EmptyDatasource {
        params: Parameters,
    }

    impl Datasource for EmptyDatasource {
        fn params(&self) -> &Parameters {
            &self.params
        }

        fn data_type(&self) -> DatasourceResult<DatasourceKind> {
            Ok(DatasourceKind::Vector)
        }

        fn envelope(&self) -> DatasourceResult<Box2d> {
            Ok(Box2d::default())
        }

        fn geometry_type(&self) -> DatasourceResult<Option<GeometryKind>> {
            Ok(None)
        }

        fn descriptor(&self) -> LayerDescriptor {
            LayerDescriptor::new("empty", "utf-8")
        }

        fn features(&self, _query: &Query) -> DatasourceResult<Option<FeaturesetPtr>> {
            Ok(None)
        }

        fn features_at_point(
            &self,
            _point: Coord2d,
            _tolerance: f64,
        ) -> DatasourceResult<Option<FeaturesetPtr>> {
            Ok(None)
        }
    }

    struct EmptyFactory;

    impl DatasourceFactory for EmptyFactory {
        fn name(&self) -> &str {
            "empty"
        }

        fn create(&self, params: &Parameters) -> DatasourceResult<Arc<dyn Datasource>> {
            Ok(Arc::new(EmptyDatasource {
                params: params.clone(),
            }))
        }
    }

    #[test]
    fn test_registry_dispatches_on_type() -> DatasourceResult<()> {
        let registry = DatasourceRegistry::new();
        registry.register(Arc::new(EmptyFactory))?;
        assert_eq!(registry.names()?, vec!["empty".to_string()]);

        let params: Parameters = [("type", "empty")].into_iter().collect();
        let datasource = registry.create(&params)?;
        assert_eq!(datasource.descriptor().name(), "empty");
        assert_eq!(datasource.params(), &params);
        Ok(())
    }

    #[test]
    fn test_registry_rejects_duplicate_names() -> DatasourceResult<()> {
        let registry = DatasourceRegistry::new();
        registry.register(Arc::new(EmptyFactory))?;
        assert!(registry.register(Arc::new(EmptyFactory)).is_err());
        Ok(())
    }

    #[test]
    fn test_registry_unknown_or_missing_type() {
        let registry = DatasourceRegistry::new();
        let params: Parameters = [("type", "shape")].into_iter().collect();
        assert!(registry.create(&params).is_err());
        assert!(registry.create(&Parameters::new()).is_err());
    }
}
