use crate::di::arguments::{Argument, Arguments};
use crate::di::source::{PARAMETER_SOURCE, ParameterSource, ParameterSources};
use crate::di::{
    Component, ComponentDescriptor, ComponentIndex, ComponentRegistry, Instance, ParamKind, ParamSpec,
};
use crate::error::{ComponentreeError, Result};
use crate::lifecycle;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Caller-supplied values for `Data` parameters, keyed by parameter name.
pub type DataMap = HashMap<String, Value>;

/// Dependency injection container over a frozen registry.
///
/// Singletons are created lazily, the first time anything needs them. Each
/// name owns a once-cell, so concurrent requests for the same service wait on
/// a single construction instead of racing.
pub struct Container {
    registry: Arc<ComponentRegistry>,
    singletons: DashMap<String, Arc<OnceCell<Instance>>>,
    sources: ParameterSources,
    init_timeout: Option<Duration>,
}

impl Container {
    pub(crate) fn new(registry: ComponentRegistry, init_timeout: Option<Duration>) -> Self {
        let registry = Arc::new(registry);
        let singletons = DashMap::new();

        // The built-in index has no factory; its instance wraps the frozen registry.
        let seeded = registry
            .get(ComponentIndex::NAME)
            .is_ok_and(|descriptor| !descriptor.is_constructible());
        if seeded {
            let index: Instance = Arc::new(ComponentIndex::new(Arc::clone(&registry)));
            singletons.insert(
                ComponentIndex::NAME.to_string(),
                Arc::new(OnceCell::from(index)),
            );
        }

        Self {
            registry,
            singletons,
            sources: ParameterSources::new(),
            init_timeout,
        }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn get(&self, name: &str) -> Result<&ComponentDescriptor> {
        self.registry.get(name)
    }

    pub fn find_by_tags(&self, tags: &[&str]) -> Vec<&ComponentDescriptor> {
        self.registry.find_by_tags(tags)
    }

    pub fn find_by_capability(&self, capability: &str, tags: &[&str]) -> Vec<&ComponentDescriptor> {
        self.registry.find_by_capability(capability, tags)
    }

    /// Resolve the component registered as `name`.
    ///
    /// Services come from the singleton cache; any other component is
    /// constructed afresh on every call.
    pub async fn resolve(&self, name: &str) -> Result<Instance> {
        let descriptor = self.registry.get(name)?;
        self.resolve_descriptor(descriptor, None).await
    }

    /// Like [`Container::resolve`], with values for `Data` parameters that no
    /// parameter source supplies.
    ///
    /// The values only reach the construction this call performs: an already
    /// cached service is returned as is, and dependencies never see them.
    pub async fn resolve_with(&self, name: &str, data: &DataMap) -> Result<Instance> {
        let descriptor = self.registry.get(name)?;
        self.resolve_descriptor(descriptor, Some(data)).await
    }

    pub async fn resolve_as<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        self.resolve(name)
            .await?
            .downcast::<T>()
            .map_err(|_| ComponentreeError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    /// Resolve a statically declared component by its type.
    pub async fn get_instance<T: Component>(&self) -> Result<Arc<T>> {
        self.resolve_as::<T>(T::NAME).await
    }

    /// Resolve `name` and view it through one of its declared capabilities.
    pub async fn resolve_capability<T>(&self, name: &str, capability: &str) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let descriptor = self.registry.get(name)?;
        let instance = self.resolve_descriptor(descriptor, None).await?;
        Self::cast::<T>(descriptor, capability, instance)
    }

    /// A service instance, if it has already been constructed.
    pub fn cached(&self, name: &str) -> Option<Instance> {
        self.singletons
            .get(name)
            .and_then(|cell| cell.get().map(Arc::clone))
    }

    pub fn parameter_source(&self, name: &str) -> Option<Arc<dyn ParameterSource>> {
        self.sources.get(name)
    }

    pub fn parameter_sources(&self) -> &ParameterSources {
        &self.sources
    }

    /// Instantiate `descriptor` as a singleton and register it as a parameter source.
    pub(crate) async fn install_parameter_source(&self, descriptor: &ComponentDescriptor) -> Result<()> {
        let chain = vec![descriptor.name().to_string()];
        let instance = self.singleton(descriptor, None, chain).await?;
        let source = Self::cast::<dyn ParameterSource>(descriptor, PARAMETER_SOURCE, instance)?;
        self.sources.insert(descriptor.name(), source);
        Ok(())
    }

    /// Construct a service unless it is already cached.
    pub(crate) async fn ensure_service(&self, descriptor: &ComponentDescriptor) -> Result<bool> {
        if self.cached(descriptor.name()).is_some() {
            return Ok(false);
        }
        let chain = vec![descriptor.name().to_string()];
        self.singleton(descriptor, None, chain).await?;
        Ok(true)
    }

    async fn resolve_descriptor(
        &self,
        descriptor: &ComponentDescriptor,
        data: Option<&DataMap>,
    ) -> Result<Instance> {
        let chain = vec![descriptor.name().to_string()];
        if descriptor.is_service() {
            self.singleton(descriptor, data, chain).await
        } else {
            self.instantiate(descriptor, data, chain).await
        }
    }

    fn cast<T>(descriptor: &ComponentDescriptor, capability: &str, instance: Instance) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let caster = descriptor.caster(capability).ok_or_else(|| {
            ComponentreeError::not_constructible(
                descriptor.name(),
                format!("capability '{capability}' has no implementation bound"),
            )
        })?;

        let downcast_failed = || ComponentreeError::DowncastFailed {
            type_name: std::any::type_name::<T>().to_string(),
        };

        // The caster returns an Instance which holds an Arc<T>.
        let wrapper = (caster)(instance).ok_or_else(downcast_failed)?;
        let wrapper = wrapper.downcast::<Arc<T>>().map_err(|_| downcast_failed())?;
        Ok(wrapper.as_ref().clone())
    }

    fn singleton<'a>(
        &'a self,
        descriptor: &'a ComponentDescriptor,
        data: Option<&'a DataMap>,
        chain: Vec<String>,
    ) -> BoxFuture<'a, Result<Instance>> {
        async move {
            let cell = self
                .singletons
                .entry(descriptor.name().to_string())
                .or_default()
                .clone();

            let instance = cell
                .get_or_try_init(|| self.instantiate(descriptor, data, chain))
                .await?;
            Ok(Arc::clone(instance))
        }
        .boxed()
    }

    fn instantiate<'a>(
        &'a self,
        descriptor: &'a ComponentDescriptor,
        data: Option<&'a DataMap>,
        chain: Vec<String>,
    ) -> BoxFuture<'a, Result<Instance>> {
        async move {
            let factory = descriptor.factory().ok_or_else(|| {
                ComponentreeError::not_constructible(descriptor.name(), "no constructor registered")
            })?;

            let mut values = Vec::with_capacity(descriptor.parameters().len());
            for (index, param) in descriptor.parameters().iter().enumerate() {
                let argument = match param.kind {
                    ParamKind::Injection => {
                        Argument::Component(self.dependency(descriptor, param, &chain).await?)
                    }
                    ParamKind::Data => {
                        Argument::Data(self.data_value(descriptor, param, index, data).await?)
                    }
                };
                values.push((param.clone(), argument));
            }

            tracing::debug!("Constructing {}", descriptor.name());
            let instance = (factory)(&Arguments::new(descriptor.name(), values))?;
            lifecycle::run_initializers(descriptor, &instance, self.init_timeout).await?;
            Ok(instance)
        }
        .boxed()
    }

    async fn dependency(
        &self,
        dependent: &ComponentDescriptor,
        param: &ParamSpec,
        chain: &[String],
    ) -> Result<Instance> {
        let target = self
            .registry
            .get(&param.name)
            .map_err(|_| ComponentreeError::NotFound {
                name: param.name.clone(),
                required_by: Some(dependent.name().to_string()),
            })?;

        let mut next = chain.to_vec();
        next.push(param.name.clone());
        if chain.contains(&param.name) {
            return Err(ComponentreeError::Circularity { chain: next });
        }

        if target.is_service() {
            self.singleton(target, None, next).await
        } else {
            self.instantiate(target, None, next).await
        }
    }

    async fn data_value(
        &self,
        descriptor: &ComponentDescriptor,
        param: &ParamSpec,
        index: usize,
        data: Option<&DataMap>,
    ) -> Result<Value> {
        let value = match &param.source {
            Some(source_name) => {
                let source = self.sources.get(source_name).ok_or_else(|| {
                    ComponentreeError::NoDataSource {
                        component: descriptor.name().to_string(),
                        parameter: param.name.clone(),
                        source_name: source_name.clone(),
                    }
                })?;
                source.resolve(descriptor, &param.name, index).await?
            }
            None => data.and_then(|values| values.get(&param.name)).cloned(),
        };

        value.ok_or_else(|| ComponentreeError::MissingData {
            component: descriptor.name().to_string(),
            parameter: param.name.clone(),
        })
    }
}
