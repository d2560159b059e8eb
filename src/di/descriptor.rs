use crate::di::Arguments;
use crate::di::source::{PARAMETER_SOURCE, ParameterSource};
use crate::error::Result;
use crate::lifecycle::Initializer;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A constructed, type-erased component instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) type Factory = Arc<dyn Fn(&Arguments) -> Result<Instance> + Send + Sync>;

/// Type alias for a function that can cast an `Instance` to another `Instance`.
/// The inner value is usually an `Arc<dyn Trait>`.
pub(crate) type CasterFn = Arc<dyn Fn(Instance) -> Option<Instance> + Send + Sync>;

/// How a constructor parameter is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// Resolved by injecting the component registered under the parameter name.
    Injection,
    /// Resolved from a parameter source or from caller-supplied data.
    Data,
}

/// Declaration of a single constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    /// Name of the parameter source supplying a `Data` parameter.
    pub source: Option<String>,
}

impl ParamSpec {
    pub fn inject(component: impl Into<String>) -> Self {
        Self {
            name: component.into(),
            kind: ParamKind::Injection,
            source: None,
        }
    }

    pub fn data(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Data,
            source: None,
        }
    }

    pub fn data_from(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Data,
            source: Some(source.into()),
        }
    }

    pub fn is_injection(&self) -> bool {
        self.kind == ParamKind::Injection
    }
}

/// Everything the container knows about a constructible component.
///
/// Descriptors are immutable once built; the parameter list in particular
/// keeps the length it had at registration.
#[derive(Clone)]
pub struct ComponentDescriptor {
    name: String,
    parameters: Arc<[ParamSpec]>,
    tags: BTreeSet<String>,
    capabilities: BTreeMap<String, Option<CasterFn>>,
    is_service: bool,
    initializers: Vec<Initializer>,
    source: Option<String>,
    factory: Option<Factory>,
}

impl ComponentDescriptor {
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[ParamSpec] {
        &self.parameters
    }

    /// Injection-kind parameters, in declaration order.
    pub fn dependencies(&self) -> impl Iterator<Item = &ParamSpec> {
        self.parameters.iter().filter(|p| p.is_injection())
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tags(&self, tags: &[&str]) -> bool {
        tags.iter().all(|tag| self.tags.contains(*tag))
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.capabilities.keys().map(String::as_str)
    }

    pub fn implements(&self, capability: &str) -> bool {
        self.capabilities.contains_key(capability)
    }

    pub fn is_service(&self) -> bool {
        self.is_service
    }

    pub fn initializers(&self) -> &[Initializer] {
        &self.initializers
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_constructible(&self) -> bool {
        self.factory.is_some()
    }

    pub(crate) fn factory(&self) -> Option<&Factory> {
        self.factory.as_ref()
    }

    pub(crate) fn caster(&self, capability: &str) -> Option<&CasterFn> {
        self.capabilities.get(capability).and_then(Option::as_ref)
    }

    pub(crate) fn set_source_if_missing(&mut self, source: &str) {
        if self.source.is_none() {
            self.source = Some(source.to_string());
        }
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("tags", &self.tags)
            .field("capabilities", &self.capabilities.keys().collect::<Vec<_>>())
            .field("is_service", &self.is_service)
            .field("initializers", &self.initializers)
            .field("source", &self.source)
            .field("constructible", &self.factory.is_some())
            .finish()
    }
}

/// Builder for [`ComponentDescriptor`]
///
/// # Example
/// ```
/// use componentree::ComponentDescriptor;
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// let descriptor = ComponentDescriptor::builder("Greeter")
///     .data("greeting")
///     .tag("http")
///     .service()
///     .factory(|args| Ok(Greeter { greeting: args.data(0)? }))
///     .build();
///
/// assert_eq!(descriptor.parameters().len(), 1);
/// ```
pub struct DescriptorBuilder {
    name: String,
    parameters: Vec<ParamSpec>,
    tags: BTreeSet<String>,
    capabilities: BTreeMap<String, Option<CasterFn>>,
    is_service: bool,
    initializers: Vec<Initializer>,
    source: Option<String>,
    factory: Option<Factory>,
}

impl DescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            tags: BTreeSet::new(),
            capabilities: BTreeMap::new(),
            is_service: false,
            initializers: Vec::new(),
            source: None,
            factory: None,
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = ParamSpec>) -> Self {
        self.parameters.extend(params);
        self
    }

    pub fn inject(self, component: impl Into<String>) -> Self {
        self.param(ParamSpec::inject(component))
    }

    pub fn data(self, name: impl Into<String>) -> Self {
        self.param(ParamSpec::data(name))
    }

    pub fn data_from(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.param(ParamSpec::data_from(name, source))
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Mark the component as a singleton service.
    pub fn service(mut self) -> Self {
        self.is_service = true;
        self
    }

    /// Declare a capability without a typed view of the instance.
    pub fn implements(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.entry(capability.into()).or_insert(None);
        self
    }

    /// Declare a capability together with the cast to its trait object.
    pub fn provides<Trait, Impl, F>(mut self, capability: impl Into<String>, caster_fn: F) -> Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        let caster: CasterFn = Arc::new(move |instance: Instance| {
            let concrete = instance.downcast::<Impl>().ok()?;
            let trait_obj: Arc<Trait> = caster_fn(concrete);
            Some(Arc::new(trait_obj) as Instance)
        });
        self.capabilities.insert(capability.into(), Some(caster));
        self
    }

    /// Declare the component as a [`ParameterSource`].
    pub fn parameter_source<Impl: ParameterSource + 'static>(self) -> Self {
        self.provides::<dyn ParameterSource, Impl, _>(PARAMETER_SOURCE, |instance| {
            instance as Arc<dyn ParameterSource>
        })
    }

    /// Append a post-construction initializer; initializers run in the order added.
    pub fn initializer<T, F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.initializers.push(Initializer::new(name, f));
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn factory<T, F>(mut self, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Arguments) -> Result<T> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(move |args: &Arguments| {
            f(args).map(|instance| Arc::new(instance) as Instance)
        }));
        self
    }

    pub fn build(self) -> ComponentDescriptor {
        ComponentDescriptor {
            name: self.name,
            parameters: self.parameters.into(),
            tags: self.tags,
            capabilities: self.capabilities,
            is_service: self.is_service,
            initializers: self.initializers,
            source: self.source,
            factory: self.factory,
        }
    }
}

/// Trait for types that declare themselves to the container
///
/// This trait is typically implemented automatically via the `#[derive(Component)]` macro,
/// which turns field attributes into the ordered parameter list.
///
/// # Example
/// ```
/// use componentree::{Arguments, Component, DescriptorBuilder, ParamSpec, Result};
/// use std::sync::Arc;
///
/// struct Database;
///
/// impl Component for Database {
///     const NAME: &'static str = "Database";
///
///     fn declare(builder: DescriptorBuilder) -> DescriptorBuilder {
///         builder.service()
///     }
///
///     fn construct(_args: &Arguments) -> Result<Self> {
///         Ok(Database)
///     }
/// }
///
/// struct UserService {
///     database: Arc<Database>,
/// }
///
/// impl Component for UserService {
///     const NAME: &'static str = "UserService";
///
///     fn parameters() -> Vec<ParamSpec> {
///         vec![ParamSpec::inject(Database::NAME)]
///     }
///
///     fn construct(args: &Arguments) -> Result<Self> {
///         Ok(UserService { database: args.component(0)? })
///     }
/// }
///
/// assert_eq!(UserService::descriptor().dependencies().count(), 1);
/// ```
pub trait Component: Sized + Send + Sync + 'static {
    /// Registry key of the component.
    const NAME: &'static str;

    /// Constructor parameters, in the order `construct` reads them.
    fn parameters() -> Vec<ParamSpec> {
        Vec::new()
    }

    /// Lifecycle, tags, capabilities and initializers.
    fn declare(builder: DescriptorBuilder) -> DescriptorBuilder {
        builder
    }

    fn construct(args: &Arguments) -> Result<Self>;

    fn descriptor() -> ComponentDescriptor {
        let builder = ComponentDescriptor::builder(Self::NAME)
            .params(Self::parameters())
            .factory(Self::construct);
        Self::declare(builder).build()
    }
}
