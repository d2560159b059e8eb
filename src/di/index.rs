//! Built-in query handle
//!
//! Every booted container registers [`ComponentIndex`] as a service, so
//! components can inject it and run tag or capability queries against the
//! frozen registry from their own code.

use crate::di::{Arguments, Component, ComponentDescriptor, ComponentRegistry, DescriptorBuilder};
use crate::error::{ComponentreeError, Result};
use std::sync::Arc;

/// Read-only view of the registry a container was built from
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Component)]
/// #[component(service, init = "announce")]
/// struct JobRunner {
///     #[param(inject)]
///     index: Arc<ComponentIndex>,
/// }
///
/// impl JobRunner {
///     async fn announce(&self) -> anyhow::Result<()> {
///         for job in self.index.find_by_tags(&["job"]) {
///             tracing::info!("scheduled {}", job.name());
///         }
///         Ok(())
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ComponentIndex {
    registry: Arc<ComponentRegistry>,
}

impl ComponentIndex {
    pub(crate) fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn get(&self, name: &str) -> Result<&ComponentDescriptor> {
        self.registry.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn find_by_tags(&self, tags: &[&str]) -> Vec<&ComponentDescriptor> {
        self.registry.find_by_tags(tags)
    }

    pub fn find_by_capability(&self, capability: &str, tags: &[&str]) -> Vec<&ComponentDescriptor> {
        self.registry.find_by_capability(capability, tags)
    }
}

impl Component for ComponentIndex {
    const NAME: &'static str = "Componentree";

    fn declare(builder: DescriptorBuilder) -> DescriptorBuilder {
        builder.service().tag("builtin")
    }

    /// The container seeds the instance when it freezes the registry.
    fn construct(_args: &Arguments) -> Result<Self> {
        Err(ComponentreeError::not_constructible(
            Self::NAME,
            "provided by the container",
        ))
    }

    fn descriptor() -> ComponentDescriptor {
        Self::declare(ComponentDescriptor::builder(Self::NAME))
            .source(module_path!())
            .build()
    }
}
