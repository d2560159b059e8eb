use crate::di::{
    Component, ComponentDescriptor, ComponentRegistry, Container, DependencyValidator,
    ValidationReport,
};
use crate::error::Result;
use std::time::Duration;

/// Builder for constructing a dependency injection container
///
/// Registration is only possible here; `build` validates the dependency
/// graph and freezes the registry inside the resulting [`Container`].
///
/// # Example
/// ```
/// use componentree::{ComponentDescriptor, ContainerBuilder};
///
/// let container = ContainerBuilder::new()
///     .register(ComponentDescriptor::builder("Clock").service().factory(|_| Ok(())).build())
///     .build()
///     .unwrap();
///
/// assert!(container.get("Clock").is_ok());
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    registry: ComponentRegistry,
    init_timeout: Option<Duration>,
}

impl ContainerBuilder {
    /// Create a new container builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor; a later registration under the same name wins
    pub fn register(mut self, descriptor: ComponentDescriptor) -> Self {
        self.add(descriptor);
        self
    }

    /// Register a statically declared component
    pub fn component<T: Component>(self) -> Self {
        self.register(T::descriptor())
    }

    /// Set a timeout applied to each initializer
    pub fn init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = Some(timeout);
        self
    }

    pub(crate) fn add(&mut self, descriptor: ComponentDescriptor) {
        self.registry.register(descriptor);
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Scan the registered components for circular dependencies
    pub fn validate(&self) -> ValidationReport {
        DependencyValidator::new(&self.registry).validate()
    }

    /// Validate and build the container
    ///
    /// # Errors
    ///
    /// Returns [`crate::ComponentreeError::InvalidGraph`] carrying every
    /// circular chain found.
    pub fn build(self) -> Result<Container> {
        let report = self.validate();
        for (component, missing) in &report.unresolved {
            tracing::warn!("{} depends on unregistered component {}", component, missing);
        }
        for cycle in &report.circularities {
            tracing::error!("{}", cycle);
        }
        report.into_result()?;

        Ok(Container::new(self.registry, self.init_timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComponentreeError;

    #[test]
    fn test_build_rejects_cycles() {
        let result = ContainerBuilder::new()
            .register(ComponentDescriptor::builder("C").inject("C").build())
            .build();

        match result {
            Err(ComponentreeError::InvalidGraph { count, errors }) => {
                assert_eq!(count, 1);
                assert_eq!(errors[0].chain().unwrap(), ["C", "C"]);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("cyclic registry must not build"),
        }
    }

    #[test]
    fn test_build_tolerates_unresolved_references() {
        let container = ContainerBuilder::new()
            .register(ComponentDescriptor::builder("A").inject("Ghost").build())
            .build()
            .unwrap();
        assert_eq!(container.registry().len(), 1);
    }
}
