use crate::di::ComponentDescriptor;
use crate::error::{ComponentreeError, Result};
use indexmap::IndexMap;

/// Mapping from component name to descriptor.
///
/// Iteration follows first-registration order. Re-registering a name replaces
/// the descriptor but keeps its position, so boot order stays deterministic.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: IndexMap<String, ComponentDescriptor>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `descriptor.name()`.
    ///
    /// Returns the descriptor that was replaced, if any.
    pub fn register(&mut self, descriptor: ComponentDescriptor) -> Option<ComponentDescriptor> {
        let name = descriptor.name().to_string();
        let previous = self.components.insert(name, descriptor);
        if let Some(previous) = &previous {
            tracing::debug!(
                "Component {} re-registered; replacing definition from {}",
                previous.name(),
                previous.source().unwrap_or("<unknown>")
            );
        }
        previous
    }

    pub fn get(&self, name: &str) -> Result<&ComponentDescriptor> {
        self.components
            .get(name)
            .ok_or_else(|| ComponentreeError::not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.components.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Service (singleton) descriptors, in registry order.
    pub fn services(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.iter().filter(|d| d.is_service())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Descriptors carrying every requested tag.
    ///
    /// A descriptor without any tags never matches, even when no tags are requested.
    pub fn find_by_tags(&self, tags: &[&str]) -> Vec<&ComponentDescriptor> {
        self.iter()
            .filter(|d| !d.tags().is_empty() && d.has_tags(tags))
            .collect()
    }

    /// Descriptors implementing `capability`, narrowed by `tags` when any are given.
    pub fn find_by_capability(&self, capability: &str, tags: &[&str]) -> Vec<&ComponentDescriptor> {
        self.iter()
            .filter(|d| d.implements(capability))
            .filter(|d| tags.is_empty() || d.has_tags(tags))
            .collect()
    }
}
