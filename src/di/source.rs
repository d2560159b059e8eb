use crate::di::ComponentDescriptor;
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

/// Capability identifier under which parameter sources are discovered.
pub const PARAMETER_SOURCE: &str = "ParameterSource";

/// Pluggable resolver for `Data` parameters
///
/// Parameter sources are components themselves. They are discovered by the
/// [`PARAMETER_SOURCE`] capability and instantiated before any service.
///
/// # Example
/// ```
/// use componentree::{ComponentDescriptor, ParameterSource, Result};
/// use componentree::async_trait;
/// use serde_json::{Value, json};
///
/// struct Defaults;
///
/// #[async_trait]
/// impl ParameterSource for Defaults {
///     async fn resolve(
///         &self,
///         _target: &ComponentDescriptor,
///         parameter: &str,
///         _index: usize,
///     ) -> Result<Option<Value>> {
///         Ok((parameter == "port").then(|| json!(8080)))
///     }
/// }
///
/// let descriptor = ComponentDescriptor::builder("Defaults")
///     .parameter_source::<Defaults>()
///     .factory(|_| Ok(Defaults))
///     .build();
/// ```
#[async_trait]
pub trait ParameterSource: Send + Sync {
    /// Produce the value of parameter `parameter` (at position `index`) of `target`.
    ///
    /// `Ok(None)` means the source has no value; the injector reports it as missing.
    async fn resolve(
        &self,
        target: &ComponentDescriptor,
        parameter: &str,
        index: usize,
    ) -> Result<Option<Value>>;
}

/// Parameter sources keyed by component name.
#[derive(Default)]
pub struct ParameterSources {
    sources: DashMap<String, Arc<dyn ParameterSource>>,
}

impl ParameterSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, source: Arc<dyn ParameterSource>) {
        self.sources.insert(name.into(), source);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ParameterSource>> {
        self.sources.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
