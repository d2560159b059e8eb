//! Component Loaders
//!
//! A loader turns some storage medium into an ordered list of
//! [`ComponentDescriptor`]s. The container never discovers components on its
//! own: every descriptor reaches the registry through a loader or through an
//! explicit registration on the boot builder.

mod inventory_loader;

pub use inventory_loader::{InventoryLoader, Registration};

use crate::config::ComponentreeConfig;
use crate::di::{Component, ComponentDescriptor};
use crate::error::Result;
use async_trait::async_trait;

/// Source of component descriptors for the Load phase
///
/// # Example
///
/// ```rust,ignore
/// use componentree::loader::ComponentLoader;
///
/// struct ManifestLoader { path: PathBuf, catalog: Catalog }
///
/// #[async_trait]
/// impl ComponentLoader for ManifestLoader {
///     async fn load(&self, config: &ComponentreeConfig) -> Result<Vec<ComponentDescriptor>> {
///         let raw = tokio::fs::read_to_string(&self.path).await
///             .map_err(|e| ComponentreeError::Load(e.to_string()))?;
///         self.catalog.describe(&raw, &config.base)
///     }
/// }
/// ```
#[async_trait]
pub trait ComponentLoader: Send + Sync {
    /// Name used in boot diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn load(&self, config: &ComponentreeConfig) -> Result<Vec<ComponentDescriptor>>;
}

/// Loader over an explicit, in-memory list of descriptors.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    descriptors: Vec<ComponentDescriptor>,
}

impl StaticLoader {
    pub fn new(descriptors: impl IntoIterator<Item = ComponentDescriptor>) -> Self {
        Self {
            descriptors: descriptors.into_iter().collect(),
        }
    }

    pub fn with(mut self, descriptor: ComponentDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn component<T: Component>(self) -> Self {
        self.with(T::descriptor())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[async_trait]
impl ComponentLoader for StaticLoader {
    fn name(&self) -> &str {
        "static"
    }

    async fn load(&self, _config: &ComponentreeConfig) -> Result<Vec<ComponentDescriptor>> {
        Ok(self.descriptors.clone())
    }
}

/// Submit a [`Component`] for discovery by [`InventoryLoader`]
///
/// # Example
/// ```rust,ignore
/// componentree::register_component!(UserService);
/// componentree::register_component!(AuditLog, base = "jobs");
/// ```
#[macro_export]
macro_rules! register_component {
    ($component:ty) => {
        $crate::register_component!($component, base = $crate::config::DEFAULT_BASE);
    };
    ($component:ty, base = $base:expr) => {
        $crate::inventory::submit! {
            $crate::loader::Registration::new(
                $base,
                module_path!(),
                <$component as $crate::Component>::descriptor,
            )
        }
    };
}
