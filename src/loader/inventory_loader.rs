//! Compile-time component discovery.
//!
//! Components submit a [`Registration`] via `inventory::submit!` (usually
//! through `#[component(base = "...")]` or [`crate::register_component!`]).
//! Nothing reads the collected entries until [`InventoryLoader`] runs in the
//! Load phase.

use super::ComponentLoader;
use crate::config::ComponentreeConfig;
use crate::di::ComponentDescriptor;
use crate::error::Result;
use async_trait::async_trait;

/// Registry entry for discoverable components
pub struct Registration {
    /// Discovery key matched against [`ComponentreeConfig::base`].
    pub base: &'static str,
    /// Module that submitted the entry.
    pub source: &'static str,
    /// Builds the component's descriptor.
    pub describe: fn() -> ComponentDescriptor,
}

impl Registration {
    pub const fn new(
        base: &'static str,
        source: &'static str,
        describe: fn() -> ComponentDescriptor,
    ) -> Self {
        Self {
            base,
            source,
            describe,
        }
    }
}

inventory::collect!(Registration);

/// Loads every submitted [`Registration`] whose base matches the configuration.
///
/// Link order is not stable, so descriptors are sorted by source module and
/// name before they are handed to the registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryLoader;

impl InventoryLoader {
    pub fn new() -> Self {
        Self
    }

    /// Number of registrations submitted for `base`.
    pub fn available(base: &str) -> usize {
        inventory::iter::<Registration>()
            .filter(|entry| entry.base == base)
            .count()
    }
}

#[async_trait]
impl ComponentLoader for InventoryLoader {
    fn name(&self) -> &str {
        "inventory"
    }

    async fn load(&self, config: &ComponentreeConfig) -> Result<Vec<ComponentDescriptor>> {
        let mut found: Vec<(&'static str, ComponentDescriptor)> = inventory::iter::<Registration>()
            .filter(|entry| entry.base == config.base)
            .map(|entry| {
                let mut descriptor = (entry.describe)();
                descriptor.set_source_if_missing(entry.source);
                (entry.source, descriptor)
            })
            .collect();

        found.sort_by(|(a_source, a), (b_source, b)| {
            a_source.cmp(b_source).then_with(|| a.name().cmp(b.name()))
        });

        if config.debug {
            for (source, descriptor) in &found {
                tracing::debug!("Discovered {} in {}", descriptor.name(), source);
            }
        }

        Ok(found.into_iter().map(|(_, descriptor)| descriptor).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{Arguments, Component, DescriptorBuilder};

    struct Mailer;

    impl Component for Mailer {
        const NAME: &'static str = "Mailer";

        fn declare(builder: DescriptorBuilder) -> DescriptorBuilder {
            builder.service().tag("mail")
        }

        fn construct(_args: &Arguments) -> Result<Self> {
            Ok(Mailer)
        }
    }

    struct Outbox;

    impl Component for Outbox {
        const NAME: &'static str = "Outbox";

        fn construct(_args: &Arguments) -> Result<Self> {
            Ok(Outbox)
        }
    }

    crate::register_component!(Mailer, base = "inventory-loader-test");
    crate::register_component!(Outbox, base = "inventory-loader-test");
    crate::register_component!(Outbox, base = "inventory-loader-other");

    fn config(base: &str) -> ComponentreeConfig {
        ComponentreeConfig {
            base: base.to_string(),
            ..ComponentreeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_loads_matching_base_only() {
        let loaded = InventoryLoader
            .load(&config("inventory-loader-test"))
            .await
            .unwrap();

        let names: Vec<_> = loaded.iter().map(|d| d.name()).collect();
        assert_eq!(names, ["Mailer", "Outbox"]);
        assert_eq!(loaded[0].source(), Some(module_path!()));
        assert!(loaded[0].is_service());
        assert_eq!(InventoryLoader::available("inventory-loader-other"), 1);
    }

    #[tokio::test]
    async fn test_unknown_base_loads_nothing() {
        let loaded = InventoryLoader.load(&config("nothing-here")).await.unwrap();
        assert!(loaded.is_empty());
    }
}
