//! Registry manifest
//!
//! A serializable snapshot of component metadata. Factories, casters and
//! initializer bodies are code and stay out of it.

use crate::di::{ComponentDescriptor, ComponentRegistry, ParamSpec};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// One shared instance, cached after first construction.
    Service,
    /// A fresh instance per resolution.
    Transient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub parameters: Vec<ParamSpec>,
    pub tags: Vec<String>,
    pub capabilities: Vec<String>,
    pub lifecycle: Lifecycle,
    pub initializers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl From<&ComponentDescriptor> for ManifestEntry {
    fn from(descriptor: &ComponentDescriptor) -> Self {
        Self {
            name: descriptor.name().to_string(),
            parameters: descriptor.parameters().to_vec(),
            tags: descriptor.tags().iter().cloned().collect(),
            capabilities: descriptor.capabilities().map(str::to_string).collect(),
            lifecycle: if descriptor.is_service() {
                Lifecycle::Service
            } else {
                Lifecycle::Transient
            },
            initializers: descriptor
                .initializers()
                .iter()
                .map(|init| init.name().to_string())
                .collect(),
            source: descriptor.source().map(str::to_string),
        }
    }
}

/// Components in registry order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentManifest {
    pub components: Vec<ManifestEntry>,
}

impl ComponentManifest {
    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.components.iter().find(|entry| entry.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl ComponentRegistry {
    pub fn manifest(&self) -> ComponentManifest {
        ComponentManifest {
            components: self.iter().map(ManifestEntry::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{PARAMETER_SOURCE, ParamKind};
    use serde_json::json;

    fn registry() -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        registry.register(
            ComponentDescriptor::builder("Repo")
                .service()
                .tag("storage")
                .data_from("url", "ConfigService")
                .initializer("connect", |_: std::sync::Arc<()>| async { anyhow::Ok(()) })
                .source("app::repo")
                .build(),
        );
        registry.register(ComponentDescriptor::builder("Handler").inject("Repo").build());
        registry
    }

    #[test]
    fn test_manifest_follows_registry() {
        let manifest = registry().manifest();
        let names: Vec<_> = manifest.components.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Repo", "Handler"]);

        let repo = manifest.get("Repo").unwrap();
        assert_eq!(repo.lifecycle, Lifecycle::Service);
        assert_eq!(repo.tags, ["storage"]);
        assert_eq!(repo.initializers, ["connect"]);
        assert_eq!(repo.parameters[0].kind, ParamKind::Data);
        assert_eq!(repo.parameters[0].source.as_deref(), Some("ConfigService"));

        let handler = manifest.get("Handler").unwrap();
        assert_eq!(handler.lifecycle, Lifecycle::Transient);
        assert_eq!(handler.source, None);
    }

    #[test]
    fn test_manifest_json_shape() {
        let value = serde_json::to_value(registry().manifest()).unwrap();
        let handler = &value["components"][1];

        assert_eq!(handler["lifecycle"], json!("transient"));
        assert_eq!(handler["parameters"][0]["kind"], json!("Injection"));
        assert!(handler.get("source").is_none());

        let parsed: ComponentManifest = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, registry().manifest());
    }

    #[test]
    fn test_capabilities_listed() {
        let mut registry = ComponentRegistry::new();
        registry.register(crate::config::ConfigService::descriptor_with(Vec::new()));
        let manifest = registry.manifest();
        assert_eq!(manifest.components[0].capabilities, [PARAMETER_SOURCE]);
        assert_eq!("service".parse::<Lifecycle>().unwrap(), Lifecycle::Service);
    }
}
