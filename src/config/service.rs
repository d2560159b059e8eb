use crate::di::{Arguments, Component, ComponentDescriptor, DescriptorBuilder, ParameterSource};
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::env;
use std::sync::Arc;

/// Configuration service
///
/// A key/value store registered as a built-in parameter source. Lookups for a
/// parameter try `"{component}.{parameter}"` first, then `"{parameter}"`.
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, Value>>,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded from the process environment.
    pub fn from_env() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(key, parse_env_value(&value));
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.config.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.config.len()
    }

    pub fn is_empty(&self) -> bool {
        self.config.is_empty()
    }

    /// Descriptor of the built-in service, seeded from the environment and
    /// then from `values`.
    pub fn descriptor_with(values: Vec<(String, Value)>) -> ComponentDescriptor {
        Self::declare(ComponentDescriptor::builder(Self::NAME))
            .factory(move |_| {
                let service = ConfigService::from_env();
                for (key, value) in &values {
                    service.set(key.clone(), value.clone());
                }
                Ok(service)
            })
            .source(module_path!())
            .build()
    }
}

impl Component for ConfigService {
    const NAME: &'static str = "ConfigService";

    fn declare(builder: DescriptorBuilder) -> DescriptorBuilder {
        builder
            .service()
            .tag("builtin")
            .parameter_source::<ConfigService>()
    }

    fn construct(_args: &Arguments) -> Result<Self> {
        Ok(ConfigService::from_env())
    }
}

#[async_trait]
impl ParameterSource for ConfigService {
    async fn resolve(
        &self,
        target: &ComponentDescriptor,
        parameter: &str,
        _index: usize,
    ) -> Result<Option<Value>> {
        let scoped = format!("{}.{}", target.name(), parameter);
        Ok(self.get(&scoped).or_else(|| self.get(parameter)))
    }
}

/// Environment values are strings; scalars that parse as JSON keep their type.
fn parse_env_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Bool(_) | Value::Number(_) | Value::Null)) => value,
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_env_values_keep_scalar_types() {
        assert_eq!(parse_env_value("8080"), json!(8080));
        assert_eq!(parse_env_value("true"), json!(true));
        assert_eq!(parse_env_value("localhost"), json!("localhost"));
        assert_eq!(parse_env_value("[1,2]"), json!("[1,2]"));
    }

    #[tokio::test]
    async fn test_scoped_key_wins() {
        let service = ConfigService::new();
        service.set("port", 80);
        service.set("Api.port", 8443);

        let api = ComponentDescriptor::builder("Api").build();
        let web = ComponentDescriptor::builder("Web").build();

        assert_eq!(service.resolve(&api, "port", 0).await.unwrap(), Some(json!(8443)));
        assert_eq!(service.resolve(&web, "port", 0).await.unwrap(), Some(json!(80)));
        assert_eq!(service.resolve(&web, "host", 1).await.unwrap(), None);
    }

    #[test]
    fn test_builtin_descriptor() {
        let descriptor = ConfigService::descriptor_with(Vec::new());
        assert_eq!(descriptor.name(), "ConfigService");
        assert!(descriptor.is_service());
        assert!(descriptor.implements(crate::di::PARAMETER_SOURCE));
        assert!(descriptor.is_constructible());
    }
}
