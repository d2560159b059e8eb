use crate::di::{Instance, ParamSpec};
use crate::error::{ComponentreeError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// A resolved constructor argument.
#[derive(Clone)]
pub enum Argument {
    Component(Instance),
    Data(Value),
}

/// Resolved constructor arguments, in parameter declaration order.
///
/// Factories read their arguments positionally; every accessor reports a
/// shape mismatch as [`ComponentreeError::NotConstructible`].
pub struct Arguments {
    component: String,
    values: Vec<(ParamSpec, Argument)>,
}

impl Arguments {
    pub(crate) fn new(component: impl Into<String>, values: Vec<(ParamSpec, Argument)>) -> Self {
        Self {
            component: component.into(),
            values,
        }
    }

    /// Name of the component being constructed.
    pub fn component_name(&self) -> &str {
        &self.component
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of the parameter called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.values.iter().position(|(spec, _)| spec.name == name)
    }

    pub fn spec(&self, index: usize) -> Result<&ParamSpec> {
        self.entry(index).map(|(spec, _)| spec)
    }

    /// The injected instance at `index`, type-erased.
    pub fn instance(&self, index: usize) -> Result<Instance> {
        match self.entry(index)? {
            (_, Argument::Component(instance)) => Ok(Arc::clone(instance)),
            (spec, Argument::Data(_)) => Err(self.mismatch(format!(
                "parameter {index} ('{}') is a data parameter, not an injection",
                spec.name
            ))),
        }
    }

    /// The injected instance at `index`, downcast to `T`.
    pub fn component<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>> {
        let instance = self.instance(index)?;
        instance.downcast::<T>().map_err(|_| {
            self.mismatch(format!(
                "parameter {index} is not a {}",
                std::any::type_name::<T>()
            ))
        })
    }

    /// The raw data value at `index`.
    pub fn value(&self, index: usize) -> Result<&Value> {
        match self.entry(index)? {
            (_, Argument::Data(value)) => Ok(value),
            (spec, Argument::Component(_)) => Err(self.mismatch(format!(
                "parameter {index} ('{}') is an injection, not a data parameter",
                spec.name
            ))),
        }
    }

    /// The data value at `index`, deserialized into `T`.
    pub fn data<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let value = self.value(index)?;
        T::deserialize(value).map_err(|e| {
            self.mismatch(format!(
                "parameter {index} cannot be read as {}: {e}",
                std::any::type_name::<T>()
            ))
        })
    }

    fn entry(&self, index: usize) -> Result<&(ParamSpec, Argument)> {
        self.values.get(index).ok_or_else(|| {
            self.mismatch(format!(
                "parameter {index} requested but only {} declared",
                self.values.len()
            ))
        })
    }

    fn mismatch(&self, reason: String) -> ComponentreeError {
        ComponentreeError::not_constructible(&self.component, reason)
    }
}
