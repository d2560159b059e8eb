mod arguments;
mod builder;
mod container;
mod descriptor;
mod index;
mod registry;
mod source;
mod validator;

pub use arguments::{Argument, Arguments};
pub use builder::ContainerBuilder;
pub use container::{Container, DataMap};
pub use descriptor::{Component, ComponentDescriptor, DescriptorBuilder, Instance, ParamKind, ParamSpec};
pub use index::ComponentIndex;
pub use registry::ComponentRegistry;
pub use source::{PARAMETER_SOURCE, ParameterSource, ParameterSources};
pub use validator::{DependencyValidator, ValidationReport};
