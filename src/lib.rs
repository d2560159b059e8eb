//! # Componentree
//!
//! Startup-time component composition for Rust services.
//!
//! Componentree loads component descriptors, validates their dependency graph,
//! and constructs every service once, in a deterministic order, before the
//! application starts doing real work.
//!
//! ## Features
//!
//! - **Explicit Descriptors**: every constructor parameter is declared as an injection or as data
//! - **Graph Validation**: circular dependencies are reported before anything is built
//! - **Singleton Services**: each service is constructed at most once, even under concurrent requests
//! - **Parameter Sources**: pluggable components that supply configuration data to constructors
//! - **Capability Queries**: look components up by tag or by declared capability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use componentree::prelude::*;
//!
//! #[derive(Component)]
//! #[component(service)]
//! pub struct Database {
//!     #[param(data, source = "ConfigService")]
//!     url: String,
//! }
//!
//! #[derive(Component)]
//! #[component(service, tag = "api", init = "warm_up")]
//! pub struct UserService {
//!     #[param(inject)]
//!     db: Arc<Database>,
//! }
//!
//! impl UserService {
//!     async fn warm_up(&self) -> anyhow::Result<()> {
//!         tracing::info!("users backed by {}", self.db.url);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let app = Componentree::builder()
//!         .config_value("url", "postgres://localhost/app")
//!         .component::<Database>()
//!         .component::<UserService>()
//!         .boot()
//!         .await?;
//!
//!     let users = app.container().get_instance::<UserService>().await?;
//!     Ok(())
//! }
//! ```

extern crate self as componentree;

pub mod boot;
pub mod config;
pub mod di;
pub mod error;
pub mod lifecycle;
pub mod loader;
pub mod manifest;

// Re-export core types
pub use boot::{BootPhase, Componentree, ComponentreeBuilder};
pub use config::{ComponentreeConfig, ConfigService};
pub use di::{
    Argument, Arguments, Component, ComponentDescriptor, ComponentIndex, ComponentRegistry,
    Container, ContainerBuilder, DataMap, DescriptorBuilder, Instance, PARAMETER_SOURCE, ParamKind,
    ParamSpec, ParameterSource,
};
pub use error::{ComponentreeError, Result};
pub use lifecycle::Initializer;
pub use loader::{ComponentLoader, InventoryLoader, StaticLoader};
pub use manifest::{ComponentManifest, ManifestEntry};

// Re-export macros
pub use componentree_macro::Component;

// Re-export commonly used types from dependencies
pub use anyhow;
pub use async_trait::async_trait;
pub use inventory;
pub use serde_json;

/// Prelude module for convenient imports
///
/// ```
/// use componentree::prelude::*;
/// ```
pub mod prelude {
    pub use crate::boot::{Componentree, ComponentreeBuilder};
    pub use crate::config::{ComponentreeConfig, ConfigService};
    pub use crate::di::{
        Arguments, ComponentDescriptor, ComponentIndex, Container, DescriptorBuilder, ParamSpec,
        ParameterSource,
    };
    pub use crate::error::{ComponentreeError, Result};
    pub use crate::loader::{ComponentLoader, InventoryLoader, StaticLoader};
    // Both the trait and the derive macro
    pub use crate::Component;
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
