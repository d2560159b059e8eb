//! Component Lifecycle
//!
//! Runs the post-construction initializers declared on a component.
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. Resolve constructor parameters (in declaration order)
//!    ↓
//! 2. Construct the instance
//!    ↓
//! 3. Initializers (each awaited, in declaration order)   ← Lifecycle Hook
//!    ↓
//! 4. Instance handed to dependents / cached as singleton
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use componentree::prelude::*;
//!
//! #[derive(Component)]
//! #[component(service, init = "connect")]
//! pub struct DatabaseService {
//!     #[param(data, source = "ConfigService")]
//!     url: String,
//! }
//!
//! impl DatabaseService {
//!     async fn connect(&self) -> anyhow::Result<()> {
//!         tracing::info!("Connecting to {}", self.url);
//!         Ok(())
//!     }
//! }
//! ```

mod initializer;

pub use initializer::Initializer;

use crate::di::{ComponentDescriptor, Instance};
use crate::error::{ComponentreeError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Execute all initializers of `descriptor` against `instance`
///
/// Initializers are executed in the order they were declared; the first
/// failure aborts the sequence.
pub(crate) async fn run_initializers(
    descriptor: &ComponentDescriptor,
    instance: &Instance,
    timeout: Option<Duration>,
) -> Result<()> {
    let initializers = descriptor.initializers();
    if initializers.is_empty() {
        return Ok(());
    }

    for init in initializers {
        tracing::debug!("Initializing: {}::{}", descriptor.name(), init.name());
        let pending = init.invoke(Arc::clone(instance));

        let outcome = match timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .unwrap_or_else(|_| Err(anyhow::anyhow!("timeout after {:?}", limit))),
            None => pending.await,
        };

        outcome.map_err(|e| {
            tracing::error!(
                "Initializer {}::{} failed: {:#}",
                descriptor.name(),
                init.name(),
                e
            );
            ComponentreeError::InitializerFailure {
                component: descriptor.name().to_string(),
                initializer: init.name().to_string(),
                message: format!("{e:#}"),
            }
        })?;
    }

    tracing::debug!(
        "{} initialized ({} initializers executed)",
        descriptor.name(),
        initializers.len()
    );
    Ok(())
}
