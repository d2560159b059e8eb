//! Configuration
//!
//! [`ComponentreeConfig`] is the boot configuration. [`ConfigService`] is the
//! built-in component that serves configuration values to `Data` parameters.

mod service;

pub use service::ConfigService;

use crate::error::Result;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default discovery key handed to loaders.
pub const DEFAULT_BASE: &str = "c";

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "componentree.toml";

/// Prefix of environment variables overriding configuration keys.
pub const ENV_PREFIX: &str = "COMPONENTREE_";

/// Boot configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentreeConfig {
    /// Discovery key used by loaders; the container itself never reads it.
    pub base: String,
    /// Verbose boot diagnostics.
    pub debug: bool,
    /// Upper bound for each initializer, in milliseconds.
    pub init_timeout_ms: Option<u64>,
}

impl Default for ComponentreeConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE.to_string(),
            debug: false,
            init_timeout_ms: None,
        }
    }
}

impl ComponentreeConfig {
    /// Load configuration from all sources
    ///
    /// Sources are merged in this order (later sources override earlier):
    /// 1. Default values
    /// 2. `componentree.toml` in the working directory (if it exists)
    /// 3. `COMPONENTREE_*` environment variables
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILENAME)
    }

    /// Like [`load`](Self::load), reading the given TOML file instead.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::layered(path.as_ref(), ENV_PREFIX)
    }

    fn layered(path: &Path, env_prefix: &str) -> Result<Self> {
        Self::figment(path)
            .merge(Env::prefixed(env_prefix))
            .extract()
            .map_err(Into::into)
    }

    fn figment(path: &Path) -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if path.exists() {
            figment.merge(Toml::file(path))
        } else {
            figment
        }
    }

    pub fn init_timeout(&self) -> Option<Duration> {
        self.init_timeout_ms.map(Duration::from_millis)
    }
}
