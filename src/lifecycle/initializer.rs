//! Post-construction initializers
//!
//! An initializer is a named asynchronous step bound to the concrete component
//! type. It receives the freshly constructed instance after every constructor
//! parameter has been resolved.

use crate::di::Instance;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type InitFn = Arc<dyn Fn(Instance) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// A named, asynchronous post-construction step
///
/// # Example
///
/// ```rust
/// use componentree::lifecycle::Initializer;
/// use std::sync::Arc;
///
/// struct Cache;
///
/// impl Cache {
///     async fn warm(&self) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
///
/// let init = Initializer::new("warm", |cache: Arc<Cache>| async move { cache.warm().await });
/// assert_eq!(init.name(), "warm");
/// ```
#[derive(Clone)]
pub struct Initializer {
    name: String,
    run: InitFn,
}

impl Initializer {
    pub fn new<T, F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let bound = name.clone();
        let run: InitFn = Arc::new(move |instance: Instance| match instance.downcast::<T>() {
            Ok(component) => f(component).boxed(),
            Err(_) => {
                let message = format!(
                    "initializer '{}' expects a {} instance",
                    bound,
                    std::any::type_name::<T>()
                );
                async move { Err(anyhow::anyhow!(message)) }.boxed()
            }
        });
        Self { name, run }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn invoke(&self, instance: Instance) -> BoxFuture<'static, anyhow::Result<()>> {
        (self.run)(instance)
    }
}

impl fmt::Debug for Initializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Initializer").field(&self.name).finish()
    }
}
