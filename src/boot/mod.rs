//! Application Boot
//!
//! Drives a component set from loaders to a running container. Phases run
//! strictly one after another:
//!
//! 1. **Load**: every attached loader, in attachment order
//! 2. **Register**: built-ins, then builder registrations, then loaded descriptors
//! 3. **Validate**: circular dependencies abort boot
//! 4. **ParameterSources**: every component with the parameter-source capability
//! 5. **Services**: every service, one at a time, in registry order
//!
//! The first error ends boot. It is handed to the error handler (or logged)
//! and never retried.

use crate::config::{ComponentreeConfig, ConfigService};
use crate::di::{
    Component, ComponentDescriptor, ComponentIndex, ComponentRegistry, Container,
    ContainerBuilder, PARAMETER_SOURCE,
};
use crate::error::{ComponentreeError, Result};
use crate::loader::ComponentLoader;
use crate::manifest::ComponentManifest;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use strum_macros::Display;

/// Callback invoked with the error that ended boot.
pub type ErrorHandler = Box<dyn Fn(&ComponentreeError) + Send + Sync>;

/// Boot phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BootPhase {
    Load,
    Register,
    Validate,
    ParameterSources,
    Services,
}

/// A booted component tree
///
/// # Example
///
/// ```rust,ignore
/// use componentree::{Componentree, InventoryLoader};
///
/// #[tokio::main]
/// async fn main() {
///     let app = Componentree::builder()
///         .config(ComponentreeConfig::load()?)
///         .loader(InventoryLoader::new())
///         .boot_or_exit()
///         .await;
///
///     let users = app.container().get_instance::<UserService>().await?;
/// }
/// ```
pub struct Componentree {
    container: Arc<Container>,
    config: ComponentreeConfig,
}

impl Componentree {
    pub fn builder() -> ComponentreeBuilder {
        ComponentreeBuilder::new()
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn config(&self) -> &ComponentreeConfig {
        &self.config
    }

    pub fn registry(&self) -> &ComponentRegistry {
        self.container.registry()
    }

    pub fn manifest(&self) -> ComponentManifest {
        self.container.registry().manifest()
    }
}

/// Builder for [`Componentree`]
#[derive(Default)]
pub struct ComponentreeBuilder {
    config: ComponentreeConfig,
    loaders: Vec<Box<dyn ComponentLoader>>,
    early: VecDeque<ComponentDescriptor>,
    config_values: Vec<(String, Value)>,
    error_handler: Option<ErrorHandler>,
    init_timeout: Option<Duration>,
}

impl ComponentreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ComponentreeConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a loader; loaders run in attachment order
    pub fn loader(mut self, loader: impl ComponentLoader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    /// Register a descriptor ahead of everything the loaders produce
    pub fn register(mut self, descriptor: ComponentDescriptor) -> Self {
        self.early.push_back(descriptor);
        self
    }

    pub fn component<T: Component>(self) -> Self {
        self.register(T::descriptor())
    }

    /// Seed a value into the built-in [`ConfigService`]
    pub fn config_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config_values.push((key.into(), value.into()));
        self
    }

    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ComponentreeError) + Send + Sync + 'static,
    {
        self.error_handler = Some(Box::new(handler));
        self
    }

    /// Timeout for each initializer; takes precedence over `init_timeout_ms`
    pub fn init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = Some(timeout);
        self
    }

    /// Run every boot phase
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any phase, after passing it to the
    /// error handler.
    pub async fn boot(mut self) -> Result<Componentree> {
        let handler = self.error_handler.take();
        let mut phase = BootPhase::Load;

        match self.run(&mut phase).await {
            Ok(app) => Ok(app),
            Err(err) => {
                match &handler {
                    Some(handler) => handler(&err),
                    None => {
                        // A subscriber may not be installed; stderr always is.
                        let report = diagnostic(phase, &err);
                        tracing::error!("{}", report);
                        eprintln!("{report}");
                    }
                }
                Err(err)
            }
        }
    }

    /// Like [`ComponentreeBuilder::boot`], but exits the process with status 1 on failure.
    pub async fn boot_or_exit(self) -> Componentree {
        match self.boot().await {
            Ok(app) => app,
            Err(_) => std::process::exit(1),
        }
    }

    async fn run(mut self, phase: &mut BootPhase) -> Result<Componentree> {
        let config = std::mem::take(&mut self.config);
        let debug = config.debug;

        *phase = BootPhase::Load;
        tracing::info!("Loading components (base: {})", config.base);
        let mut loaded = Vec::new();
        for loader in &self.loaders {
            let descriptors = loader.load(&config).await?;
            tracing::debug!("{} loader produced {} component(s)", loader.name(), descriptors.len());
            for mut descriptor in descriptors {
                descriptor.set_source_if_missing(loader.name());
                loaded.push(descriptor);
            }
        }
        if loaded.is_empty() {
            tracing::warn!("No components loaded for base '{}'", config.base);
        } else if debug {
            for descriptor in &loaded {
                tracing::debug!(
                    "Loaded {} from {}",
                    descriptor.name(),
                    descriptor.source().unwrap_or("unknown")
                );
            }
        }

        *phase = BootPhase::Register;
        let mut builder = ContainerBuilder::new();
        if let Some(timeout) = self.init_timeout.or_else(|| config.init_timeout()) {
            builder = builder.init_timeout(timeout);
        }
        builder.add(ConfigService::descriptor_with(std::mem::take(&mut self.config_values)));
        builder.add(ComponentIndex::descriptor());
        while let Some(descriptor) = self.early.pop_front() {
            builder.add(descriptor);
        }
        for descriptor in loaded {
            builder.add(descriptor);
        }
        tracing::debug!("Registered {} component(s)", builder.registry().len());

        *phase = BootPhase::Validate;
        let container = builder.build()?;

        *phase = BootPhase::ParameterSources;
        for descriptor in source_order(container.find_by_capability(PARAMETER_SOURCE, &[])) {
            container.install_parameter_source(descriptor).await?;
            if debug {
                tracing::debug!("Parameter source {} ready", descriptor.name());
            }
        }

        *phase = BootPhase::Services;
        let mut started = 0usize;
        for descriptor in container.registry().services() {
            if container.ensure_service(descriptor).await? {
                started += 1;
                if debug {
                    tracing::debug!("Service {} ready", descriptor.name());
                }
            }
        }

        tracing::info!(
            "Boot complete: {} component(s), {} parameter source(s), {} service(s) started",
            container.registry().len(),
            container.parameter_sources().len(),
            started
        );

        Ok(Componentree {
            container: Arc::new(container),
            config,
        })
    }
}

/// Boot failure report: the phase, the error and every cycle it aggregates.
fn diagnostic(phase: BootPhase, err: &ComponentreeError) -> String {
    let mut report = format!("Boot failed during {phase} phase: {err}");
    if let ComponentreeError::InvalidGraph { errors, .. } = err {
        for cause in errors {
            report.push_str("\n  ");
            report.push_str(&cause.to_string());
        }
    }
    report
}

/// Orders parameter sources so that a source reading `Data` from another
/// source comes after it. Registry order is kept otherwise; sources left in a
/// cycle keep registry order and fail on construction with `NoDataSource`.
fn source_order(mut pending: Vec<&ComponentDescriptor>) -> Vec<&ComponentDescriptor> {
    let mut ordered = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let waiting_on = |descriptor: &ComponentDescriptor, pending: &[&ComponentDescriptor]| {
            descriptor.parameters().iter().any(|param| {
                param.source.as_deref().is_some_and(|source| {
                    source != descriptor.name() && pending.iter().any(|p| p.name() == source)
                })
            })
        };

        match pending.iter().position(|d| !waiting_on(*d, &pending)) {
            Some(ready) => ordered.push(pending.remove(ready)),
            None => ordered.append(&mut pending),
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Arguments;
    use crate::loader::StaticLoader;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter;

    struct Holder {
        inner: Arc<Counter>,
    }

    fn scenario(built: &Arc<AtomicUsize>) -> StaticLoader {
        let built = Arc::clone(built);
        StaticLoader::new([
            ComponentDescriptor::builder("A")
                .service()
                .factory(move |_| {
                    built.fetch_add(1, Ordering::SeqCst);
                    Ok(Counter)
                })
                .build(),
            ComponentDescriptor::builder("B")
                .service()
                .inject("A")
                .factory(|args: &Arguments| {
                    Ok(Holder {
                        inner: args.component(0)?,
                    })
                })
                .build(),
        ])
    }

    #[tokio::test]
    async fn test_boot_constructs_each_service_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let app = Componentree::builder()
            .loader(scenario(&built))
            .boot()
            .await
            .unwrap();

        let container = app.container();
        let a = container.resolve_as::<Counter>("A").await.unwrap();
        let b = container.resolve_as::<Holder>("B").await.unwrap();

        assert!(Arc::ptr_eq(&a, &b.inner));
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(
            app.registry().names().collect::<Vec<_>>(),
            ["ConfigService", "Componentree", "A", "B"]
        );
        assert_eq!(app.registry().get("A").unwrap().source(), Some("static"));
    }

    #[tokio::test]
    async fn test_cycle_reaches_error_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let result = Componentree::builder()
            .register(
                ComponentDescriptor::builder("C")
                    .service()
                    .inject("C")
                    .factory(|_| Ok(Counter))
                    .build(),
            )
            .error_handler(move |err| sink.lock().unwrap().push(err.to_string()))
            .boot()
            .await;

        match result {
            Err(ComponentreeError::InvalidGraph { count, .. }) => assert_eq!(count, 1),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("boot must fail"),
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("1 circular chain"));
    }

    #[tokio::test]
    async fn test_missing_data_aborts_boot() {
        let result = Componentree::builder()
            .register(
                ComponentDescriptor::builder("Server")
                    .service()
                    .data("port")
                    .factory(|args| args.data::<u16>(0))
                    .build(),
            )
            .boot()
            .await;

        assert!(matches!(
            result,
            Err(ComponentreeError::MissingData { ref component, .. }) if component == "Server"
        ));
    }

    struct LogSink(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Route this thread's log output into a buffer until the guard drops.
    fn capture_logs() -> (Arc<Mutex<Vec<u8>>>, tracing::subscriber::DefaultGuard) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || LogSink(Arc::clone(&sink)))
            .with_ansi(false)
            .finish();
        (buffer, tracing::subscriber::set_default(subscriber))
    }

    fn logged(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8_lossy(&buffer.lock().unwrap()).into_owned()
    }

    #[tokio::test]
    async fn test_empty_load_still_registers_builtins() {
        let (logs, _guard) = capture_logs();

        let app = Componentree::builder()
            .loader(StaticLoader::default())
            .boot()
            .await
            .unwrap();

        assert_eq!(
            app.registry().names().collect::<Vec<_>>(),
            ["ConfigService", "Componentree"]
        );
        assert!(app.container().parameter_source("ConfigService").is_some());

        let output = logged(&logs);
        assert!(output.contains("WARN"));
        assert!(output.contains("No components loaded for base 'c'"));
    }

    #[tokio::test]
    async fn test_failure_without_handler_is_reported() {
        let (logs, _guard) = capture_logs();

        let result = Componentree::builder()
            .register(
                ComponentDescriptor::builder("C")
                    .service()
                    .inject("C")
                    .factory(|_| Ok(Counter))
                    .build(),
            )
            .boot()
            .await;
        assert!(matches!(result, Err(ComponentreeError::InvalidGraph { .. })));

        let output = logged(&logs);
        assert!(output.contains("Boot failed during Validate phase"));
        assert!(output.contains("Circular dependency detected: C -> C"));
    }

    #[test]
    fn test_diagnostic_lists_every_cycle() {
        let err = ComponentreeError::InvalidGraph {
            count: 2,
            errors: vec![
                ComponentreeError::Circularity {
                    chain: vec!["A".into(), "B".into(), "A".into()],
                },
                ComponentreeError::Circularity {
                    chain: vec!["C".into(), "C".into()],
                },
            ],
        };

        let report = diagnostic(BootPhase::Validate, &err);
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Boot failed during Validate phase"));
        assert_eq!(lines[1].trim(), "Circular dependency detected: A -> B -> A");
        assert_eq!(lines[2].trim(), "Circular dependency detected: C -> C");

        let missing = diagnostic(BootPhase::Services, &ComponentreeError::not_found("Ghost"));
        assert_eq!(missing, "Boot failed during Services phase: Could not find component: Ghost");
    }

    #[tokio::test]
    async fn test_components_can_query_the_index() {
        let app = Componentree::builder()
            .register(ComponentDescriptor::builder("Nightly").tag("job").build())
            .register(ComponentDescriptor::builder("Hourly").tag("job").build())
            .register(
                ComponentDescriptor::builder("Scheduler")
                    .service()
                    .inject(ComponentIndex::NAME)
                    .factory(|args| {
                        let index = args.component::<ComponentIndex>(0)?;
                        let jobs: Vec<String> = index
                            .find_by_tags(&["job"])
                            .iter()
                            .map(|d| d.name().to_string())
                            .collect();
                        Ok(jobs)
                    })
                    .build(),
            )
            .boot()
            .await
            .unwrap();

        let jobs = app.container().resolve_as::<Vec<String>>("Scheduler").await.unwrap();
        assert_eq!(*jobs, ["Nightly", "Hourly"]);

        let index = app.container().get_instance::<ComponentIndex>().await.unwrap();
        assert!(index.contains("Scheduler"));
    }

    struct Fixed(serde_json::Value);

    #[crate::async_trait]
    impl crate::di::ParameterSource for Fixed {
        async fn resolve(
            &self,
            _target: &ComponentDescriptor,
            _parameter: &str,
            _index: usize,
        ) -> Result<Option<Value>> {
            Ok(Some(self.0.clone()))
        }
    }

    #[tokio::test]
    async fn test_sources_install_dependency_first() {
        let outer = ComponentDescriptor::builder("Outer")
            .service()
            .data_from("prefix", "Inner")
            .parameter_source::<Fixed>()
            .factory(|args| Ok(Fixed(json!(format!("{}-outer", args.data::<String>(0)?)))))
            .build();
        let inner = ComponentDescriptor::builder("Inner")
            .service()
            .parameter_source::<Fixed>()
            .factory(|_| Ok(Fixed(json!("inner"))))
            .build();

        let app = Componentree::builder()
            .register(outer)
            .register(inner)
            .register(
                ComponentDescriptor::builder("Client")
                    .service()
                    .data_from("name", "Outer")
                    .factory(|args| args.data::<String>(0))
                    .build(),
            )
            .boot()
            .await
            .unwrap();

        let client = app.container().resolve_as::<String>("Client").await.unwrap();
        assert_eq!(*client, "inner-outer");
    }

    #[test]
    fn test_source_order_keeps_independent_sources_in_place() {
        let a = ComponentDescriptor::builder("A").data_from("x", "C").build();
        let b = ComponentDescriptor::builder("B").build();
        let c = ComponentDescriptor::builder("C").data_from("y", "C").build();

        let names: Vec<_> = source_order(vec![&a, &b, &c]).iter().map(|d| d.name()).collect();
        assert_eq!(names, ["B", "C", "A"]);

        let looped_a = ComponentDescriptor::builder("A").data_from("x", "B").build();
        let looped_b = ComponentDescriptor::builder("B").data_from("y", "A").build();
        let names: Vec<_> = source_order(vec![&looped_a, &looped_b])
            .iter()
            .map(|d| d.name())
            .collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[tokio::test]
    async fn test_services_start_in_registry_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let service = |name: &'static str| {
            let order = Arc::clone(&order);
            ComponentDescriptor::builder(name)
                .service()
                .factory(move |_| {
                    order.lock().unwrap().push(name);
                    Ok(Counter)
                })
                .build()
        };

        Componentree::builder()
            .register(service("Early"))
            .loader(StaticLoader::new([service("Zeta"), service("Alpha")]))
            .loader(StaticLoader::new([service("Mid")]))
            .boot()
            .await
            .unwrap();

        assert_eq!(*order.lock().unwrap(), ["Early", "Zeta", "Alpha", "Mid"]);
    }

    #[tokio::test]
    async fn test_config_values_feed_data_parameters() {
        let app = Componentree::builder()
            .config_value("Server.port", 9090)
            .config_value("host", json!("0.0.0.0"))
            .register(
                ComponentDescriptor::builder("Server")
                    .service()
                    .data_from("host", ConfigService::NAME)
                    .data_from("port", ConfigService::NAME)
                    .factory(|args| Ok((args.data::<String>(0)?, args.data::<u16>(1)?)))
                    .build(),
            )
            .boot()
            .await
            .unwrap();

        let server = app.container().cached("Server").unwrap();
        let server = server.downcast::<(String, u16)>().unwrap();
        assert_eq!(*server, ("0.0.0.0".to_string(), 9090));
    }

    #[tokio::test]
    async fn test_initializer_timeout_from_config() {
        let result = Componentree::builder()
            .config(ComponentreeConfig {
                init_timeout_ms: Some(10),
                ..ComponentreeConfig::default()
            })
            .register(
                ComponentDescriptor::builder("Stuck")
                    .service()
                    .factory(|_| Ok(Counter))
                    .initializer("wait", |_: Arc<Counter>| async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        anyhow::Ok(())
                    })
                    .build(),
            )
            .boot()
            .await;

        assert!(matches!(
            result,
            Err(ComponentreeError::InitializerFailure { ref initializer, .. }) if initializer == "wait"
        ));
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(BootPhase::ParameterSources.to_string(), "ParameterSources");
        assert_eq!(BootPhase::Validate.to_string(), "Validate");
    }
}
