//! Application assembly and lifecycle.

use hermes_config::{ApplicationConfig, ConfigError};
use hermes_convert::{ConverterRegistry, ResponseSink};
use hermes_core::{BoxError, HermesError, HermesResult, Validator};
use hermes_router::{InstanceFactory, Resource, RouteTable};
use hermes_server::{Dispatcher, Server, ServerConfig, ServerError, ShutdownSignal};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Errors raised while assembling or running an [`Application`].
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Port, matching URL or another setting is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A service could not be turned into routes.
    #[error(transparent)]
    Routes(#[from] HermesError),

    /// The transport failed.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The server task panicked or was cancelled.
    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

type Registration = Box<dyn FnOnce(&mut RouteTable) -> HermesResult<usize> + Send>;

/// Collects services, converters and settings, then builds an
/// [`Application`].
///
/// Nothing is validated until [`build`](Self::build), which checks the port
/// and matching URL and parses every service.
#[must_use]
pub struct ApplicationBuilder {
    config: ApplicationConfig,
    registry: ConverterRegistry,
    services: Vec<(&'static str, Registration)>,
    validator: Option<Arc<dyn Validator>>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    /// Starts from the default configuration and the built-in converters.
    pub fn new() -> Self {
        Self {
            config: ApplicationConfig::default(),
            registry: ConverterRegistry::new(),
            services: Vec::new(),
            validator: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: ApplicationConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the listening port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the URL pattern the dispatcher is mounted on.
    pub fn with_matching_url(mut self, matching_url: impl Into<String>) -> Self {
        self.config.matching_url = matching_url.into();
        self
    }

    /// Registers a service whose instance comes from the factory passed to
    /// [`build`](Self::build).
    pub fn with_service<H: Resource>(mut self) -> Self {
        self.services.push((
            std::any::type_name::<H>(),
            Box::new(|table: &mut RouteTable| table.add_handler_type::<H>()),
        ));
        self
    }

    /// Registers a service with a ready-made instance.
    pub fn with_service_instance<H: Resource>(mut self, instance: H) -> Self {
        self.services.push((
            std::any::type_name::<H>(),
            Box::new(move |table: &mut RouteTable| table.add_handler_instance(instance)),
        ));
        self
    }

    /// Registers an incoming converter for `T`, replacing the built-in one.
    pub fn with_in_converter<T, E, F>(mut self, convert: F) -> Self
    where
        T: Any + Send + Sync,
        E: Into<BoxError>,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        self.registry.register_incoming(convert);
        self
    }

    /// Registers an outgoing writer for `T`.
    pub fn with_out_writer<T, F>(mut self, write: F) -> Self
    where
        T: Any + Send,
        F: Fn(T, &mut ResponseSink) -> HermesResult<()> + Send + Sync + 'static,
    {
        self.registry.register_outgoing(write);
        self
    }

    /// Replaces the parameter validator.
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Validates the settings, parses every service and wires the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Config`] for an invalid port or matching
    /// URL and [`ApplicationError::Routes`] for the first service that cannot
    /// be parsed.
    pub fn build<F: InstanceFactory + 'static>(self, factory: F) -> Result<Application, ApplicationError> {
        self.config.validate()?;

        let mut table = RouteTable::new(Arc::new(self.registry), Arc::new(factory));
        for (service, register) in self.services {
            match register(&mut table) {
                Ok(routes) => tracing::debug!(service, routes, "service registered"),
                Err(e) => {
                    tracing::error!(service, error = %e, "cannot register service");
                    return Err(e.into());
                }
            }
        }

        let mut dispatcher =
            Dispatcher::new(Arc::new(table)).with_matching_url(&self.config.matching_url);
        if let Some(validator) = self.validator {
            dispatcher = dispatcher.with_validator(validator);
        }

        tracing::info!(
            port = self.config.port,
            matching_url = %self.config.matching_url,
            routes = dispatcher.table().len(),
            "application built"
        );
        Ok(Application {
            config: self.config,
            dispatcher,
        })
    }
}

/// A built application: configuration plus a ready dispatcher.
#[derive(Clone)]
pub struct Application {
    config: ApplicationConfig,
    dispatcher: Dispatcher,
}

impl Application {
    /// Starts a builder.
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Returns the effective configuration.
    #[must_use]
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// Returns the dispatcher, e.g. for an in-memory test client.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Transport settings derived from the configuration.
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        let server = &self.config.server;
        ServerConfig::builder()
            .port(self.config.port)
            .shutdown_timeout(Duration::from_secs(server.shutdown_timeout_secs))
            .request_timeout(Duration::from_secs(server.request_timeout_secs))
            .max_body_bytes(server.max_body_bytes)
            .build()
    }

    /// Serves until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Fails if the port cannot be bound.
    pub async fn run(self) -> Result<(), ApplicationError> {
        let server = Server::new(self.server_config(), self.dispatcher);
        server.run().await?;
        Ok(())
    }

    /// Binds the configured port and serves in the background.
    ///
    /// # Errors
    ///
    /// Fails if the port cannot be bound.
    pub async fn start(self) -> Result<ApplicationHandle, ApplicationError> {
        let server = Server::new(self.server_config(), self.dispatcher);
        let listener = server.bind().await?;
        Self::spawn(server, listener)
    }

    /// Serves on an already bound listener in the background.
    ///
    /// # Errors
    ///
    /// Fails if the listener has no local address.
    pub fn serve_on(self, listener: TcpListener) -> Result<ApplicationHandle, ApplicationError> {
        let server = Server::new(self.server_config(), self.dispatcher);
        Self::spawn(server, listener)
    }

    fn spawn(server: Server, listener: TcpListener) -> Result<ApplicationHandle, ApplicationError> {
        let local_addr = listener.local_addr().map_err(ServerError::from)?;
        let shutdown = ShutdownSignal::new();
        let task = tokio::spawn(server.serve(listener, shutdown.clone()));
        Ok(ApplicationHandle {
            local_addr,
            shutdown,
            task,
        })
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("config", &self.config)
            .field("routes", &self.dispatcher.table().len())
            .finish_non_exhaustive()
    }
}

/// A running application.
#[derive(Debug)]
pub struct ApplicationHandle {
    local_addr: SocketAddr,
    shutdown: ShutdownSignal,
    task: JoinHandle<Result<(), ServerError>>,
}

impl ApplicationHandle {
    /// Returns the bound address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the signal that stops the server.
    #[must_use]
    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Stops accepting connections and waits for the server to finish.
    ///
    /// # Errors
    ///
    /// Returns the server's error, if any.
    pub async fn stop(self) -> Result<(), ApplicationError> {
        self.shutdown.trigger();
        self.task.await??;
        tracing::info!(addr = %self.local_addr, "application stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{Args, MethodSignature, Violation, Instance};
    use hermes_router::{Constructors, Param, ResourceDef};

    struct Ping;

    impl Resource for Ping {
        fn describe(def: &mut ResourceDef<Self>) {
            def.method("ping", |_: &Self, _: Args| Ok::<_, BoxError>("pong")).get();
        }
    }

    struct BadPath;

    impl Resource for BadPath {
        fn describe(def: &mut ResourceDef<Self>) {
            def.method("item", |_: &Self, _: Args| Ok::<_, BoxError>(()))
                .get()
                .param(Param::of::<String>("id").path_param("id"));
        }
    }

    struct AllowAll;

    impl Validator for AllowAll {
        fn validate(&self, _: &Instance, _: &MethodSignature, _: &Args) -> Vec<Violation> {
            Vec::new()
        }
    }

    #[test]
    fn test_build_rejects_invalid_port() {
        for port in [0, 65535] {
            let result = Application::builder().with_port(port).build(Constructors::new());
            assert!(matches!(result, Err(ApplicationError::Config(_))));
        }
    }

    #[test]
    fn test_build_rejects_invalid_matching_url() {
        for url in ["", "resources/*"] {
            let result = Application::builder()
                .with_matching_url(url)
                .build(Constructors::new());
            assert!(matches!(result, Err(ApplicationError::Config(_))), "{url}");
        }
    }

    #[test]
    fn test_build_reports_parse_failure() {
        let result = Application::builder()
            .with_service::<Ping>()
            .with_service::<BadPath>()
            .build(Constructors::new());
        assert!(matches!(
            result,
            Err(ApplicationError::Routes(HermesError::UnsupportedBinding { .. }))
        ));
    }

    #[test]
    fn test_build_wires_dispatcher() {
        let app = Application::builder()
            .with_port(9000)
            .with_matching_url("/resources/*")
            .with_service_instance(Ping)
            .with_validator(AllowAll)
            .build(Constructors::new())
            .unwrap();

        assert_eq!(app.dispatcher().prefix(), "/resources");
        assert_eq!(app.dispatcher().table().len(), 1);
        assert_eq!(app.server_config().http_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_server_config_follows_config() {
        let mut config = ApplicationConfig::default();
        config.server.request_timeout_secs = 3;
        config.server.max_body_bytes = 10;
        let app = Application::builder()
            .with_config(config)
            .build(Constructors::new())
            .unwrap();

        let server = app.server_config();
        assert_eq!(server.request_timeout(), Duration::from_secs(3));
        assert_eq!(server.max_body_bytes(), 10);
    }
}
