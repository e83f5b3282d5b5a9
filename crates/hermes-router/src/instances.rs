//! Handler instances.
//!
//! Handler objects are created lazily through an [`InstanceFactory`] and
//! cached per type. Each type is constructed at most once, even when its
//! first requests arrive concurrently.

use dashmap::DashMap;
use hermes_core::{BoxError, HandlerType, HermesError, HermesResult, Instance};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Produces handler instances on demand.
///
/// Factories must not read back from the [`InstanceCache`] they serve.
pub trait InstanceFactory: Send + Sync {
    /// Creates the instance for a handler type.
    fn create(&self, handler: &HandlerType) -> Result<Instance, BoxError>;
}

impl<F> InstanceFactory for F
where
    F: Fn(&HandlerType) -> Result<Instance, BoxError> + Send + Sync,
{
    fn create(&self, handler: &HandlerType) -> Result<Instance, BoxError> {
        self(handler)
    }
}

type Constructor = Arc<dyn Fn() -> Result<Instance, BoxError> + Send + Sync>;

/// A factory built from per-type constructors.
///
/// # Example
///
/// ```
/// use hermes_core::HandlerType;
/// use hermes_router::{Constructors, InstanceFactory};
///
/// #[derive(Default)]
/// struct WeatherResource;
///
/// let factory = Constructors::new().with_default::<WeatherResource>();
/// assert!(factory.create(&HandlerType::of::<WeatherResource>()).is_ok());
/// assert!(factory.create(&HandlerType::of::<String>()).is_err());
/// ```
#[derive(Clone, Default)]
pub struct Constructors {
    constructors: HashMap<TypeId, Constructor>,
}

impl Constructors {
    /// Creates a factory without constructors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an infallible constructor for `H`.
    #[must_use]
    pub fn with<H, F>(self, construct: F) -> Self
    where
        H: Any + Send + Sync,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.with_fallible(move || Ok::<_, BoxError>(construct()))
    }

    /// Registers `H::default` as the constructor for `H`.
    #[must_use]
    pub fn with_default<H: Default + Any + Send + Sync>(self) -> Self {
        self.with(H::default)
    }

    /// Registers a constructor for `H` that may fail.
    #[must_use]
    pub fn with_fallible<H, E, F>(mut self, construct: F) -> Self
    where
        H: Any + Send + Sync,
        E: Into<BoxError>,
        F: Fn() -> Result<H, E> + Send + Sync + 'static,
    {
        let constructor: Constructor =
            Arc::new(move || construct().map(|h| Arc::new(h) as Instance).map_err(Into::into));
        self.constructors.insert(TypeId::of::<H>(), constructor);
        self
    }

    /// Returns the number of registered constructors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Returns `true` if no constructor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl InstanceFactory for Constructors {
    fn create(&self, handler: &HandlerType) -> Result<Instance, BoxError> {
        let construct = self
            .constructors
            .get(&handler.id())
            .ok_or_else(|| format!("no constructor registered for {handler}"))?;
        construct()
    }
}

impl fmt::Debug for Constructors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructors")
            .field("count", &self.constructors.len())
            .finish()
    }
}

/// Handler instances keyed by type.
pub struct InstanceCache {
    instances: DashMap<TypeId, Instance>,
    factory: Arc<dyn InstanceFactory>,
}

impl InstanceCache {
    /// Creates an empty cache backed by `factory`.
    #[must_use]
    pub fn new(factory: Arc<dyn InstanceFactory>) -> Self {
        Self {
            instances: DashMap::new(),
            factory,
        }
    }

    /// Returns the cached instance, creating it on first use.
    ///
    /// Concurrent first calls for one type invoke the factory once; the
    /// others wait and receive the same instance. A failed creation caches
    /// nothing, so the next call retries.
    pub fn get_or_create(&self, handler: &HandlerType) -> HermesResult<Instance> {
        if let Some(instance) = self.instances.get(&handler.id()) {
            return Ok(Arc::clone(instance.value()));
        }
        let entry = self.instances.entry(handler.id()).or_try_insert_with(|| {
            debug!(handler = %handler, "creating handler instance");
            self.factory
                .create(handler)
                .map_err(|e| HermesError::instance_with_source(handler.name(), e))
        })?;
        Ok(Arc::clone(entry.value()))
    }

    /// Stores a pre-built instance, replacing any cached one.
    pub fn insert(&self, handler: HandlerType, instance: Instance) {
        self.instances.insert(handler.id(), instance);
    }

    /// Returns `true` if an instance of the type is cached.
    #[must_use]
    pub fn contains(&self, handler: &HandlerType) -> bool {
        self.instances.contains_key(&handler.id())
    }

    /// Returns the number of cached instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceCache")
            .field("cached", &self.instances.len())
            .finish_non_exhaustive()
    }
}
