//! The route table.
//!
//! Routes are partitioned by verb and matched on the exact path. Parsing
//! happens at registration; lookups only read.

use crate::descriptor::RouteDescriptor;
use crate::instances::{InstanceCache, InstanceFactory};
use crate::resource::{parse, Resource};
use hermes_convert::ConverterRegistry;
use hermes_core::{HandlerType, HermesResult, Instance, Verb};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Routes of one path space, split by verb.
#[derive(Debug, Clone, Default)]
pub struct VerbRoutes {
    /// GET routes by path
    get: HashMap<String, Arc<RouteDescriptor>>,
    /// POST routes by path
    post: HashMap<String, Arc<RouteDescriptor>>,
}

impl VerbRoutes {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, verb: Verb) -> &HashMap<String, Arc<RouteDescriptor>> {
        match verb {
            Verb::Get => &self.get,
            Verb::Post => &self.post,
        }
    }

    fn map_mut(&mut self, verb: Verb) -> &mut HashMap<String, Arc<RouteDescriptor>> {
        match verb {
            Verb::Get => &mut self.get,
            Verb::Post => &mut self.post,
        }
    }

    /// Inserts a route, returning the one it replaced.
    pub fn insert(&mut self, route: RouteDescriptor) -> Option<Arc<RouteDescriptor>> {
        let verb = route.verb();
        self.map_mut(verb)
            .insert(route.path().to_string(), Arc::new(route))
    }

    /// Returns the route for an exact `(verb, path)` pair.
    #[must_use]
    pub fn get(&self, verb: Verb, path: &str) -> Option<&Arc<RouteDescriptor>> {
        self.map(verb).get(path)
    }

    /// Returns the verbs that have a route at `path`.
    #[must_use]
    pub fn allowed_verbs(&self, path: &str) -> Vec<Verb> {
        Verb::ALL
            .into_iter()
            .filter(|verb| self.map(*verb).contains_key(path))
            .collect()
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.get.len() + self.post.len()
    }

    /// Returns `true` if there are no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over all routes, GET first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteDescriptor>> {
        self.get.values().chain(self.post.values())
    }
}

/// Registered routes plus the instances serving them.
///
/// # Example
///
/// ```
/// use hermes_convert::ConverterRegistry;
/// use hermes_core::{Args, BoxError, Verb};
/// use hermes_router::{Constructors, Resource, ResourceDef, RouteTable};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Health;
///
/// impl Resource for Health {
///     fn describe(def: &mut ResourceDef<Self>) {
///         def.method("ping", |_: &Self, _: Args| Ok::<_, BoxError>("pong")).get();
///     }
/// }
///
/// let factory = Constructors::new().with_default::<Health>();
/// let mut table = RouteTable::new(Arc::new(ConverterRegistry::new()), Arc::new(factory));
/// table.add_handler_type::<Health>().unwrap();
///
/// let route = table.lookup(Verb::Get, "/ping").unwrap();
/// assert!(table.instance_for(route.handler_type()).is_ok());
/// assert!(table.lookup(Verb::Post, "/ping").is_none());
/// ```
pub struct RouteTable {
    registry: Arc<ConverterRegistry>,
    routes: VerbRoutes,
    instances: InstanceCache,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new(registry: Arc<ConverterRegistry>, factory: Arc<dyn InstanceFactory>) -> Self {
        Self {
            registry,
            routes: VerbRoutes::new(),
            instances: InstanceCache::new(factory),
        }
    }

    /// Parses `H` and registers its routes. Instances are created on first
    /// use through the factory.
    ///
    /// A route with the same verb and path as an existing one replaces it.
    /// Returns the number of routes registered.
    pub fn add_handler_type<H: Resource>(&mut self) -> HermesResult<usize> {
        let routes = parse::<H>(&self.registry)?;
        let count = routes.len();
        for route in routes {
            let (verb, path) = (route.verb(), route.path().to_string());
            let method = route.signature().qualified_name();
            match self.routes.insert(route) {
                Some(previous) => warn!(
                    %verb,
                    %path,
                    method = %method,
                    replaced = %previous.signature().qualified_name(),
                    "route replaced"
                ),
                None => debug!(%verb, %path, method = %method, "route registered"),
            }
        }
        Ok(count)
    }

    /// Registers the routes of a pre-built handler and caches the instance.
    pub fn add_handler_instance<H: Resource>(&mut self, instance: H) -> HermesResult<usize> {
        self.add_handler_arc(Arc::new(instance))
    }

    /// Like [`RouteTable::add_handler_instance`] for an instance that is
    /// already shared.
    pub fn add_handler_arc<H: Resource>(&mut self, instance: Arc<H>) -> HermesResult<usize> {
        let count = self.add_handler_type::<H>()?;
        self.instances.insert(HandlerType::of::<H>(), instance);
        Ok(count)
    }

    /// Returns the route for an exact `(verb, path)` pair.
    #[must_use]
    pub fn lookup(&self, verb: Verb, path: &str) -> Option<&Arc<RouteDescriptor>> {
        self.routes.get(verb, path)
    }

    /// Returns the instance serving a handler type, creating it on first use.
    pub fn instance_for(&self, handler: &HandlerType) -> HermesResult<Instance> {
        self.instances.get_or_create(handler)
    }

    /// Returns the routes.
    #[must_use]
    pub fn routes(&self) -> &VerbRoutes {
        &self.routes
    }

    /// Returns the converter registry routes are parsed against.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConverterRegistry> {
        &self.registry
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no route is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.routes.len())
            .field("instances", &self.instances)
            .finish_non_exhaustive()
    }
}
