//! Handler identity.
//!
//! Handler objects are stored type-erased; [`HandlerType`] is the key they
//! are registered, constructed and cached under.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A shared, type-erased handler object.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Identity of a handler type.
#[derive(Clone, Copy)]
pub struct HandlerType {
    id: TypeId,
    name: &'static str,
}

impl HandlerType {
    /// Returns the identity of `H`.
    #[must_use]
    pub fn of<H: Any>() -> Self {
        Self {
            id: TypeId::of::<H>(),
            name: type_name::<H>(),
        }
    }

    /// Returns the type ID.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the full type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the type name without its module path.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for HandlerType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HandlerType {}

impl std::hash::Hash for HandlerType {
    fn hash<S: std::hash::Hasher>(&self, state: &mut S) {
        self.id.hash(state);
    }
}

impl fmt::Debug for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RunService;
    struct Wrapper<T>(T);

    #[test]
    fn test_identity() {
        assert_eq!(HandlerType::of::<RunService>(), HandlerType::of::<RunService>());
        assert_ne!(HandlerType::of::<RunService>(), HandlerType::of::<String>());
    }

    #[test]
    fn test_short_name() {
        assert_eq!(HandlerType::of::<RunService>().short_name(), "RunService");
        assert_eq!(HandlerType::of::<Wrapper<u8>>().short_name(), "Wrapper");
        assert!(HandlerType::of::<RunService>().name().ends_with("::RunService"));
    }
}
