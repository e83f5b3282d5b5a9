//! Positional arguments bound for one handler invocation.

use crate::error::{HermesError, HermesResult};
use std::any::{type_name, Any};
use std::fmt;

/// A single bound argument; `None` when the source value was absent.
pub type ArgValue = Option<Box<dyn Any + Send + Sync>>;

/// The argument list built by the dispatcher, in declaration order.
///
/// Values are stored type-erased; handlers take them back out with the
/// type they declared for the parameter.
///
/// # Example
///
/// ```
/// use hermes_core::Args;
///
/// let mut args = Args::new();
/// args.push(Some(Box::new(10_i32)));
/// args.push(None);
///
/// assert_eq!(args.get::<i32>(0), Some(&10));
/// assert_eq!(args.take::<i32>(1).unwrap(), None);
/// ```
#[derive(Default)]
pub struct Args {
    values: Vec<ArgValue>,
}

impl Args {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty argument list with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Appends the next positional argument.
    pub fn push(&mut self, value: ArgValue) {
        self.values.push(value);
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns `true` if the argument at `index` holds a value.
    #[must_use]
    pub fn is_present(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(Some(_)))
    }

    /// Borrows the argument at `index` without knowing its type.
    #[must_use]
    pub fn get_any(&self, index: usize) -> Option<&(dyn Any + Send + Sync)> {
        self.values.get(index)?.as_deref()
    }

    /// Borrows the argument at `index` as `T`.
    ///
    /// Returns `None` if the value is absent or of another type.
    #[must_use]
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.get_any(index)?.downcast_ref::<T>()
    }

    /// Takes the argument at `index` out of the list.
    ///
    /// Absent values yield `Ok(None)`. Asking for the wrong type or an index
    /// past the end is a conversion error.
    pub fn take<T: Any>(&mut self, index: usize) -> HermesResult<Option<T>> {
        let slot = self.values.get_mut(index).ok_or_else(|| {
            HermesError::conversion(format!("argument {index} is out of range"))
        })?;
        match slot.take() {
            None => Ok(None),
            Some(value) => match value.downcast::<T>() {
                Ok(value) => Ok(Some(*value)),
                Err(value) => {
                    *slot = Some(value);
                    Err(HermesError::conversion(format!(
                        "argument {index} is not a {}",
                        type_name::<T>()
                    )))
                }
            },
        }
    }

    /// Takes an argument that must be present.
    pub fn required<T: Any>(&mut self, index: usize) -> HermesResult<T> {
        self.take(index)?.ok_or_else(|| {
            HermesError::conversion(format!(
                "argument {index} ({}) is missing",
                type_name::<T>()
            ))
        })
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.values
                    .iter()
                    .map(|value| if value.is_some() { "<value>" } else { "<absent>" }),
            )
            .finish()
    }
}
