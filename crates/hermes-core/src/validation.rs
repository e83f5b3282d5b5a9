//! Parameter validation.
//!
//! The dispatcher consults a [`Validator`] after binding arguments and
//! before invoking the handler. Only the first [`Violation`] is reported to
//! the client. [`ConstraintValidator`] checks the [`Constraint`]s declared on
//! each parameter and is the default implementation.

use crate::args::Args;
use crate::handler::{HandlerType, Instance};
use bytes::Bytes;
use std::any::Any;

/// A constraint declared on a handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// The value must be present.
    NotNull {
        /// Message reported on violation.
        message: String,
    },
    /// The value must be present and, for strings and sequences, non-empty.
    NotEmpty {
        /// Message reported on violation.
        message: String,
    },
}

impl Constraint {
    /// Default message for [`Constraint::NotNull`].
    pub const NOT_NULL_MESSAGE: &'static str = "may not be null";
    /// Default message for [`Constraint::NotEmpty`].
    pub const NOT_EMPTY_MESSAGE: &'static str = "may not be empty";

    /// Creates a `NotNull` constraint with a custom message.
    #[must_use]
    pub fn not_null(message: impl Into<String>) -> Self {
        Self::NotNull {
            message: message.into(),
        }
    }

    /// Creates a `NotEmpty` constraint with a custom message.
    #[must_use]
    pub fn not_empty(message: impl Into<String>) -> Self {
        Self::NotEmpty {
            message: message.into(),
        }
    }

    /// Returns the message reported on violation.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::NotNull { message } | Self::NotEmpty { message } => message,
        }
    }

    /// Checks a bound value against this constraint.
    #[must_use]
    pub fn is_satisfied_by(&self, value: Option<&(dyn Any + Send + Sync)>) -> bool {
        match (self, value) {
            (_, None) => false,
            (Self::NotNull { .. }, Some(_)) => true,
            (Self::NotEmpty { .. }, Some(value)) => !is_empty_value(value),
        }
    }
}

fn is_empty_value(value: &(dyn Any + Send + Sync)) -> bool {
    if let Some(s) = value.downcast_ref::<String>() {
        s.is_empty()
    } else if let Some(bytes) = value.downcast_ref::<Vec<u8>>() {
        bytes.is_empty()
    } else if let Some(bytes) = value.downcast_ref::<Bytes>() {
        bytes.is_empty()
    } else if let Some(items) = value.downcast_ref::<Vec<String>>() {
        items.is_empty()
    } else {
        false
    }
}

/// Declared name and constraints of one handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSignature {
    /// The declared parameter name.
    pub name: String,
    /// Constraints in declaration order.
    pub constraints: Vec<Constraint>,
}

/// The validation-relevant view of a handler method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    /// The type declaring the method.
    pub handler: HandlerType,
    /// The method name.
    pub method: String,
    /// Parameters in positional order.
    pub params: Vec<ParamSignature>,
}

impl MethodSignature {
    /// Returns `Type::method`, used in logs and error messages.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.handler.short_name(), self.method)
    }
}

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The parameter that failed.
    pub parameter: String,
    /// Human-readable message.
    pub message: String,
}

/// Validates bound arguments before a handler is invoked.
///
/// Implementations must be thread-safe: one validator serves all requests.
pub trait Validator: Send + Sync {
    /// Returns every violation found, in parameter order. An empty result
    /// lets the invocation proceed.
    fn validate(&self, instance: &Instance, method: &MethodSignature, args: &Args)
        -> Vec<Violation>;
}

/// Checks each parameter's declared [`Constraint`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintValidator;

impl Validator for ConstraintValidator {
    fn validate(
        &self,
        _instance: &Instance,
        method: &MethodSignature,
        args: &Args,
    ) -> Vec<Violation> {
        method
            .params
            .iter()
            .enumerate()
            .flat_map(|(index, param)| {
                let value = args.get_any(index);
                param
                    .constraints
                    .iter()
                    .filter(move |constraint| !constraint.is_satisfied_by(value))
                    .map(move |constraint| Violation {
                        parameter: param.name.clone(),
                        message: constraint.message().to_string(),
                    })
            })
            .collect()
    }
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

impl Validator for NoopValidator {
    fn validate(&self, _: &Instance, _: &MethodSignature, _: &Args) -> Vec<Violation> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct WeatherResource;

    fn signature() -> MethodSignature {
        MethodSignature {
            handler: HandlerType::of::<WeatherResource>(),
            method: "by_city".to_string(),
            params: vec![
                ParamSignature {
                    name: "city".to_string(),
                    constraints: vec![Constraint::not_empty("City cannot be empty!")],
                },
                ParamSignature {
                    name: "country".to_string(),
                    constraints: vec![Constraint::not_empty("Country cannot be empty!")],
                },
            ],
        }
    }

    fn args(city: Option<&str>, country: Option<&str>) -> Args {
        let mut args = Args::new();
        for value in [city, country] {
            args.push(value.map(|v| Box::new(v.to_string()) as Box<dyn Any + Send + Sync>));
        }
        args
    }

    fn instance() -> Instance {
        Arc::new(WeatherResource)
    }

    fn some(value: &(dyn Any + Send + Sync)) -> Option<&(dyn Any + Send + Sync)> {
        Some(value)
    }

    #[test]
    fn test_all_satisfied() {
        let violations =
            ConstraintValidator.validate(&instance(), &signature(), &args(Some("Kiev"), Some("UA")));
        assert!(violations.is_empty());
    }

    #[test]
    fn test_violations_in_parameter_order() {
        let violations = ConstraintValidator.validate(&instance(), &signature(), &args(None, Some("")));
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].parameter, "city");
        assert_eq!(violations[0].message, "City cannot be empty!");
        assert_eq!(violations[1].message, "Country cannot be empty!");
    }

    #[test]
    fn test_not_null_accepts_any_present_value() {
        let constraint = Constraint::not_null(Constraint::NOT_NULL_MESSAGE);
        assert!(constraint.is_satisfied_by(some(&0.0_f64)));
        assert!(constraint.is_satisfied_by(some(&String::new())));
        assert!(!constraint.is_satisfied_by(None));
    }

    #[test]
    fn test_not_empty_sequences() {
        let constraint = Constraint::not_empty(Constraint::NOT_EMPTY_MESSAGE);
        assert!(!constraint.is_satisfied_by(some(&Vec::<u8>::new())));
        assert!(constraint.is_satisfied_by(some(&vec![1_u8])));
        assert!(!constraint.is_satisfied_by(some(&Bytes::new())));
        assert!(constraint.is_satisfied_by(some(&42_i32)));
    }

    #[test]
    fn test_noop_validator() {
        assert!(NoopValidator.validate(&instance(), &signature(), &args(None, None)).is_empty());
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(signature().qualified_name(), "WeatherResource::by_city");
    }
}
