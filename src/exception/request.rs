//! Request-processing exceptions: validation, malformed bodies, binding and
//! type-conversion failures, plus the aggregate wrapper.

use super::{ApiException, ROOT_EXCEPTION};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// A single constraint violation reported by a validator.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Body field path the violation applies to, e.g. `user.userName`.
    pub field: Option<String>,
    /// Method or query parameter the violation applies to.
    pub parameter: Option<String>,
    /// Validation kind, e.g. `NotBlank` or `Size`. Combined with the field
    /// into the composite override key `<field>.<kind>`.
    pub kind: String,
    pub message: String,
    pub rejected_value: Option<Value>,
    pub path: Option<String>,
}

impl Violation {
    pub fn field(
        field: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: Some(field.into()),
            parameter: None,
            kind: kind.into(),
            message: message.into(),
            rejected_value: None,
            path: None,
        }
    }

    pub fn parameter(
        parameter: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: None,
            parameter: Some(parameter.into()),
            kind: kind.into(),
            message: message.into(),
            rejected_value: None,
            path: None,
        }
    }

    pub fn global(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: None,
            parameter: None,
            kind: kind.into(),
            message: message.into(),
            rejected_value: None,
            path: None,
        }
    }

    pub fn with_rejected_value(mut self, value: Value) -> Self {
        self.rejected_value = Some(value);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Raised when request validation fails with one or more violations.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ValidationException {
    pub message: String,
    pub violations: Vec<Violation>,
}

impl ValidationException {
    pub fn new(message: impl Into<String>, violations: Vec<Violation>) -> Self {
        Self {
            message: message.into(),
            violations,
        }
    }
}

impl ApiException for ValidationException {
    fn type_hierarchy(&self) -> &'static [&'static str] {
        &["errestra::exception::ValidationException", ROOT_EXCEPTION]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Raised when a request body cannot be read at all.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct MalformedRequestException {
    pub message: String,
}

impl MalformedRequestException {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ApiException for MalformedRequestException {
    fn type_hierarchy(&self) -> &'static [&'static str] {
        &[
            "errestra::exception::MalformedRequestException",
            ROOT_EXCEPTION,
        ]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Raised when a path/query value cannot be converted to its declared type.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TypeConversionException {
    pub message: String,
    /// The field or parameter name, as declared.
    pub name: String,
    /// The target type the value failed to convert into.
    pub expected_type: String,
    pub rejected_value: Option<Value>,
    /// True when `name` refers to a method parameter rather than a body field.
    pub parameter: bool,
}

impl TypeConversionException {
    pub fn new(
        message: impl Into<String>,
        name: impl Into<String>,
        expected_type: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            name: name.into(),
            expected_type: expected_type.into(),
            rejected_value: None,
            parameter: false,
        }
    }

    pub fn with_rejected_value(mut self, value: Value) -> Self {
        self.rejected_value = Some(value);
        self
    }

    pub fn for_parameter(mut self) -> Self {
        self.parameter = true;
        self
    }
}

impl ApiException for TypeConversionException {
    fn type_hierarchy(&self) -> &'static [&'static str] {
        &[
            "errestra::exception::TypeConversionException",
            ROOT_EXCEPTION,
        ]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Raised when a request body is not valid JSON.
#[derive(Debug, Error)]
#[error("{message} at line {line} column {column}")]
pub struct JsonParseException {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl JsonParseException {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl ApiException for JsonParseException {
    fn type_hierarchy(&self) -> &'static [&'static str] {
        &["errestra::exception::JsonParseException", ROOT_EXCEPTION]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A single model-binding failure. Unlike a [`Violation`] it carries no
/// structured validation kind; the binding handler infers one from the
/// message text.
#[derive(Debug, Clone)]
pub struct BindingFailure {
    pub field: Option<String>,
    pub message: String,
    pub rejected_value: Option<Value>,
}

impl BindingFailure {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
            rejected_value: None,
        }
    }

    pub fn global(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
            rejected_value: None,
        }
    }

    pub fn with_rejected_value(mut self, value: Value) -> Self {
        self.rejected_value = Some(value);
        self
    }
}

/// Raised when binding request data onto a model object fails.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ModelBindingException {
    pub message: String,
    pub failures: Vec<BindingFailure>,
}

impl ModelBindingException {
    pub fn new(message: impl Into<String>, failures: Vec<BindingFailure>) -> Self {
        Self {
            message: message.into(),
            failures,
        }
    }
}

impl ApiException for ModelBindingException {
    fn type_hierarchy(&self) -> &'static [&'static str] {
        &["errestra::exception::ModelBindingException", ROOT_EXCEPTION]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A composite exception wrapping one or more inner exceptions, possibly
/// nested. Unwrapped by the aggregate handler before ordinary dispatch.
pub struct AggregateException {
    pub message: String,
    pub inner: Vec<Box<dyn ApiException>>,
}

impl AggregateException {
    pub fn new(message: impl Into<String>, inner: Vec<Box<dyn ApiException>>) -> Self {
        Self {
            message: message.into(),
            inner,
        }
    }
}

impl fmt::Debug for AggregateException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateException")
            .field("message", &self.message)
            .field("inner", &self.inner)
            .finish()
    }
}

impl fmt::Display for AggregateException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} inner exceptions)", self.message, self.inner.len())
    }
}

impl ApiException for AggregateException {
    fn type_hierarchy(&self) -> &'static [&'static str] {
        &["errestra::exception::AggregateException", ROOT_EXCEPTION]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
