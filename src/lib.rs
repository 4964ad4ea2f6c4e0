//! # Errestra
//!
//! Structured exception handling for Rust web services.
//!
//! Errestra converts runtime failures raised while serving an API request
//! into a stable, machine-parsable JSON error envelope: error codes, HTTP
//! statuses and per-field validation detail instead of raw error dumps.
//!
//! ## Features
//!
//! - **Ordered handler chain**: pluggable [`ExceptionHandler`]s tried in
//!   ascending order, with a fallback that always produces a response
//! - **Three mapping axes**: error code, message and HTTP status each resolve
//!   through override tables, an optional declared-hierarchy walk, and a
//!   configurable code-generation strategy
//! - **Aggregate unwrapping**: composite exceptions are flattened and their
//!   single leaf re-dispatched as if raised directly
//! - **Crash-proof pipeline**: a buggy handler, customizer, localizer or
//!   telemetry hook can never escape `handle_exception`; the caller always
//!   gets a well-formed response
//! - **No 5xx leaks**: server-error responses carry a configured fallback
//!   message, never internal exception detail
//!
//! ## Quick Start
//!
//! ```rust
//! use errestra::prelude::*;
//!
//! let dispatcher = ExceptionDispatcher::builder()
//!     .config(
//!         ExceptionConfig::builder()
//!             .code("errestra::exception::KeyNotFoundException", "RESOURCE_MISSING")
//!             .build(),
//!     )
//!     .build();
//!
//! let response = dispatcher
//!     .handle_exception(Box::new(ApiError::KeyNotFound("user 42".into())))
//!     .expect("handling enabled");
//!
//! assert_eq!(response.code, "RESOURCE_MISSING");
//! assert_eq!(response.http_status.as_u16(), 404);
//! ```

pub mod config;
pub mod customize;
pub mod dispatch;
pub mod exception;
pub mod handler;
pub mod http;
pub mod mapping;
pub mod metadata;
pub mod response;

// Re-export core types
pub use config::{ConfigHolder, ExceptionConfig};
pub use dispatch::{ExceptionDispatcher, ExceptionDispatcherBuilder};
pub use exception::{ApiError, ApiException};
pub use handler::{ExceptionHandler, FallbackHandler};
pub use mapping::CodeStrategy;
pub use response::ErrorResponse;

// Re-export commonly used types from dependencies
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use errestra::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigHolder, ExceptionConfig, ExceptionConfigBuilder};
    pub use crate::customize::{
        Localizer, LoggingService, ResponseCustomizer, TelemetryEvent, TelemetrySink,
        TracingLoggingService,
    };
    pub use crate::dispatch::{ExceptionDispatcher, ExceptionDispatcherBuilder};
    pub use crate::exception::{
        AggregateException, ApiError, ApiException, BindingFailure, JsonParseException,
        MalformedRequestException, ModelBindingException, TypeConversionException,
        ValidationException, Violation,
    };
    pub use crate::handler::{
        AggregateExceptionHandler, DefaultFallbackHandler, ExceptionHandler, FallbackHandler,
        HandlerChain,
    };
    pub use crate::mapping::CodeStrategy;
    pub use crate::metadata::{ExceptionMetadata, MetadataRegistry, PropertySpec};
    pub use crate::response::{ErrorResponse, FieldError, GlobalError, ParameterError};
    pub use axum::http::StatusCode;
    pub use std::sync::Arc;
}
