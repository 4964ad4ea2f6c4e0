use axum::http::StatusCode as HttpStatusCode;
use std::any::Any;
use std::fmt;
use thiserror::Error;

pub mod request;

pub use request::{
    AggregateException, BindingFailure, JsonParseException, MalformedRequestException,
    ModelBindingException, TypeConversionException, ValidationException, Violation,
};

/// Root of every declared exception hierarchy.
pub const ROOT_EXCEPTION: &str = "Exception";

/// An exception the dispatch pipeline can route.
///
/// There is no inheritance in Rust, so the type hierarchy the mappers walk is
/// declared explicitly: [`type_hierarchy`](ApiException::type_hierarchy)
/// returns the exception's own fully-qualified name first, then each declared
/// ancestor, ending in [`ROOT_EXCEPTION`].
///
/// Embedding applications implement this trait for their own error types and
/// register handlers for them; handlers recover the concrete type through
/// [`as_any`](ApiException::as_any).
pub trait ApiException: fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Fully-qualified type name, used as the exact-match key in the
    /// code/message/status override tables.
    fn type_name(&self) -> &'static str {
        self.type_hierarchy()[0]
    }

    /// Declared ancestor chain, self first. Must be non-empty and end in
    /// [`ROOT_EXCEPTION`].
    fn type_hierarchy(&self) -> &'static [&'static str];

    /// A status declared directly on the exception instance. Takes precedence
    /// over every configured override table in the status mapper.
    fn status_hint(&self) -> Option<HttpStatusCode> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// The built-in exception kinds.
///
/// Each variant carries the message shown for 4xx responses; 5xx messages are
/// replaced by the configured fallback text before they leave the pipeline.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Argument(String),

    #[error("{0}")]
    Format(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error("{0}")]
    UnauthorizedAccess(String),

    #[error("{0}")]
    NotImplemented(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    KeyNotFound(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    OperationCanceled(String),

    #[error("{0}")]
    TaskCanceled(String),

    /// A failure with no more specific kind. Its type name is the bare root
    /// `Exception`, which the code mapper turns into `INTERNAL_ERROR`.
    #[error("{0}")]
    Unexpected(String),
}

impl ApiException for ApiError {
    fn type_hierarchy(&self) -> &'static [&'static str] {
        match self {
            Self::Argument(_) => &["errestra::exception::ArgumentException", ROOT_EXCEPTION],
            Self::Format(_) => &["errestra::exception::FormatException", ROOT_EXCEPTION],
            Self::InvalidOperation(_) => &[
                "errestra::exception::InvalidOperationException",
                ROOT_EXCEPTION,
            ],
            Self::UnauthorizedAccess(_) => &[
                "errestra::exception::UnauthorizedAccessException",
                ROOT_EXCEPTION,
            ],
            Self::NotImplemented(_) => &[
                "errestra::exception::NotImplementedException",
                ROOT_EXCEPTION,
            ],
            Self::Timeout(_) => &["errestra::exception::TimeoutException", ROOT_EXCEPTION],
            Self::KeyNotFound(_) => &["errestra::exception::KeyNotFoundException", ROOT_EXCEPTION],
            Self::NotFound(_) => &["errestra::exception::NotFoundException", ROOT_EXCEPTION],
            Self::OperationCanceled(_) => &[
                "errestra::exception::OperationCanceledException",
                ROOT_EXCEPTION,
            ],
            // TaskCanceled declares OperationCanceled as its parent, so the
            // superclass walk can resolve overrides registered on the parent.
            Self::TaskCanceled(_) => &[
                "errestra::exception::TaskCanceledException",
                "errestra::exception::OperationCanceledException",
                ROOT_EXCEPTION,
            ],
            Self::Unexpected(_) => &[ROOT_EXCEPTION],
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
