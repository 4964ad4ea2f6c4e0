use crate::config::ExceptionConfig;
use crate::exception::ApiException;
use crate::response::ErrorResponse;
use std::sync::{Arc, OnceLock};

pub mod aggregate;
pub mod builtins;
pub mod fallback;

pub use aggregate::AggregateExceptionHandler;
pub use builtins::{
    JsonParseExceptionHandler, MalformedRequestExceptionHandler, ModelBindingExceptionHandler,
    TypeConversionExceptionHandler, ValidationExceptionHandler,
};
pub use fallback::DefaultFallbackHandler;

/// A unit that claims and converts one class of exception into an
/// [`ErrorResponse`].
///
/// Handlers are tried in ascending [`order`](ExceptionHandler::order); ties
/// are broken by registration order. `handle` must be pure; it may panic only
/// on a wrong-type dispatch, which the facade's safety net contains.
pub trait ExceptionHandler: Send + Sync + 'static {
    /// Chain position. Lower runs first. Built-ins use 50-140; custom
    /// handlers default after them.
    fn order(&self) -> i32 {
        100
    }

    fn can_handle(&self, exception: &dyn ApiException) -> bool;

    fn handle(&self, exception: &dyn ApiException, config: &ExceptionConfig) -> ErrorResponse;
}

/// The handler of last resort. Must never panic.
pub trait FallbackHandler: Send + Sync + 'static {
    fn handle(&self, exception: &dyn ApiException, config: &ExceptionConfig) -> ErrorResponse;
}

/// The registered handlers, sorted exactly once on first use.
pub struct HandlerChain {
    registered: Vec<Arc<dyn ExceptionHandler>>,
    sorted: OnceLock<Vec<Arc<dyn ExceptionHandler>>>,
}

impl HandlerChain {
    pub fn new(handlers: Vec<Arc<dyn ExceptionHandler>>) -> Self {
        Self {
            registered: handlers,
            sorted: OnceLock::new(),
        }
    }

    /// Handlers in dispatch order. Sorted lazily, once; concurrent first
    /// calls race only on who publishes the identical result.
    pub fn sorted(&self) -> &[Arc<dyn ExceptionHandler>] {
        self.sorted.get_or_init(|| {
            let mut handlers = self.registered.clone();
            // sort_by_key is stable, so equal orders keep registration order.
            handlers.sort_by_key(|handler| handler.order());
            handlers
        })
    }

    /// The smallest-order handler that claims the exception.
    pub fn find(&self, exception: &dyn ApiException) -> Option<&Arc<dyn ExceptionHandler>> {
        self.sorted()
            .iter()
            .find(|handler| handler.can_handle(exception))
    }
}
