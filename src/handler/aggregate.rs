//! Unwraps composite exceptions and re-dispatches their single leaf.

use super::{ExceptionHandler, FallbackHandler, HandlerChain};
use crate::config::ExceptionConfig;
use crate::exception::{AggregateException, ApiException};
use crate::response::ErrorResponse;
use std::sync::{Arc, OnceLock};

/// High-priority handler for [`AggregateException`].
///
/// Flattens nested aggregates into leaves. A single leaf is re-dispatched
/// through the rest of the chain (this handler excluded) as if it had been
/// raised directly; zero or several leaves go to the fallback handler with
/// the original, un-flattened aggregate.
///
/// The chain it re-dispatches into contains this handler itself, so the
/// filtered list is resolved lazily on first use instead of at construction.
pub struct AggregateExceptionHandler {
    chain: Arc<OnceLock<Arc<HandlerChain>>>,
    fallback: Arc<dyn FallbackHandler>,
    resolved: OnceLock<Vec<Arc<dyn ExceptionHandler>>>,
}

impl AggregateExceptionHandler {
    pub const ORDER: i32 = 50;

    /// `chain` is a cell the dispatcher builder fills once the full chain,
    /// including this handler, exists.
    pub fn new(
        chain: Arc<OnceLock<Arc<HandlerChain>>>,
        fallback: Arc<dyn FallbackHandler>,
    ) -> Self {
        Self {
            chain,
            fallback,
            resolved: OnceLock::new(),
        }
    }

    /// Every registered handler except this one, in dispatch order. Computed
    /// exactly once; concurrent first calls agree on the result.
    fn resolved(&self) -> &[Arc<dyn ExceptionHandler>] {
        self.resolved.get_or_init(|| {
            let Some(chain) = self.chain.get() else {
                return Vec::new();
            };
            chain
                .sorted()
                .iter()
                .filter(|handler| {
                    // Exclude self by identity; the data pointer is enough.
                    Arc::as_ptr(handler) as *const () != self as *const Self as *const ()
                })
                .cloned()
                .collect()
        })
    }

    fn flatten<'a>(aggregate: &'a AggregateException, leaves: &mut Vec<&'a dyn ApiException>) {
        for inner in &aggregate.inner {
            match inner.as_any().downcast_ref::<AggregateException>() {
                Some(nested) => Self::flatten(nested, leaves),
                None => leaves.push(inner.as_ref()),
            }
        }
    }
}

impl ExceptionHandler for AggregateExceptionHandler {
    fn order(&self) -> i32 {
        Self::ORDER
    }

    fn can_handle(&self, exception: &dyn ApiException) -> bool {
        exception.as_any().is::<AggregateException>()
    }

    fn handle(&self, exception: &dyn ApiException, config: &ExceptionConfig) -> ErrorResponse {
        let Some(aggregate) = exception.as_any().downcast_ref::<AggregateException>() else {
            panic!("AggregateExceptionHandler dispatched for {}", exception.type_name());
        };

        let mut leaves = Vec::new();
        Self::flatten(aggregate, &mut leaves);

        match leaves.as_slice() {
            [leaf] => {
                let leaf = *leaf;
                match self.resolved().iter().find(|h| h.can_handle(leaf)) {
                    Some(handler) => handler.handle(leaf, config),
                    None => self.fallback.handle(leaf, config),
                }
            }
            _ => self.fallback.handle(exception, config),
        }
    }
}
