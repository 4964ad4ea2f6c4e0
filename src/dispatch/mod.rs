//! The dispatch facade: sequences handlers, post-processing and failure
//! containment.

use crate::config::{ConfigHolder, ExceptionConfig};
use crate::customize::{
    Localizer, LoggingService, ResponseCustomizer, TelemetryEvent, TelemetrySink,
    TracingLoggingService,
};
use crate::exception::ApiException;
use crate::handler::{
    AggregateExceptionHandler, DefaultFallbackHandler, ExceptionHandler, FallbackHandler,
    HandlerChain, JsonParseExceptionHandler, MalformedRequestExceptionHandler,
    ModelBindingExceptionHandler, TypeConversionExceptionHandler, ValidationExceptionHandler,
};
use crate::metadata::MetadataRegistry;
use crate::response::ErrorResponse;
use axum::http::StatusCode as HttpStatusCode;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};
use tracing::{Span, error, error_span, field, warn};

/// Owns the ordered handler chain and sequences one exception through
/// dispatch, customization, logging, localization and telemetry.
///
/// `handle_exception` never lets an unexpected failure escape while handling
/// is enabled: any panic raised by a handler, customizer, localizer or
/// telemetry sink is contained and turned into a generic 500 response.
///
/// # Example
/// ```
/// use errestra::dispatch::ExceptionDispatcher;
/// use errestra::exception::ApiError;
///
/// let dispatcher = ExceptionDispatcher::builder().build();
/// let response = dispatcher
///     .handle_exception(Box::new(ApiError::KeyNotFound("user 42".into())))
///     .expect("handling is enabled");
/// assert_eq!(response.code, "KEY_NOT_FOUND");
/// ```
pub struct ExceptionDispatcher {
    chain: Arc<HandlerChain>,
    fallback: Arc<dyn FallbackHandler>,
    customizers: Vec<Arc<dyn ResponseCustomizer>>,
    localizer: Option<Arc<dyn Localizer>>,
    logging: Arc<dyn LoggingService>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    config: Arc<ConfigHolder>,
}

impl ExceptionDispatcher {
    pub fn builder() -> ExceptionDispatcherBuilder {
        ExceptionDispatcherBuilder::new()
    }

    /// The configuration holder; hot reloads go through it.
    pub fn config(&self) -> &Arc<ConfigHolder> {
        &self.config
    }

    /// Convert an exception into an [`ErrorResponse`].
    ///
    /// Returns `Err` with the original exception, untouched, when handling is
    /// globally disabled; that is the only path out of this method that is
    /// not a well-formed response.
    pub fn handle_exception(
        &self,
        exception: Box<dyn ApiException>,
    ) -> Result<ErrorResponse, Box<dyn ApiException>> {
        // One snapshot for the whole call, hot reloads notwithstanding.
        let config = self.config.load();
        if !config.enabled {
            return Err(exception);
        }

        let span = error_span!(
            "handle_exception",
            exception_type = exception.type_name(),
            otel.status_code = field::Empty,
        );
        let _entered = span.enter();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.dispatch(exception.as_ref(), &config)
        }));

        match outcome {
            Ok(response) => Ok(response),
            Err(panic) => {
                // Log the secondary failure and the original exception, then
                // keep the guarantee: some well-formed response, always.
                error!(
                    failure = panic_message(&*panic),
                    original = %exception,
                    original_type = exception.type_name(),
                    "exception pipeline failed, returning generic response"
                );
                let response = self.generic_response(&config);
                // The configured logging service sees the original exception
                // and the substituted response too, under its own boundary.
                self.log(exception.as_ref(), &response);
                Ok(response)
            }
        }
    }

    fn dispatch(&self, exception: &dyn ApiException, config: &ExceptionConfig) -> ErrorResponse {
        let mut response = match self.chain.find(exception) {
            Some(handler) => handler.handle(exception, config),
            None => self.fallback.handle(exception, config),
        };

        // Containment applies to every producer, not just the fallback: a
        // server error never carries the exception's own message.
        if response.http_status.is_server_error() {
            response.message = Some(config.fallback_message.clone());
        }

        if config.http_status_in_json_response && response.status == 0 {
            response.status = response.http_status.as_u16();
        }

        for customizer in &self.customizers {
            customizer.customize(&mut response);
        }

        self.log(exception, &response);

        if let Some(localizer) = &self.localizer {
            localize_response(localizer.as_ref(), &mut response);
        }

        if let Some(sink) = &self.telemetry {
            sink.record(&TelemetryEvent {
                code: response.code.clone(),
                exception_type: exception.type_name(),
                http_status: response.http_status.as_u16(),
                message: exception.to_string(),
                detail: format!("{exception:?}"),
            });
            // Mark the dispatch span failed; the event carries the resolved
            // envelope for trace backends.
            Span::current().record("otel.status_code", "ERROR");
            error!(
                code = %response.code,
                status = response.http_status.as_u16(),
                "handled exception attached to span"
            );
        }

        response
    }

    /// Logging is best-effort: a panicking logging service is swallowed here
    /// rather than falling through to the outer boundary, so the already
    /// well-formed response survives.
    fn log(&self, exception: &dyn ApiException, response: &ErrorResponse) {
        let logged = catch_unwind(AssertUnwindSafe(|| self.logging.log(exception, response)));
        if logged.is_err() {
            warn!("logging service failed, response unaffected");
        }
    }

    fn generic_response(&self, config: &ExceptionConfig) -> ErrorResponse {
        // Built from literals only so this path cannot fail in turn.
        let mut response =
            ErrorResponse::new("INTERNAL_ERROR", HttpStatusCode::INTERNAL_SERVER_ERROR)
                .with_message(config.fallback_message.clone());
        if config.http_status_in_json_response {
            response.status = response.http_status.as_u16();
        }
        response
    }
}

fn localize_response(localizer: &dyn Localizer, response: &mut ErrorResponse) {
    if let Some(message) = response.message.take() {
        response.message = Some(localizer.localize(&response.code, &message));
    }
    if let Some(fields) = &mut response.field_errors {
        for field in fields {
            if let Some(message) = field.message.take() {
                field.message = Some(localizer.localize_field(&field.code, &field.property, &message));
            }
        }
    }
    if let Some(globals) = &mut response.global_errors {
        for global in globals {
            if let Some(message) = global.message.take() {
                global.message = Some(localizer.localize(&global.code, &message));
            }
        }
    }
    if let Some(parameters) = &mut response.parameter_errors {
        for parameter in parameters {
            if let Some(message) = parameter.message.take() {
                parameter.message =
                    Some(localizer.localize_field(&parameter.code, &parameter.parameter, &message));
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Builder for [`ExceptionDispatcher`].
///
/// Registers the built-in handlers unless told otherwise; custom handlers
/// join the same chain and are ordered by [`ExceptionHandler::order`].
pub struct ExceptionDispatcherBuilder {
    handlers: Vec<Arc<dyn ExceptionHandler>>,
    customizers: Vec<Arc<dyn ResponseCustomizer>>,
    localizer: Option<Arc<dyn Localizer>>,
    logging: Option<Arc<dyn LoggingService>>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    config: Option<Arc<ConfigHolder>>,
    metadata: Arc<MetadataRegistry>,
    fallback: Option<Arc<dyn FallbackHandler>>,
    builtin_handlers: bool,
}

impl ExceptionDispatcherBuilder {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            customizers: Vec::new(),
            localizer: None,
            logging: None,
            telemetry: None,
            config: None,
            metadata: Arc::new(MetadataRegistry::new()),
            fallback: None,
            builtin_handlers: true,
        }
    }

    pub fn handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn customizer(mut self, customizer: Arc<dyn ResponseCustomizer>) -> Self {
        self.customizers.push(customizer);
        self
    }

    pub fn localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.localizer = Some(localizer);
        self
    }

    pub fn logging(mut self, logging: Arc<dyn LoggingService>) -> Self {
        self.logging = Some(logging);
        self
    }

    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn config(mut self, config: ExceptionConfig) -> Self {
        self.config = Some(Arc::new(ConfigHolder::new(config)));
        self
    }

    pub fn config_holder(mut self, holder: Arc<ConfigHolder>) -> Self {
        self.config = Some(holder);
        self
    }

    pub fn metadata(mut self, metadata: Arc<MetadataRegistry>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn fallback(mut self, fallback: Arc<dyn FallbackHandler>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Skip the built-in handlers; only explicitly registered handlers and
    /// the fallback remain.
    pub fn without_builtin_handlers(mut self) -> Self {
        self.builtin_handlers = false;
        self
    }

    pub fn build(self) -> ExceptionDispatcher {
        let fallback = self
            .fallback
            .unwrap_or_else(|| Arc::new(DefaultFallbackHandler::new(self.metadata.clone())));

        let mut handlers = self.handlers;
        // The aggregate handler re-dispatches into the chain that contains
        // it, so the chain is published through a cell it reads lazily.
        let chain_cell: Arc<OnceLock<Arc<HandlerChain>>> = Arc::new(OnceLock::new());
        if self.builtin_handlers {
            handlers.push(Arc::new(AggregateExceptionHandler::new(
                chain_cell.clone(),
                fallback.clone(),
            )));
            handlers.push(Arc::new(ValidationExceptionHandler));
            handlers.push(Arc::new(MalformedRequestExceptionHandler));
            handlers.push(Arc::new(TypeConversionExceptionHandler));
            handlers.push(Arc::new(JsonParseExceptionHandler));
            handlers.push(Arc::new(ModelBindingExceptionHandler));
        }

        let chain = Arc::new(HandlerChain::new(handlers));
        chain_cell.set(chain.clone()).ok();

        ExceptionDispatcher {
            chain,
            fallback,
            customizers: self.customizers,
            localizer: self.localizer,
            logging: self.logging.unwrap_or_else(|| Arc::new(TracingLoggingService)),
            telemetry: self.telemetry,
            config: self.config.unwrap_or_default(),
        }
    }
}

impl Default for ExceptionDispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
