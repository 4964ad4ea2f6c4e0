//! End-to-end dispatch pipeline tests.

use errestra::prelude::*;
use serde_json::json;
use std::io;
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;

struct FixedHandler {
    code: &'static str,
    order: i32,
}

impl ExceptionHandler for FixedHandler {
    fn order(&self) -> i32 {
        self.order
    }

    fn can_handle(&self, exception: &dyn ApiException) -> bool {
        exception.as_any().is::<ApiError>()
    }

    fn handle(&self, _exception: &dyn ApiException, _config: &ExceptionConfig) -> ErrorResponse {
        ErrorResponse::new(self.code, StatusCode::BAD_REQUEST)
    }
}

struct PanickingHandler;

impl ExceptionHandler for PanickingHandler {
    fn order(&self) -> i32 {
        1
    }

    fn can_handle(&self, _exception: &dyn ApiException) -> bool {
        true
    }

    fn handle(&self, _exception: &dyn ApiException, _config: &ExceptionConfig) -> ErrorResponse {
        panic!("buggy handler")
    }
}

#[derive(Default)]
struct CapturingSink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl TelemetrySink for CapturingSink {
    fn record(&self, event: &TelemetryEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[derive(Default)]
struct CapturingLogger {
    entries: Mutex<Vec<(String, String)>>,
}

impl LoggingService for CapturingLogger {
    fn log(&self, exception: &dyn ApiException, response: &ErrorResponse) {
        self.entries
            .lock()
            .unwrap()
            .push((exception.type_name().to_string(), response.code.clone()));
    }
}

/// Shared in-memory sink for tracing output, cloned into each event writer.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn smallest_order_matching_handler_produces_the_response() {
    let dispatcher = ExceptionDispatcher::builder()
        .handler(Arc::new(FixedHandler { code: "LATE", order: 500 }))
        .handler(Arc::new(FixedHandler { code: "EARLY", order: 5 }))
        .build();

    let response = dispatcher
        .handle_exception(Box::new(ApiError::Argument("x".into())))
        .unwrap();
    assert_eq!(response.code, "EARLY");
}

#[test]
fn unmatched_exceptions_fall_back() {
    let dispatcher = ExceptionDispatcher::builder().build();
    let response = dispatcher
        .handle_exception(Box::new(ApiError::UnauthorizedAccess("no token".into())))
        .unwrap();
    assert_eq!(response.code, "UNAUTHORIZED_ACCESS");
    assert_eq!(response.http_status, StatusCode::UNAUTHORIZED);
}

#[test]
fn panicking_handler_yields_a_generic_500() {
    let dispatcher = ExceptionDispatcher::builder()
        .handler(Arc::new(PanickingHandler))
        .build();

    let response = dispatcher
        .handle_exception(Box::new(ApiError::Argument("original".into())))
        .unwrap();
    assert_eq!(response.code, "INTERNAL_ERROR");
    assert_eq!(response.http_status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.message.as_deref(), Some("An unexpected error occurred"));
}

#[test]
fn safety_net_logs_the_handler_failure_and_the_original_exception() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();

    let dispatcher = ExceptionDispatcher::builder()
        .handler(Arc::new(PanickingHandler))
        .build();

    let response = tracing::subscriber::with_default(subscriber, || {
        dispatcher.handle_exception(Box::new(ApiError::Argument("the original failure".into())))
    })
    .unwrap();
    assert_eq!(response.code, "INTERNAL_ERROR");

    let output = logs.contents();
    assert!(output.contains("buggy handler"), "missing handler failure: {output}");
    assert!(output.contains("the original failure"), "missing original exception: {output}");
    assert!(output.contains("ArgumentException"), "missing original type: {output}");
}

#[test]
fn custom_logging_service_observes_safety_net_responses() {
    let logger = Arc::new(CapturingLogger::default());
    let dispatcher = ExceptionDispatcher::builder()
        .handler(Arc::new(PanickingHandler))
        .logging(logger.clone())
        .build();

    dispatcher
        .handle_exception(Box::new(ApiError::Argument("original".into())))
        .unwrap();

    let entries = logger.entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "errestra::exception::ArgumentException");
    assert_eq!(entries[0].1, "INTERNAL_ERROR");
}

#[test]
fn disabled_handling_returns_the_original_exception() {
    let dispatcher = ExceptionDispatcher::builder()
        .config(ExceptionConfig::builder().enabled(false).build())
        .build();

    let original = dispatcher
        .handle_exception(Box::new(ApiError::Argument("id must be positive".into())))
        .unwrap_err();
    assert_eq!(original.to_string(), "id must be positive");
    assert_eq!(original.type_name(), "errestra::exception::ArgumentException");
}

#[test]
fn server_error_messages_never_leak_regardless_of_handler() {
    struct LeakyHandler;

    impl ExceptionHandler for LeakyHandler {
        fn can_handle(&self, _exception: &dyn ApiException) -> bool {
            true
        }

        fn handle(&self, exception: &dyn ApiException, _config: &ExceptionConfig) -> ErrorResponse {
            ErrorResponse::new("LEAKY", StatusCode::BAD_GATEWAY)
                .with_message(exception.to_string())
        }
    }

    let dispatcher = ExceptionDispatcher::builder()
        .handler(Arc::new(LeakyHandler))
        .build();
    let response = dispatcher
        .handle_exception(Box::new(ApiError::Unexpected("secret details".into())))
        .unwrap();
    assert_eq!(response.message.as_deref(), Some("An unexpected error occurred"));
}

#[test]
fn customizers_run_in_order_and_later_writes_win() {
    struct AddProperty(&'static str, serde_json::Value);

    impl ResponseCustomizer for AddProperty {
        fn customize(&self, response: &mut ErrorResponse) {
            response.add_property(self.0, self.1.clone());
        }
    }

    let dispatcher = ExceptionDispatcher::builder()
        .customizer(Arc::new(AddProperty("traceId", json!("first"))))
        .customizer(Arc::new(AddProperty("traceId", json!("second"))))
        .build();

    let response = dispatcher
        .handle_exception(Box::new(ApiError::Argument("x".into())))
        .unwrap();
    assert_eq!(response.properties.unwrap()["traceId"], json!("second"));
}

#[test]
fn localizer_rewrites_every_message() {
    struct ShoutingLocalizer;

    impl Localizer for ShoutingLocalizer {
        fn localize(&self, _code: &str, message: &str) -> String {
            message.to_uppercase()
        }

        fn localize_field(&self, _code: &str, property: &str, message: &str) -> String {
            format!("{property}: {}", message.to_uppercase())
        }
    }

    let dispatcher = ExceptionDispatcher::builder()
        .localizer(Arc::new(ShoutingLocalizer))
        .build();

    let response = dispatcher
        .handle_exception(Box::new(ValidationException::new(
            "validation failed",
            vec![Violation::field("name", "NotBlank", "must not be blank")],
        )))
        .unwrap();

    assert_eq!(response.message.as_deref(), Some("VALIDATION FAILED"));
    assert_eq!(
        response.field_errors.unwrap()[0].message.as_deref(),
        Some("name: MUST NOT BE BLANK")
    );
}

#[test]
fn telemetry_sink_receives_the_resolved_envelope() {
    let sink = Arc::new(CapturingSink::default());
    let dispatcher = ExceptionDispatcher::builder()
        .telemetry(sink.clone())
        .build();

    dispatcher
        .handle_exception(Box::new(ApiError::KeyNotFound("user 42".into())))
        .unwrap();

    let events = sink.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].code, "KEY_NOT_FOUND");
    assert_eq!(events[0].http_status, 404);
    assert_eq!(events[0].exception_type, "errestra::exception::KeyNotFoundException");
    assert_eq!(events[0].message, "user 42");
}

#[test]
fn telemetry_marks_the_dispatch_span_failed() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();

    let sink = Arc::new(CapturingSink::default());
    let dispatcher = ExceptionDispatcher::builder()
        .telemetry(sink.clone())
        .build();

    tracing::subscriber::with_default(subscriber, || {
        dispatcher
            .handle_exception(Box::new(ApiError::KeyNotFound("user 42".into())))
            .unwrap()
    });

    let output = logs.contents();
    assert!(
        output.contains("handled exception attached to span"),
        "missing span failure event: {output}"
    );
    assert!(output.contains("KEY_NOT_FOUND"), "missing resolved code: {output}");
}

#[test]
fn status_is_echoed_into_the_body_when_configured() {
    let dispatcher = ExceptionDispatcher::builder()
        .config(
            ExceptionConfig::builder()
                .http_status_in_json_response(true)
                .build(),
        )
        .build();

    let response = dispatcher
        .handle_exception(Box::new(ApiError::KeyNotFound("user 42".into())))
        .unwrap();
    assert_eq!(response.status, 404);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], json!(404));
}

#[test]
fn single_leaf_aggregate_dispatches_like_the_leaf() {
    let dispatcher = ExceptionDispatcher::builder().build();

    let direct = dispatcher
        .handle_exception(Box::new(ApiError::Argument("id must be positive".into())))
        .unwrap();
    let wrapped = dispatcher
        .handle_exception(Box::new(AggregateException::new(
            "wrapper",
            vec![Box::new(ApiError::Argument("id must be positive".into()))],
        )))
        .unwrap();

    assert_eq!(direct, wrapped);
    assert_eq!(wrapped.code, "ARGUMENT");
    assert_eq!(wrapped.http_status, StatusCode::BAD_REQUEST);
}

#[test]
fn multi_leaf_aggregate_goes_whole_to_the_fallback() {
    let dispatcher = ExceptionDispatcher::builder().build();

    let response = dispatcher
        .handle_exception(Box::new(AggregateException::new(
            "several failures",
            vec![
                Box::new(ApiError::Argument("a".into())),
                Box::new(ApiError::Timeout("b".into())),
            ],
        )))
        .unwrap();
    assert_eq!(response.code, "AGGREGATE");
    assert_eq!(response.http_status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn hot_reload_does_not_affect_subsequent_snapshot_reads() {
    let dispatcher = ExceptionDispatcher::builder().build();

    let before = dispatcher
        .handle_exception(Box::new(ApiError::Unexpected("boom".into())))
        .unwrap();
    assert_eq!(before.message.as_deref(), Some("An unexpected error occurred"));

    dispatcher.config().store(
        ExceptionConfig::builder()
            .fallback_message("Es ist ein Fehler aufgetreten")
            .build(),
    );

    let after = dispatcher
        .handle_exception(Box::new(ApiError::Unexpected("boom".into())))
        .unwrap();
    assert_eq!(after.message.as_deref(), Some("Es ist ein Fehler aufgetreten"));
}

#[test]
fn metadata_registered_at_startup_drives_the_fallback() {
    let metadata = Arc::new(MetadataRegistry::new());
    metadata.register(
        "errestra::exception::NotFoundException",
        ExceptionMetadata::new()
            .with_code("RESOURCE_GONE")
            .with_status(StatusCode::GONE)
            .with_property(PropertySpec::new("resource", |ex| {
                ex.as_any()
                    .downcast_ref::<ApiError>()
                    .map(|e| json!(e.to_string()))
            }, false)),
    );

    let dispatcher = ExceptionDispatcher::builder().metadata(metadata).build();
    let response = dispatcher
        .handle_exception(Box::new(ApiError::NotFound("order 7".into())))
        .unwrap();

    assert_eq!(response.code, "RESOURCE_GONE");
    assert_eq!(response.http_status, StatusCode::GONE);
    assert_eq!(response.properties.unwrap()["resource"], json!("order 7"));
}
