//! Post-processing hooks applied after a response is produced.

use crate::exception::ApiException;
use crate::response::ErrorResponse;
use tracing::{error, warn};

/// Enriches a finished response. Customizers run in registration order; a
/// later customizer's write to the same extension key wins.
pub trait ResponseCustomizer: Send + Sync + 'static {
    fn customize(&self, response: &mut ErrorResponse);
}

/// Translates response text. Keyed by code, and additionally by property for
/// field and parameter errors.
pub trait Localizer: Send + Sync + 'static {
    fn localize(&self, code: &str, message: &str) -> String;

    fn localize_field(&self, code: &str, property: &str, message: &str) -> String;
}

/// Records a handled exception together with the response it produced.
/// Best-effort: a failing logging service never affects the response.
pub trait LoggingService: Send + Sync + 'static {
    fn log(&self, exception: &dyn ApiException, response: &ErrorResponse);
}

/// Default logging service backed by `tracing`.
///
/// Client errors are logged at warn without exception detail; server errors
/// at error with the full Debug form, since their messages are withheld from
/// the response body.
#[derive(Debug, Clone, Default)]
pub struct TracingLoggingService;

impl LoggingService for TracingLoggingService {
    fn log(&self, exception: &dyn ApiException, response: &ErrorResponse) {
        let status = response.http_status.as_u16();
        if response.http_status.is_server_error() {
            error!(
                code = %response.code,
                status,
                exception_type = exception.type_name(),
                exception = ?exception,
                "request failed"
            );
        } else {
            warn!(
                code = %response.code,
                status,
                exception_type = exception.type_name(),
                "request rejected"
            );
        }
    }
}

/// What the telemetry sink receives for each handled exception.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEvent {
    pub code: String,
    pub exception_type: &'static str,
    pub http_status: u16,
    pub message: String,
    /// Debug rendering of the exception, the closest thing to a stack trace.
    pub detail: String,
}

/// Best-effort telemetry enrichment for handled exceptions.
pub trait TelemetrySink: Send + Sync + 'static {
    fn record(&self, event: &TelemetryEvent);
}
