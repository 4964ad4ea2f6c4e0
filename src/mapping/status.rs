//! HTTP-status resolution: a status declared on the exception instance wins,
//! then the override tables, then built-in defaults per exception kind.

use super::{bare_name, lookup};
use crate::config::ExceptionConfig;
use crate::exception::ApiException;
use axum::http::StatusCode as HttpStatusCode;

/// Non-standard nginx status for a client that closed the connection.
pub fn client_closed_request() -> HttpStatusCode {
    // 499 is inside the valid range, so from_u16 cannot fail here.
    HttpStatusCode::from_u16(499).unwrap_or(HttpStatusCode::BAD_REQUEST)
}

/// Resolve the HTTP status for an exception, falling back to `default`
/// (normally 500).
pub fn http_status(
    config: &ExceptionConfig,
    exception: &dyn ApiException,
    default: HttpStatusCode,
) -> HttpStatusCode {
    if let Some(status) = exception.status_hint() {
        return status;
    }
    if let Some(status) = lookup(
        &config.http_statuses,
        exception,
        config.search_super_class_hierarchy,
    ) {
        return *status;
    }
    // Built-in defaults, checked most-specific-first along the declared
    // hierarchy so e.g. TaskCanceled resolves before its OperationCanceled
    // parent.
    for name in exception.type_hierarchy() {
        if let Some(status) = builtin_default(name) {
            return status;
        }
    }
    default
}

fn builtin_default(type_name: &str) -> Option<HttpStatusCode> {
    match bare_name(type_name) {
        "ArgumentException"
        | "FormatException"
        | "InvalidOperationException"
        | "TaskCanceledException"
        | "ValidationException"
        | "MalformedRequestException"
        | "TypeConversionException"
        | "JsonParseException"
        | "ModelBindingException" => Some(HttpStatusCode::BAD_REQUEST),
        "UnauthorizedAccessException" => Some(HttpStatusCode::UNAUTHORIZED),
        "NotImplementedException" => Some(HttpStatusCode::NOT_IMPLEMENTED),
        "TimeoutException" => Some(HttpStatusCode::REQUEST_TIMEOUT),
        "KeyNotFoundException" | "NotFoundException" | "FileNotFoundException" => {
            Some(HttpStatusCode::NOT_FOUND)
        }
        "OperationCanceledException" => Some(client_closed_request()),
        _ => None,
    }
}
