//! Built-in handlers for the request-processing exceptions.
//!
//! Each handler claims exactly one exception type through a downcast check
//! and derives per-failure codes and messages through the field-specific
//! mapper lookups, keyed by `<property>.<kind>`.

use super::ExceptionHandler;
use crate::config::ExceptionConfig;
use crate::exception::{
    ApiException, BindingFailure, JsonParseException, MalformedRequestException,
    ModelBindingException, TypeConversionException, ValidationException, Violation,
};
use crate::mapping::{camel_case_path, code, message, status};
use crate::response::{ErrorResponse, FieldError, GlobalError, ParameterError};
use axum::http::StatusCode as HttpStatusCode;
use serde_json::json;

fn base_response(exception: &dyn ApiException, config: &ExceptionConfig) -> ErrorResponse {
    let resolved_code = code::error_code(config, exception);
    let resolved_status = status::http_status(config, exception, HttpStatusCode::BAD_REQUEST);
    let mut response = ErrorResponse::new(resolved_code, resolved_status);
    response.message = message::error_message(config, exception, Some(&exception.to_string()));
    response
}

fn attach_violation(response: &mut ErrorResponse, violation: &Violation, config: &ExceptionConfig) {
    let default_code = code::generate(config.default_error_code_strategy, &violation.kind);

    if let Some(field) = &violation.field {
        let field_key = format!("{field}.{}", violation.kind);
        let entry_code = code::error_code_for_field(config, &field_key, &default_code);
        let entry_message = message::error_message_for_field(
            config,
            &field_key,
            &entry_code,
            Some(&violation.message),
        );

        let mut error = FieldError::new(entry_code, camel_case_path(field), entry_message);
        if let Some(value) = &violation.rejected_value {
            error = error.with_rejected_value(value.clone());
        }
        if config.add_path_to_error {
            if let Some(path) = &violation.path {
                error = error.with_path(camel_case_path(path));
            }
        }
        response.add_field_error(error);
    } else if let Some(parameter) = &violation.parameter {
        let field_key = format!("{parameter}.{}", violation.kind);
        let entry_code = code::error_code_for_field(config, &field_key, &default_code);
        let entry_message = message::error_message_for_field(
            config,
            &field_key,
            &entry_code,
            Some(&violation.message),
        );

        let mut error =
            ParameterError::new(entry_code, camel_case_path(parameter), entry_message);
        if let Some(value) = &violation.rejected_value {
            error = error.with_rejected_value(value.clone());
        }
        response.add_parameter_error(error);
    } else {
        let entry_code = code::error_code_for_field(config, &violation.kind, &default_code);
        let entry_message = message::error_message_for_field(
            config,
            &violation.kind,
            &entry_code,
            Some(&violation.message),
        );
        response.add_global_error(GlobalError::new(entry_code, entry_message));
    }
}

/// Converts a [`ValidationException`] into field/global/parameter errors.
pub struct ValidationExceptionHandler;

impl ExceptionHandler for ValidationExceptionHandler {
    fn order(&self) -> i32 {
        100
    }

    fn can_handle(&self, exception: &dyn ApiException) -> bool {
        exception.as_any().is::<ValidationException>()
    }

    fn handle(&self, exception: &dyn ApiException, config: &ExceptionConfig) -> ErrorResponse {
        let Some(validation) = exception.as_any().downcast_ref::<ValidationException>() else {
            panic!("ValidationExceptionHandler dispatched for {}", exception.type_name());
        };

        let mut response = base_response(exception, config);
        for violation in &validation.violations {
            attach_violation(&mut response, violation, config);
        }
        response
    }
}

/// Handles unreadable request bodies.
pub struct MalformedRequestExceptionHandler;

impl ExceptionHandler for MalformedRequestExceptionHandler {
    fn order(&self) -> i32 {
        110
    }

    fn can_handle(&self, exception: &dyn ApiException) -> bool {
        exception.as_any().is::<MalformedRequestException>()
    }

    fn handle(&self, exception: &dyn ApiException, config: &ExceptionConfig) -> ErrorResponse {
        assert!(
            self.can_handle(exception),
            "MalformedRequestExceptionHandler dispatched for {}",
            exception.type_name()
        );
        base_response(exception, config)
    }
}

/// Handles path/query values that fail type conversion.
pub struct TypeConversionExceptionHandler;

impl ExceptionHandler for TypeConversionExceptionHandler {
    fn order(&self) -> i32 {
        120
    }

    fn can_handle(&self, exception: &dyn ApiException) -> bool {
        exception.as_any().is::<TypeConversionException>()
    }

    fn handle(&self, exception: &dyn ApiException, config: &ExceptionConfig) -> ErrorResponse {
        let Some(conversion) = exception.as_any().downcast_ref::<TypeConversionException>() else {
            panic!("TypeConversionExceptionHandler dispatched for {}", exception.type_name());
        };

        let mut response = base_response(exception, config);
        let entry_code = code::error_code_for_field(
            config,
            &format!("{}.TypeConversion", conversion.name),
            "INVALID_TYPE",
        );
        let entry_message = format!(
            "Value for '{}' must be a valid {}",
            camel_case_path(&conversion.name),
            conversion.expected_type
        );

        if conversion.parameter {
            let mut error = ParameterError::new(
                entry_code,
                camel_case_path(&conversion.name),
                Some(entry_message),
            );
            if let Some(value) = &conversion.rejected_value {
                error = error.with_rejected_value(value.clone());
            }
            response.add_parameter_error(error);
        } else {
            let mut error = FieldError::new(
                entry_code,
                camel_case_path(&conversion.name),
                Some(entry_message),
            );
            if let Some(value) = &conversion.rejected_value {
                error = error.with_rejected_value(value.clone());
            }
            response.add_field_error(error);
        }
        response
    }
}

/// Handles JSON bodies that fail to parse; records the location in the
/// extension bag.
pub struct JsonParseExceptionHandler;

impl ExceptionHandler for JsonParseExceptionHandler {
    fn order(&self) -> i32 {
        130
    }

    fn can_handle(&self, exception: &dyn ApiException) -> bool {
        exception.as_any().is::<JsonParseException>()
    }

    fn handle(&self, exception: &dyn ApiException, config: &ExceptionConfig) -> ErrorResponse {
        let Some(parse) = exception.as_any().downcast_ref::<JsonParseException>() else {
            panic!("JsonParseExceptionHandler dispatched for {}", exception.type_name());
        };

        let mut response = base_response(exception, config);
        response.add_property("line", json!(parse.line));
        response.add_property("column", json!(parse.column));
        response
    }
}

/// Handles model-binding failures. Binding failures carry no structured
/// validation kind, so one is inferred from the message text by keyword
/// matching. This is a heuristic and can misclassify unusual messages.
pub struct ModelBindingExceptionHandler;

impl ExceptionHandler for ModelBindingExceptionHandler {
    fn order(&self) -> i32 {
        140
    }

    fn can_handle(&self, exception: &dyn ApiException) -> bool {
        exception.as_any().is::<ModelBindingException>()
    }

    fn handle(&self, exception: &dyn ApiException, config: &ExceptionConfig) -> ErrorResponse {
        let Some(binding) = exception.as_any().downcast_ref::<ModelBindingException>() else {
            panic!("ModelBindingExceptionHandler dispatched for {}", exception.type_name());
        };

        let mut response = base_response(exception, config);
        for failure in &binding.failures {
            let violation = to_violation(failure);
            attach_violation(&mut response, &violation, config);
        }
        response
    }
}

fn to_violation(failure: &BindingFailure) -> Violation {
    let kind = infer_validation_kind(&failure.message);
    let mut violation = match &failure.field {
        Some(field) => Violation::field(field.clone(), kind, failure.message.clone()),
        None => Violation::global(kind, failure.message.clone()),
    };
    if let Some(value) = &failure.rejected_value {
        violation = violation.with_rejected_value(value.clone());
    }
    violation
}

/// Infer a validation kind from free-text failure messages.
///
/// Pure keyword matching; edge-case messages can land in the wrong bucket.
fn infer_validation_kind(message: &str) -> &'static str {
    let normalized = message.to_ascii_lowercase();
    if normalized.contains("required") || normalized.contains("missing") {
        "Required"
    } else if normalized.contains("null") {
        "NotNull"
    } else if normalized.contains("blank") {
        "NotBlank"
    } else if normalized.contains("size") || normalized.contains("length") {
        "Size"
    } else if normalized.contains("format")
        || normalized.contains("invalid")
        || normalized.contains("parse")
    {
        "Invalid"
    } else {
        "Unknown"
    }
}
