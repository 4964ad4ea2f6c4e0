//! The handler of last resort.

use super::FallbackHandler;
use crate::config::ExceptionConfig;
use crate::exception::ApiException;
use crate::mapping::{code, message, status};
use crate::metadata::MetadataRegistry;
use crate::response::ErrorResponse;
use axum::http::StatusCode as HttpStatusCode;
use serde_json::Value;
use std::sync::Arc;

/// Produces a response for any exception no chain handler claimed.
///
/// Metadata registered for the exception type takes precedence over the
/// code/status mappers. Whatever the resolved status, a 5xx response never
/// carries the exception's own message: it is replaced by the configured
/// fallback text so internal detail cannot leak.
pub struct DefaultFallbackHandler {
    metadata: Arc<MetadataRegistry>,
}

impl DefaultFallbackHandler {
    pub fn new(metadata: Arc<MetadataRegistry>) -> Self {
        Self { metadata }
    }
}

impl FallbackHandler for DefaultFallbackHandler {
    fn handle(&self, exception: &dyn ApiException, config: &ExceptionConfig) -> ErrorResponse {
        let metadata = self.metadata.get(exception.type_name());

        let resolved_code = metadata
            .as_ref()
            .and_then(|m| m.code.clone())
            .unwrap_or_else(|| code::error_code(config, exception));

        let resolved_status = metadata.as_ref().and_then(|m| m.status).unwrap_or_else(|| {
            status::http_status(config, exception, HttpStatusCode::INTERNAL_SERVER_ERROR)
        });

        let resolved_message = if resolved_status.is_server_error() {
            Some(config.fallback_message.clone())
        } else {
            message::error_message(config, exception, Some(&exception.to_string()))
        };

        let mut response = ErrorResponse::new(resolved_code, resolved_status);
        response.message = resolved_message;

        if let Some(metadata) = metadata {
            for property in &metadata.properties {
                match property.read(exception) {
                    Some(value) if !value.is_null() => {
                        response.add_property(property.name.clone(), value);
                    }
                    _ if property.include_if_null => {
                        response.add_property(property.name.clone(), Value::Null);
                    }
                    _ => {}
                }
            }
        }

        response
    }
}
