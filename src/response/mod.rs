use axum::http::StatusCode as HttpStatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The structured error envelope returned for a handled exception.
///
/// Produced exactly once per dispatch by a handler (or the fallback handler),
/// then mutated in place by customizers and the localizer before it is handed
/// to the writer.
///
/// # Example
/// ```
/// use errestra::response::{ErrorResponse, FieldError};
/// use axum::http::StatusCode;
///
/// let mut response = ErrorResponse::new("VALIDATION_FAILED", StatusCode::BAD_REQUEST);
/// response.add_field_error(FieldError::new("REQUIRED", "userName", Some("must not be blank")));
/// assert_eq!(response.field_errors.as_ref().map(Vec::len), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Stable machine-readable error code. Never empty.
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// The status chosen by whichever handler produced this response.
    /// Never serialized; the writer sets it as the transport status.
    #[serde(skip, default = "default_http_status")]
    pub http_status: HttpStatusCode,

    /// Wire-facing mirror of `http_status`. Zero means absent; only populated
    /// when the configuration asks for the status in the JSON body.
    #[serde(default, skip_serializing_if = "status_is_absent")]
    pub status: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<Vec<FieldError>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_errors: Option<Vec<GlobalError>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_errors: Option<Vec<ParameterError>>,

    /// Extension bag for ad-hoc customization. Keys keep insertion order and
    /// the last write for a given key wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

fn default_http_status() -> HttpStatusCode {
    HttpStatusCode::INTERNAL_SERVER_ERROR
}

fn status_is_absent(status: &u16) -> bool {
    *status == 0
}

impl ErrorResponse {
    /// Create an envelope with the given code and status.
    ///
    /// # Panics
    /// Panics if `code` is empty.
    pub fn new(code: impl Into<String>, http_status: HttpStatusCode) -> Self {
        let code = code.into();
        assert!(!code.is_empty(), "error code must not be empty");
        Self {
            code,
            message: None,
            http_status,
            status: 0,
            field_errors: None,
            global_errors: None,
            parameter_errors: None,
            properties: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Collections stay absent until the first insertion, never empty-but-present.
    pub fn add_field_error(&mut self, error: FieldError) {
        self.field_errors.get_or_insert_with(Vec::new).push(error);
    }

    pub fn add_global_error(&mut self, error: GlobalError) {
        self.global_errors.get_or_insert_with(Vec::new).push(error);
    }

    pub fn add_parameter_error(&mut self, error: ParameterError) {
        self.parameter_errors.get_or_insert_with(Vec::new).push(error);
    }

    /// Add or overwrite an extension property. Last write wins.
    pub fn add_property(&mut self, name: impl Into<String>, value: Value) {
        self.properties
            .get_or_insert_with(Map::new)
            .insert(name.into(), value);
    }
}

/// A validation failure tied to a body field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub code: String,
    pub property: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_value: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl FieldError {
    /// # Panics
    /// Panics if `code` or `property` is empty.
    pub fn new(
        code: impl Into<String>,
        property: impl Into<String>,
        message: Option<impl Into<String>>,
    ) -> Self {
        let code = code.into();
        let property = property.into();
        assert!(!code.is_empty(), "field error code must not be empty");
        assert!(!property.is_empty(), "field error property must not be empty");
        Self {
            code,
            property,
            message: message.map(Into::into),
            rejected_value: None,
            path: None,
        }
    }

    pub fn with_rejected_value(mut self, value: Value) -> Self {
        self.rejected_value = Some(value);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// A validation failure not tied to any field or parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalError {
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GlobalError {
    /// # Panics
    /// Panics if `code` is empty.
    pub fn new(code: impl Into<String>, message: Option<impl Into<String>>) -> Self {
        let code = code.into();
        assert!(!code.is_empty(), "global error code must not be empty");
        Self {
            code,
            message: message.map(Into::into),
        }
    }
}

/// A validation failure tied to a method or query parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterError {
    pub code: String,
    pub parameter: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_value: Option<Value>,
}

impl ParameterError {
    /// # Panics
    /// Panics if `code` or `parameter` is empty.
    pub fn new(
        code: impl Into<String>,
        parameter: impl Into<String>,
        message: Option<impl Into<String>>,
    ) -> Self {
        let code = code.into();
        let parameter = parameter.into();
        assert!(!code.is_empty(), "parameter error code must not be empty");
        assert!(!parameter.is_empty(), "parameter error parameter must not be empty");
        Self {
            code,
            parameter,
            message: message.map(Into::into),
            rejected_value: None,
        }
    }

    pub fn with_rejected_value(mut self, value: Value) -> Self {
        self.rejected_value = Some(value);
        self
    }
}
