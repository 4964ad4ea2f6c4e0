//! Startup-registered per-exception-type metadata.
//!
//! Declarative overrides (custom code, custom status, extra response
//! properties) live in an explicit registry keyed by fully-qualified type
//! name, populated by registration calls at startup. The fallback handler
//! consults it before the mappers.

use crate::exception::ApiException;
use axum::http::StatusCode as HttpStatusCode;
use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type PropertyAccessor = Arc<dyn Fn(&dyn ApiException) -> Option<Value> + Send + Sync>;

/// One extra property to attach to the response's extension bag.
#[derive(Clone)]
pub struct PropertySpec {
    pub name: String,
    accessor: PropertyAccessor,
    /// Attach the property even when the accessor yields nothing.
    pub include_if_null: bool,
}

impl PropertySpec {
    pub fn new(
        name: impl Into<String>,
        accessor: impl Fn(&dyn ApiException) -> Option<Value> + Send + Sync + 'static,
        include_if_null: bool,
    ) -> Self {
        Self {
            name: name.into(),
            accessor: Arc::new(accessor),
            include_if_null,
        }
    }

    /// Read the property value off an exception instance.
    pub fn read(&self, exception: &dyn ApiException) -> Option<Value> {
        (self.accessor)(exception)
    }
}

impl fmt::Debug for PropertySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySpec")
            .field("name", &self.name)
            .field("include_if_null", &self.include_if_null)
            .finish_non_exhaustive()
    }
}

/// Declarative overrides for one exception type.
#[derive(Debug, Clone, Default)]
pub struct ExceptionMetadata {
    pub code: Option<String>,
    pub status: Option<HttpStatusCode>,
    pub properties: Vec<PropertySpec>,
}

impl ExceptionMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_status(mut self, status: HttpStatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_property(mut self, property: PropertySpec) -> Self {
        self.properties.push(property);
        self
    }
}

/// Registry of [`ExceptionMetadata`], keyed by fully-qualified type name.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entries: DashMap<String, ExceptionMetadata>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for a type. Last registration for a name wins.
    pub fn register(&self, type_name: impl Into<String>, metadata: ExceptionMetadata) {
        self.entries.insert(type_name.into(), metadata);
    }

    pub fn get(&self, type_name: &str) -> Option<ExceptionMetadata> {
        self.entries.get(type_name).map(|entry| entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::ApiError;
    use serde_json::json;

    #[test]
    fn registered_metadata_is_returned_by_type_name() {
        let registry = MetadataRegistry::new();
        registry.register(
            "errestra::exception::KeyNotFoundException",
            ExceptionMetadata::new()
                .with_code("MISSING_KEY")
                .with_status(HttpStatusCode::GONE),
        );

        let metadata = registry
            .get("errestra::exception::KeyNotFoundException")
            .unwrap();
        assert_eq!(metadata.code.as_deref(), Some("MISSING_KEY"));
        assert_eq!(metadata.status, Some(HttpStatusCode::GONE));
        assert!(registry.get("errestra::exception::TimeoutException").is_none());
    }

    #[test]
    fn property_accessor_reads_off_the_instance() {
        let spec = PropertySpec::new(
            "detail",
            |ex| {
                ex.as_any()
                    .downcast_ref::<ApiError>()
                    .map(|e| json!(e.to_string()))
            },
            false,
        );

        let ex = ApiError::KeyNotFound("user 42".into());
        assert_eq!(spec.read(&ex), Some(json!("user 42")));
    }
}
