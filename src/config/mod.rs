use crate::mapping::CodeStrategy;
use axum::http::StatusCode as HttpStatusCode;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Immutable configuration snapshot for one dispatch.
///
/// Every `handle_exception` call reads exactly one snapshot for its whole
/// duration; hot reloads publish a new snapshot through [`ConfigHolder`]
/// instead of mutating shared state.
#[derive(Debug, Clone)]
pub struct ExceptionConfig {
    /// When false the dispatcher returns the original exception untouched.
    pub enabled: bool,

    /// Echo the resolved HTTP status into the JSON body's `status` field.
    pub http_status_in_json_response: bool,

    pub default_error_code_strategy: CodeStrategy,

    /// Walk the declared type hierarchy when an exact override lookup misses.
    pub search_super_class_hierarchy: bool,

    /// Error-code overrides, keyed by fully-qualified type name or
    /// `<field>.<kind>` composite key.
    pub codes: HashMap<String, String>,

    /// Message overrides, same keys as `codes`.
    pub messages: HashMap<String, String>,

    /// HTTP-status overrides, keyed by fully-qualified type name.
    pub http_statuses: HashMap<String, HttpStatusCode>,

    /// Message substituted whenever a response resolves to a 5xx status.
    pub fallback_message: String,

    /// Attach the raw violation path to field errors when available.
    pub add_path_to_error: bool,
}

impl Default for ExceptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            http_status_in_json_response: false,
            default_error_code_strategy: CodeStrategy::default(),
            search_super_class_hierarchy: false,
            codes: HashMap::new(),
            messages: HashMap::new(),
            http_statuses: HashMap::new(),
            fallback_message: "An unexpected error occurred".to_string(),
            add_path_to_error: true,
        }
    }
}

impl ExceptionConfig {
    pub fn builder() -> ExceptionConfigBuilder {
        ExceptionConfigBuilder::default()
    }
}

/// Builder for [`ExceptionConfig`].
///
/// # Example
/// ```
/// use errestra::config::ExceptionConfig;
/// use errestra::mapping::CodeStrategy;
///
/// let config = ExceptionConfig::builder()
///     .code_strategy(CodeStrategy::KebabCase)
///     .code("errestra::exception::ArgumentException", "BAD_ARGUMENT")
///     .fallback_message("Something went wrong")
///     .build();
/// assert_eq!(config.fallback_message, "Something went wrong");
/// ```
#[derive(Debug, Default)]
pub struct ExceptionConfigBuilder {
    config: ExceptionConfig,
}

impl ExceptionConfigBuilder {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn http_status_in_json_response(mut self, include: bool) -> Self {
        self.config.http_status_in_json_response = include;
        self
    }

    pub fn code_strategy(mut self, strategy: CodeStrategy) -> Self {
        self.config.default_error_code_strategy = strategy;
        self
    }

    pub fn search_super_class_hierarchy(mut self, walk: bool) -> Self {
        self.config.search_super_class_hierarchy = walk;
        self
    }

    pub fn code(mut self, key: impl Into<String>, code: impl Into<String>) -> Self {
        self.config.codes.insert(key.into(), code.into());
        self
    }

    pub fn message(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.config.messages.insert(key.into(), message.into());
        self
    }

    pub fn http_status(mut self, key: impl Into<String>, status: HttpStatusCode) -> Self {
        self.config.http_statuses.insert(key.into(), status);
        self
    }

    pub fn fallback_message(mut self, message: impl Into<String>) -> Self {
        self.config.fallback_message = message.into();
        self
    }

    pub fn add_path_to_error(mut self, add: bool) -> Self {
        self.config.add_path_to_error = add;
        self
    }

    pub fn build(self) -> ExceptionConfig {
        self.config
    }
}

/// Atomically swappable configuration holder.
///
/// Readers take one `Arc` snapshot per dispatch; writers publish a complete
/// replacement. Concurrent readers never observe a half-updated snapshot.
#[derive(Debug)]
pub struct ConfigHolder {
    inner: RwLock<Arc<ExceptionConfig>>,
}

impl ConfigHolder {
    pub fn new(config: ExceptionConfig) -> Self {
        Self {
            inner: RwLock::new(Arc::new(config)),
        }
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<ExceptionConfig> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish a new snapshot. In-flight dispatches keep the one they loaded.
    pub fn store(&self, config: ExceptionConfig) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
    }
}

impl Default for ConfigHolder {
    fn default() -> Self {
        Self::new(ExceptionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_contract() {
        let config = ExceptionConfig::default();
        assert!(config.enabled);
        assert!(!config.http_status_in_json_response);
        assert!(!config.search_super_class_hierarchy);
        assert_eq!(config.fallback_message, "An unexpected error occurred");
    }

    #[test]
    fn in_flight_snapshot_survives_a_hot_reload() {
        let holder = ConfigHolder::default();
        let before = holder.load();

        holder.store(ExceptionConfig::builder().fallback_message("rotated").build());

        assert_eq!(before.fallback_message, "An unexpected error occurred");
        assert_eq!(holder.load().fallback_message, "rotated");
    }
}
