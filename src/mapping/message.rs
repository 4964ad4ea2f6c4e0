//! Error-message resolution: override tables first, then the caller-supplied
//! default (usually the exception's own Display text).

use super::lookup;
use crate::config::ExceptionConfig;
use crate::exception::ApiException;

/// Resolve the message for an exception, falling back to `default`.
pub fn error_message(
    config: &ExceptionConfig,
    exception: &dyn ApiException,
    default: Option<&str>,
) -> Option<String> {
    lookup(
        &config.messages,
        exception,
        config.search_super_class_hierarchy,
    )
    .cloned()
    .or_else(|| default.map(str::to_string))
}

/// Resolve a field-specific message: exact `field_key` match, then the
/// resolved code as a secondary lookup key, then the literal default.
pub fn error_message_for_field(
    config: &ExceptionConfig,
    field_key: &str,
    default_code: &str,
    default_message: Option<&str>,
) -> Option<String> {
    config
        .messages
        .get(field_key)
        .or_else(|| config.messages.get(default_code))
        .cloned()
        .or_else(|| default_message.map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::ApiError;

    #[test]
    fn falls_back_to_caller_default() {
        let config = ExceptionConfig::default();
        let ex = ApiError::Argument("id must be positive".into());
        assert_eq!(
            error_message(&config, &ex, Some("id must be positive")),
            Some("id must be positive".to_string())
        );
        assert_eq!(error_message(&config, &ex, None), None);
    }

    #[test]
    fn exact_entry_wins_over_default() {
        let mut config = ExceptionConfig::default();
        config.messages.insert(
            "errestra::exception::ArgumentException".into(),
            "Invalid request".into(),
        );
        let ex = ApiError::Argument("internal detail".into());
        assert_eq!(
            error_message(&config, &ex, Some("internal detail")),
            Some("Invalid request".to_string())
        );
    }

    #[test]
    fn field_lookup_tries_field_key_then_code() {
        let mut config = ExceptionConfig::default();
        config
            .messages
            .insert("userName.NotBlank".into(), "User name is required".into());
        config
            .messages
            .insert("NOT_BLANK".into(), "Value is required".into());

        assert_eq!(
            error_message_for_field(&config, "userName.NotBlank", "NOT_BLANK", None),
            Some("User name is required".to_string())
        );
        assert_eq!(
            error_message_for_field(&config, "email.NotBlank", "NOT_BLANK", None),
            Some("Value is required".to_string())
        );
        assert_eq!(
            error_message_for_field(&config, "email.Size", "SIZE", Some("too long")),
            Some("too long".to_string())
        );
    }
}
