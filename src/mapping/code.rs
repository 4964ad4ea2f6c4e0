//! Error-code resolution: override tables first, then a configurable
//! code-generation strategy over the exception's type name.

use super::{bare_name, lookup, split_words};
use crate::config::ExceptionConfig;
use crate::exception::{ApiException, ROOT_EXCEPTION};
use strum_macros::{Display, EnumString};

/// How a default error code is generated from an exception type name when no
/// override table entry matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
pub enum CodeStrategy {
    /// `UserNotFoundException` becomes `USER_NOT_FOUND`.
    #[default]
    AllCaps,
    /// The fully-qualified type name, unstripped.
    FullQualifiedName,
    /// `InvalidOperationException` becomes `invalid-operation`.
    KebabCase,
    /// `UserNotFoundException` becomes `UserNotFound`.
    PascalCase,
    /// `InvalidOperationException` becomes `invalid.operation`.
    DotSeparated,
}

/// Resolve the error code for an exception.
pub fn error_code(config: &ExceptionConfig, exception: &dyn ApiException) -> String {
    if let Some(code) = lookup(
        &config.codes,
        exception,
        config.search_super_class_hierarchy,
    ) {
        return code.clone();
    }
    generate(config.default_error_code_strategy, exception.type_name())
}

/// Resolve a field-specific error code: exact `field_key` match, then the
/// caller-supplied default treated as a secondary lookup key, then the
/// default itself.
pub fn error_code_for_field(
    config: &ExceptionConfig,
    field_key: &str,
    default_code: &str,
) -> String {
    config
        .codes
        .get(field_key)
        .or_else(|| config.codes.get(default_code))
        .cloned()
        .unwrap_or_else(|| default_code.to_string())
}

/// Generate a code from a type name using the given strategy.
///
/// The trailing `Exception` suffix is stripped for every strategy except
/// [`CodeStrategy::FullQualifiedName`]; the bare root `Exception` maps to the
/// literal `INTERNAL_ERROR`.
pub fn generate(strategy: CodeStrategy, fully_qualified_name: &str) -> String {
    if strategy == CodeStrategy::FullQualifiedName {
        return fully_qualified_name.to_string();
    }

    let bare = bare_name(fully_qualified_name);
    if bare == ROOT_EXCEPTION {
        return "INTERNAL_ERROR".to_string();
    }

    let stripped = bare.strip_suffix("Exception").unwrap_or(bare);
    let words = split_words(stripped);
    if words.is_empty() {
        return "UNKNOWN_ERROR".to_string();
    }

    match strategy {
        CodeStrategy::AllCaps => words.join("_").to_uppercase(),
        CodeStrategy::KebabCase => words.join("-").to_lowercase(),
        CodeStrategy::PascalCase => stripped.to_string(),
        CodeStrategy::DotSeparated => words.join(".").to_lowercase(),
        CodeStrategy::FullQualifiedName => fully_qualified_name.to_string(),
    }
}
