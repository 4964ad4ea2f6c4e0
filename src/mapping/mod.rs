//! The three override-then-strategy resolution pipelines.
//!
//! Code, message and status mapping share one precedence contract, evaluated
//! against a single [`ExceptionConfig`](crate::config::ExceptionConfig)
//! snapshot:
//!
//! 1. exact key match (fully-qualified type name, or a `<field>.<kind>`
//!    composite key for validation entries);
//! 2. superclass walk over the declared type hierarchy, when enabled;
//! 3. a strategy-generated default (code) or a caller-supplied literal
//!    default (message, status).

use crate::exception::ApiException;
use std::collections::HashMap;

pub mod code;
pub mod message;
pub mod status;

pub use code::CodeStrategy;

/// Look a value up by the exception's exact type name, then (when `walk` is
/// set) by each declared ancestor, nearest first.
fn lookup<'a, V>(
    table: &'a HashMap<String, V>,
    exception: &dyn ApiException,
    walk: bool,
) -> Option<&'a V> {
    let hierarchy = exception.type_hierarchy();
    if let Some(value) = table.get(hierarchy[0]) {
        return Some(value);
    }
    if walk {
        for ancestor in &hierarchy[1..] {
            if let Some(value) = table.get(*ancestor) {
                return Some(value);
            }
        }
    }
    None
}

/// Bare type name: everything after the last `::`.
pub(crate) fn bare_name(fully_qualified: &str) -> &str {
    fully_qualified
        .rsplit("::")
        .next()
        .unwrap_or(fully_qualified)
}

/// Split a PascalCase name into words at lowercase-to-uppercase and
/// uppercase-run-to-lowercase boundaries. `HTTPServer` splits as
/// `HTTP` / `Server`.
pub(crate) fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 {
            let prev = chars[i - 1];
            let upper_run_ends = prev.is_uppercase()
                && c.is_uppercase()
                && chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            let case_rises = prev.is_lowercase() && c.is_uppercase();
            if (case_rises || upper_run_ends) && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Camel-case a property path segment by segment: `User.UserName` becomes
/// `user.userName`.
pub(crate) fn camel_case_path(path: &str) -> String {
    path.split('.')
        .map(camel_case_segment)
        .collect::<Vec<_>>()
        .join(".")
}

fn camel_case_segment(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
