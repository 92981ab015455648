//! Variable references embedded in text templates.
//!
//! A reference is written `{{name}}`, where `name` starts with a letter or an
//! underscore followed by letters, digits or underscores. Whitespace between
//! the braces and the name is tolerated: `{{ name }}` refers to `name`.

use ahash::AHashMap;
use itertools::Itertools;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("variable pattern is valid")
});

/// Returns the distinct variable names referenced in `text`, in first-seen order.
///
/// ```
/// use pipeflow::template::extract_variables;
///
/// assert_eq!(extract_variables("{{b}} {{a}} {{b}}"), vec!["b", "a"]);
/// ```
pub fn extract_variables(text: &str) -> Vec<String> {
    VARIABLE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .unique()
        .collect()
}

/// Substitutes bound variables into `text`. Unbound references are left untouched.
pub fn render(text: &str, bindings: &AHashMap<String, String>) -> String {
    VARIABLE
        .replace_all(text, |caps: &Captures| match bindings.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
