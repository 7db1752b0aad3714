//! Wildcard matching used by every schema, table and field filter.

use regex::Regex;

/// Matches `value` against a wildcard `pattern`, ignoring case.
///
/// An empty value or an empty pattern always matches, as does a bare `*`.
/// Without `*` the comparison is plain case-insensitive equality; otherwise
/// the pattern is anchored on both ends and each `*` stands for any run of
/// characters.
///
/// # Example
/// ```rust
/// use ddlsync_core::pattern::matches;
///
/// assert!(matches("ADDRESS_LINE", "addr*"));
/// assert!(matches("order_table", "*TABLE"));
/// assert!(!matches("orders", "order"));
/// ```
pub fn matches(value: &str, pattern: &str) -> bool {
    if value.is_empty() || pattern.is_empty() || pattern == "*" {
        return true;
    }

    let value = value.to_lowercase();
    let pattern = pattern.to_lowercase();

    if !pattern.contains('*') {
        return value == pattern;
    }

    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    // Escaped literals joined by `.*` always form a valid expression.
    Regex::new(&format!("^(?s:{body})$")).is_ok_and(|re| re.is_match(&value))
}

/// Compares catalog names case-insensitively, Unicode-aware.
pub fn same_name(left: &str, right: &str) -> bool {
    left == right || left.to_uppercase() == right.to_uppercase()
}

/// Matches a schema-qualified table against a pair of wildcard patterns.
pub fn matches_table(schema: &str, table: &str, schema_pattern: &str, table_pattern: &str) -> bool {
    matches(schema, schema_pattern) && matches(table, table_pattern)
}
