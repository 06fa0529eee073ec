//! Name conversions shared by the planners and the renderers.

use convert_case::{Case, Casing};

/// `resultLog` → `ResultLog`.
pub fn pascal(name: &str) -> String {
    name.to_case(Case::Pascal)
}

/// `ResultLog` → `resultLog`.
pub fn camel(name: &str) -> String {
    name.to_case(Case::Camel)
}

/// `ResultLog` → `result_log`.
pub fn snake(name: &str) -> String {
    name.to_case(Case::Snake)
}

/// Pascal-cased member name for a literal such as `'error'` or `'+'`.
///
/// Returns `None` when the literal has no identifier characters.
pub fn literal_member(literal: &str) -> Option<String> {
    let cleaned: String = literal
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();
    let name = pascal(cleaned.trim());
    match name.chars().next() {
        Some(first) if first.is_alphabetic() => Some(name),
        _ => None,
    }
}

/// Collapses runs of whitespace, as used for schema descriptions.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_conversions() {
        assert_eq!(pascal("resultLog"), "ResultLog");
        assert_eq!(camel("FileName"), "fileName");
        assert_eq!(snake("StringValue"), "string_value");
    }

    #[test]
    fn test_literal_members() {
        assert_eq!(literal_member("error").as_deref(), Some("Error"));
        assert_eq!(literal_member("not-applicable").as_deref(), Some("NotApplicable"));
        assert_eq!(literal_member("+"), None);
        assert_eq!(literal_member("1st"), None);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\n   b\tc "), "a b c");
    }
}
