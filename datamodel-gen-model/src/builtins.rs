//! Built-in grammar-type tags.
//!
//! Tags are written in upper case. Besides the fixed tags below, any token
//! ending in `_DICT` is a dictionary, and any other all-uppercase name is a
//! lexer rule whose text ends up as a string.

pub const STRING: &str = "STRING";
pub const ID: &str = "ID";
pub const IDENTIFIER: &str = "IDENTIFIER";
pub const NUMBER: &str = "NUMBER";
pub const INTEGER: &str = "INTEGER";
pub const BOOLEAN: &str = "BOOLEAN";
pub const URI: &str = "URI";
pub const DICTIONARY: &str = "DICTIONARY";

pub const DICTIONARY_SUFFIX: &str = "_DICT";

/// All fixed tags, in the order they are documented.
pub const BUILTIN_TAGS: &[&str] = &[STRING, ID, IDENTIFIER, NUMBER, INTEGER, BOOLEAN, URI, DICTIONARY];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltIn {
    String,
    /// Any other upper-case lexer rule. Behaves like [`BuiltIn::String`].
    LexerToken,
    Identifier,
    Number,
    Integer,
    Boolean,
    Uri,
    Dictionary,
}

impl BuiltIn {
    /// Scalars are inlined into the referencing class.
    pub fn is_scalar(self) -> bool {
        !matches!(self, BuiltIn::Identifier | BuiltIn::Dictionary)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, BuiltIn::Number | BuiltIn::Integer)
    }

    pub fn is_string_like(self) -> bool {
        matches!(self, BuiltIn::String | BuiltIn::LexerToken)
    }
}

/// Classifies a grammar-type tag.
pub fn classify(tag: &str) -> Option<BuiltIn> {
    let builtin = match tag {
        STRING => BuiltIn::String,
        ID | IDENTIFIER => BuiltIn::Identifier,
        NUMBER => BuiltIn::Number,
        INTEGER => BuiltIn::Integer,
        BOOLEAN => BuiltIn::Boolean,
        URI => BuiltIn::Uri,
        DICTIONARY => BuiltIn::Dictionary,
        _ if tag.ends_with(DICTIONARY_SUFFIX) => BuiltIn::Dictionary,
        _ if is_upper_case(tag) => BuiltIn::LexerToken,
        _ => return None,
    };
    Some(builtin)
}

/// Reserved names cannot define a model type.
pub fn is_reserved(name: &str) -> bool {
    classify(name).is_some()
}

fn is_upper_case(name: &str) -> bool {
    name.chars().any(char::is_alphabetic) && !name.chars().any(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("STRING"), Some(BuiltIn::String));
        assert_eq!(classify("ID"), Some(BuiltIn::Identifier));
        assert_eq!(classify("PROP_DICT"), Some(BuiltIn::Dictionary));
        assert_eq!(classify("DIGIT"), Some(BuiltIn::LexerToken));
        assert_eq!(classify("Foo"), None);
        assert_eq!(classify("fooBar"), None);
        assert_eq!(classify("_"), None);
    }

    #[test]
    fn test_scalars() {
        assert!(BuiltIn::Number.is_scalar());
        assert!(!BuiltIn::Identifier.is_scalar());
        assert!(!BuiltIn::Dictionary.is_scalar());
    }
}
