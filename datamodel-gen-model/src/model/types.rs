use crate::location::SourceLocation;
use std::fmt;

/// A single `@name{value}` annotation taken from a block comment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Annotation {
    pub name: String,
    /// The value without its outer braces, if one was given.
    pub value: Option<String>,
    pub location: SourceLocation,
}

impl Annotation {
    pub fn new(name: impl Into<String>, value: Option<String>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            value,
            location,
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "@{}{{{}}}", self.name, value),
            None => write!(f, "@{}", self.name),
        }
    }
}

/// Annotations in source order. Lookups return the last occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Annotations(Vec<Annotation>);

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, annotation: Annotation) {
        self.0.push(annotation);
    }

    pub fn extend(&mut self, other: Annotations) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.0.iter()
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.iter().any(|a| a.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Annotation> {
        self.0.iter().rev().find(|a| a.name == name)
    }

    /// The trimmed value of the annotation `name`, if present and non-empty.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|a| a.value.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

impl FromIterator<Annotation> for Annotations {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
