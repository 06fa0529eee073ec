//! Runtime support for generated data models.
//!
//! Generated modules import this as `rt` and implement its traits for every
//! node type. Nothing here depends on a particular grammar.

use itertools::Itertools;
use std::fmt::Display;

pub mod dictionary;
pub mod json;

pub use dictionary::GrammarDictionary;
pub use json::{decode_value, from_json, to_json, DecodeError, JsonWriter, WriteJson};

/// A dynamically typed property value, as handed to `set_property`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<N> {
    Null,
    Bool(bool),
    /// A number written without a fraction or exponent that fits `i64`.
    Integer(i64),
    Number(f64),
    String(String),
    List(Vec<Value<N>>),
    Node(N),
}

/// Typed conversion out of a [`Value`]. `None` means the value has the wrong shape.
pub trait FromValue<N>: Sized {
    fn from_value(value: Value<N>) -> Option<Self>;
}

impl<N> FromValue<N> for String {
    fn from_value(value: Value<N>) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl<N> FromValue<N> for f64 {
    fn from_value(value: Value<N>) -> Option<Self> {
        match value {
            Value::Number(n) => Some(n),
            Value::Integer(n) => Some(n as f64),
            _ => None,
        }
    }
}

impl<N> FromValue<N> for i64 {
    fn from_value(value: Value<N>) -> Option<Self> {
        match value {
            Value::Integer(n) => Some(n),
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(n as i64),
            _ => None,
        }
    }
}

impl<N> FromValue<N> for bool {
    fn from_value(value: Value<N>) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl<N, T: FromValue<N>> FromValue<N> for Option<T> {
    fn from_value(value: Value<N>) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<N, T: FromValue<N>> FromValue<N> for Box<T> {
    fn from_value(value: Value<N>) -> Option<Self> {
        T::from_value(value).map(Box::new)
    }
}

impl<N, T: FromValue<N>> FromValue<N> for Vec<T> {
    fn from_value(value: Value<N>) -> Option<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

/// The closed node union of a generated model.
pub trait SyntaxNode: Sized {
    type Kind: Copy + Eq + std::fmt::Debug;

    fn kind(&self) -> Self::Kind;

    /// Creates an empty node from its serialized type name.
    fn create(type_name: &str) -> Option<Self>;

    /// Assigns a property by its serialized name. Returns `false` if the name
    /// is unknown or the value has the wrong type.
    fn set_property(&mut self, name: &str, value: Value<Self>) -> bool;
}

/// Converts the result of a rewrite back into the type of the slot it came
/// from. A node of another type cannot be stored there and is dropped.
pub fn rewritten<N: SyntaxNode, T: FromValue<N>>(node: N) -> Option<T> {
    let kind = node.kind();
    let value = T::from_value(Value::Node(node));
    if value.is_none() {
        log::warn!(
            "dropping rewritten {:?} node, expected {}",
            kind,
            std::any::type_name::<T>()
        );
    }
    value
}

/// The common fallthrough of every generated `set_property`.
pub fn set_base_property<N>(name: &str, _value: Value<N>) -> bool {
    log::trace!("property '{}' not handled", name);
    false
}

/// Seed of every structural hash.
pub const HASH_SEED: u64 = 17;

/// `hash * 31 + value`, wrapping.
pub fn combine_hash(hash: u64, value: u64) -> u64 {
    hash.wrapping_mul(31).wrapping_add(value)
}

/// A hash that agrees with [`StructuralEq`].
pub trait StructuralHash {
    fn structural_hash(&self) -> u64;
}

/// Equality over the data a node carries. Numbers compare by bit pattern.
pub trait StructuralEq {
    fn structural_eq(&self, other: &Self) -> bool;
}

impl StructuralHash for String {
    fn structural_hash(&self) -> u64 {
        hash_str(self)
    }
}

impl StructuralHash for f64 {
    fn structural_hash(&self) -> u64 {
        self.to_bits()
    }
}

impl StructuralHash for i64 {
    fn structural_hash(&self) -> u64 {
        *self as u64
    }
}

impl StructuralHash for bool {
    fn structural_hash(&self) -> u64 {
        *self as u64
    }
}

impl<T: StructuralHash> StructuralHash for Option<T> {
    fn structural_hash(&self) -> u64 {
        self.as_ref().map_or(0, T::structural_hash)
    }
}

impl<T: StructuralHash + ?Sized> StructuralHash for Box<T> {
    fn structural_hash(&self) -> u64 {
        (**self).structural_hash()
    }
}

impl<T: StructuralHash> StructuralHash for Vec<T> {
    fn structural_hash(&self) -> u64 {
        self.iter()
            .fold(HASH_SEED, |hash, item| combine_hash(hash, item.structural_hash()))
    }
}

impl StructuralEq for String {
    fn structural_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl StructuralEq for f64 {
    fn structural_eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl StructuralEq for i64 {
    fn structural_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl StructuralEq for bool {
    fn structural_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl<T: StructuralEq> StructuralEq for Option<T> {
    fn structural_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.structural_eq(b),
            _ => false,
        }
    }
}

impl<T: StructuralEq + ?Sized> StructuralEq for Box<T> {
    fn structural_eq(&self, other: &Self) -> bool {
        (**self).structural_eq(other)
    }
}

impl<T: StructuralEq> StructuralEq for Vec<T> {
    fn structural_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.structural_eq(b))
    }
}

pub(crate) fn hash_str(text: &str) -> u64 {
    // FNV-1a: stable across runs and platforms.
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// `<Name>(null)` for an absent member.
pub fn display_or_null<T: Display>(value: &Option<T>, type_name: &str) -> String {
    match value {
        Some(v) => v.to_string(),
        None => format!("{}(null)", type_name),
    }
}

/// `[a, b]`.
pub fn display_list<T: Display>(items: &[T]) -> String {
    display_list_with(items, ",")
}

/// `[a; b]` for the delimiter `;`. Each delimiter is followed by a space.
pub fn display_list_with<T: Display>(items: &[T], delimiter: &str) -> String {
    format!("[{}]", items.iter().join(&format!("{} ", delimiter)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(<i64 as FromValue<()>>::from_value(Value::Number(3.0)), Some(3));
        assert_eq!(<i64 as FromValue<()>>::from_value(Value::Number(3.5)), None);
        assert_eq!(
            <i64 as FromValue<()>>::from_value(Value::Integer(9_007_199_254_740_993)),
            Some(9_007_199_254_740_993)
        );
        assert_eq!(<f64 as FromValue<()>>::from_value(Value::Integer(2)), Some(2.0));
        assert_eq!(<String as FromValue<()>>::from_value(Value::Bool(true)), None);
        assert_eq!(<Option<f64> as FromValue<()>>::from_value(Value::Null), Some(None));
        assert_eq!(
            <Vec<bool> as FromValue<()>>::from_value(Value::List(vec![Value::Bool(true), Value::Bool(false)])),
            Some(vec![true, false])
        );
        assert_eq!(
            <Vec<bool> as FromValue<()>>::from_value(Value::List(vec![Value::Bool(true), Value::Null])),
            None
        );
    }

    #[test]
    fn test_structural_hash_and_eq() {
        assert_eq!(Option::<String>::None.structural_hash(), 0);
        assert_eq!(vec![1i64, 2].structural_hash(), combine_hash(combine_hash(HASH_SEED, 1), 2));
        assert_ne!(vec![1i64, 2].structural_hash(), vec![2i64, 1].structural_hash());
        assert!(f64::NAN.structural_eq(&f64::NAN));
        assert!(!Some(1.0f64).structural_eq(&None));
        assert_eq!(hash_str("abc"), hash_str("abc"));
    }

    #[test]
    fn test_display_helpers() {
        assert_eq!(display_or_null(&None::<String>, "Bar"), "Bar(null)");
        assert_eq!(display_or_null(&Some(2.5), "Number"), "2.5");
        assert_eq!(display_list(&["tag1", "tag2"]), "[tag1, tag2]");
        assert_eq!(display_list::<String>(&[]), "[]");
        assert_eq!(display_list_with(&[1, 2, 3], ";"), "[1; 2; 3]");
        assert_eq!(display_list_with(&["x"], "|"), "[x]");
    }
}
