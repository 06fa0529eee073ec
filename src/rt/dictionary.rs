use super::{combine_hash, hash_str, StructuralEq, StructuralHash};
use indexmap::IndexMap;
use std::fmt;

/// A string-keyed dictionary with case-insensitive lookup that remembers
/// insertion order and the key spelling of the first insertion.
#[derive(Debug, Clone)]
pub struct GrammarDictionary<V> {
    entries: IndexMap<String, (String, V)>,
}

impl<V> Default for GrammarDictionary<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> GrammarDictionary<V> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Inserts or replaces a value. Returns the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.entries.get_mut(&key.to_lowercase()) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.insert(key.to_lowercase(), (key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(&key.to_lowercase()).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order, with their original key spelling.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.values().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values().map(|(_, v)| v)
    }

    /// Replaces every value, keeping keys and order. Entries mapped to `None`
    /// are removed.
    pub fn filter_map_values<U>(self, mut f: impl FnMut(V) -> Option<U>) -> GrammarDictionary<U> {
        GrammarDictionary {
            entries: self
                .entries
                .into_iter()
                .filter_map(|(folded, (key, value))| f(value).map(|value| (folded, (key, value))))
                .collect(),
        }
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for GrammarDictionary<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dictionary = Self::new();
        for (key, value) in iter {
            dictionary.insert(key, value);
        }
        dictionary
    }
}

impl<V: StructuralEq> StructuralEq for GrammarDictionary<V> {
    fn structural_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(folded, (_, value))| match other.entries.get(folded) {
                    Some((_, theirs)) => value.structural_eq(theirs),
                    None => false,
                })
    }
}

impl<V: StructuralEq> PartialEq for GrammarDictionary<V> {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other)
    }
}

impl<V: StructuralEq> Eq for GrammarDictionary<V> {}

impl<V: StructuralHash> StructuralHash for GrammarDictionary<V> {
    fn structural_hash(&self) -> u64 {
        // Order-independent, like equality.
        let entries = self
            .entries
            .iter()
            .fold(0u64, |acc, (folded, (_, value))| {
                acc ^ combine_hash(hash_str(folded), value.structural_hash())
            });
        combine_hash(self.len() as u64, entries)
    }
}

impl<V: fmt::Display> fmt::Display for GrammarDictionary<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{}\": {}", key, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let mut d = GrammarDictionary::new();
        assert_eq!(d.insert("Alpha", 1.0), None);
        assert_eq!(d.get("alpha"), Some(&1.0));
        assert_eq!(d.insert("ALPHA", 2.0), Some(1.0));
        assert_eq!(d.len(), 1);
        assert_eq!(d.iter().next(), Some(("Alpha", &2.0)));
    }

    #[test]
    fn test_insertion_order_and_display() {
        let d: GrammarDictionary<f64> = [("b", 2.0), ("a", 1.0)].into_iter().collect();
        assert_eq!(d.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(d.to_string(), r#"{"b": 2, "a": 1}"#);
    }

    #[test]
    fn test_equality_ignores_order() {
        let a: GrammarDictionary<i64> = [("x", 1), ("y", 2)].into_iter().collect();
        let b: GrammarDictionary<i64> = [("Y", 2), ("x", 1)].into_iter().collect();
        let c: GrammarDictionary<i64> = [("x", 1), ("y", 3)].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.structural_hash(), b.structural_hash());
        assert_ne!(a, c);
    }

    #[test]
    fn test_filter_map_values() {
        let d: GrammarDictionary<i64> = [("x", 1), ("Y", 2), ("z", 3)].into_iter().collect();
        let even = d.filter_map_values(|v| (v % 2 == 0).then(|| v * 2));
        assert_eq!(even.len(), 1);
        assert_eq!(even.get("y"), Some(&4));
        assert_eq!(even.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["Y"]);
    }
}
