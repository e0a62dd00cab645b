//! Specialized collection types

use std::collections::HashMap;

/// Name-keyed registry that iterates in insertion order.
///
/// Scene objects are addressed by name from configuration files and from the
/// application, while light arrays in shaders are filled by iteration order, so the
/// registry keeps both a name index and a stable insertion sequence.
#[derive(Debug, Clone)]
pub struct NamedRegistry<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> NamedRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert a value under `name`.
    ///
    /// A new name is appended at the end of the iteration order. An existing name keeps
    /// its slot and the previous value is returned so the caller can release it.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Option<T> {
        let name = name.into();
        if let Some(&slot) = self.index.get(&name) {
            return Some(std::mem::replace(&mut self.entries[slot].1, value));
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, value));
        None
    }

    /// Look up a value by name
    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&slot| &self.entries[slot].1)
    }

    /// Look up a value by name for mutation
    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        match self.index.get(name) {
            Some(&slot) => Some(&mut self.entries[slot].1),
            None => None,
        }
    }

    /// Whether a value is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Remove a value, preserving the relative order of the remaining entries
    pub fn remove(&mut self, name: &str) -> Option<T> {
        let slot = self.index.remove(name)?;
        let (_, value) = self.entries.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(value)
    }

    /// Remove every entry, yielding them in insertion order
    pub fn drain(&mut self) -> impl Iterator<Item = (String, T)> + '_ {
        self.index.clear();
        self.entries.drain(..)
    }

    /// Iterate `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Iterate `(name, value)` pairs in insertion order with mutable values
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.entries
            .iter_mut()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Registered names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for NamedRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_follows_insertion_order() {
        let mut registry = NamedRegistry::new();
        registry.insert("zeta", 1);
        registry.insert("alpha", 2);
        registry.insert("mid", 3);

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_reinsert_keeps_slot_and_returns_previous() {
        let mut registry = NamedRegistry::new();
        registry.insert("a", 1);
        registry.insert("b", 2);

        assert_eq!(registry.insert("a", 10), Some(1));
        let pairs: Vec<_> = registry.iter().map(|(n, v)| (n.to_string(), *v)).collect();
        assert_eq!(pairs, vec![("a".to_string(), 10), ("b".to_string(), 2)]);
    }

    #[test]
    fn test_remove_reindexes_following_entries() {
        let mut registry = NamedRegistry::new();
        registry.insert("a", 1);
        registry.insert("b", 2);
        registry.insert("c", 3);

        assert_eq!(registry.remove("a"), Some(1));
        assert_eq!(registry.get("c"), Some(&3));
        assert_eq!(registry.get("b"), Some(&2));
        assert!(registry.get("a").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_missing_lookup_does_not_insert() {
        let mut registry: NamedRegistry<i32> = NamedRegistry::new();
        assert!(registry.get("ghost").is_none());
        assert!(registry.get_mut("ghost").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drain_empties_in_order() {
        let mut registry = NamedRegistry::new();
        registry.insert("x", 1);
        registry.insert("y", 2);

        let drained: Vec<_> = registry.drain().map(|(name, _)| name).collect();
        assert_eq!(drained, vec!["x", "y"]);
        assert!(registry.is_empty());
        assert!(!registry.contains("x"));
    }
}
