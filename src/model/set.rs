//! Order-preserving set
//!
//! Members are unique and equality ignores order, but iteration keeps the
//! order members were inserted in. Exclusion rules rely on that: position
//! inside one rule-set decides precedence on the server.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone)]
pub struct UniqueList<T> {
    items: Vec<T>,
}

impl<T> Default for UniqueList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: PartialEq> UniqueList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member; returns false when an equal member is already present
    pub fn insert(&mut self, item: T) -> bool {
        if self.items.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: PartialEq> PartialEq for UniqueList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len() && self.items.iter().all(|item| other.contains(item))
    }
}

impl<T: Eq> Eq for UniqueList<T> {}

impl<T: PartialEq> FromIterator<T> for UniqueList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        for item in iter {
            list.insert(item);
        }
        list
    }
}

impl<T: PartialEq> Extend<T> for UniqueList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T> IntoIterator for UniqueList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a UniqueList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for UniqueList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + PartialEq> Deserialize<'de> for UniqueList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicates_and_keeps_order() {
        let mut list = UniqueList::new();
        assert!(list.insert("b"));
        assert!(list.insert("a"));
        assert!(!list.insert("b"));

        assert_eq!(list.as_slice(), &["b", "a"]);
    }

    #[test]
    fn test_equality_ignores_order() {
        let left: UniqueList<&str> = ["x", "y"].into_iter().collect();
        let right: UniqueList<&str> = ["y", "x"].into_iter().collect();
        let shorter: UniqueList<&str> = ["x"].into_iter().collect();

        assert_eq!(left, right);
        assert_ne!(left, shorter);
    }

    #[test]
    fn test_empty_list_serializes_as_empty_array() {
        let list: UniqueList<String> = UniqueList::new();
        assert_eq!(serde_json::to_string(&list).unwrap(), "[]");
    }

    #[test]
    fn test_deserialize_collapses_duplicates() {
        let list: UniqueList<String> = serde_json::from_str(r#"["a","a","b"]"#).unwrap();
        assert_eq!(list.len(), 2);
    }
}
