//! Ordered collection with a key to position index.

use std::collections::HashMap;

use serde::{Serialize, Serializer};

/// Items that carry their own identity.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Insertion-ordered list of unique items with constant-time lookup by key.
///
/// Items are never removed, so positions handed out by [`insert`](Self::insert) stay valid for the life of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedList<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for IndexedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> IndexedList<T>
where
    T: Keyed,
{
    /// Appends `item` and returns its position.
    ///
    /// If an item with the same key exists the list is left untouched and the position of the existing item is
    /// returned as the error.
    pub fn insert(&mut self, item: T) -> Result<usize, usize> {
        if let Some(&pos) = self.index.get(item.key()) {
            return Err(pos);
        }

        let pos = self.items.len();
        self.index.insert(item.key().to_owned(), pos);
        self.items.push(item);
        Ok(pos)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.position(key).map(|pos| &self.items[pos])
    }

    /// Mutable access by key. The key of the item must not be changed.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        let pos = self.position(key)?;
        self.items.get_mut(pos)
    }

    pub fn at(&self, pos: usize) -> Option<&T> {
        self.items.get(pos)
    }

    /// Mutable access by position. The key of the item must not be changed.
    pub fn at_mut(&mut self, pos: usize) -> Option<&mut T> {
        self.items.get_mut(pos)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Verifies that the index and the list agree.
    ///
    /// Every key resolves to an item carrying that key, and every item is indexed exactly once.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.index.len() != self.items.len() {
            return Err(format!(
                "index holds {} keys but list holds {} items",
                self.index.len(),
                self.items.len()
            ));
        }

        for (key, &pos) in &self.index {
            match self.items.get(pos) {
                Some(item) if item.key() == key => {}
                Some(item) => {
                    return Err(format!(
                        "key {key:?} points to position {pos} holding {:?}",
                        item.key()
                    ));
                }
                None => return Err(format!("key {key:?} points past the end ({pos})")),
            }
        }

        Ok(())
    }
}

impl<'a, T> IntoIterator for &'a IndexedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> Serialize for IndexedList<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(&self.items)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item {
        key: String,
        value: u32,
    }

    impl Keyed for Item {
        fn key(&self) -> &str {
            &self.key
        }
    }

    fn item(key: &str, value: u32) -> Item {
        Item {
            key: key.to_owned(),
            value,
        }
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut list = IndexedList::default();
        assert_eq!(list.insert(item("a", 1)), Ok(0));
        assert_eq!(list.insert(item("b", 2)), Ok(1));
        assert_eq!(list.insert(item("a", 3)), Err(0));

        assert_eq!(list.len(), 2);
        assert_eq!(list.get("a").unwrap().value, 1);
        assert_eq!(list.at(1).unwrap().key, "b");
        list.check_invariants().unwrap();
    }

    #[test]
    fn test_check_invariants_detects_rekeyed_item() {
        let mut list = IndexedList::default();
        list.insert(item("a", 1)).unwrap();
        list.at_mut(0).unwrap().key = "z".to_owned();

        let err = list.check_invariants().unwrap_err();
        assert!(err.contains("\"a\""), "{err}");
    }

    #[test]
    fn test_serializes_as_sequence() {
        #[derive(Serialize)]
        struct Named {
            name: &'static str,
        }

        impl Keyed for Named {
            fn key(&self) -> &str {
                self.name
            }
        }

        let mut list = IndexedList::default();
        list.insert(Named { name: "x" }).unwrap();
        list.insert(Named { name: "y" }).unwrap();
        assert_eq!(
            serde_json::to_string(&list).unwrap(),
            r#"[{"name":"x"},{"name":"y"}]"#
        );
    }

    proptest! {
        #[test]
        fn index_matches_list(keys in proptest::collection::vec("[a-e]{1,2}", 0..64)) {
            let mut list = IndexedList::default();
            let mut first_seen: Vec<String> = vec![];

            for (i, key) in keys.iter().enumerate() {
                let res = list.insert(item(key, i as u32));
                match first_seen.iter().position(|k| k == key) {
                    Some(pos) => prop_assert_eq!(res, Err(pos)),
                    None => {
                        prop_assert_eq!(res, Ok(first_seen.len()));
                        first_seen.push(key.clone());
                    }
                }
            }

            prop_assert!(list.check_invariants().is_ok());
            let order: Vec<&str> = list.iter().map(|i| i.key.as_str()).collect();
            prop_assert_eq!(order, first_seen.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }
}
