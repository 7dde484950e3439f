use std::{
    borrow::Borrow,
    collections::{hash_map::RandomState, HashMap},
    fmt::{self, Debug, Formatter},
    hash::{BuildHasher, Hash},
    slice,
};

/// Guarantees iteration in insertion order, which keeps every table derived from a traversal
/// deterministic across runs.
#[derive(Clone)]
pub struct OrderedHashMap<K, V, S = RandomState> {
    inner: HashMap<K, V, S>,
    insertion_order: Vec<K>,
}
impl<K: Eq + Hash + Clone, V, S: BuildHasher> OrderedHashMap<K, V, S> {
    pub fn iter(&self) -> OrderedHashMapIter<K, V, S> {
        OrderedHashMapIter {
            inner: &self.inner,
            key_iter: self.insertion_order.iter(),
        }
    }

    /// Insert a value. Re-inserting an existing key replaces its value but keeps its
    /// original position, and returns the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.inner.insert(key.clone(), value);
        if previous.is_none() {
            self.insertion_order.push(key);
        }
        previous
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(key)
    }

    pub fn keys(&self) -> slice::Iter<K> {
        self.insertion_order.iter()
    }

    pub fn len(&self) -> usize {
        self.insertion_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }
}
impl<K, V, S: BuildHasher + Default> Default for OrderedHashMap<K, V, S> {
    fn default() -> Self {
        Self {
            inner: Default::default(),
            insertion_order: Default::default(),
        }
    }
}
impl<K: Eq + Hash + Clone, V, S: BuildHasher + Default> FromIterator<(K, V)>
    for OrderedHashMap<K, V, S>
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}
impl<K: Eq + Hash + Clone + Debug, V: Debug, S: BuildHasher> Debug for OrderedHashMap<K, V, S> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

pub struct OrderedHashMapIter<'k, K, V, S> {
    inner: &'k HashMap<K, V, S>,
    key_iter: slice::Iter<'k, K>,
}

impl<'k, K: Eq + Hash, V, S: BuildHasher> Iterator for OrderedHashMapIter<'k, K, V, S> {
    type Item = (&'k K, &'k V);

    fn next(&mut self) -> Option<Self::Item> {
        let inner = self.inner;
        self.key_iter
            .by_ref()
            .find_map(|k| inner.get_key_value(k))
    }
}

/// A set that iterates in insertion order. Adding an element that is already present is a
/// no-op.
#[derive(Clone)]
pub struct OrderedHashSet<K, S = RandomState> {
    map: OrderedHashMap<K, (), S>,
}
impl<K: Eq + Hash + Clone, S: BuildHasher> OrderedHashSet<K, S> {
    /// Add an element. Returns `true` if it was not yet present.
    pub fn insert(&mut self, key: K) -> bool {
        self.map.insert(key, ()).is_none()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn iter(&self) -> slice::Iter<K> {
        self.map.keys()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
impl<K, S: BuildHasher + Default> Default for OrderedHashSet<K, S> {
    fn default() -> Self {
        Self {
            map: Default::default(),
        }
    }
}
impl<K: Eq + Hash + Clone + Debug, S: BuildHasher> Debug for OrderedHashSet<K, S> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_follows_insertion_order() {
        let mut map: OrderedHashMap<&str, usize> = Default::default();
        for (idx, key) in ["z", "a", "m", "b"].into_iter().enumerate() {
            map.insert(key, idx);
        }

        let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(vec!["z", "a", "m", "b"], keys);
    }

    #[test]
    fn reinsertion_keeps_original_position() {
        let mut map: OrderedHashMap<String, usize> = Default::default();
        map.insert("a".to_string(), 1);
        map.insert("b".to_string(), 2);

        assert_eq!(Some(1), map.insert("a".to_string(), 3));
        assert_eq!(2, map.len());
        assert_eq!(
            vec![(&"a".to_string(), &3), (&"b".to_string(), &2)],
            map.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn set_ignores_duplicates() {
        let mut set: OrderedHashSet<usize> = Default::default();
        assert!(set.insert(3));
        assert!(set.insert(1));
        assert!(!set.insert(3));

        assert_eq!(vec![&3, &1], set.iter().collect::<Vec<_>>());
    }
}
