//! Fixed-capacity, open-addressed hash map with linear probing.
//!
//! No eviction: once `N` live entries are present, inserts fail rather than
//! displacing an existing entry. Intended for hot-path lookups (Pending /
//! Processed order maps) up to a few thousand entries.

use std::hash::{Hash, Hasher};

#[derive(Clone)]
enum Slot<K, V> {
    Empty,
    Occupied(K, V),
    Tombstone,
}

pub struct FlatMap<K, V, const N: usize> {
    slots: Vec<Slot<K, V>>,
    len: usize,
}

impl<K: Eq + Hash + Clone, V, const N: usize> FlatMap<K, V, N> {
    pub fn new() -> Self {
        assert!(N > 0, "FlatMap capacity must be non-zero");
        Self {
            slots: (0..N).map(|_| Slot::Empty).collect(),
            len: 0,
        }
    }

    fn hash(&self, key: &K) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish() as usize
    }

    /// Insert, returning the previous value if the key was already present.
    /// Returns `Err(value)` instead of inserting if the map is full.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, V> {
        if let Some(idx) = self.find_slot(&key) {
            match std::mem::replace(&mut self.slots[idx], Slot::Empty) {
                Slot::Occupied(_, old) => {
                    self.slots[idx] = Slot::Occupied(key, value);
                    return Ok(Some(old));
                }
                _ => unreachable!(),
            }
        }
        if self.len >= N {
            return Err(value);
        }
        let start = self.hash(&key) % N;
        for offset in 0..N {
            let idx = (start + offset) % N;
            match &self.slots[idx] {
                Slot::Empty | Slot::Tombstone => {
                    self.slots[idx] = Slot::Occupied(key, value);
                    self.len += 1;
                    return Ok(None);
                }
                Slot::Occupied(_, _) => continue,
            }
        }
        Err(value)
    }

    fn find_slot(&self, key: &K) -> Option<usize> {
        let start = self.hash(key) % N;
        for offset in 0..N {
            let idx = (start + offset) % N;
            match &self.slots[idx] {
                Slot::Empty => return None,
                Slot::Occupied(k, _) if k == key => return Some(idx),
                Slot::Occupied(_, _) | Slot::Tombstone => continue,
            }
        }
        None
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let idx = self.find_slot(key)?;
        match &self.slots[idx] {
            Slot::Occupied(_, v) => Some(v),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.find_slot(key)?;
        match &mut self.slots[idx] {
            Slot::Occupied(_, v) => Some(v),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find_slot(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.find_slot(key)?;
        match std::mem::replace(&mut self.slots[idx], Slot::Tombstone) {
            Slot::Occupied(_, v) => {
                self.len -= 1;
                Some(v)
            }
            _ => unreachable!(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len >= N
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots.iter().filter_map(|s| match s {
            Slot::Occupied(k, v) => Some((k, v)),
            _ => None,
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }
}

impl<K: Eq + Hash + Clone, V, const N: usize> Default for FlatMap<K, V, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut m: FlatMap<String, u32, 8> = FlatMap::new();
        assert_eq!(m.insert("a".to_string(), 1).unwrap(), None);
        assert_eq!(m.get(&"a".to_string()), Some(&1));
        assert_eq!(m.remove(&"a".to_string()), Some(1));
        assert_eq!(m.get(&"a".to_string()), None);
    }

    #[test]
    fn reject_on_full() {
        let mut m: FlatMap<u32, u32, 2> = FlatMap::new();
        m.insert(1, 1).unwrap();
        m.insert(2, 2).unwrap();
        assert!(m.is_full());
        assert_eq!(m.insert(3, 3), Err(3));
    }

    #[test]
    fn tombstone_allows_reuse() {
        let mut m: FlatMap<u32, u32, 2> = FlatMap::new();
        m.insert(1, 1).unwrap();
        m.insert(2, 2).unwrap();
        m.remove(&1);
        assert!(m.insert(3, 3).is_ok());
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn update_existing_key() {
        let mut m: FlatMap<u32, u32, 4> = FlatMap::new();
        m.insert(1, 1).unwrap();
        assert_eq!(m.insert(1, 2).unwrap(), Some(1));
        assert_eq!(m.get(&1), Some(&2));
        assert_eq!(m.len(), 1);
    }
}
