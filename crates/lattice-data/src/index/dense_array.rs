// Copyright 2025 lattice contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Keyed packed storage with swap-removal.

use std::collections::HashMap;
use std::ops::Index;

use lattice_core::error::PositionError;
use lattice_core::key::IndexKey;

/// A contiguous, gap-free value sequence with a key ↔ position mapping.
///
/// Values live in one dense vector so bulk traversal touches only live
/// data; that contiguity is the reason this exists instead of a plain hash
/// map. Removal swaps the last value into the freed slot, so positions are
/// stable only until the next mutation and iteration order is the
/// swap-affected storage order, not insertion order.
///
/// Invariant: `position -> key -> position` round-trips for every live
/// key, and positions form the dense range `[0, len())` with no gaps.
pub struct DenseArray<K: IndexKey, V> {
    pub(crate) values: Vec<V>,
    pub(crate) key_to_position: HashMap<K, usize>,
    pub(crate) position_to_key: Vec<K>,
}

impl<K: IndexKey, V> DenseArray<K, V> {
    /// Creates an empty array.
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            key_to_position: HashMap::new(),
            position_to_key: Vec::new(),
        }
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no entries are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Appends `value` under `key`.
    ///
    /// Adding a key already present is a precondition violation; the call
    /// is a no-op in release builds.
    pub fn add(&mut self, key: K, value: V) {
        debug_assert!(
            !self.key_to_position.contains_key(&key),
            "key {key:?} already present in dense array"
        );
        if self.key_to_position.contains_key(&key) {
            return;
        }
        let position = self.values.len();
        self.values.push(value);
        self.key_to_position.insert(key, position);
        self.position_to_key.push(key);
    }

    /// Removes `key`, swapping the last value into its slot.
    ///
    /// Removing an absent key is a precondition violation; the call is a
    /// no-op in release builds. Removing a non-last entry relocates
    /// exactly one other key (the previously last one); removing the last
    /// entry relocates nothing.
    pub fn remove(&mut self, key: K) {
        let Some(position) = self.key_to_position.remove(&key) else {
            debug_assert!(false, "key {key:?} not present in dense array");
            return;
        };
        self.values.swap_remove(position);
        let moved = self.position_to_key.swap_remove(position);
        if position < self.position_to_key.len() {
            self.key_to_position.insert(moved, position);
        }
    }

    /// Returns the value stored under `key`.
    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.key_to_position
            .get(&key)
            .map(|&position| &self.values[position])
    }

    /// Returns the value stored under `key`, mutably.
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        match self.key_to_position.get(&key) {
            Some(&position) => self.values.get_mut(position),
            None => None,
        }
    }

    /// Returns the value at a dense position.
    pub fn value_at(&self, position: usize) -> Result<&V, PositionError> {
        self.values.get(position).ok_or(PositionError {
            position,
            len: self.values.len(),
        })
    }

    /// Returns the key whose value sits at a dense position.
    pub fn key_at(&self, position: usize) -> Result<K, PositionError> {
        self.position_to_key
            .get(position)
            .copied()
            .ok_or(PositionError {
                position,
                len: self.position_to_key.len(),
            })
    }

    /// The backing contiguous value sequence.
    #[inline]
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// The live keys, parallel to [`values`](DenseArray::values).
    #[inline]
    pub fn keys(&self) -> &[K] {
        &self.position_to_key
    }

    /// Iterates over `(key, &value)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.position_to_key
            .iter()
            .copied()
            .zip(self.values.iter())
    }

    /// Removes every entry. Capacity is retained.
    pub fn clear(&mut self) {
        self.values.clear();
        self.key_to_position.clear();
        self.position_to_key.clear();
    }
}

impl<K: IndexKey, V> Default for DenseArray<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: IndexKey, V> Index<K> for DenseArray<K, V> {
    type Output = V;

    /// Panics if `key` is absent, like the standard map indexers.
    fn index(&self, key: K) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key {key:?} not present in dense array"),
        }
    }
}
