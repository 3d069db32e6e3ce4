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

//! The free-list-backed slot allocator.

/// Issues stable sparse indices that point at reassignable dense slots.
///
/// Each issued index cycles through Unissued → Issued(dense) → erased
/// (undirected, on the free list) → Issued(new dense) → … indefinitely;
/// [`clear`](IndirectionTable::clear) returns every index to Unissued.
/// Erased indices are recycled last-in first-out before any fresh index
/// is appended, so the table's footprint tracks the peak live count, not
/// the issue count.
#[derive(Debug, Default, Clone)]
pub struct IndirectionTable {
    slots: Vec<Option<usize>>,
    free: Vec<usize>,
    dense_len: usize,
}

impl IndirectionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a sparse index directed at the next dense slot.
    ///
    /// Recycles the most recently erased index when one is available,
    /// otherwise appends a fresh one. O(1) amortized.
    pub fn next(&mut self) -> usize {
        let dense = self.dense_len;
        self.dense_len += 1;
        if let Some(index) = self.free.pop() {
            self.slots[index] = Some(dense);
            index
        } else {
            let index = self.slots.len();
            self.slots.push(Some(dense));
            index
        }
    }

    /// Undirects `index` and queues it for reuse.
    ///
    /// The index must have been issued and not already erased; violating
    /// that is a precondition violation, ignored in release builds.
    pub fn erase(&mut self, index: usize) {
        let Some(slot) = self.slots.get_mut(index) else {
            debug_assert!(false, "erased index {index} was never issued");
            return;
        };
        if slot.is_none() {
            debug_assert!(false, "index {index} erased twice");
            return;
        }
        *slot = None;
        self.free.push(index);
    }

    /// Repoints an issued `sparse` index at `dense`.
    ///
    /// Used when an external dense array is compacted and its slots move.
    /// The index must have been issued.
    pub fn put(&mut self, sparse: usize, dense: usize) {
        let Some(slot) = self.slots.get_mut(sparse) else {
            debug_assert!(false, "put on index {sparse}, which was never issued");
            return;
        };
        *slot = Some(dense);
    }

    /// Returns the dense slot `sparse` currently points at, or `None`
    /// when the index is erased.
    ///
    /// The index must have been issued; out-of-range indices are a
    /// precondition violation answered with `None` in release builds.
    pub fn at(&self, sparse: usize) -> Option<usize> {
        debug_assert!(sparse < self.slots.len(), "index {sparse} was never issued");
        self.slots.get(sparse).copied().flatten()
    }

    /// Number of sparse indices ever issued and not cleared.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when no index has been issued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Capacity of the slot table.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Total dense slots handed out over the table's lifetime.
    ///
    /// Dense slots are not reused by [`erase`](IndirectionTable::erase);
    /// only [`clear`](IndirectionTable::clear) resets the counter.
    #[inline]
    pub fn dense_len(&self) -> usize {
        self.dense_len
    }

    /// Iterates over every slot's current mapping, erased ones included.
    pub fn iter(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.slots.iter().copied()
    }

    /// Returns every index to Unissued.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.dense_len = 0;
    }
}
