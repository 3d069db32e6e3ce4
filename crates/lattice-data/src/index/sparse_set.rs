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

//! The bucketed sparse index.

use std::alloc::Layout;
use std::collections::BTreeMap;
use std::mem;
use std::ptr::NonNull;

use lattice_core::key::IndexKey;
use lattice_core::memory::{self, MemoryArena, SystemArena};

use super::bucket::{Bucket, BUCKET_CAPACITY, BUCKET_SHIFT};

/// Default growth factor for the dense key buffer.
const DEFAULT_GROW_FACTOR: f32 = 2.0;

/// Maps unsigned integer keys to `usize` values (typically dense
/// positions) using bucketed sorted arrays.
///
/// A key is routed to its bucket by a fixed shift (`bucket = key >> 10`,
/// bucket capacity 1024), so lookup cost is O(10) regardless of key
/// magnitude and memory scales with the number of occupied bucket ranges,
/// not the maximum key value. Buckets are created lazily, split when an
/// insert finds them full, and merged or rebalanced with their next
/// neighbor when a removal leaves them under half capacity.
///
/// Splits and merges may place an entry one bucket away from its home
/// range; lookups therefore probe the home bucket and both neighbors.
/// Every probe is exact because buckets store full keys.
///
/// The set also owns a dense array of the inserted keys, maintained with
/// swap-removal. When the stored values are dense positions (the position
/// map discipline [`PackedArray`](super::PackedArray) uses), `dense[get(k)]
/// == k` holds for every live key and [`remove`](SparseSet::remove) keeps
/// the array gap-free in constant time. Storing unrelated values is
/// allowed for insert/lookup/iterate workloads, but `remove`'s swap then
/// has nothing meaningful to do and the discipline is debug-asserted.
pub struct SparseSet<K: IndexKey, A: MemoryArena = SystemArena> {
    pub(crate) buckets: BTreeMap<usize, Bucket<K>>,
    dense: NonNull<K>,
    len: usize,
    capacity: usize,
    grow_factor: f32,
    arena: A,
}

// SAFETY: the raw dense buffer and bucket blocks are exclusively owned by
// the set; no aliased access escapes a single call.
unsafe impl<K: IndexKey, A: MemoryArena + Send> Send for SparseSet<K, A> {}
unsafe impl<K: IndexKey, A: MemoryArena + Sync> Sync for SparseSet<K, A> {}

impl<K: IndexKey> SparseSet<K> {
    /// Creates an empty set with the default capacity and growth factor.
    pub fn new() -> Self {
        Self::with_capacity_in(BUCKET_CAPACITY, DEFAULT_GROW_FACTOR, SystemArena)
    }
}

impl<K: IndexKey> Default for SparseSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: IndexKey, A: MemoryArena> SparseSet<K, A> {
    /// Creates an empty set whose dense key buffer starts at
    /// `initial_capacity` entries and grows by `grow_factor` when full.
    ///
    /// Factors that cannot grow the buffer (non-finite or <= 1.0) fall
    /// back to the default of 2.0.
    pub fn with_capacity_in(initial_capacity: usize, grow_factor: f32, arena: A) -> Self {
        let grow_factor = if grow_factor.is_finite() && grow_factor > 1.0 {
            grow_factor
        } else {
            DEFAULT_GROW_FACTOR
        };
        let dense = if initial_capacity > 0 {
            memory::allocate_or_abort(&arena, Self::dense_layout(initial_capacity)).cast::<K>()
        } else {
            NonNull::dangling()
        };
        Self {
            buckets: BTreeMap::new(),
            dense,
            len: 0,
            capacity: initial_capacity,
            grow_factor,
            arena,
        }
    }

    /// Creates an empty set with the default sizing, allocating from
    /// `arena`.
    pub fn new_in(arena: A) -> Self {
        Self::with_capacity_in(BUCKET_CAPACITY, DEFAULT_GROW_FACTOR, arena)
    }

    fn dense_layout(capacity: usize) -> Layout {
        Layout::array::<K>(capacity).expect("dense key buffer layout overflowed")
    }

    #[inline]
    fn split_key(key: K) -> usize {
        key.as_usize() >> BUCKET_SHIFT
    }

    /// Number of live keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no keys are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current capacity of the dense key buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The live keys in dense layout order.
    ///
    /// The order is the storage order, not insertion order, and is
    /// invalidated by any subsequent insert or remove.
    #[inline]
    pub fn keys(&self) -> &[K] {
        // SAFETY: the first `len` dense slots are initialized.
        unsafe { std::slice::from_raw_parts(self.dense.as_ptr(), self.len) }
    }

    /// Finds the bucket holding `key`, probing its home range and both
    /// neighbors. Returns the bucket's map index and the stored value.
    fn probe(&self, key: K) -> Option<(usize, usize)> {
        let home = Self::split_key(key);
        let candidates = [Some(home), Some(home + 1), home.checked_sub(1)];
        for index in candidates.into_iter().flatten() {
            if let Some(bucket) = self.buckets.get(&index) {
                if let Some(value) = bucket.get(key) {
                    return Some((index, value));
                }
            }
        }
        None
    }

    /// Looks up the value stored for `key`.
    #[inline]
    pub fn get(&self, key: K) -> Option<usize> {
        self.probe(key).map(|(_, value)| value)
    }

    /// True if `key` is currently inserted.
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.probe(key).is_some()
    }

    /// Inserts `key` with `value` and returns the key's dense position.
    ///
    /// Inserting a key already present is an idempotent no-op that returns
    /// the stored value unchanged.
    pub fn insert(&mut self, key: K, value: usize) -> usize {
        if let Some((_, existing)) = self.probe(key) {
            return existing;
        }

        let home = Self::split_key(key);
        let target = if self.make_room(home) {
            home
        } else {
            // The home bucket is saturated with entries relocated down from
            // the previous range; the key itself overflows one bucket up.
            let made = self.make_room(home + 1);
            debug_assert!(made, "overflow bucket saturated by a fresh key");
            if !made {
                log::error!("sparse set could not place key {key:?}; insert dropped");
                return self.len;
            }
            home + 1
        };

        if self.len == self.capacity {
            self.grow_dense();
        }
        // SAFETY: `len < capacity` after the growth check.
        unsafe { self.dense.as_ptr().add(self.len).write(key) };

        let arena = &self.arena;
        let bucket = self.buckets.entry(target).or_insert_with(|| {
            log::trace!("sparse set: creating bucket {target}");
            Bucket::allocate(arena)
        });
        bucket.insert(key, value);
        self.len += 1;
        self.len - 1
    }

    /// Ensures the bucket at `index` has at least one free slot, splitting
    /// its tail into the next bucket if necessary (cascading right when the
    /// next bucket is itself full).
    ///
    /// Returns false when nothing in the bucket may legally move one range
    /// up, i.e. the bucket is saturated with the previous range's overflow.
    fn make_room(&mut self, index: usize) -> bool {
        let Some(bucket) = self.buckets.get(&index) else {
            return true;
        };
        if !bucket.is_full() {
            return true;
        }
        let base = index << BUCKET_SHIFT;
        if bucket.len() == bucket.partition_below(base) {
            return false;
        }
        if !self.make_room(index + 1) {
            return false;
        }
        let arena = &self.arena;
        let mut bucket = match self.buckets.remove(&index) {
            Some(bucket) => bucket,
            None => return true,
        };
        let next = self.buckets.entry(index + 1).or_insert_with(|| {
            log::trace!("sparse set: creating bucket {}", index + 1);
            Bucket::allocate(arena)
        });
        let moved = bucket.distribute_into(next, base);
        log::trace!("sparse set: split bucket {index}, moved {moved} entries up");
        self.buckets.insert(index, bucket);
        moved > 0
    }

    fn grow_dense(&mut self) {
        let grown = (self.capacity as f32 * self.grow_factor) as usize;
        let new_capacity = grown.max(self.capacity + 1);
        let new_dense =
            memory::allocate_or_abort(&self.arena, Self::dense_layout(new_capacity)).cast::<K>();
        // SAFETY: both buffers are live and disjoint; `len` entries are
        // initialized in the old one.
        unsafe {
            std::ptr::copy_nonoverlapping(self.dense.as_ptr(), new_dense.as_ptr(), self.len);
        }
        self.release_dense();
        self.dense = new_dense;
        self.capacity = new_capacity;
    }

    fn release_dense(&mut self) {
        if self.capacity > 0 {
            // SAFETY: the buffer was allocated from this arena with this
            // exact layout.
            unsafe {
                self.arena
                    .deallocate(self.dense.cast(), Self::dense_layout(self.capacity));
            }
        }
    }

    /// Removes `key`. Removing an absent key is a no-op.
    ///
    /// When the stored value is the key's dense position, the last dense
    /// key is swapped into the vacated slot and its bucket entry is
    /// repointed, keeping the dense array gap-free in constant time.
    pub fn remove(&mut self, key: K) {
        let Some((bucket_index, position)) = self.probe(key) else {
            return;
        };
        debug_assert!(
            position < self.len && self.keys()[position] == key,
            "removed key's stored value must be its dense position"
        );

        if position + 1 < self.len {
            let last = self.keys()[self.len - 1];
            // SAFETY: `position < len`, checked by the branch above.
            unsafe { self.dense.as_ptr().add(position).write(last) };
            if let Some((last_bucket, _)) = self.probe(last) {
                if let Some(bucket) = self.buckets.get_mut(&last_bucket) {
                    bucket.set(last, position);
                }
            }
        }

        if let Some(bucket) = self.buckets.get_mut(&bucket_index) {
            bucket.remove(key);
        }
        self.maintain(bucket_index);
        self.len -= 1;
    }

    /// Merges or rebalances the bucket at `index` with its immediate next
    /// neighbor if a removal left it under half capacity.
    fn maintain(&mut self, index: usize) {
        let Some(bucket) = self.buckets.get(&index) else {
            return;
        };
        if bucket.len() >= BUCKET_CAPACITY / 2 {
            return;
        }
        let Some(next) = self.buckets.get(&(index + 1)) else {
            return;
        };

        let fits = bucket.len() + next.len() <= BUCKET_CAPACITY;
        // An entry may come down one range at most: a merge is only legal
        // while the neighbor holds nothing from two ranges up.
        let ceiling = (index + 2).saturating_mul(BUCKET_CAPACITY);
        let contained = next.max_key().is_none_or(|key| key.as_usize() < ceiling);

        if fits && contained {
            if let Some(next) = self.buckets.remove(&(index + 1)) {
                if let Some(bucket) = self.buckets.get_mut(&index) {
                    bucket.merge_from(&next);
                    log::debug!(
                        "sparse set: merged bucket {} into {index} ({} entries)",
                        index + 1,
                        bucket.len()
                    );
                }
                next.release(&self.arena);
            }
        } else if let Some(mut next) = self.buckets.remove(&(index + 1)) {
            if let Some(bucket) = self.buckets.get_mut(&index) {
                bucket.rebalance_with(&mut next, index << BUCKET_SHIFT);
                log::debug!(
                    "sparse set: rebalanced buckets {index}/{} to {}/{}",
                    index + 1,
                    bucket.len(),
                    next.len()
                );
            }
            self.buckets.insert(index + 1, next);
        }
    }

    /// Destroys every bucket and resets the set to empty.
    ///
    /// The dense key buffer keeps its capacity.
    pub fn clear(&mut self) {
        for (_, bucket) in mem::take(&mut self.buckets) {
            bucket.release(&self.arena);
        }
        self.len = 0;
        log::trace!("sparse set: cleared");
    }

    /// Iterates over `(key, value)` pairs in dense layout order.
    pub fn iter(&self) -> SparseSetIter<'_, K, A> {
        SparseSetIter {
            set: self,
            front: 0,
        }
    }
}

impl<K: IndexKey, A: MemoryArena> Drop for SparseSet<K, A> {
    fn drop(&mut self) {
        for (_, bucket) in mem::take(&mut self.buckets) {
            bucket.release(&self.arena);
        }
        self.release_dense();
    }
}

/// Iterator over a [`SparseSet`]'s `(key, value)` pairs in dense order.
pub struct SparseSetIter<'a, K: IndexKey, A: MemoryArena> {
    set: &'a SparseSet<K, A>,
    front: usize,
}

impl<K: IndexKey, A: MemoryArena> Iterator for SparseSetIter<'_, K, A> {
    type Item = (K, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.set.len {
            return None;
        }
        let key = self.set.keys()[self.front];
        self.front += 1;
        let value = self.set.get(key)?;
        Some((key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.set.len - self.front;
        (remaining, Some(remaining))
    }
}

impl<'a, K: IndexKey, A: MemoryArena> IntoIterator for &'a SparseSet<K, A> {
    type Item = (K, usize);
    type IntoIter = SparseSetIter<'a, K, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
