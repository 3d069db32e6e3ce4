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

//! The fixed-capacity sorted bucket backing one sparse index range.

use std::alloc::Layout;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use lattice_core::key::IndexKey;
use lattice_core::memory::{self, MemoryArena};

/// Number of key bits consumed by the in-bucket position.
pub(crate) const BUCKET_SHIFT: usize = 10;

/// Maximum number of live entries per bucket.
pub(crate) const BUCKET_CAPACITY: usize = 1 << BUCKET_SHIFT;

/// A fixed-capacity pair of parallel arrays, sorted by key, in one arena
/// block: `BUCKET_CAPACITY` key slots followed by `BUCKET_CAPACITY` value
/// slots. Only the first `len` slots of each array are initialized.
///
/// Buckets hold full keys rather than in-bucket offsets. Entries may be
/// relocated one bucket away from their home range by splits and merges,
/// and an offset cannot tell a relocated entry from a native one; the full
/// key can. The block is sized identically either way.
///
/// A bucket does not own an arena handle; its block is released explicitly
/// through [`release`](Bucket::release) by the owning set.
pub(crate) struct Bucket<K> {
    data: NonNull<u8>,
    len: usize,
    _marker: PhantomData<K>,
}

impl<K: IndexKey> Bucket<K> {
    const VALUES_OFFSET: usize = BUCKET_CAPACITY * mem::size_of::<K>();

    /// The layout of one bucket block.
    ///
    /// The key array comes first; its total size is a multiple of the
    /// block alignment for every plain-old-data key width, so the value
    /// array behind it is always properly aligned.
    fn block_layout() -> Layout {
        let size = BUCKET_CAPACITY * (mem::size_of::<K>() + mem::size_of::<usize>());
        let align = mem::align_of::<K>().max(mem::align_of::<usize>());
        Layout::from_size_align(size, align).expect("bucket block layout is statically valid")
    }

    /// Acquires an empty bucket from the arena.
    pub(crate) fn allocate<A: MemoryArena>(arena: &A) -> Self {
        let data = memory::allocate_or_abort(arena, Self::block_layout());
        Self {
            data,
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Returns the bucket's block to the arena.
    pub(crate) fn release<A: MemoryArena>(self, arena: &A) {
        // SAFETY: `data` was allocated by `allocate` with this exact layout
        // and `self` is consumed, so the block cannot be released twice.
        unsafe { arena.deallocate(self.data, Self::block_layout()) }
    }

    #[inline]
    fn key_ptr(&self) -> *mut K {
        self.data.as_ptr().cast::<K>()
    }

    #[inline]
    fn value_ptr(&self) -> *mut usize {
        // SAFETY: the offset stays inside the allocated block.
        unsafe { self.data.as_ptr().add(Self::VALUES_OFFSET).cast::<usize>() }
    }

    /// The live keys, in ascending order.
    #[inline]
    pub(crate) fn keys(&self) -> &[K] {
        // SAFETY: the first `len` key slots are initialized.
        unsafe { std::slice::from_raw_parts(self.key_ptr(), self.len) }
    }

    /// The live values, parallel to [`keys`](Bucket::keys).
    #[inline]
    pub(crate) fn values(&self) -> &[usize] {
        // SAFETY: the first `len` value slots are initialized.
        unsafe { std::slice::from_raw_parts(self.value_ptr(), self.len) }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len >= BUCKET_CAPACITY
    }

    /// The largest live key, if any.
    #[inline]
    pub(crate) fn max_key(&self) -> Option<K> {
        self.keys().last().copied()
    }

    #[allow(dead_code)]
    #[inline]
    pub(crate) fn contains(&self, key: K) -> bool {
        self.keys().binary_search(&key).is_ok()
    }

    /// Looks up the value stored for `key`.
    pub(crate) fn get(&self, key: K) -> Option<usize> {
        let index = self.keys().binary_search(&key).ok()?;
        Some(self.values()[index])
    }

    /// Overwrites the value of an existing entry. Returns false if the key
    /// is not present.
    pub(crate) fn set(&mut self, key: K, value: usize) -> bool {
        match self.keys().binary_search(&key) {
            Ok(index) => {
                // SAFETY: `index` is a live slot.
                unsafe { self.value_ptr().add(index).write(value) };
                true
            }
            Err(_) => false,
        }
    }

    /// Inserts `(key, value)` at its sorted position, shifting the tail.
    ///
    /// Returns false when the bucket is full; the caller is responsible for
    /// making room first. Inserting a key already present is a precondition
    /// violation and leaves the bucket unchanged.
    pub(crate) fn insert(&mut self, key: K, value: usize) -> bool {
        if self.is_full() {
            return false;
        }
        let index = match self.keys().binary_search(&key) {
            Ok(_) => {
                debug_assert!(false, "duplicate key inserted into bucket");
                return true;
            }
            Err(index) => index,
        };
        // SAFETY: len < capacity, so slots [index, len] are in bounds; the
        // copies shift initialized entries into the free tail slot.
        unsafe {
            let keys = self.key_ptr().add(index);
            let values = self.value_ptr().add(index);
            ptr::copy(keys, keys.add(1), self.len - index);
            ptr::copy(values, values.add(1), self.len - index);
            keys.write(key);
            values.write(value);
        }
        self.len += 1;
        true
    }

    /// Removes `key`, shifting the tail down over the gap. Returns the
    /// removed value, or `None` if the key was not present.
    pub(crate) fn remove(&mut self, key: K) -> Option<usize> {
        let index = self.keys().binary_search(&key).ok()?;
        let value = self.values()[index];
        // SAFETY: `index` < len; the copies move the initialized tail down
        // by one slot.
        unsafe {
            let keys = self.key_ptr().add(index);
            let values = self.value_ptr().add(index);
            ptr::copy(keys.add(1), keys, self.len - index - 1);
            ptr::copy(values.add(1), values, self.len - index - 1);
        }
        self.len -= 1;
        Some(value)
    }

    /// Number of leading entries whose key is below `bound`.
    #[inline]
    pub(crate) fn partition_below(&self, bound: usize) -> usize {
        self.keys().partition_point(|key| key.as_usize() < bound)
    }

    /// Merges `count` sorted entries into this bucket, keeping it sorted.
    ///
    /// The two runs are interleaved back to front, so the merge is in
    /// place and costs one pass.
    ///
    /// # Safety
    ///
    /// `src_keys`/`src_values` must point at `count` initialized entries in
    /// ascending key order, not aliasing this bucket's live slots, and
    /// `len + count` must not exceed the bucket capacity.
    unsafe fn merge_raw(&mut self, src_keys: *const K, src_values: *const usize, count: usize) {
        debug_assert!(self.len + count <= BUCKET_CAPACITY);
        let keys = self.key_ptr();
        let values = self.value_ptr();
        let mut existing = self.len;
        let mut incoming = count;
        let mut write = self.len + count;
        while incoming > 0 {
            write -= 1;
            if existing > 0 && *keys.add(existing - 1) > *src_keys.add(incoming - 1) {
                existing -= 1;
                keys.add(write).write(*keys.add(existing));
                values.add(write).write(*values.add(existing));
            } else {
                incoming -= 1;
                keys.add(write).write(*src_keys.add(incoming));
                values.add(write).write(*src_values.add(incoming));
            }
        }
        self.len += count;
    }

    /// Splits this bucket's tail into `other`, the bucket one index up.
    ///
    /// At most half the entries move, and only entries at or above
    /// `self_base` (this bucket's own base key): anything lower was already
    /// relocated down from the previous range and may not drift a second
    /// bucket away from home. Returns the number of entries moved.
    pub(crate) fn distribute_into(&mut self, other: &mut Bucket<K>, self_base: usize) -> usize {
        let movable = self.len - self.partition_below(self_base);
        let count = movable
            .min(self.len / 2)
            .min(BUCKET_CAPACITY - other.len);
        if count == 0 {
            return 0;
        }
        let start = self.len - count;
        // SAFETY: the source run is the initialized, sorted tail of a
        // distinct bucket, and `other` has room for `count` entries.
        unsafe {
            other.merge_raw(self.key_ptr().add(start), self.value_ptr().add(start), count);
        }
        self.len = start;
        count
    }

    /// Absorbs every entry of `other`. The caller must have checked that
    /// the combined size fits and releases `other`'s block afterwards.
    pub(crate) fn merge_from(&mut self, other: &Bucket<K>) {
        debug_assert!(self.len + other.len <= BUCKET_CAPACITY);
        // SAFETY: `other` is a distinct bucket and its first `len` slots
        // are initialized and sorted.
        unsafe { self.merge_raw(other.key_ptr(), other.value_ptr(), other.len) }
    }

    /// Moves the first `count` entries of `other` into this bucket,
    /// shifting `other`'s remainder back to its array origin.
    fn pull_front(&mut self, other: &mut Bucket<K>, count: usize) {
        debug_assert!(count <= other.len && self.len + count <= BUCKET_CAPACITY);
        // SAFETY: the source run is initialized and sorted; the trailing
        // copies close the gap left at the donor's origin.
        unsafe {
            self.merge_raw(other.key_ptr(), other.value_ptr(), count);
            ptr::copy(other.key_ptr().add(count), other.key_ptr(), other.len - count);
            ptr::copy(
                other.value_ptr().add(count),
                other.value_ptr(),
                other.len - count,
            );
        }
        other.len -= count;
    }

    /// Moves the last `count` entries of this bucket into `other`.
    fn push_tail(&mut self, other: &mut Bucket<K>, count: usize) {
        debug_assert!(count <= self.len && other.len + count <= BUCKET_CAPACITY);
        let start = self.len - count;
        // SAFETY: the source run is the initialized, sorted tail of a
        // distinct bucket with room checked above.
        unsafe {
            other.merge_raw(self.key_ptr().add(start), self.value_ptr().add(start), count);
        }
        self.len = start;
    }

    /// Redistributes entries between this bucket and `next` (the bucket one
    /// index up) so each ends near half the combined size.
    ///
    /// Movement is capped by the residency rule: entries pulled down from
    /// `next` must have a home of at most one range above this bucket, and
    /// entries pushed up must be at or above this bucket's own base.
    pub(crate) fn rebalance_with(&mut self, next: &mut Bucket<K>, self_base: usize) {
        let total = self.len + next.len;
        let target = total / 2;
        if self.len < target {
            let wanted = target - self.len;
            let ceiling = self_base.saturating_add(2 * BUCKET_CAPACITY);
            let eligible = next.partition_below(ceiling);
            let count = wanted.min(eligible).min(BUCKET_CAPACITY - self.len);
            if count > 0 {
                self.pull_front(next, count);
            }
        } else if self.len > target {
            let wanted = self.len - target;
            let movable = self.len - self.partition_below(self_base);
            let count = wanted.min(movable).min(BUCKET_CAPACITY - next.len);
            if count > 0 {
                self.push_tail(next, count);
            }
        }
    }
}
