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

//! The memory arena capability consumed by every container.
//!
//! Containers never call the global allocator directly: each one holds an
//! arena handle and acquires every raw buffer and bucket block through it.
//! The capability is byte-level and layout-driven, so a single arena serves
//! any element type. `SystemArena` is the default, backed by `std::alloc`.
//!
//! Allocation accounting is instance-based: an [`ArenaCounters`] is created
//! explicitly by whoever wants the numbers (typically through a tracking
//! arena decorator) rather than living in process-wide statics.

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// A capability for acquiring and releasing raw memory.
///
/// Implementations hand out blocks satisfying the requested [`Layout`] and
/// take them back with the same layout. Handles are held by value inside
/// the containers, so implementations should be cheap to clone.
pub trait MemoryArena {
    /// Acquires a block for `layout`, or `None` if the arena is exhausted.
    ///
    /// `layout` must have a non-zero size.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Releases a block previously returned by [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have been allocated by this arena with the same `layout`,
    /// and must not be released twice.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The default arena, backed by the standard library allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemArena;

impl MemoryArena for SystemArena {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        debug_assert!(layout.size() > 0, "zero-sized arena allocation");
        // SAFETY: the layout has a non-zero size per the trait contract.
        NonNull::new(unsafe { alloc::alloc(layout) })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        alloc::dealloc(ptr.as_ptr(), layout);
    }
}

/// Acquires a block from `arena` or aborts the process.
///
/// Allocation failure is fatal for the containers: they do not attempt
/// partial recovery mid-operation. The failure is reported through the
/// logging sink before the abort.
pub fn allocate_or_abort<A: MemoryArena>(arena: &A, layout: Layout) -> NonNull<u8> {
    match arena.allocate(layout) {
        Some(ptr) => ptr,
        None => {
            log::error!(
                "arena failed to allocate {} bytes (align {})",
                layout.size(),
                layout.align()
            );
            alloc::handle_alloc_error(layout)
        }
    }
}

/// Live allocation counters for one arena.
///
/// All counters are updated with relaxed atomics; readers get a consistent
/// enough picture for diagnostics, which is all they are for.
#[derive(Debug, Default)]
pub struct ArenaCounters {
    /// Bytes currently held by live allocations.
    pub current_bytes: AtomicUsize,
    /// The largest value `current_bytes` has ever reached.
    pub peak_bytes: AtomicU64,
    /// Number of allocation calls.
    pub allocations: AtomicU64,
    /// Number of deallocation calls.
    pub deallocations: AtomicU64,
    /// Cumulative bytes ever allocated.
    pub bytes_allocated: AtomicU64,
    /// Cumulative bytes ever released.
    pub bytes_deallocated: AtomicU64,
}

impl ArenaCounters {
    /// Creates a zeroed counter block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one allocation of `size` bytes.
    pub fn record_allocate(&self, size: usize) {
        let updated = self
            .current_bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_add(size)
            });
        match updated {
            Ok(previous) => {
                self.peak_bytes
                    .fetch_max((previous + size) as u64, Ordering::Relaxed);
                self.allocations.fetch_add(1, Ordering::Relaxed);
                self.bytes_allocated.fetch_add(size as u64, Ordering::Relaxed);
            }
            Err(_) => log::error!("arena byte counter overflowed recording {size} bytes"),
        }
    }

    /// Records one deallocation of `size` bytes.
    pub fn record_deallocate(&self, size: usize) {
        let updated = self
            .current_bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_sub(size)
            });
        match updated {
            Ok(_) => {
                self.deallocations.fetch_add(1, Ordering::Relaxed);
                self.bytes_deallocated
                    .fetch_add(size as u64, Ordering::Relaxed);
            }
            Err(_) => log::error!("arena byte counter underflowed releasing {size} bytes"),
        }
    }

    /// Takes a snapshot of the counters.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            current_bytes: self.current_bytes.load(Ordering::Relaxed),
            peak_bytes: self.peak_bytes.load(Ordering::Relaxed),
            allocations: self.allocations.load(Ordering::Relaxed),
            deallocations: self.deallocations.load(Ordering::Relaxed),
            bytes_allocated: self.bytes_allocated.load(Ordering::Relaxed),
            bytes_deallocated: self.bytes_deallocated.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of an [`ArenaCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Bytes currently held by live allocations.
    pub current_bytes: usize,
    /// The largest number of bytes ever held simultaneously.
    pub peak_bytes: u64,
    /// Number of allocation calls.
    pub allocations: u64,
    /// Number of deallocation calls.
    pub deallocations: u64,
    /// Cumulative bytes ever allocated.
    pub bytes_allocated: u64,
    /// Cumulative bytes ever released.
    pub bytes_deallocated: u64,
}

impl ArenaStats {
    /// Net number of live allocations.
    pub fn net_allocations(&self) -> i64 {
        self.allocations as i64 - self.deallocations as i64
    }
}
