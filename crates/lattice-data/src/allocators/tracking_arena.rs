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

//! An arena decorator that tracks memory usage.

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::Arc;

use lattice_core::memory::{ArenaCounters, ArenaStats, MemoryArena, SystemArena};

/// A wrapper around a [`MemoryArena`] implementation that intercepts
/// allocation calls to update a shared [`ArenaCounters`] block.
///
/// The counters are owned by the decorator and shared between its clones,
/// so a container can be handed one clone while the caller keeps another
/// to read [`stats`](TrackingArena::stats) from.
///
/// # Type Parameters
///
/// * `A`: The underlying arena that performs the actual memory
///   acquisition. Defaults to [`SystemArena`].
#[derive(Debug, Default, Clone)]
pub struct TrackingArena<A = SystemArena> {
    inner: A,
    counters: Arc<ArenaCounters>,
}

impl<A> TrackingArena<A> {
    /// Creates a tracking arena over the given inner arena.
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            counters: Arc::new(ArenaCounters::new()),
        }
    }

    /// Takes a snapshot of the allocation counters.
    pub fn stats(&self) -> ArenaStats {
        self.counters.stats()
    }
}

impl<A: MemoryArena> MemoryArena for TrackingArena<A> {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        let ptr = self.inner.allocate(layout)?;
        self.counters.record_allocate(layout.size());
        Some(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.counters.record_deallocate(layout.size());
        self.inner.deallocate(ptr, layout);
    }
}
