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

//! The sparse-to-dense index structures.
//!
//! [`SparseSet`] is the core: a bucketed sparse index mapping unsigned
//! integer keys to dense positions through fixed bit-sliced addressing.
//! [`PackedArray`] composes it with a packed value store for O(1) add,
//! remove, and lookup with guaranteed-contiguous iteration, and
//! [`DenseArray`] is the standalone keyed variant of that packed store.
//! [`IndirectionTable`] is an independent free-list slot allocator.

mod bucket;
mod dense_array;
mod indirection;
mod packed_array;
mod sparse_set;

pub use dense_array::DenseArray;
pub use indirection::IndirectionTable;
pub use packed_array::PackedArray;
pub use sparse_set::{SparseSet, SparseSetIter};
