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

//! # Lattice Data
//!
//! Storage structures for associating a large, sparsely populated integer
//! key space with compactly packed value storage: a bucketed sparse index,
//! swap-remove packed stores built on it, and a free-list slot allocator.

#![warn(missing_docs)]

pub mod allocators;
pub mod index;

pub use index::{DenseArray, IndirectionTable, PackedArray, SparseSet};
