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

//! # Lattice Core
//!
//! Foundational crate containing the contracts shared by the lattice
//! storage structures: the unsigned-integer key capability, the memory
//! arena capability, and the positional-access error type.

#![warn(missing_docs)]

pub mod error;
pub mod key;
pub mod memory;

pub use error::PositionError;
pub use key::IndexKey;
pub use memory::{ArenaCounters, ArenaStats, MemoryArena, SystemArena};
