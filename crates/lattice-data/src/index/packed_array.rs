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

//! The sparse-index-plus-packed-store composition.

use lattice_core::error::PositionError;
use lattice_core::key::IndexKey;
use lattice_core::memory::{MemoryArena, SystemArena};

use super::sparse_set::SparseSet;

/// Packed component storage addressed by sparse entity keys.
///
/// Composes a [`SparseSet`] mapping each entity to a dense position with a
/// packed store mapping that position to the component. The two sides
/// append and swap-remove in lockstep, so the entity at dense slot `i`
/// always owns the component at `components()[i]` and iteration touches
/// exactly the live components, contiguously, in swap-affected order.
pub struct PackedArray<E: IndexKey, C, A: MemoryArena = SystemArena> {
    pub(crate) positions: SparseSet<E, A>,
    pub(crate) components: Vec<C>,
}

impl<E: IndexKey, C> PackedArray<E, C> {
    /// Creates an empty array.
    pub fn new() -> Self {
        Self {
            positions: SparseSet::new(),
            components: Vec::new(),
        }
    }
}

impl<E: IndexKey, C> Default for PackedArray<E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: IndexKey, C, A: MemoryArena> PackedArray<E, C, A> {
    /// Creates an empty array whose sparse index allocates from `arena`.
    pub fn new_in(arena: A) -> Self {
        Self {
            positions: SparseSet::new_in(arena),
            components: Vec::new(),
        }
    }

    /// Number of live components.
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True when no components are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Adds `component` under `entity`. Adding an entity already present
    /// is an idempotent no-op; the stored component is not overwritten.
    pub fn add(&mut self, entity: E, component: C) {
        if self.positions.contains(entity) {
            return;
        }
        let position = self.components.len();
        debug_assert_eq!(position, self.positions.len());
        self.positions.insert(entity, position);
        self.components.push(component);
    }

    /// Removes `entity` and its component. Removing an absent entity is a
    /// no-op.
    ///
    /// The sparse set swaps its last dense key into the freed slot; the
    /// component store mirrors that with a swap-remove at the same
    /// position, keeping both sides gap-free.
    pub fn remove(&mut self, entity: E) {
        let Some(position) = self.positions.get(entity) else {
            return;
        };
        self.positions.remove(entity);
        self.components.swap_remove(position);
    }

    /// Returns the component stored for `entity`.
    #[inline]
    pub fn get(&self, entity: E) -> Option<&C> {
        self.positions
            .get(entity)
            .and_then(|position| self.components.get(position))
    }

    /// Returns the component stored for `entity`, mutably.
    #[inline]
    pub fn get_mut(&mut self, entity: E) -> Option<&mut C> {
        match self.positions.get(entity) {
            Some(position) => self.components.get_mut(position),
            None => None,
        }
    }

    /// True if `entity` currently has a component.
    #[inline]
    pub fn contains(&self, entity: E) -> bool {
        self.positions.contains(entity)
    }

    /// Returns the component at a dense position.
    pub fn component_at(&self, position: usize) -> Result<&C, PositionError> {
        self.components.get(position).ok_or(PositionError {
            position,
            len: self.components.len(),
        })
    }

    /// Returns the entity owning the component at a dense position.
    pub fn entity_at(&self, position: usize) -> Result<E, PositionError> {
        self.positions
            .keys()
            .get(position)
            .copied()
            .ok_or(PositionError {
                position,
                len: self.positions.len(),
            })
    }

    /// The backing contiguous component sequence.
    #[inline]
    pub fn components(&self) -> &[C] {
        &self.components
    }

    /// The live entities, parallel to [`components`](PackedArray::components).
    #[inline]
    pub fn entities(&self) -> &[E] {
        self.positions.keys()
    }

    /// Iterates over `(entity, &component)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (E, &C)> {
        self.positions
            .keys()
            .iter()
            .copied()
            .zip(self.components.iter())
    }

    /// Removes every entity and component.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.components.clear();
    }
}
