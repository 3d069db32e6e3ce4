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

//! The unsigned-integer key capability shared by every container.

use std::fmt::Debug;
use std::hash::Hash;

use bytemuck::Pod;

/// A sparse key: an unsigned integer identifying an item, e.g. an entity id.
///
/// Keys are not required to be dense or contiguous across the key space;
/// the containers derive their addressing from the key's integer value
/// (`bucket = key >> SHIFT`, `offset = key & MASK`).
///
/// The `Pod` bound is what allows buckets to keep keys in raw, partially
/// initialized memory blocks and relocate them with plain byte copies.
pub trait IndexKey: Copy + Eq + Ord + Hash + Pod + Debug + 'static {
    /// Widens the key to a `usize` for addressing arithmetic.
    fn as_usize(self) -> usize;

    /// Narrows a `usize` back into the key type.
    ///
    /// The value must fit the key's width; this is a precondition, checked
    /// in debug builds only.
    fn from_usize(value: usize) -> Self;
}

macro_rules! impl_index_key {
    ($($ty:ty),*) => {
        $(impl IndexKey for $ty {
            #[inline]
            fn as_usize(self) -> usize {
                self as usize
            }

            #[inline]
            fn from_usize(value: usize) -> Self {
                debug_assert!(
                    <$ty>::try_from(value).is_ok(),
                    "value {value} does not fit the key type"
                );
                value as $ty
            }
        })*
    };
}

impl_index_key!(u8, u16, u32, u64, usize);
