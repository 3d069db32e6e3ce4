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

//! Error types for positional access.

use std::error::Error;
use std::fmt;

/// A dense position was outside the live range of a container.
///
/// This is caller misuse of positional rather than keyed access, and is
/// therefore reportable, unlike looking up an absent key, which is an
/// ordinary `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionError {
    /// The rejected position.
    pub position: usize,
    /// The container's live length at the time of the access.
    pub len: usize,
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "position {} is out of bounds for length {}",
            self.position, self.len
        )
    }
}

impl Error for PositionError {}
