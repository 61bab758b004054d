// Copyright 2025 eraflo
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

//! Defines the 2D extent type used for every resolution-dependent resource.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The width and height of a 2D image, in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent2D {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

impl Extent2D {
    /// Creates a new extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of mip levels of a full chain down to 1x1.
    pub fn full_mip_count(&self) -> u32 {
        let largest = self.width.max(self.height).max(1);
        u32::BITS - largest.leading_zeros()
    }

    /// Number of workgroups needed to cover the extent with square tiles of `tile` texels.
    pub fn workgroups(&self, tile: u32) -> [u32; 3] {
        let tile = tile.max(1);
        [self.width.div_ceil(tile), self.height.div_ceil(tile), 1]
    }

    /// Reciprocal of the extent, `[1/width, 1/height]`. Zero dimensions map to zero.
    pub fn texel_size(&self) -> [f32; 2] {
        let inv = |v: u32| if v == 0 { 0.0 } else { 1.0 / v as f32 };
        [inv(self.width), inv(self.height)]
    }
}

impl fmt::Display for Extent2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
