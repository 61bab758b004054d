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

//! Defines data structures related to GPU texture resources.

use crate::math::Extent2D;
use std::borrow::Cow;

/// An opaque handle to a texture owned by a [`GraphicsDevice`](crate::renderer::GraphicsDevice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// The texel formats the frame pipeline allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Four 16-bit float channels. Used for every HDR intermediate target.
    Rgba16Float,
    /// Four 32-bit float channels. Used for geometry buffers needing full precision.
    Rgba32Float,
    /// A single 32-bit float channel.
    R32Float,
}

impl TextureFormat {
    /// Size of one texel in bytes.
    pub const fn bytes_per_texel(&self) -> u32 {
        match self {
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgba32Float => 16,
            TextureFormat::R32Float => 4,
        }
    }
}

/// A set of flags describing the allowed usages of a [`TextureId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureUsage {
    bits: u32,
}

impl TextureUsage {
    /// No usage.
    pub const NONE: Self = Self { bits: 0 };
    /// The texture can be used as the source of a copy operation.
    pub const COPY_SRC: Self = Self { bits: 1 << 0 };
    /// The texture can be used as the destination of a copy operation.
    pub const COPY_DST: Self = Self { bits: 1 << 1 };
    /// The texture can be bound in a shader for sampling.
    pub const TEXTURE_BINDING: Self = Self { bits: 1 << 2 };
    /// The texture can be written by compute shaders as a storage image.
    pub const STORAGE_BINDING: Self = Self { bits: 1 << 3 };
    /// The texture can be used as a color attachment of a full-screen pass.
    pub const RENDER_ATTACHMENT: Self = Self { bits: 1 << 4 };

    /// Usage of a target written by a compute stage and sampled afterwards.
    pub const STORAGE_TARGET: Self = Self {
        bits: Self::STORAGE_BINDING.bits | Self::TEXTURE_BINDING.bits | Self::COPY_SRC.bits,
    };
    /// Usage of a target written by a full-screen stage and sampled afterwards.
    pub const COLOR_TARGET: Self = Self {
        bits: Self::RENDER_ATTACHMENT.bits | Self::TEXTURE_BINDING.bits | Self::COPY_SRC.bits,
    };

    /// Creates a set of usage flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks if every flag of `other` is also set in `self`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks if no flag is set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl std::ops::BitOr for TextureUsage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for TextureUsage {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// A descriptor used to create a [`TextureId`].
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Width and height of mip level 0.
    pub extent: Extent2D,
    /// The number of mipmap levels for the texture.
    pub mip_level_count: u32,
    /// The format of the texels in the texture.
    pub format: TextureFormat,
    /// How the texture will be used.
    pub usage: TextureUsage,
}

impl<'a> TextureDescriptor<'a> {
    /// A single-mip render target of the given extent.
    pub fn target(
        label: impl Into<Cow<'a, str>>,
        extent: Extent2D,
        format: TextureFormat,
        usage: TextureUsage,
    ) -> Self {
        Self {
            label: Some(label.into()),
            extent,
            mip_level_count: 1,
            format,
            usage,
        }
    }

    /// Requests a full mip chain down to 1x1.
    pub fn with_full_mip_chain(mut self) -> Self {
        self.mip_level_count = self.extent.full_mip_count();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_flags_combine() {
        let usage = TextureUsage::STORAGE_BINDING | TextureUsage::TEXTURE_BINDING;
        assert!(usage.contains(TextureUsage::STORAGE_BINDING));
        assert!(!usage.contains(TextureUsage::RENDER_ATTACHMENT));
        assert!(TextureUsage::STORAGE_TARGET.contains(usage));
        assert!(TextureUsage::NONE.is_empty());
    }

    #[test]
    fn descriptor_full_mip_chain() {
        let desc = TextureDescriptor::target(
            "History A",
            Extent2D::new(800, 800),
            TextureFormat::Rgba16Float,
            TextureUsage::COLOR_TARGET,
        )
        .with_full_mip_chain();
        assert_eq!(desc.mip_level_count, 10);
        assert_eq!(desc.label.as_deref(), Some("History A"));
    }
}
