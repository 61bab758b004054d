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

//! Conversions from the core rendering types to their wgpu equivalents.

use lumen_core::math::Extent2D;
use lumen_core::renderer::{TextureFormat, TextureUsage};

/// A local extension trait to convert our types into WGPU-compatible types.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_wgpu()` syntax.
pub trait IntoWgpu<T> {
    /// Consumes self and converts it into a WGPU-compatible type.
    fn into_wgpu(self) -> T;
}

impl IntoWgpu<wgpu::Extent3d> for Extent2D {
    fn into_wgpu(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

impl IntoWgpu<wgpu::TextureFormat> for TextureFormat {
    fn into_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
            TextureFormat::R32Float => wgpu::TextureFormat::R32Float,
        }
    }
}

// The core flags do not share wgpu's bit layout, so map them one by one.
impl IntoWgpu<wgpu::TextureUsages> for TextureUsage {
    fn into_wgpu(self) -> wgpu::TextureUsages {
        const PAIRS: [(TextureUsage, wgpu::TextureUsages); 5] = [
            (TextureUsage::COPY_SRC, wgpu::TextureUsages::COPY_SRC),
            (TextureUsage::COPY_DST, wgpu::TextureUsages::COPY_DST),
            (
                TextureUsage::TEXTURE_BINDING,
                wgpu::TextureUsages::TEXTURE_BINDING,
            ),
            (
                TextureUsage::STORAGE_BINDING,
                wgpu::TextureUsages::STORAGE_BINDING,
            ),
            (
                TextureUsage::RENDER_ATTACHMENT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            ),
        ];
        PAIRS
            .iter()
            .filter(|(core, _)| self.contains(*core))
            .fold(wgpu::TextureUsages::empty(), |acc, (_, usage)| acc | *usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_flags_map_individually() {
        let usage: wgpu::TextureUsages = TextureUsage::STORAGE_TARGET.into_wgpu();
        assert!(usage.contains(wgpu::TextureUsages::STORAGE_BINDING));
        assert!(usage.contains(wgpu::TextureUsages::TEXTURE_BINDING));
        assert!(!usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT));

        let usage: wgpu::TextureUsages = TextureUsage::NONE.into_wgpu();
        assert!(usage.is_empty());
    }

    #[test]
    fn extent_becomes_single_layer() {
        let size: wgpu::Extent3d = Extent2D::new(1024, 768).into_wgpu();
        assert_eq!(size.width, 1024);
        assert_eq!(size.height, 768);
        assert_eq!(size.depth_or_array_layers, 1);
        let format: wgpu::TextureFormat = TextureFormat::Rgba16Float.into_wgpu();
        assert_eq!(format, wgpu::TextureFormat::Rgba16Float);
    }
}
