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

use lumen_core::math::Extent2D;
use lumen_core::renderer::{
    GraphicsDevice, TextureDescriptor, TextureFormat, TextureId, TextureUsage,
};

use super::{HistoryBuffer, PingPongTarget, PipelineError};

/// Format of every intermediate target.
pub const TARGET_FORMAT: TextureFormat = TextureFormat::Rgba16Float;

/// Every resolution-dependent texture of the pipeline, created and destroyed as one set.
///
/// A set is either fully created or not at all, which is what keeps a stage
/// from ever sampling a texture sized for another extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTargets {
    extent: Extent2D,
    /// Ray-traced HDR color.
    pub scene_color: TextureId,
    /// Geometry position buffer.
    pub position: TextureId,
    /// Geometry normal buffer.
    pub normal: TextureId,
    /// Ambient occlusion factor.
    pub ambient_occlusion: TextureId,
    /// Bright-pass and blur ping-pong.
    pub bloom: PingPongTarget,
    /// Bloom combine output.
    pub composite: TextureId,
    /// TAA history pair, with full mip chains.
    pub history: HistoryBuffer,
}

impl FrameTargets {
    /// Creates a complete set at `extent`.
    ///
    /// On failure every texture created so far is destroyed before returning.
    pub fn create(device: &dyn GraphicsDevice, extent: Extent2D) -> Result<Self, PipelineError> {
        let max = device.max_texture_dimension();
        if extent.is_empty() || extent.width > max || extent.height > max {
            return Err(PipelineError::InvalidExtent(extent));
        }

        let mut created = Vec::with_capacity(9);
        match Self::create_all(device, extent, &mut created) {
            Ok(targets) => {
                log::debug!("Created {} frame targets at {}.", created.len(), extent);
                Ok(targets)
            }
            Err(err) => {
                log::error!("Frame target creation failed at {extent}: {err}");
                for id in created {
                    if let Err(e) = device.destroy_texture(id) {
                        log::warn!("Failed to release {id:?} after setup failure: {e}");
                    }
                }
                Err(err)
            }
        }
    }

    fn create_all(
        device: &dyn GraphicsDevice,
        extent: Extent2D,
        created: &mut Vec<TextureId>,
    ) -> Result<Self, PipelineError> {
        let mut make = |label: &'static str, usage: TextureUsage, mips: bool| {
            let mut descriptor = TextureDescriptor::target(label, extent, TARGET_FORMAT, usage);
            if mips {
                descriptor = descriptor.with_full_mip_chain();
            }
            let id = device
                .create_texture(&descriptor)
                .map_err(|e| PipelineError::setup(label, e))?;
            created.push(id);
            Ok::<_, PipelineError>(id)
        };

        let scene_color = make("Scene Color", TextureUsage::STORAGE_TARGET, false)?;
        let position = make("Geometry Position", TextureUsage::STORAGE_TARGET, false)?;
        let normal = make("Geometry Normal", TextureUsage::STORAGE_TARGET, false)?;
        let ambient_occlusion = make("Ambient Occlusion", TextureUsage::STORAGE_TARGET, false)?;
        let bloom_ping = make("Bloom Ping", TextureUsage::COLOR_TARGET, false)?;
        let bloom_pong = make("Bloom Pong", TextureUsage::COLOR_TARGET, false)?;
        let composite = make("Composite", TextureUsage::COLOR_TARGET, false)?;
        let history_a = make("History A", TextureUsage::COLOR_TARGET, true)?;
        let history_b = make("History B", TextureUsage::COLOR_TARGET, true)?;

        Ok(Self {
            extent,
            scene_color,
            position,
            normal,
            ambient_occlusion,
            bloom: PingPongTarget::new(bloom_ping, bloom_pong),
            composite,
            history: HistoryBuffer::new(history_a, history_b),
        })
    }

    /// Size shared by every texture of the set.
    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    /// Every texture of the set.
    pub fn textures(&self) -> [TextureId; 9] {
        let [ping, pong] = self.bloom.textures();
        let [history_a, history_b] = self.history.textures();
        [
            self.scene_color,
            self.position,
            self.normal,
            self.ambient_occlusion,
            ping,
            pong,
            self.composite,
            history_a,
            history_b,
        ]
    }

    /// Destroys every texture of the set.
    pub fn destroy(&self, device: &dyn GraphicsDevice) {
        for id in self.textures() {
            if let Err(e) = device.destroy_texture(id) {
                log::warn!("Failed to destroy frame target {id:?}: {e}");
            }
        }
    }
}
