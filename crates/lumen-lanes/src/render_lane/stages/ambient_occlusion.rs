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

use lumen_core::renderer::{GpuStage, ShaderKey};

use super::WORKGROUP_TILE;
use crate::render_lane::{RenderStage, ResourceRole, StageContext};

/// Resolves an ambient occlusion factor from the geometry targets.
///
/// The factor is written unweighted. Strength is applied by the combine stage.
#[derive(Debug, Clone, Copy)]
pub struct AmbientOcclusionStage {
    /// Occlusion taps per pixel.
    pub samples: u32,
    /// World-space occlusion radius.
    pub radius: f32,
}

impl Default for AmbientOcclusionStage {
    fn default() -> Self {
        Self {
            samples: 12,
            radius: 1.0,
        }
    }
}

impl RenderStage for AmbientOcclusionStage {
    fn id(&self) -> GpuStage {
        GpuStage::AoResolve
    }

    fn label(&self) -> &'static str {
        "Ambient Occlusion"
    }

    fn shader(&self) -> ShaderKey {
        ShaderKey::AmbientOcclusion
    }

    fn inputs(&self) -> &'static [ResourceRole] {
        &[ResourceRole::GeometryPosition, ResourceRole::GeometryNormal]
    }

    fn outputs(&self) -> &'static [ResourceRole] {
        &[ResourceRole::AmbientOcclusion]
    }

    fn execute(&self, ctx: &mut StageContext<'_>) {
        let mut params = ctx.params;
        params.ao_samples = self.samples;
        params.ao_radius = self.radius;
        ctx.dispatch_compute(self, params, WORKGROUP_TILE);
    }
}
