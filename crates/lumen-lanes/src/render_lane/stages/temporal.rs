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

use crate::render_lane::{RenderStage, ResourceRole, StageContext};

/// Blends the composite with the previous frame's history into the current
/// history texture, then rebuilds that texture's mip chain for next frame.
#[derive(Debug, Clone, Copy)]
pub struct TemporalResolveStage {
    /// Weight of the history, in `[0, 1]`.
    pub blend_factor: f32,
}

impl Default for TemporalResolveStage {
    fn default() -> Self {
        Self { blend_factor: 0.9 }
    }
}

impl RenderStage for TemporalResolveStage {
    fn id(&self) -> GpuStage {
        GpuStage::TemporalResolve
    }

    fn label(&self) -> &'static str {
        "Temporal Resolve"
    }

    fn shader(&self) -> ShaderKey {
        ShaderKey::TemporalResolve
    }

    fn inputs(&self) -> &'static [ResourceRole] {
        &[ResourceRole::Composite, ResourceRole::HistoryPrevious]
    }

    fn outputs(&self) -> &'static [ResourceRole] {
        &[ResourceRole::HistoryCurrent]
    }

    fn execute(&self, ctx: &mut StageContext<'_>) {
        let mut params = ctx.params;
        params.taa_blend = self.blend_factor;
        ctx.draw_fullscreen(self, params);
        if let Some(current) = ctx.bindings.get(ResourceRole::HistoryCurrent) {
            ctx.encoder.generate_mipmaps(current);
        }
    }
}
