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

/// Traces the scene into the color and geometry targets.
///
/// The dispatch receives the camera, the scene counts and the TAA jitter; the
/// shading itself lives entirely in the registered program.
#[derive(Debug, Default, Clone, Copy)]
pub struct RayTraceStage;

impl RenderStage for RayTraceStage {
    fn id(&self) -> GpuStage {
        GpuStage::RayTrace
    }

    fn label(&self) -> &'static str {
        "Ray Trace"
    }

    fn shader(&self) -> ShaderKey {
        ShaderKey::RayTrace
    }

    fn inputs(&self) -> &'static [ResourceRole] {
        &[]
    }

    fn outputs(&self) -> &'static [ResourceRole] {
        &[
            ResourceRole::SceneColor,
            ResourceRole::GeometryPosition,
            ResourceRole::GeometryNormal,
        ]
    }

    fn execute(&self, ctx: &mut StageContext<'_>) {
        let params = ctx.params;
        ctx.dispatch_compute(self, params, WORKGROUP_TILE);
    }
}
