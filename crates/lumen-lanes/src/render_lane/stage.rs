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

//! The render stage abstraction and the context a stage executes in.

use lumen_core::math::Extent2D;
use lumen_core::renderer::{
    CommandEncoder, ComputeDispatch, FullscreenDraw, GpuStage, PassKind, PassParams, ShaderKey,
    TextureId,
};

/// A logical resource a stage reads or writes, resolved to a physical texture
/// by the orchestrator for each pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRole {
    /// HDR output of the ray-tracing dispatch.
    SceneColor,
    /// World-space position written alongside the scene color.
    GeometryPosition,
    /// World-space normal written alongside the scene color.
    GeometryNormal,
    /// Ambient occlusion factor.
    AmbientOcclusion,
    /// The bloom ping-pong side sampled by the current pass.
    BloomRead,
    /// The bloom ping-pong side rendered by the current pass.
    BloomWrite,
    /// Scene color with bloom and AO applied.
    Composite,
    /// The history texture written by the previous frame.
    HistoryPrevious,
    /// The history texture written by the current frame.
    HistoryCurrent,
}

impl ResourceRole {
    /// Number of roles.
    pub const COUNT: usize = 9;

    const fn index(self) -> usize {
        self as usize
    }
}

/// Role to texture assignments for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleBindings {
    textures: [Option<TextureId>; ResourceRole::COUNT],
}

impl RoleBindings {
    /// Assigns `texture` to `role`, replacing any previous assignment.
    pub fn bind(&mut self, role: ResourceRole, texture: TextureId) {
        self.textures[role.index()] = Some(texture);
    }

    /// Returns a copy with `role` assigned to `texture`.
    pub fn with(mut self, role: ResourceRole, texture: TextureId) -> Self {
        self.bind(role, texture);
        self
    }

    /// The texture bound to `role`.
    pub fn get(&self, role: ResourceRole) -> Option<TextureId> {
        self.textures[role.index()]
    }

    /// Resolves `roles` in order, or reports the first unbound role.
    pub fn resolve(&self, roles: &[ResourceRole]) -> Result<Vec<TextureId>, ResourceRole> {
        roles
            .iter()
            .map(|&role| self.get(role).ok_or(role))
            .collect()
    }
}

/// Everything a stage needs to record its pass.
pub struct StageContext<'a> {
    /// Encoder of the current frame.
    pub encoder: &'a mut dyn CommandEncoder,
    /// Physical textures for the roles of this pass.
    pub bindings: RoleBindings,
    /// Frame-constant uniform values. Stages fill in their own scalars on a copy.
    pub params: PassParams,
    /// Size of every target of this frame.
    pub extent: Extent2D,
    /// Index of the pass within a multi-pass stage, `0` otherwise.
    pub iteration: u32,
}

impl<'a> StageContext<'a> {
    /// Creates a context for the first pass of a stage.
    pub fn new(
        encoder: &'a mut dyn CommandEncoder,
        bindings: RoleBindings,
        params: PassParams,
        extent: Extent2D,
    ) -> Self {
        Self {
            encoder,
            bindings,
            params,
            extent,
            iteration: 0,
        }
    }

    fn resolve(&self, stage: &dyn RenderStage, roles: &[ResourceRole]) -> Option<Vec<TextureId>> {
        match self.bindings.resolve(roles) {
            Ok(textures) => Some(textures),
            Err(role) => {
                log::error!(
                    "Stage '{}' has no texture bound for {:?}, pass skipped.",
                    stage.label(),
                    role
                );
                None
            }
        }
    }

    /// Records the compute dispatch of `stage`, covering the extent with
    /// `tile`x`tile` workgroups.
    pub fn dispatch_compute(&mut self, stage: &dyn RenderStage, params: PassParams, tile: u32) {
        let (Some(inputs), Some(outputs)) = (
            self.resolve(stage, stage.inputs()),
            self.resolve(stage, stage.outputs()),
        ) else {
            return;
        };
        self.encoder.dispatch_compute(&ComputeDispatch {
            label: stage.label(),
            shader: stage.shader(),
            params,
            inputs: &inputs,
            outputs: &outputs,
            workgroups: self.extent.workgroups(tile),
        });
    }

    /// Records the full-screen pass of `stage` into its single output.
    pub fn draw_fullscreen(&mut self, stage: &dyn RenderStage, params: PassParams) {
        let (Some(inputs), Some(outputs)) = (
            self.resolve(stage, stage.inputs()),
            self.resolve(stage, stage.outputs()),
        ) else {
            return;
        };
        let Some(&target) = outputs.first() else {
            log::error!("Stage '{}' declares no output, pass skipped.", stage.label());
            return;
        };
        self.encoder.draw_fullscreen(&FullscreenDraw {
            label: stage.label(),
            shader: stage.shader(),
            params,
            inputs: &inputs,
            target,
        });
    }
}

/// One GPU pass of the frame.
///
/// A stage declares what it reads and writes by role and records exactly one
/// dispatch or full-screen pass. Timer queries and barriers belong to the
/// orchestrator, so a stage can be driven by any [`StageContext`].
pub trait RenderStage: Send + Sync {
    /// The timer section this stage is measured under.
    fn id(&self) -> GpuStage;

    /// Debug label of the pass.
    fn label(&self) -> &'static str;

    /// The program this stage runs.
    fn shader(&self) -> ShaderKey;

    /// How the stage issues its work.
    fn pass_kind(&self) -> PassKind {
        self.shader().pass_kind()
    }

    /// Roles sampled by the pass, in binding order.
    fn inputs(&self) -> &'static [ResourceRole];

    /// Roles written by the pass, in binding order.
    fn outputs(&self) -> &'static [ResourceRole];

    /// Whether the outputs are written through unordered image stores, which
    /// requires a barrier before any later stage samples them.
    fn writes_unordered(&self) -> bool {
        self.pass_kind() == PassKind::Compute
    }

    /// Records the pass.
    fn execute(&self, ctx: &mut StageContext<'_>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_resolve_in_declared_order() {
        let bindings = RoleBindings::default()
            .with(ResourceRole::GeometryNormal, TextureId(2))
            .with(ResourceRole::GeometryPosition, TextureId(1));
        let resolved = bindings
            .resolve(&[ResourceRole::GeometryPosition, ResourceRole::GeometryNormal])
            .unwrap();
        assert_eq!(resolved, vec![TextureId(1), TextureId(2)]);
    }

    #[test]
    fn missing_binding_reports_the_role() {
        let bindings = RoleBindings::default().with(ResourceRole::SceneColor, TextureId(0));
        assert_eq!(
            bindings.resolve(&[ResourceRole::SceneColor, ResourceRole::BloomRead]),
            Err(ResourceRole::BloomRead)
        );
    }
}
