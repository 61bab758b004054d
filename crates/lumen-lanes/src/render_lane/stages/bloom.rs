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

//! Bloom: bright-pass extraction, separable blur and compositing.

use lumen_core::renderer::{GpuStage, ShaderKey};

use crate::render_lane::{RenderStage, ResourceRole, StageContext};

/// Thresholds the scene color into the bloom ping-pong seed.
#[derive(Debug, Clone, Copy)]
pub struct BloomExtractStage {
    /// Luminance above which a texel is kept.
    pub threshold: f32,
}

impl Default for BloomExtractStage {
    fn default() -> Self {
        Self { threshold: 1.0 }
    }
}

impl RenderStage for BloomExtractStage {
    fn id(&self) -> GpuStage {
        GpuStage::BloomExtract
    }

    fn label(&self) -> &'static str {
        "Bloom Extract"
    }

    fn shader(&self) -> ShaderKey {
        ShaderKey::BloomExtract
    }

    fn inputs(&self) -> &'static [ResourceRole] {
        &[ResourceRole::SceneColor]
    }

    fn outputs(&self) -> &'static [ResourceRole] {
        &[ResourceRole::BloomWrite]
    }

    fn execute(&self, ctx: &mut StageContext<'_>) {
        let mut params = ctx.params;
        params.bloom_threshold = self.threshold;
        ctx.draw_fullscreen(self, params);
    }
}

/// Direction of one blur pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurAxis {
    /// Samples along x.
    Horizontal,
    /// Samples along y.
    Vertical,
}

impl BlurAxis {
    /// Even passes blur horizontally, odd passes vertically.
    pub const fn for_iteration(iteration: u32) -> Self {
        if iteration % 2 == 0 {
            BlurAxis::Horizontal
        } else {
            BlurAxis::Vertical
        }
    }
}

/// One pass of the separable Gaussian blur. The orchestrator runs it once per
/// iteration, flipping the ping-pong target in between.
#[derive(Debug, Default, Clone, Copy)]
pub struct BloomBlurStage;

impl RenderStage for BloomBlurStage {
    fn id(&self) -> GpuStage {
        GpuStage::BloomBlur
    }

    fn label(&self) -> &'static str {
        "Bloom Blur"
    }

    fn shader(&self) -> ShaderKey {
        ShaderKey::BloomBlur
    }

    fn inputs(&self) -> &'static [ResourceRole] {
        &[ResourceRole::BloomRead]
    }

    fn outputs(&self) -> &'static [ResourceRole] {
        &[ResourceRole::BloomWrite]
    }

    fn execute(&self, ctx: &mut StageContext<'_>) {
        let mut params = ctx.params;
        params.horizontal = (BlurAxis::for_iteration(ctx.iteration) == BlurAxis::Horizontal) as u32;
        ctx.draw_fullscreen(self, params);
    }
}

/// Adds the blurred bright pass to the scene color and applies ambient occlusion.
///
/// The program computes `color * mix(1, ao, ao_strength) + bloom * strength`,
/// so an `ao_strength` of zero leaves the color untouched whatever the AO
/// texture holds.
#[derive(Debug, Clone, Copy)]
pub struct BloomCombineStage {
    /// Weight of the blurred bright pass.
    pub strength: f32,
    /// AO darkening strength. Zero when the AO stage is disabled.
    pub ao_strength: f32,
}

impl Default for BloomCombineStage {
    fn default() -> Self {
        Self {
            strength: 0.5,
            ao_strength: 1.0,
        }
    }
}

impl RenderStage for BloomCombineStage {
    fn id(&self) -> GpuStage {
        GpuStage::BloomCombine
    }

    fn label(&self) -> &'static str {
        "Bloom Combine"
    }

    fn shader(&self) -> ShaderKey {
        ShaderKey::BloomCombine
    }

    fn inputs(&self) -> &'static [ResourceRole] {
        &[
            ResourceRole::SceneColor,
            ResourceRole::BloomRead,
            ResourceRole::AmbientOcclusion,
        ]
    }

    fn outputs(&self) -> &'static [ResourceRole] {
        &[ResourceRole::Composite]
    }

    fn execute(&self, ctx: &mut StageContext<'_>) {
        let mut params = ctx.params;
        params.bloom_strength = self.strength;
        params.ao_strength = self.ao_strength;
        ctx.draw_fullscreen(self, params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::renderer::PassKind;

    #[test]
    fn blur_alternates_starting_horizontal() {
        let axes: Vec<_> = (0..4).map(BlurAxis::for_iteration).collect();
        assert_eq!(
            axes,
            [
                BlurAxis::Horizontal,
                BlurAxis::Vertical,
                BlurAxis::Horizontal,
                BlurAxis::Vertical
            ]
        );
    }

    #[test]
    fn bloom_stages_are_fullscreen_and_ordered() {
        let stages: [&dyn RenderStage; 3] = [
            &BloomExtractStage::default(),
            &BloomBlurStage,
            &BloomCombineStage::default(),
        ];
        for stage in stages {
            assert_eq!(stage.pass_kind(), PassKind::Fullscreen);
            assert!(!stage.writes_unordered());
        }
        assert!(GpuStage::BloomExtract < GpuStage::BloomBlur);
        assert!(GpuStage::BloomBlur < GpuStage::BloomCombine);
    }
}
