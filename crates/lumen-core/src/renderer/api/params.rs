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

//! The uniform block shared by every stage program.

use crate::math::Extent2D;
use crate::renderer::api::scene::SceneInputs;
use bytemuck::{Pod, Zeroable};

/// Per-pass uniform parameters, laid out to match the `PassParams` block of the
/// stage programs (std140-compatible, 128 bytes).
///
/// Every stage receives the same block; each program reads the fields it needs.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PassParams {
    /// Camera position in `xyz`, vertical field of view in degrees in `w`.
    pub camera_position: [f32; 4],
    /// Camera forward vector in `xyz`.
    pub camera_forward: [f32; 4],
    /// Camera up vector in `xyz`.
    pub camera_up: [f32; 4],
    /// Camera right vector in `xyz`.
    pub camera_right: [f32; 4],
    /// Sub-pixel jitter in normalized device units. Zero when TAA is off.
    pub jitter: [f32; 2],
    /// `1 / extent` of the targets of this frame.
    pub texel_size: [f32; 2],
    /// Number of scene primitives.
    pub object_count: u32,
    /// Number of scene lights.
    pub light_count: u32,
    /// Frame index truncated to 32 bits.
    pub frame_index: u32,
    /// `1` for a horizontal blur iteration, `0` for vertical.
    pub horizontal: u32,
    /// Luminance above which a texel contributes to bloom.
    pub bloom_threshold: f32,
    /// Weight of the blurred bright pass in the composite.
    pub bloom_strength: f32,
    /// How strongly the AO factor darkens the composite. Zero makes AO neutral.
    pub ao_strength: f32,
    /// Weight of the history buffer in the temporal resolve.
    pub taa_blend: f32,
    /// `1` when the previous history buffer holds last frame's output.
    pub history_valid: u32,
    /// Occlusion taps per pixel of the AO stage.
    pub ao_samples: u32,
    /// World-space occlusion radius of the AO stage.
    pub ao_radius: f32,
    /// Padding up to a 16-byte multiple.
    pub _padding: u32,
}

impl PassParams {
    /// Builds the frame-constant part of the block from the host inputs.
    pub fn for_frame(scene: &SceneInputs, frame_index: u64, extent: Extent2D) -> Self {
        let camera = &scene.camera;
        let [px, py, pz] = camera.position;
        let [fx, fy, fz] = camera.forward;
        let [ux, uy, uz] = camera.up;
        let [rx, ry, rz] = camera.right;
        Self {
            camera_position: [px, py, pz, camera.fov_degrees],
            camera_forward: [fx, fy, fz, 0.0],
            camera_up: [ux, uy, uz, 0.0],
            camera_right: [rx, ry, rz, 0.0],
            texel_size: extent.texel_size(),
            object_count: scene.object_count,
            light_count: scene.light_count,
            frame_index: frame_index as u32,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_params_layout_is_uniform_friendly() {
        assert_eq!(std::mem::size_of::<PassParams>(), 128);
        assert_eq!(std::mem::size_of::<PassParams>() % 16, 0);
    }

    #[test]
    fn for_frame_packs_camera_and_counts() {
        let scene = SceneInputs {
            object_count: 12,
            light_count: 3,
            ..Default::default()
        };
        let params = PassParams::for_frame(&scene, 7, Extent2D::new(800, 400));
        assert_eq!(params.camera_position[3], 45.0);
        assert_eq!(params.object_count, 12);
        assert_eq!(params.light_count, 3);
        assert_eq!(params.frame_index, 7);
        assert_eq!(params.texel_size, [1.0 / 800.0, 1.0 / 400.0]);
        assert_eq!(params.jitter, [0.0, 0.0]);
        assert_eq!(bytemuck::bytes_of(&params).len(), 128);
    }
}
