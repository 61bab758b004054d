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

//! Inputs supplied by the host every frame.

use serde::{Deserialize, Serialize};

/// Camera parameters passed through to the ray-tracing program unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    /// World-space eye position.
    pub position: [f32; 3],
    /// Normalized view direction.
    pub forward: [f32; 3],
    /// Normalized up vector.
    pub up: [f32; 3],
    /// Normalized right vector.
    pub right: [f32; 3],
    /// Vertical field of view, in degrees.
    pub fov_degrees: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 3.0],
            forward: [0.0, 0.0, -1.0],
            up: [0.0, 1.0, 0.0],
            right: [1.0, 0.0, 0.0],
            fov_degrees: 45.0,
        }
    }
}

/// The scene as seen by the frame pipeline: counts and a camera, never the data itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneInputs {
    /// Number of primitives in the scene buffers.
    pub object_count: u32,
    /// Number of lights in the scene buffers.
    pub light_count: u32,
    /// The camera for this frame.
    pub camera: CameraParams,
}

/// Everything the host provides to render one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInputs {
    /// Scene counts and camera.
    pub scene: SceneInputs,
    /// Host wall-clock duration of the previous frame, in milliseconds.
    pub cpu_frame_time_ms: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_scene_keeps_default_camera() {
        let scene: SceneInputs = ron::from_str("(object_count: 12, light_count: 2)")
            .expect("partial scene should parse");
        assert_eq!(scene.object_count, 12);
        assert_eq!(scene.light_count, 2);
        assert_eq!(scene.camera, CameraParams::default());
    }
}
