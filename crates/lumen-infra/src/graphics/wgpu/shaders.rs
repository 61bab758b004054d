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

//! WGSL sources of the six stage programs.

use lumen_core::renderer::{GraphicsDevice, ResourceError, ShaderKey, StagePipelineDescriptor};

/// Returns the WGSL source registered for `key`.
pub fn source(key: ShaderKey) -> &'static str {
    match key {
        ShaderKey::RayTrace => include_str!("../../../shaders/ray_trace.wgsl"),
        ShaderKey::AmbientOcclusion => include_str!("../../../shaders/ambient_occlusion.wgsl"),
        ShaderKey::BloomExtract => include_str!("../../../shaders/bloom_extract.wgsl"),
        ShaderKey::BloomBlur => include_str!("../../../shaders/bloom_blur.wgsl"),
        ShaderKey::BloomCombine => include_str!("../../../shaders/bloom_combine.wgsl"),
        ShaderKey::TemporalResolve => include_str!("../../../shaders/temporal_resolve.wgsl"),
    }
}

fn label(key: ShaderKey) -> &'static str {
    match key {
        ShaderKey::RayTrace => "Ray Trace Program",
        ShaderKey::AmbientOcclusion => "Ambient Occlusion Program",
        ShaderKey::BloomExtract => "Bloom Extract Program",
        ShaderKey::BloomBlur => "Bloom Blur Program",
        ShaderKey::BloomCombine => "Bloom Combine Program",
        ShaderKey::TemporalResolve => "Temporal Resolve Program",
    }
}

/// Compiles and registers every stage program on `device`.
///
/// Stops at the first program that fails; programs registered before it stay
/// registered.
pub fn register_stage_programs(device: &dyn GraphicsDevice) -> Result<(), ResourceError> {
    for key in ShaderKey::ALL {
        let descriptor = StagePipelineDescriptor::new(key, source(key)).with_label(label(key));
        device.create_stage_pipeline(&descriptor)?;
    }
    log::info!("Registered {} stage programs.", ShaderKey::ALL.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::renderer::{
        PassKind, COMPUTE_ENTRY_POINT, FULLSCREEN_FRAGMENT_ENTRY_POINT,
        FULLSCREEN_VERTEX_ENTRY_POINT,
    };

    #[test]
    fn every_program_declares_its_entry_points() {
        for key in ShaderKey::ALL {
            let wgsl = source(key);
            match key.pass_kind() {
                PassKind::Compute => {
                    assert!(wgsl.contains(&format!("fn {COMPUTE_ENTRY_POINT}(")), "{key:?}");
                    assert!(wgsl.contains("@workgroup_size(16, 16, 1)"), "{key:?}");
                }
                PassKind::Fullscreen => {
                    assert!(wgsl.contains(&format!("fn {FULLSCREEN_VERTEX_ENTRY_POINT}(")));
                    assert!(wgsl.contains(&format!("fn {FULLSCREEN_FRAGMENT_ENTRY_POINT}(")));
                }
            }
        }
    }

    #[test]
    fn every_program_binds_the_parameter_block_first() {
        for key in ShaderKey::ALL {
            assert!(
                source(key).contains("@group(0) @binding(0) var<uniform> params: PassParams;"),
                "{key:?}"
            );
        }
    }
}
