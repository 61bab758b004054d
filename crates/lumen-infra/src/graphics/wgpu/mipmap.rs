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

//! Mip chain generation by successive 2x2 box downsampling.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

const DOWNSAMPLE_WGSL: &str = r#"
@group(0) @binding(0) var source: texture_2d<f32>;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    return vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
}

@fragment
fn fs_main(@builtin(position) frag: vec4<f32>) -> @location(0) vec4<f32> {
    let last = vec2<i32>(textureDimensions(source)) - vec2<i32>(1);
    let base = vec2<i32>(frag.xy) * 2;
    var sum = vec4<f32>(0.0);
    for (var y = 0; y < 2; y++) {
        for (var x = 0; x < 2; x++) {
            sum += textureLoad(source, min(base + vec2<i32>(x, y), last), 0);
        }
    }
    return sum * 0.25;
}
"#;

/// Builds and caches one downsample pipeline per color format.
#[derive(Debug, Default)]
pub(crate) struct MipmapGenerator {
    pipelines: Mutex<HashMap<wgpu::TextureFormat, Arc<wgpu::RenderPipeline>>>,
}

impl MipmapGenerator {
    fn pipeline(
        &self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> Arc<wgpu::RenderPipeline> {
        let mut pipelines = self.pipelines.lock().unwrap_or_else(PoisonError::into_inner);
        pipelines
            .entry(format)
            .or_insert_with(|| {
                log::debug!("Creating mipmap pipeline for {format:?}.");
                let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("Lumen Mipmap Shader"),
                    source: wgpu::ShaderSource::Wgsl(DOWNSAMPLE_WGSL.into()),
                });
                Arc::new(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("Lumen Mipmap Pipeline"),
                    layout: None,
                    vertex: wgpu::VertexState {
                        module: &module,
                        entry_point: Some("vs_main"),
                        buffers: &[],
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &module,
                        entry_point: Some("fs_main"),
                        targets: &[Some(format.into())],
                        compilation_options: Default::default(),
                    }),
                    primitive: wgpu::PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview_mask: None,
                    cache: None,
                }))
            })
            .clone()
    }

    /// Fills levels `1..` of `mip_views` from level 0.
    pub(crate) fn generate(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        format: wgpu::TextureFormat,
        mip_views: &[Arc<wgpu::TextureView>],
    ) {
        if mip_views.len() < 2 {
            return;
        }
        let pipeline = self.pipeline(device, format);
        let layout = pipeline.get_bind_group_layout(0);

        for level in 1..mip_views.len() {
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Lumen Mipmap Bind Group"),
                layout: &layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&mip_views[level - 1]),
                }],
            });
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Lumen Mipmap Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &mip_views[level],
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                ..Default::default()
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}
