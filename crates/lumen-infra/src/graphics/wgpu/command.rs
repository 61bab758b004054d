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

use lumen_core::renderer::{
    CommandBufferId, CommandEncoder, ComputeDispatch, FullscreenDraw, MemoryBarrier, TextureId,
};
use std::sync::Arc;

use super::device::{WgpuDevice, WgpuStagePipeline};
use super::profiler::WgpuTimestampQueries;

/// Records stage passes into a `wgpu::CommandEncoder`.
///
/// Every pass gets its own bind group 0: the parameter block at binding 0,
/// the inputs next, then the sampler (full-screen) or storage outputs (compute).
pub struct WgpuCommandEncoder {
    pub(crate) encoder: Option<wgpu::CommandEncoder>,
    pub(crate) device: WgpuDevice,
    pub(crate) timestamps: Option<Arc<WgpuTimestampQueries>>,
}

impl WgpuCommandEncoder {
    fn input_views(
        &self,
        label: &str,
        inputs: &[TextureId],
    ) -> Option<Vec<Arc<wgpu::TextureView>>> {
        inputs
            .iter()
            .map(|id| {
                let view = self.device.sample_view(*id);
                if view.is_none() {
                    log::warn!("WgpuCommandEncoder: '{label}' input {id:?} not found.");
                }
                view
            })
            .collect()
    }
}

impl CommandEncoder for WgpuCommandEncoder {
    fn dispatch_compute(&mut self, dispatch: &ComputeDispatch<'_>) {
        if self.encoder.is_none() {
            return;
        }
        let Some(WgpuStagePipeline::Compute(pipeline)) = self.device.stage_pipeline(dispatch.shader)
        else {
            log::warn!(
                "WgpuCommandEncoder: no compute pipeline for {:?}.",
                dispatch.shader
            );
            return;
        };
        let device = self.device.clone();
        let Some(inputs) = self.input_views(dispatch.label, dispatch.inputs) else {
            return;
        };
        let outputs: Option<Vec<_>> = dispatch
            .outputs
            .iter()
            .map(|id| device.target_view(*id))
            .collect();
        let Some(outputs) = outputs else {
            log::warn!("WgpuCommandEncoder: '{}' output not found.", dispatch.label);
            return;
        };

        let params = device.create_params_buffer(dispatch.label, &dispatch.params);
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: params.as_entire_binding(),
        }];
        for (i, view) in inputs.iter().chain(outputs.iter()).enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: i as u32 + 1,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }
        let bind_group = device
            .wgpu_device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(dispatch.label),
                layout: &pipeline.get_bind_group_layout(0),
                entries: &entries,
            });

        let Some(encoder) = self.encoder.as_mut() else {
            return;
        };
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(dispatch.label),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        let [x, y, z] = dispatch.workgroups;
        pass.dispatch_workgroups(x, y, z);
    }

    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>) {
        if self.encoder.is_none() {
            return;
        }
        let Some(WgpuStagePipeline::Fullscreen(pipeline)) = self.device.stage_pipeline(draw.shader)
        else {
            log::warn!(
                "WgpuCommandEncoder: no full-screen pipeline for {:?}.",
                draw.shader
            );
            return;
        };
        let device = self.device.clone();
        let Some(inputs) = self.input_views(draw.label, draw.inputs) else {
            return;
        };
        let Some(target) = device.target_view(draw.target) else {
            log::warn!(
                "WgpuCommandEncoder: '{}' target {:?} not found.",
                draw.label,
                draw.target
            );
            return;
        };

        let params = device.create_params_buffer(draw.label, &draw.params);
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: params.as_entire_binding(),
        }];
        for (i, view) in inputs.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: i as u32 + 1,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }
        entries.push(wgpu::BindGroupEntry {
            binding: inputs.len() as u32 + 1,
            resource: wgpu::BindingResource::Sampler(device.linear_sampler()),
        });
        let bind_group = device
            .wgpu_device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(draw.label),
                layout: &pipeline.get_bind_group_layout(0),
                entries: &entries,
            });

        let Some(encoder) = self.encoder.as_mut() else {
            return;
        };
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(draw.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target,
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

    fn memory_barrier(&mut self, barrier: MemoryBarrier) {
        // wgpu inserts the storage-to-sampled transition between passes itself.
        log::trace!("WgpuCommandEncoder: {barrier:?} barrier handled by wgpu.");
    }

    fn generate_mipmaps(&mut self, texture: TextureId) {
        let Some(encoder) = self.encoder.as_mut() else {
            return;
        };
        match self.device.mip_views(texture) {
            Some((format, views)) => {
                self.device
                    .mipmaps()
                    .generate(self.device.wgpu_device(), encoder, format, &views)
            }
            None => log::warn!("WgpuCommandEncoder: texture {texture:?} not found for mipmaps."),
        }
    }

    fn write_timestamp(&mut self, slot: u32, query_index: u32) {
        if let (Some(encoder), Some(queries)) = (self.encoder.as_mut(), &self.timestamps) {
            queries.write(encoder, slot, query_index);
        }
    }

    fn resolve_timestamps(&mut self, slot: u32, query_count: u32) -> bool {
        match (self.encoder.as_mut(), &self.timestamps) {
            (Some(encoder), Some(queries)) => queries.encode_resolve(encoder, slot, query_count),
            _ => false,
        }
    }

    fn finish(mut self: Box<Self>) -> CommandBufferId {
        let command_buffer = self
            .encoder
            .take()
            .map(|encoder| encoder.finish())
            .unwrap_or_else(|| {
                self.device
                    .wgpu_device()
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor::default())
                    .finish()
            });
        self.device.register_command_buffer(command_buffer)
    }
}
