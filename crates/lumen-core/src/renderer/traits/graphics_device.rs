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

use crate::math::Extent2D;
use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use crate::renderer::traits::CommandEncoder;
use std::fmt::Debug;

/// The device contract the frame pipeline drives.
///
/// Methods take `&self`: implementations keep their resource registries behind
/// interior mutability so one device can be shared by the host and the pipeline.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a new GPU texture.
    /// ## Errors
    /// * `ResourceError::InvalidExtent` - If a dimension is zero or above the device limit.
    /// * `ResourceError::IncompleteTarget` - If the texture cannot serve the requested usage.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError>;

    /// Destroys a GPU texture.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Size of mip level 0 of a live texture.
    fn texture_extent(&self, id: TextureId) -> Option<Extent2D>;

    /// Largest width or height accepted by [`GraphicsDevice::create_texture`].
    fn max_texture_dimension(&self) -> u32;

    /// Compiles and registers the program behind a stage, replacing any program
    /// previously registered under the same key.
    /// ## Errors
    /// * `ResourceError::PipelineCompilation` - If the program is rejected.
    fn create_stage_pipeline(
        &self,
        descriptor: &StagePipelineDescriptor,
    ) -> Result<(), ResourceError>;

    /// Whether a program is registered under `key`.
    fn has_stage_pipeline(&self, key: ShaderKey) -> bool;

    /// Allocates `slots * queries_per_slot` timestamp queries and their readback buffers.
    ///
    /// Returns `Ok(false)` when the device cannot record timestamps; callers
    /// then run without profiling.
    fn create_timestamp_queries(
        &self,
        slots: u32,
        queries_per_slot: u32,
    ) -> Result<bool, ResourceError>;

    /// Releases the timestamp queries, if any.
    fn destroy_timestamp_queries(&self);

    /// Nanoseconds per timestamp tick.
    fn timestamp_period_ns(&self) -> f32;

    /// Creates a new command encoder to record GPU commands.
    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder>;

    /// Submits a finished command buffer to the queue.
    fn submit_command_buffer(&self, command_buffer: CommandBufferId);

    /// Starts the asynchronous readback of `slot`, resolved by a command buffer
    /// that has already been submitted. `frame_tag` names the frame that wrote it.
    fn schedule_timestamp_readback(&self, slot: u32, frame_tag: u64);

    /// Reads the timestamps of `slot` if they belong to `frame_tag`.
    ///
    /// With [`ReadbackStrategy::Poll`] this never blocks. With
    /// [`ReadbackStrategy::BoundedWait`] it waits for the pending readback of
    /// that slot only.
    fn read_timestamps(
        &self,
        slot: u32,
        frame_tag: u64,
        strategy: ReadbackStrategy,
    ) -> TimestampReadback;
}
