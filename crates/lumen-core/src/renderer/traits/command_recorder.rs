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

use crate::renderer::api::{
    CommandBufferId, ComputeDispatch, FullscreenDraw, MemoryBarrier, TextureId,
};

/// A trait for an object that records the commands of one frame.
///
/// Each call records exactly one GPU operation. Passes are opened and closed by
/// the implementation, so a stage never holds a pass object across calls.
pub trait CommandEncoder {
    /// Records one compute dispatch.
    fn dispatch_compute(&mut self, dispatch: &ComputeDispatch<'_>);

    /// Records one full-screen pass rendering into `draw.target`.
    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>);

    /// Records an explicit synchronization point.
    fn memory_barrier(&mut self, barrier: MemoryBarrier);

    /// Regenerates every mip level of `texture` from level 0.
    fn generate_mipmaps(&mut self, texture: TextureId);

    /// Writes a GPU timestamp into query `query_index` of `slot`.
    fn write_timestamp(&mut self, slot: u32, query_index: u32);

    /// Resolves the first `query_count` queries of `slot` and copies them to the
    /// slot's readback buffer.
    ///
    /// Returns `false` when the readback buffer is still in use by an earlier
    /// readback, in which case nothing was recorded.
    fn resolve_timestamps(&mut self, slot: u32, query_count: u32) -> bool;

    /// Finalizes the command recording and returns a handle to the resulting command buffer.
    fn finish(self: Box<Self>) -> CommandBufferId;
}
