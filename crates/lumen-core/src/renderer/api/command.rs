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

//! Defines data structures used for recording and describing GPU commands.

use crate::renderer::api::params::PassParams;
use crate::renderer::api::pipeline::ShaderKey;
use crate::renderer::api::texture::TextureId;

/// An opaque handle to a recorded command buffer that is ready for submission.
///
/// This ID is returned by [`CommandEncoder::finish`](crate::renderer::CommandEncoder::finish)
/// and consumed by [`GraphicsDevice::submit_command_buffer`](crate::renderer::GraphicsDevice::submit_command_buffer).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CommandBufferId(pub u64);

/// One compute dispatch of a stage program.
#[derive(Debug, Clone, Copy)]
pub struct ComputeDispatch<'a> {
    /// Debug label of the pass.
    pub label: &'a str,
    /// The program to run.
    pub shader: ShaderKey,
    /// Uniform block for this dispatch.
    pub params: PassParams,
    /// Sampled inputs, bound in order after the uniform block.
    pub inputs: &'a [TextureId],
    /// Storage images written by the program, bound after the inputs.
    pub outputs: &'a [TextureId],
    /// Workgroup counts in x, y, z.
    pub workgroups: [u32; 3],
}

/// One full-screen pass of a stage program, rendering into a single target.
#[derive(Debug, Clone, Copy)]
pub struct FullscreenDraw<'a> {
    /// Debug label of the pass.
    pub label: &'a str,
    /// The program to run.
    pub shader: ShaderKey,
    /// Uniform block for this draw.
    pub params: PassParams,
    /// Sampled inputs, bound in order after the uniform block.
    pub inputs: &'a [TextureId],
    /// The color attachment.
    pub target: TextureId,
}

/// An explicit synchronization point between two stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryBarrier {
    /// Makes unordered image writes of earlier passes visible to texture
    /// fetches and image loads of later passes.
    ShaderImageAccess,
}
