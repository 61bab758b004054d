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

//! The six stages of a frame, in execution order.

mod ambient_occlusion;
mod bloom;
mod ray_trace;
mod temporal;

pub use ambient_occlusion::AmbientOcclusionStage;
pub use bloom::{BlurAxis, BloomBlurStage, BloomCombineStage, BloomExtractStage};
pub use ray_trace::RayTraceStage;
pub use temporal::TemporalResolveStage;

/// Side of the square tile covered by one compute workgroup.
pub const WORKGROUP_TILE: u32 = 16;
