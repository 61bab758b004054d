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

use lumen_core::math::Extent2D;
use lumen_core::renderer::{InvalidSetting, ResourceError};
use thiserror::Error;

use super::PipelineState;

/// Errors surfaced by [`FramePipeline`](super::FramePipeline).
///
/// Only construction and resize fail. Steady-state problems such as timestamps
/// that are not ready yet are absorbed into `FrameStats` instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A GPU object could not be created. Nothing created before the failure survives.
    #[error("Failed to create {resource}: {source}")]
    Setup {
        /// What was being created.
        resource: String,
        /// The device error.
        #[source]
        source: ResourceError,
    },

    /// One of the six stage programs has not been registered. All of them are
    /// required, including those of disabled stages.
    #[error("No program registered for stage '{0}'")]
    MissingStageProgram(&'static str),

    /// The requested target size is zero or exceeds the device limit.
    #[error("Invalid target extent {0}")]
    InvalidExtent(Extent2D),

    /// The settings failed validation.
    #[error(transparent)]
    InvalidSettings(#[from] InvalidSetting),

    /// The operation is not allowed in the current state.
    #[error("Operation not allowed while the pipeline is {0:?}")]
    NotReady(PipelineState),
}

impl PipelineError {
    pub(crate) fn setup(resource: impl Into<String>, source: ResourceError) -> Self {
        PipelineError::Setup {
            resource: resource.into(),
            source,
        }
    }
}
