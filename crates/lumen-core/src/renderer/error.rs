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

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::math::Extent2D;
use crate::renderer::api::pipeline::ShaderKey;
use std::fmt;

/// An error related to the creation or use of a GPU resource (textures, pipelines, queries).
#[derive(Debug)]
pub enum ResourceError {
    /// The resource could not be found in the device registry.
    NotFound,
    /// The requested size is zero or exceeds the device limits.
    InvalidExtent {
        /// The requested size.
        requested: Extent2D,
        /// The largest 2D dimension the device supports.
        max_dimension: u32,
    },
    /// The texture cannot be used as a render or storage target (the
    /// equivalent of an incomplete framebuffer).
    IncompleteTarget {
        /// A descriptive label for the target.
        label: String,
        /// Backend-provided details.
        details: String,
    },
    /// The stage program failed to compile into a backend pipeline.
    PipelineCompilation {
        /// The stage program that failed.
        key: ShaderKey,
        /// Detailed error messages from the backend compiler.
        details: String,
    },
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidExtent {
                requested,
                max_dimension,
            } => write!(
                f,
                "Invalid texture extent {requested} (each dimension must be within 1..={max_dimension})"
            ),
            ResourceError::IncompleteTarget { label, details } => {
                write!(f, "Render target '{label}' is incomplete: {details}")
            }
            ResourceError::PipelineCompilation { key, details } => {
                write!(f, "Stage pipeline {key:?} failed to compile: {details}")
            }
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_error_display() {
        let err = ResourceError::InvalidExtent {
            requested: Extent2D::new(0, 768),
            max_dimension: 8192,
        };
        assert_eq!(
            format!("{err}"),
            "Invalid texture extent 0x768 (each dimension must be within 1..=8192)"
        );

        let err = ResourceError::IncompleteTarget {
            label: "Bloom Ping".to_string(),
            details: "format not renderable".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Render target 'Bloom Ping' is incomplete: format not renderable"
        );
    }
}
