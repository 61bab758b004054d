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

//! Defines the descriptors used to register the program backing each render stage.

use std::borrow::Cow;

/// Entry point of a compute stage program.
pub const COMPUTE_ENTRY_POINT: &str = "cs_main";
/// Vertex entry point of a full-screen stage program.
pub const FULLSCREEN_VERTEX_ENTRY_POINT: &str = "vs_main";
/// Fragment entry point of a full-screen stage program.
pub const FULLSCREEN_FRAGMENT_ENTRY_POINT: &str = "fs_main";

/// Identifies the program a stage runs. Programs are opaque to the pipeline and
/// registered by the host before the pipeline is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderKey {
    /// The scene ray-tracing compute program.
    RayTrace,
    /// The screen-space ambient occlusion compute program.
    AmbientOcclusion,
    /// The bright-pass threshold program.
    BloomExtract,
    /// The separable Gaussian blur program.
    BloomBlur,
    /// The bloom and ambient occlusion compositing program.
    BloomCombine,
    /// The temporal anti-aliasing resolve program.
    TemporalResolve,
}

impl ShaderKey {
    /// All program keys, in frame order.
    pub const ALL: [ShaderKey; 6] = [
        ShaderKey::RayTrace,
        ShaderKey::AmbientOcclusion,
        ShaderKey::BloomExtract,
        ShaderKey::BloomBlur,
        ShaderKey::BloomCombine,
        ShaderKey::TemporalResolve,
    ];

    /// The kind of pass this program is written for.
    pub const fn pass_kind(&self) -> PassKind {
        match self {
            ShaderKey::RayTrace | ShaderKey::AmbientOcclusion => PassKind::Compute,
            _ => PassKind::Fullscreen,
        }
    }
}

/// How a stage issues its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// A compute dispatch writing storage images.
    Compute,
    /// A full-screen triangle rendered into a single color attachment.
    Fullscreen,
}

/// A descriptor used to register a stage program with the device.
#[derive(Debug, Clone)]
pub struct StagePipelineDescriptor<'a> {
    /// The stage program being registered.
    pub key: ShaderKey,
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The kind of pass the program is written for.
    pub kind: PassKind,
    /// Program source in the backend's shading language.
    pub source: Cow<'a, str>,
}

impl<'a> StagePipelineDescriptor<'a> {
    /// Builds a descriptor whose pass kind is derived from the key.
    pub fn new(key: ShaderKey, source: impl Into<Cow<'a, str>>) -> Self {
        Self {
            key,
            label: None,
            kind: key.pass_kind(),
            source: source.into(),
        }
    }

    /// Sets the debug label.
    pub fn with_label(mut self, label: impl Into<Cow<'a, str>>) -> Self {
        self.label = Some(label.into());
        self
    }
}
