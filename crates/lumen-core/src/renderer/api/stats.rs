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

//! Per-frame performance statistics produced by the frame pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The timed GPU stages of a frame, in their fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GpuStage {
    /// Scene ray-tracing dispatch.
    RayTrace = 0,
    /// Ambient occlusion resolve.
    AoResolve = 1,
    /// Bloom bright-pass extraction.
    BloomExtract = 2,
    /// Every iteration of the bloom blur, timed as one section.
    BloomBlur = 3,
    /// Bloom and AO compositing.
    BloomCombine = 4,
    /// Temporal anti-aliasing resolve.
    TemporalResolve = 5,
}

impl GpuStage {
    /// Number of stages.
    pub const COUNT: usize = 6;

    /// All stages, in execution order.
    pub const ALL: [GpuStage; Self::COUNT] = [
        GpuStage::RayTrace,
        GpuStage::AoResolve,
        GpuStage::BloomExtract,
        GpuStage::BloomBlur,
        GpuStage::BloomCombine,
        GpuStage::TemporalResolve,
    ];

    /// Position of the stage in the execution order.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Index of the start timestamp within a query slot.
    pub const fn start_query(self) -> u32 {
        2 * self as u32
    }

    /// Index of the end timestamp within a query slot.
    pub const fn end_query(self) -> u32 {
        2 * self as u32 + 1
    }

    /// Human readable name used in logs and panels.
    pub const fn label(self) -> &'static str {
        match self {
            GpuStage::RayTrace => "Ray Tracing",
            GpuStage::AoResolve => "Ambient Occlusion",
            GpuStage::BloomExtract => "Bloom Extract",
            GpuStage::BloomBlur => "Bloom Blur",
            GpuStage::BloomCombine => "Bloom Combine",
            GpuStage::TemporalResolve => "TAA",
        }
    }
}

impl fmt::Display for GpuStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A collection of performance statistics for a single rendered frame.
///
/// GPU times come from the delayed timestamp readback, so `gpu_times_ms`
/// describes the earlier frame named by `gpu_frame_index` and is only
/// meaningful when `gpu_data_valid` is set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameStats {
    /// The frame that produced this record.
    pub frame_index: u64,
    /// Host wall-clock frame time, in milliseconds.
    pub cpu_frame_time_ms: f32,
    /// GPU time of each stage, in milliseconds. `None` for a stage that did not run.
    pub gpu_times_ms: [Option<f32>; GpuStage::COUNT],
    /// Whether the GPU times come from a successful readback.
    pub gpu_data_valid: bool,
    /// The frame the GPU times were measured on. Set together with `gpu_data_valid`.
    #[serde(default)]
    pub gpu_frame_index: Option<u64>,
}

impl FrameStats {
    /// A record without GPU data.
    pub fn new(frame_index: u64, cpu_frame_time_ms: f32) -> Self {
        Self {
            frame_index,
            cpu_frame_time_ms,
            ..Default::default()
        }
    }

    /// GPU time of `stage`, if it was measured.
    pub fn gpu_time(&self, stage: GpuStage) -> Option<f32> {
        self.gpu_times_ms[stage.index()]
    }

    /// Sum of all measured stage times.
    pub fn total_gpu_time_ms(&self) -> f32 {
        self.gpu_times_ms.iter().flatten().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_indices_are_paired_per_stage() {
        for stage in GpuStage::ALL {
            assert_eq!(stage.end_query(), stage.start_query() + 1);
        }
        assert_eq!(GpuStage::TemporalResolve.end_query(), 11);
        assert!(GpuStage::RayTrace < GpuStage::TemporalResolve);
    }

    #[test]
    fn total_ignores_missing_stages() {
        let mut stats = FrameStats::new(4, 16.6);
        stats.gpu_times_ms[GpuStage::RayTrace.index()] = Some(2.0);
        stats.gpu_times_ms[GpuStage::BloomBlur.index()] = Some(0.5);
        assert_eq!(stats.total_gpu_time_ms(), 2.5);
        assert_eq!(stats.gpu_time(GpuStage::AoResolve), None);
    }

    #[test]
    fn frame_stats_ron_roundtrip() {
        let mut stats = FrameStats::new(9, 12.0);
        stats.gpu_times_ms[GpuStage::TemporalResolve.index()] = Some(0.25);
        stats.gpu_data_valid = true;
        stats.gpu_frame_index = Some(8);
        let text = ron::to_string(&stats).unwrap();
        let back: FrameStats = ron::from_str(&text).unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn records_without_a_gpu_frame_still_parse() {
        let back: FrameStats = ron::from_str(
            "(frame_index: 3, cpu_frame_time_ms: 1.0, \
             gpu_times_ms: (None, None, None, None, None, None), gpu_data_valid: false)",
        )
        .unwrap();
        assert_eq!(back.gpu_frame_index, None);
    }
}
