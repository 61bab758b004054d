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

//! Runtime-tunable settings of the frame pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the timer pool reads back the previous frame's timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadbackStrategy {
    /// Poll once without blocking and skip the sample if the GPU is not done.
    /// Never stalls the CPU, may drop samples on a slow GPU.
    #[default]
    Poll,
    /// Wait for the previous frame's slot once per frame. Every sample is
    /// fresh, at the cost of one bounded stall when the GPU lags behind.
    BoundedWait,
}

/// Ambient occlusion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AoSettings {
    /// Runs the AO stage when set. When cleared the composite sees a neutral AO input.
    pub enabled: bool,
    /// Darkening strength, `0` (no effect) to `1` (full multiply).
    pub strength: f32,
    /// Occlusion taps per pixel, `1..=64`.
    pub samples: u32,
    /// World-space distance past which a tap no longer occludes, `0.1..=2.0`.
    pub radius: f32,
}

impl AoSettings {
    /// Accepted range of [`AoSettings::samples`].
    pub const SAMPLE_RANGE: std::ops::RangeInclusive<u32> = 1..=64;
    /// Accepted range of [`AoSettings::radius`].
    pub const RADIUS_RANGE: std::ops::RangeInclusive<f32> = 0.1..=2.0;
}

impl Default for AoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 1.0,
            samples: 12,
            radius: 1.0,
        }
    }
}

/// Bloom settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    /// Luminance above which a texel is extracted into the bright pass.
    pub threshold: f32,
    /// Weight of the blurred bright pass in the composite.
    pub strength: f32,
    /// Number of blur passes, alternating horizontal and vertical.
    pub blur_iterations: u32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            strength: 0.5,
            blur_iterations: 10,
        }
    }
}

/// Temporal anti-aliasing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaaSettings {
    /// Runs the temporal resolve and applies camera jitter when set.
    pub enabled: bool,
    /// Weight of the history buffer, in `[0, 1]`.
    pub blend_factor: f32,
    /// Length of the jitter pattern, in frames.
    pub jitter_cycle: u32,
    /// Jitter amplitude, in pixels.
    pub jitter_scale: f32,
}

impl Default for TaaSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            blend_factor: 0.9,
            jitter_cycle: 8,
            jitter_scale: 0.5,
        }
    }
}

/// GPU profiling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerSettings {
    /// Issues timestamp queries when set and supported by the device.
    pub enabled: bool,
    /// Number of frames kept in the rolling history.
    pub history_capacity: usize,
    /// Readback strategy of the timer pool.
    pub strategy: ReadbackStrategy,
}

impl Default for ProfilerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            history_capacity: 60,
            strategy: ReadbackStrategy::Poll,
        }
    }
}

/// A collection of every setting the frame pipeline reads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Ambient occlusion.
    pub ao: AoSettings,
    /// Bloom.
    pub bloom: BloomSettings,
    /// Temporal anti-aliasing.
    pub taa: TaaSettings,
    /// GPU profiling.
    pub profiler: ProfilerSettings,
}

/// A setting outside its accepted range.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidSetting {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub reason: String,
}

impl fmt::Display for InvalidSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid setting `{}`: {}", self.field, self.reason)
    }
}

impl std::error::Error for InvalidSetting {}

impl PipelineSettings {
    /// Checks every field against its accepted range.
    pub fn validate(&self) -> Result<(), InvalidSetting> {
        fn non_negative(field: &'static str, value: f32) -> Result<(), InvalidSetting> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(InvalidSetting {
                    field,
                    reason: format!("expected a finite value >= 0, got {value}"),
                })
            }
        }

        non_negative("ao.strength", self.ao.strength)?;
        if !AoSettings::SAMPLE_RANGE.contains(&self.ao.samples) {
            return Err(InvalidSetting {
                field: "ao.samples",
                reason: format!("expected a value in [1, 64], got {}", self.ao.samples),
            });
        }
        if !AoSettings::RADIUS_RANGE.contains(&self.ao.radius) {
            return Err(InvalidSetting {
                field: "ao.radius",
                reason: format!("expected a value in [0.1, 2], got {}", self.ao.radius),
            });
        }
        non_negative("bloom.threshold", self.bloom.threshold)?;
        non_negative("bloom.strength", self.bloom.strength)?;
        non_negative("taa.jitter_scale", self.taa.jitter_scale)?;

        if !(0.0..=1.0).contains(&self.taa.blend_factor) {
            return Err(InvalidSetting {
                field: "taa.blend_factor",
                reason: format!("expected a value in [0, 1], got {}", self.taa.blend_factor),
            });
        }
        if self.taa.jitter_cycle == 0 {
            return Err(InvalidSetting {
                field: "taa.jitter_cycle",
                reason: "the jitter pattern needs at least one frame".to_string(),
            });
        }
        if self.profiler.history_capacity == 0 {
            return Err(InvalidSetting {
                field: "profiler.history_capacity",
                reason: "the rolling history needs at least one entry".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = PipelineSettings::default();
        assert!(settings.ao.enabled);
        assert_eq!(settings.ao.strength, 1.0);
        assert_eq!(settings.ao.samples, 12);
        assert_eq!(settings.ao.radius, 1.0);
        assert_eq!(settings.bloom.threshold, 1.0);
        assert_eq!(settings.bloom.strength, 0.5);
        assert_eq!(settings.bloom.blur_iterations, 10);
        assert!(settings.taa.enabled);
        assert_eq!(settings.taa.jitter_cycle, 8);
        assert_eq!(settings.profiler.history_capacity, 60);
        assert_eq!(settings.profiler.strategy, ReadbackStrategy::Poll);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut settings = PipelineSettings::default();
        settings.taa.blend_factor = 1.5;
        assert_eq!(settings.validate().unwrap_err().field, "taa.blend_factor");

        let mut settings = PipelineSettings::default();
        settings.taa.jitter_cycle = 0;
        assert_eq!(settings.validate().unwrap_err().field, "taa.jitter_cycle");

        let mut settings = PipelineSettings::default();
        settings.bloom.strength = -0.1;
        assert_eq!(settings.validate().unwrap_err().field, "bloom.strength");

        let mut settings = PipelineSettings::default();
        settings.profiler.history_capacity = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn ao_tunables_are_bounded() {
        let mut settings = PipelineSettings::default();
        settings.ao.samples = 0;
        assert_eq!(settings.validate().unwrap_err().field, "ao.samples");
        settings.ao.samples = 65;
        assert_eq!(settings.validate().unwrap_err().field, "ao.samples");
        settings.ao.samples = 64;
        assert!(settings.validate().is_ok());

        settings.ao.radius = 0.05;
        assert_eq!(settings.validate().unwrap_err().field, "ao.radius");
        settings.ao.radius = f32::NAN;
        assert_eq!(settings.validate().unwrap_err().field, "ao.radius");
        settings.ao.radius = 2.0;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_ron_uses_defaults() {
        let text = "(bloom: (blur_iterations: 4), taa: (enabled: false))";
        let settings: PipelineSettings = ron::from_str(text).unwrap();
        assert_eq!(settings.bloom.blur_iterations, 4);
        assert_eq!(settings.bloom.threshold, 1.0);
        assert!(!settings.taa.enabled);
        assert_eq!(settings.taa.blend_factor, 0.9);
        assert!(settings.ao.enabled);
    }

    #[test]
    fn settings_json_roundtrip() {
        let mut settings = PipelineSettings::default();
        settings.profiler.strategy = ReadbackStrategy::BoundedWait;
        let json = serde_json::to_string(&settings).unwrap();
        let back: PipelineSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
