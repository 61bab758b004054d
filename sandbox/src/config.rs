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

//! Run description of the sandbox, loaded from RON and overridden from the command line.

use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use lumen_core::math::Extent2D;
use lumen_core::renderer::{PipelineSettings, SceneInputs};
use serde::{Deserialize, Serialize};

/// A resize applied before rendering `at_frame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeStep {
    pub at_frame: u64,
    pub extent: Extent2D,
}

impl FromStr for ResizeStep {
    type Err = anyhow::Error;

    /// Parses `WIDTHxHEIGHT@FRAME`, e.g. `1024x768@60`.
    fn from_str(s: &str) -> Result<Self> {
        let Some((extent, frame)) = s.split_once('@') else {
            bail!("expected WIDTHxHEIGHT@FRAME, got '{s}'");
        };
        Ok(Self {
            at_frame: frame
                .trim()
                .parse()
                .with_context(|| format!("invalid frame index '{frame}'"))?,
            extent: parse_extent(extent)?,
        })
    }
}

/// Parses `WIDTHxHEIGHT`.
pub fn parse_extent(s: &str) -> Result<Extent2D> {
    let Some((w, h)) = s.trim().split_once(['x', 'X']) else {
        bail!("expected WIDTHxHEIGHT, got '{s}'");
    };
    let width = w.parse().with_context(|| format!("invalid width '{w}'"))?;
    let height = h.parse().with_context(|| format!("invalid height '{h}'"))?;
    Ok(Extent2D::new(width, height))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub extent: Extent2D,
    pub frames: u64,
    pub resize: Option<ResizeStep>,
    pub scene: SceneInputs,
    pub settings: PipelineSettings,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            extent: Extent2D::new(800, 800),
            frames: 120,
            resize: None,
            scene: SceneInputs {
                object_count: 16,
                light_count: 3,
                ..Default::default()
            },
            settings: PipelineSettings::default(),
        }
    }
}

impl SandboxConfig {
    /// Reads a RON run description. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            ron::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        config
            .settings
            .validate()
            .with_context(|| format!("invalid settings in {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_step_parses() {
        let step: ResizeStep = "1024x768@60".parse().unwrap();
        assert_eq!(step.at_frame, 60);
        assert_eq!(step.extent, Extent2D::new(1024, 768));
        assert!("1024x768".parse::<ResizeStep>().is_err());
        assert!("axb@1".parse::<ResizeStep>().is_err());
    }

    #[test]
    fn bundled_config_parses() {
        let text = include_str!("../pipeline.ron");
        let config: SandboxConfig = ron::from_str(text).unwrap();
        assert_eq!(config.extent, Extent2D::new(800, 800));
        assert_eq!(config.scene.light_count, 3);
        assert_eq!(
            config.resize.map(|step| step.extent),
            Some(Extent2D::new(1024, 768))
        );
        assert!(config.settings.validate().is_ok());
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: SandboxConfig = ron::from_str("()").unwrap();
        assert_eq!(config, SandboxConfig::default());
    }
}
