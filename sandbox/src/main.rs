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

// Lumen Sandbox
// Renders frames headlessly through the pipeline and prints the GPU timing panel.

mod config;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use lumen_core::math::Extent2D;
use lumen_core::renderer::{FrameInputs, ReadbackStrategy};
use lumen_infra::graphics::wgpu::{backend_name, shaders};
use lumen_infra::WgpuDevice;
use lumen_lanes::FramePipeline;
use lumen_telemetry::{init_logging, StatsReporter};

use crate::config::{parse_extent, ResizeStep, SandboxConfig};

#[derive(Parser, Debug)]
#[command(name = "lumen-sandbox", version, about)]
struct Cli {
    /// RON run description. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to render.
    #[arg(short, long)]
    frames: Option<u64>,

    /// Initial resolution, as WIDTHxHEIGHT.
    #[arg(long, value_parser = parse_extent)]
    size: Option<Extent2D>,

    /// Resize before a frame, as WIDTHxHEIGHT@FRAME.
    #[arg(long)]
    resize: Option<ResizeStep>,

    /// Wait for each frame's timestamps instead of polling for them.
    #[arg(long)]
    wait: bool,

    /// Disable GPU timestamp queries.
    #[arg(long)]
    no_profiling: bool,

    /// Log the timing panel every N frames (0 disables).
    #[arg(long, default_value_t = 30)]
    report_every: u64,

    /// Print the final report as JSON instead of the panel.
    #[arg(long)]
    json: bool,

    /// Default log filter, overridden by RUST_LOG.
    #[arg(long, default_value = "info")]
    log: String,
}

impl Cli {
    fn apply(&self, config: &mut SandboxConfig) {
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
        if let Some(size) = self.size {
            config.extent = size;
        }
        if self.resize.is_some() {
            config.resize = self.resize;
        }
        if self.wait {
            config.settings.profiler.strategy = ReadbackStrategy::BoundedWait;
        }
        if self.no_profiling {
            config.settings.profiler.enabled = false;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    let mut config = match &cli.config {
        Some(path) => SandboxConfig::load(path)?,
        None => SandboxConfig::default(),
    };
    cli.apply(&mut config);

    let device = WgpuDevice::new_headless().context("creating the graphics device")?;
    let context = device.context();
    log::info!(
        "Sandbox on \"{}\" ({}, {:?}), timestamps {}",
        context.adapter_name,
        backend_name(context.adapter_backend),
        context.adapter_device_type,
        if context.supports_timestamps() {
            "supported"
        } else {
            "unsupported"
        }
    );

    shaders::register_stage_programs(&device).context("compiling the stage programs")?;
    let mut pipeline = FramePipeline::new(&device, config.extent, config.settings.clone())?;
    let mut reporter = StatsReporter::new(config.settings.profiler.history_capacity);

    let mut cpu_frame_time_ms = 0.0;
    for frame in 0..config.frames {
        if let Some(step) = config.resize.filter(|step| step.at_frame == frame) {
            pipeline.resize(&device, step.extent)?;
        }

        let started = Instant::now();
        let inputs = FrameInputs {
            scene: config.scene,
            cpu_frame_time_ms,
        };
        let stats = pipeline.render_frame(&device, &inputs)?;
        cpu_frame_time_ms = started.elapsed().as_secs_f32() * 1000.0;
        reporter.record(stats);

        if cli.report_every > 0 && (frame + 1) % cli.report_every == 0 {
            for line in reporter.panel_lines() {
                log::info!("{line}");
            }
        }
    }

    pipeline.shutdown(&device);
    device.poll_device_blocking();

    if cli.json {
        println!("{}", reporter.to_json()?);
    } else {
        for line in reporter.panel_lines() {
            println!("{line}");
        }
        println!(
            "{} frames, {} with GPU timings",
            reporter.frames_recorded(),
            reporter.valid_samples()
        );
    }
    Ok(())
}
