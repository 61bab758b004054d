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

//! Defines the FramePipeline, the orchestrator of one ray-traced, post-processed frame.

use lumen_core::math::Extent2D;
use lumen_core::renderer::{
    CommandEncoder, FrameInputs, FrameStats, GpuStage, GraphicsDevice, MemoryBarrier, PassParams,
    PipelineSettings, ShaderKey, TextureId, QUERIES_PER_SLOT, QUERY_SLOT_COUNT,
};

use super::stages::{
    AmbientOcclusionStage, BloomBlurStage, BloomCombineStage, BloomExtractStage, RayTraceStage,
    TemporalResolveStage,
};
use super::{
    FrameTargets, GpuTimerPool, JitterSequence, PipelineError, RenderStage, ResourceRole,
    RoleBindings, StageContext, TimerReadout,
};

/// Lifecycle of a [`FramePipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Construction has not completed.
    Uninitialized,
    /// Between frames. Resizes and settings changes are accepted.
    Ready,
    /// A frame is being recorded.
    InFrame,
    /// GPU resources have been released. No further frames can be rendered.
    TornDown,
}

/// The stage instances, rebuilt from the settings whenever they change.
#[derive(Debug, Clone, Copy)]
struct StageSet {
    ray_trace: RayTraceStage,
    ambient_occlusion: AmbientOcclusionStage,
    bloom_extract: BloomExtractStage,
    bloom_blur: BloomBlurStage,
    bloom_combine: BloomCombineStage,
    temporal_resolve: TemporalResolveStage,
}

impl StageSet {
    fn from_settings(settings: &PipelineSettings) -> Self {
        Self {
            ray_trace: RayTraceStage,
            ambient_occlusion: AmbientOcclusionStage {
                samples: settings.ao.samples,
                radius: settings.ao.radius,
            },
            bloom_extract: BloomExtractStage {
                threshold: settings.bloom.threshold,
            },
            bloom_blur: BloomBlurStage,
            bloom_combine: BloomCombineStage {
                strength: settings.bloom.strength,
                ao_strength: if settings.ao.enabled {
                    settings.ao.strength
                } else {
                    0.0
                },
            },
            temporal_resolve: TemporalResolveStage {
                blend_factor: settings.taa.blend_factor,
            },
        }
    }
}

/// The frame currently being recorded.
struct FrameInFlight {
    encoder: Box<dyn CommandEncoder>,
    params: PassParams,
    cpu_frame_time_ms: f32,
    recorded: bool,
}

/// Owns every resource of the frame and sequences the stages in their fixed order:
/// ray trace, ambient occlusion, bloom extract, bloom blur, bloom combine and
/// temporal resolve.
///
/// Each stage is bracketed by a timer section in the active query slot, and a
/// barrier follows every stage that writes through unordered image stores.
/// The timings of frame `f - 1` are read back at the end of frame `f`.
pub struct FramePipeline {
    state: PipelineState,
    settings: PipelineSettings,
    stages: StageSet,
    jitter: JitterSequence,
    // `None` only once torn down.
    targets: Option<FrameTargets>,
    timer_pool: GpuTimerPool,
    timestamps_supported: bool,
    // Index of the next frame to begin, or of the frame in flight.
    frame_index: u64,
    frame: Option<FrameInFlight>,
    // Texture holding the last completed frame's final image.
    presented: Option<TextureId>,
}

impl FramePipeline {
    /// Builds a pipeline rendering at `extent`.
    ///
    /// Every stage program must already be registered on `device`. Missing
    /// timestamp support only disables profiling.
    /// ## Errors
    /// * `PipelineError::InvalidSettings` - If `settings` fail validation.
    /// * `PipelineError::MissingStageProgram` - If a stage program is not registered.
    /// * `PipelineError::InvalidExtent` - If `extent` is empty or too large.
    /// * `PipelineError::Setup` - If a GPU object cannot be created. Nothing created survives.
    pub fn new(
        device: &dyn GraphicsDevice,
        extent: Extent2D,
        settings: PipelineSettings,
    ) -> Result<Self, PipelineError> {
        settings.validate()?;
        let mut pipeline = Self {
            state: PipelineState::Uninitialized,
            stages: StageSet::from_settings(&settings),
            jitter: JitterSequence::new(settings.taa.jitter_cycle),
            timer_pool: GpuTimerPool::new(false),
            settings,
            targets: None,
            timestamps_supported: false,
            frame_index: 0,
            frame: None,
            presented: None,
        };
        pipeline.initialize(device, extent)?;
        Ok(pipeline)
    }

    fn initialize(
        &mut self,
        device: &dyn GraphicsDevice,
        extent: Extent2D,
    ) -> Result<(), PipelineError> {
        if let Some(key) = ShaderKey::ALL
            .into_iter()
            .find(|&key| !device.has_stage_pipeline(key))
        {
            return Err(PipelineError::MissingStageProgram(stage_name(key)));
        }

        let targets = FrameTargets::create(device, extent)?;

        let queries = device.create_timestamp_queries(QUERY_SLOT_COUNT, QUERIES_PER_SLOT);
        self.timestamps_supported = match queries {
            Ok(supported) => supported,
            Err(e) => {
                targets.destroy(device);
                return Err(PipelineError::setup("timestamp queries", e));
            }
        };
        if !self.timestamps_supported {
            log::warn!("GPU timestamp queries unsupported, stage timings disabled.");
        }
        self.timer_pool =
            GpuTimerPool::new(self.timestamps_supported && self.settings.profiler.enabled);

        self.presented = Some(targets.composite);
        self.targets = Some(targets);
        self.state = PipelineState::Ready;
        log::info!(
            "Frame pipeline ready at {} (profiling {}).",
            extent,
            if self.timer_pool.is_enabled() {
                "on"
            } else {
                "off"
            }
        );
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Index of the next frame to render, or of the frame in flight.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// The active settings.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// The resolution-dependent targets, until teardown.
    pub fn targets(&self) -> Option<&FrameTargets> {
        self.targets.as_ref()
    }

    /// Size of the targets, until teardown.
    pub fn extent(&self) -> Option<Extent2D> {
        self.targets.as_ref().map(FrameTargets::extent)
    }

    /// The timer pool, for inspection.
    pub fn timer_pool(&self) -> &GpuTimerPool {
        &self.timer_pool
    }

    /// Whether stage timings are being recorded.
    pub fn profiling_enabled(&self) -> bool {
        self.timer_pool.is_enabled()
    }

    /// The final image of the last completed frame: the current history
    /// texture when TAA ran, the composite otherwise. `None` only after teardown.
    pub fn final_image(&self) -> Option<TextureId> {
        self.presented
    }

    /// Renders one complete frame and returns its statistics.
    pub fn render_frame(
        &mut self,
        device: &dyn GraphicsDevice,
        inputs: &FrameInputs,
    ) -> Result<FrameStats, PipelineError> {
        self.begin_frame(device, inputs)?;
        self.record_stages()?;
        self.end_frame(device)
    }

    /// Starts a frame: selects the active query slot and prepares the frame parameters.
    pub fn begin_frame(
        &mut self,
        device: &dyn GraphicsDevice,
        inputs: &FrameInputs,
    ) -> Result<(), PipelineError> {
        let extent = self.require_state(PipelineState::Ready)?.extent();
        let frame_index = self.frame_index;

        self.timer_pool.begin_frame(frame_index);

        let mut params = PassParams::for_frame(&inputs.scene, frame_index, extent);
        if self.settings.taa.enabled {
            let [x, y] = self.jitter.sample(frame_index);
            let [inv_w, inv_h] = extent.texel_size();
            let scale = self.settings.taa.jitter_scale;
            params.jitter = [x * scale * inv_w, y * scale * inv_h];
        }

        let encoder = device.create_command_encoder(Some("Lumen Frame Encoder"));
        self.frame = Some(FrameInFlight {
            encoder,
            params,
            cpu_frame_time_ms: inputs.cpu_frame_time_ms,
            recorded: false,
        });
        self.state = PipelineState::InFrame;
        log::trace!("Frame {frame_index} begun, jitter {:?}.", params.jitter);
        Ok(())
    }

    /// Records every enabled stage of the frame in their fixed order.
    pub fn record_stages(&mut self) -> Result<(), PipelineError> {
        let mut targets = *self.require_state(PipelineState::InFrame)?;
        let frame_index = self.frame_index;
        let Some(frame) = self.frame.as_mut() else {
            return Err(PipelineError::NotReady(self.state));
        };
        if frame.recorded {
            log::error!("Stages of frame {frame_index} already recorded, ignoring.");
            return Ok(());
        }
        frame.recorded = true;

        let extent = targets.extent();
        let params = frame.params;
        let encoder = frame.encoder.as_mut();
        let timers = &mut self.timer_pool;
        let stages = &self.stages;

        // 1. Ray trace
        let bindings = RoleBindings::default()
            .with(ResourceRole::SceneColor, targets.scene_color)
            .with(ResourceRole::GeometryPosition, targets.position)
            .with(ResourceRole::GeometryNormal, targets.normal);
        run_stage(timers, encoder, &stages.ray_trace, bindings, params, extent);

        // 2. Ambient occlusion
        if self.settings.ao.enabled {
            let bindings = RoleBindings::default()
                .with(ResourceRole::GeometryPosition, targets.position)
                .with(ResourceRole::GeometryNormal, targets.normal)
                .with(ResourceRole::AmbientOcclusion, targets.ambient_occlusion);
            let stage = &stages.ambient_occlusion;
            run_stage(timers, encoder, stage, bindings, params, extent);
        }

        // 3. Bloom extract, into the side the first blur pass reads.
        let bloom = &mut targets.bloom;
        bloom.reset();
        let bindings = RoleBindings::default()
            .with(ResourceRole::SceneColor, targets.scene_color)
            .with(ResourceRole::BloomWrite, bloom.seed_target());
        run_stage(timers, encoder, &stages.bloom_extract, bindings, params, extent);

        // 4. Bloom blur, timed as one section.
        timers.begin_section(encoder, GpuStage::BloomBlur);
        for iteration in 0..self.settings.bloom.blur_iterations {
            let bindings = RoleBindings::default()
                .with(ResourceRole::BloomRead, bloom.read())
                .with(ResourceRole::BloomWrite, bloom.write());
            let mut ctx = StageContext::new(encoder, bindings, params, extent);
            ctx.iteration = iteration;
            stages.bloom_blur.execute(&mut ctx);
            bloom.flip();
        }
        timers.end_section(encoder, GpuStage::BloomBlur);

        // 5. Bloom combine
        let bindings = RoleBindings::default()
            .with(ResourceRole::SceneColor, targets.scene_color)
            .with(ResourceRole::BloomRead, bloom.final_read())
            .with(ResourceRole::AmbientOcclusion, targets.ambient_occlusion)
            .with(ResourceRole::Composite, targets.composite);
        run_stage(timers, encoder, &stages.bloom_combine, bindings, params, extent);
        let mut presented = targets.composite;

        // 6. Temporal resolve
        if self.settings.taa.enabled {
            let history = &mut targets.history;
            let current = history.current(frame_index);
            let mut taa_params = params;
            taa_params.history_valid = history.previous_is_valid(frame_index) as u32;
            let bindings = RoleBindings::default()
                .with(ResourceRole::Composite, targets.composite)
                .with(ResourceRole::HistoryPrevious, history.previous(frame_index))
                .with(ResourceRole::HistoryCurrent, current);
            let stage = &stages.temporal_resolve;
            run_stage(timers, encoder, stage, bindings, taa_params, extent);
            history.mark_written(frame_index);
            presented = current;
        }

        self.targets = Some(targets);
        self.presented = Some(presented);
        Ok(())
    }

    /// Finishes the frame: resolves and submits its queries, schedules their
    /// readback and reads back the previous frame's timings.
    pub fn end_frame(&mut self, device: &dyn GraphicsDevice) -> Result<FrameStats, PipelineError> {
        self.require_state(PipelineState::InFrame)?;
        let Some(mut frame) = self.frame.take() else {
            return Err(PipelineError::NotReady(self.state));
        };
        let frame_index = self.frame_index;

        self.timer_pool.resolve(frame.encoder.as_mut());
        let command_buffer = frame.encoder.finish();
        device.submit_command_buffer(command_buffer);
        self.timer_pool.after_submit(device);

        let mut stats = FrameStats::new(frame_index, frame.cpu_frame_time_ms);
        match self
            .timer_pool
            .collect_completed(device, self.settings.profiler.strategy)
        {
            TimerReadout::Ready { frame, times } => {
                stats.gpu_times_ms = times;
                stats.gpu_data_valid = true;
                stats.gpu_frame_index = Some(frame);
            }
            TimerReadout::NotReady | TimerReadout::Invalid => {}
        }

        self.frame_index += 1;
        self.state = PipelineState::Ready;
        log::trace!(
            "Frame {frame_index} submitted (gpu data valid: {}).",
            stats.gpu_data_valid
        );
        Ok(stats)
    }

    /// Recreates every resolution-dependent target at `extent`.
    ///
    /// The new set is fully created before the old one is destroyed, so a failed
    /// resize leaves the pipeline rendering at its previous size. History is
    /// invalidated and in-flight timestamps are discarded. The frame index is kept.
    pub fn resize(
        &mut self,
        device: &dyn GraphicsDevice,
        extent: Extent2D,
    ) -> Result<(), PipelineError> {
        let old = *self.require_state(PipelineState::Ready)?;
        if old.extent() == extent {
            return Ok(());
        }
        if extent.is_empty() {
            return Err(PipelineError::InvalidExtent(extent));
        }

        let new = FrameTargets::create(device, extent)?;
        old.destroy(device);
        self.presented = Some(new.composite);
        self.targets = Some(new);
        self.timer_pool.invalidate_in_flight();
        log::info!("Frame pipeline resized from {} to {}.", old.extent(), extent);
        Ok(())
    }

    /// Applies new settings between frames.
    pub fn set_settings(&mut self, settings: PipelineSettings) -> Result<(), PipelineError> {
        settings.validate()?;
        if matches!(self.state, PipelineState::InFrame | PipelineState::TornDown) {
            return Err(PipelineError::NotReady(self.state));
        }

        let profiling = self.timestamps_supported && settings.profiler.enabled;
        if profiling != self.timer_pool.is_enabled() {
            self.timer_pool.set_enabled(profiling);
            let status = if profiling { "enabled" } else { "disabled" };
            log::info!("GPU stage timings {status}.");
        }
        if settings.taa.enabled != self.settings.taa.enabled {
            let status = if settings.taa.enabled { "enabled" } else { "disabled" };
            log::debug!("TAA {status}, history will restart.");
        }

        self.stages = StageSet::from_settings(&settings);
        self.jitter = JitterSequence::new(settings.taa.jitter_cycle);
        self.settings = settings;
        Ok(())
    }

    /// Releases every GPU resource. A frame in flight is dropped without being submitted.
    pub fn shutdown(&mut self, device: &dyn GraphicsDevice) {
        if self.state == PipelineState::TornDown {
            return;
        }
        if self.frame.take().is_some() {
            log::warn!("Frame {} dropped by shutdown.", self.frame_index);
        }
        if let Some(targets) = self.targets.take() {
            targets.destroy(device);
        }
        if self.timestamps_supported {
            device.destroy_timestamp_queries();
        }
        self.presented = None;
        self.state = PipelineState::TornDown;
        log::info!("Frame pipeline shut down after {} frames.", self.frame_index);
    }

    fn require_state(&self, expected: PipelineState) -> Result<&FrameTargets, PipelineError> {
        match (&self.targets, self.state == expected) {
            (Some(targets), true) => Ok(targets),
            _ => Err(PipelineError::NotReady(self.state)),
        }
    }
}

/// Runs one single-pass stage inside its timer section, followed by a barrier
/// when it writes through unordered stores.
fn run_stage(
    timers: &mut GpuTimerPool,
    encoder: &mut dyn CommandEncoder,
    stage: &dyn RenderStage,
    bindings: RoleBindings,
    params: PassParams,
    extent: Extent2D,
) {
    timers.begin_section(encoder, stage.id());
    let mut ctx = StageContext::new(encoder, bindings, params, extent);
    stage.execute(&mut ctx);
    timers.end_section(encoder, stage.id());
    if stage.writes_unordered() {
        encoder.memory_barrier(MemoryBarrier::ShaderImageAccess);
    }
}

fn stage_name(key: ShaderKey) -> &'static str {
    match key {
        ShaderKey::RayTrace => GpuStage::RayTrace.label(),
        ShaderKey::AmbientOcclusion => GpuStage::AoResolve.label(),
        ShaderKey::BloomExtract => GpuStage::BloomExtract.label(),
        ShaderKey::BloomBlur => GpuStage::BloomBlur.label(),
        ShaderKey::BloomCombine => GpuStage::BloomCombine.label(),
        ShaderKey::TemporalResolve => GpuStage::TemporalResolve.label(),
    }
}
