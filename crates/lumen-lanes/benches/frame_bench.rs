use criterion::{criterion_group, criterion_main, Criterion};
use lumen_core::math::Extent2D;
use lumen_core::renderer::{
    CommandBufferId, CommandEncoder, ComputeDispatch, FrameInputs, FullscreenDraw, GraphicsDevice,
    MemoryBarrier, PipelineSettings, ReadbackStrategy, ResourceError, ShaderKey,
    StagePipelineDescriptor, TextureDescriptor, TextureId, TimestampReadback,
};
use lumen_lanes::render_lane::JitterSequence;
use lumen_lanes::FramePipeline;
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A device that accepts everything and executes nothing.
#[derive(Debug, Default)]
struct NullDevice {
    next_texture: AtomicUsize,
}

struct NullEncoder {
    commands: usize,
}

impl CommandEncoder for NullEncoder {
    fn dispatch_compute(&mut self, dispatch: &ComputeDispatch<'_>) {
        black_box(dispatch.workgroups);
        self.commands += 1;
    }

    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>) {
        black_box(draw.target);
        self.commands += 1;
    }

    fn memory_barrier(&mut self, _barrier: MemoryBarrier) {
        self.commands += 1;
    }

    fn generate_mipmaps(&mut self, _texture: TextureId) {
        self.commands += 1;
    }

    fn write_timestamp(&mut self, _slot: u32, _query_index: u32) {
        self.commands += 1;
    }

    fn resolve_timestamps(&mut self, _slot: u32, _query_count: u32) -> bool {
        true
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        CommandBufferId(self.commands as u64)
    }
}

impl GraphicsDevice for NullDevice {
    fn create_texture(&self, _descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        Ok(TextureId(self.next_texture.fetch_add(1, Ordering::Relaxed)))
    }

    fn destroy_texture(&self, _id: TextureId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn texture_extent(&self, _id: TextureId) -> Option<Extent2D> {
        None
    }

    fn max_texture_dimension(&self) -> u32 {
        8192
    }

    fn create_stage_pipeline(
        &self,
        _descriptor: &StagePipelineDescriptor,
    ) -> Result<(), ResourceError> {
        Ok(())
    }

    fn has_stage_pipeline(&self, _key: ShaderKey) -> bool {
        true
    }

    fn create_timestamp_queries(&self, _slots: u32, _per_slot: u32) -> Result<bool, ResourceError> {
        Ok(true)
    }

    fn destroy_timestamp_queries(&self) {}

    fn timestamp_period_ns(&self) -> f32 {
        1.0
    }

    fn create_command_encoder(&self, _label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(NullEncoder { commands: 0 })
    }

    fn submit_command_buffer(&self, command_buffer: CommandBufferId) {
        black_box(command_buffer);
    }

    fn schedule_timestamp_readback(&self, _slot: u32, _frame_tag: u64) {}

    fn read_timestamps(
        &self,
        _slot: u32,
        _frame_tag: u64,
        _strategy: ReadbackStrategy,
    ) -> TimestampReadback {
        TimestampReadback::Ready((0..12).map(|i| i * 1_000).collect())
    }
}

fn bench_frame_recording(c: &mut Criterion) {
    let device = NullDevice::default();
    let inputs = FrameInputs::default();

    let mut group = c.benchmark_group("Frame Pipeline");

    let mut pipeline = FramePipeline::new(
        &device,
        Extent2D::new(800, 800),
        PipelineSettings::default(),
    )
    .unwrap();
    group.bench_function("Record Frame (all stages)", |b| {
        b.iter(|| black_box(pipeline.render_frame(&device, &inputs).unwrap()));
    });

    let mut settings = PipelineSettings::default();
    settings.ao.enabled = false;
    settings.taa.enabled = false;
    settings.profiler.enabled = false;
    let mut minimal = FramePipeline::new(&device, Extent2D::new(800, 800), settings).unwrap();
    group.bench_function("Record Frame (no AO, no TAA, no timers)", |b| {
        b.iter(|| black_box(minimal.render_frame(&device, &inputs).unwrap()));
    });

    group.finish();
}

fn bench_jitter(c: &mut Criterion) {
    let jitter = JitterSequence::new(16);
    c.bench_function("Halton Jitter (16 frames)", |b| {
        b.iter(|| {
            for frame in 0..16u64 {
                black_box(jitter.sample(black_box(frame)));
            }
        });
    });
}

criterion_group!(benches, bench_frame_recording, bench_jitter);
criterion_main!(benches);
