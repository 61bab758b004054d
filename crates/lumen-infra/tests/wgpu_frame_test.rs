use lumen_core::math::Extent2D;
use lumen_core::renderer::{
    FrameInputs, GraphicsDevice, PipelineSettings, ReadbackStrategy, SceneInputs,
};
use lumen_infra::graphics::wgpu::shaders;
use lumen_infra::WgpuDevice;
use lumen_lanes::{FramePipeline, PipelineState};

// Returns None when the machine has no usable adapter.
fn create_test_device() -> Option<WgpuDevice> {
    let _ = env_logger::builder().is_test(true).try_init();
    WgpuDevice::new_headless().ok()
}

fn scene() -> FrameInputs {
    FrameInputs {
        scene: SceneInputs {
            object_count: 8,
            light_count: 2,
            ..Default::default()
        },
        cpu_frame_time_ms: 16.0,
    }
}

#[test]
fn stage_programs_compile_or_skips() {
    let Some(device) = create_test_device() else {
        println!("Skipping program test: could not create test device.");
        return;
    };
    shaders::register_stage_programs(&device).expect("every stage program should compile");
}

#[test]
fn pipeline_renders_and_resizes_on_real_device_or_skips() {
    let Some(device) = create_test_device() else {
        println!("Skipping frame test: could not create test device.");
        return;
    };
    shaders::register_stage_programs(&device).expect("every stage program should compile");

    let mut settings = PipelineSettings::default();
    settings.profiler.strategy = ReadbackStrategy::BoundedWait;
    let mut pipeline = FramePipeline::new(&device, Extent2D::new(256, 192), settings)
        .expect("pipeline should build");

    let mut valid_frames = 0;
    for frame in 0..6u64 {
        let stats = pipeline
            .render_frame(&device, &scene())
            .expect("frame should render");
        assert_eq!(stats.frame_index, frame);
        assert_eq!(stats.cpu_frame_time_ms, 16.0);
        if stats.gpu_data_valid {
            valid_frames += 1;
            assert!(stats.total_gpu_time_ms() >= 0.0);
        }
    }
    if !pipeline.profiling_enabled() {
        assert_eq!(valid_frames, 0);
    }

    pipeline
        .resize(&device, Extent2D::new(320, 240))
        .expect("resize should succeed");
    pipeline
        .render_frame(&device, &scene())
        .expect("frame after resize should render");
    let image = pipeline.final_image().expect("a frame was presented");
    assert_eq!(device.texture_extent(image), Some(Extent2D::new(320, 240)));

    pipeline.shutdown(&device);
    assert_eq!(pipeline.state(), PipelineState::TornDown);
    assert_eq!(device.texture_extent(image), None);
}
