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

//! Headless wgpu context creation.

use anyhow::{anyhow, Result};
use wgpu::{Adapter, Backend, Features, Instance};

/// Returns a human-readable name for a backend.
pub fn backend_name(backend: Backend) -> &'static str {
    match backend {
        Backend::Vulkan => "Vulkan",
        Backend::Metal => "Metal",
        Backend::Dx12 => "DirectX 12",
        Backend::Gl => "OpenGL",
        Backend::BrowserWebGpu => "WebGPU",
        Backend::Noop => "No-op",
    }
}

/// Holds the core WGPU state objects required for offscreen rendering.
///
/// There is no surface: the frame pipeline renders into its own targets and
/// the host decides what to do with the final image.
#[derive(Debug)]
pub struct WgpuGraphicsContext {
    /// The adapter the device was opened on.
    pub adapter: wgpu::Adapter,
    /// The logical device.
    pub device: wgpu::Device,
    /// The device's command queue.
    pub queue: wgpu::Queue,

    // Store info for easy access
    /// Adapter name as reported by the driver.
    pub adapter_name: String,
    /// Backend API of the adapter.
    pub adapter_backend: wgpu::Backend,
    /// Kind of adapter (discrete, integrated, software...).
    pub adapter_device_type: wgpu::DeviceType,
    /// Features actually enabled on the device.
    pub active_device_features: wgpu::Features,
    /// Limits of the device.
    pub device_limits: wgpu::Limits,
}

impl WgpuGraphicsContext {
    /// Features the frame pipeline uses when the adapter offers them.
    pub const OPTIONAL_FEATURES: Features =
        Features::TIMESTAMP_QUERY.union(Features::TIMESTAMP_QUERY_INSIDE_ENCODERS);

    /// Asynchronously creates the logical device on a pre-selected adapter.
    ///
    /// ## Arguments
    /// * `adapter` - The `wgpu::Adapter` to open.
    ///
    /// ## Returns
    /// * `Result<Self>` - The initialized context, or an error if the device request failed.
    pub async fn new(adapter: Adapter) -> Result<Self> {
        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {})",
            adapter_info.name,
            backend_name(adapter_info.backend)
        );

        let features_to_enable = adapter.features() & Self::OPTIONAL_FEATURES;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Lumen Logical Device"),
                required_features: features_to_enable,
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(std::sync::Arc::new(|e: wgpu::Error| {
            log::error!("WGPU Uncaptured Error: {e:?}");
        }));

        let active_device_features = device.features();
        let device_limits = device.limits();
        log::debug!("Active device features: {active_device_features:?}");

        Ok(Self {
            adapter,
            device,
            queue,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            adapter_device_type: adapter_info.device_type,
            active_device_features,
            device_limits,
        })
    }

    /// Selects the default adapter and opens a device on it, blocking the caller.
    pub fn new_headless() -> Result<Self> {
        let instance = Instance::new(wgpu::InstanceDescriptor::new_without_display_handle());
        let adapter = pollster::block_on(instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            },
        ))
        .map_err(|e| anyhow!("No compatible graphics adapter: {e}"))?;
        pollster::block_on(Self::new(adapter))
    }

    /// Whether timestamp queries can be written between passes.
    pub fn supports_timestamps(&self) -> bool {
        self.active_device_features
            .contains(Features::TIMESTAMP_QUERY)
    }

    /// Whether timestamps can be written directly into a command encoder.
    pub fn supports_encoder_timestamps(&self) -> bool {
        self.active_device_features
            .contains(Features::TIMESTAMP_QUERY_INSIDE_ENCODERS)
    }
}
