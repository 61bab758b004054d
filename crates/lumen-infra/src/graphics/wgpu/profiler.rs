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

//! GPU timestamp queries with double-buffered, non-blocking readback.

use lumen_core::renderer::{ReadbackStrategy, TimestampReadback};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::context::WgpuGraphicsContext;

const MAP_PENDING: u8 = 0;
const MAP_DONE: u8 = 1;
const MAP_FAILED: u8 = 2;

/// Upper bound of a `BoundedWait` readback.
const READBACK_TIMEOUT: Duration = Duration::from_millis(100);

const TIMESTAMP_SIZE: u64 = std::mem::size_of::<u64>() as u64;

#[derive(Debug, Default)]
struct SlotState {
    // Number of queries copied into the staging buffer by the encoder not yet submitted.
    copied: Option<u32>,
    // A `map_async` has been requested and not consumed.
    mapping: bool,
    frame: Option<u64>,
    count: u32,
    submission: Option<wgpu::SubmissionIndex>,
}

/// A query set split into slots, each with its own staging buffer.
///
/// Lifecycle of one slot: the encoder resolves the slot's queries and copies them
/// into the slot's staging buffer, the buffer is mapped once the commands are
/// submitted, and a later frame reads the mapped data. A slot whose mapping has
/// not completed is never overwritten. A slot whose data was mapped but never
/// read is discarded when it is resolved again.
#[derive(Debug)]
pub struct WgpuTimestampQueries {
    query_set: wgpu::QuerySet,
    resolve_buffer: wgpu::Buffer,
    staging_buffers: Vec<wgpu::Buffer>,
    map_status: Vec<Arc<AtomicU8>>,
    slots: Mutex<Vec<SlotState>>,
    queries_per_slot: u32,
    period_ns: f32,
    inside_encoders: bool,
}

impl WgpuTimestampQueries {
    /// Checks if the required features for timestamp queries are available.
    pub fn feature_available(features: wgpu::Features) -> bool {
        features.contains(wgpu::Features::TIMESTAMP_QUERY)
    }

    /// Creates `slot_count` slots of `queries_per_slot` timestamps each.
    pub fn new(context: &WgpuGraphicsContext, slot_count: u32, queries_per_slot: u32) -> Self {
        let device = &context.device;
        let query_set = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("Lumen GPU Timestamp QuerySet"),
            ty: wgpu::QueryType::Timestamp,
            count: slot_count * queries_per_slot,
        });

        let resolve_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lumen GPU Timestamp Resolve Buffer"),
            size: slot_count as u64 * wgpu::QUERY_RESOLVE_BUFFER_ALIGNMENT,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let slot_bytes = queries_per_slot as u64 * TIMESTAMP_SIZE;
        let staging_buffers = (0..slot_count)
            .map(|i| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("Lumen GPU Timestamp Staging Buffer {i}")),
                    size: slot_bytes,
                    usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();

        let period_ns = context.queue.get_timestamp_period();
        let inside_encoders = context.supports_encoder_timestamps();
        log::info!(
            "GPU timestamp queries ready: {slot_count} slots x {queries_per_slot}, \
             period {period_ns:.3} ns."
        );

        Self {
            query_set,
            resolve_buffer,
            staging_buffers,
            map_status: (0..slot_count)
                .map(|_| Arc::new(AtomicU8::new(MAP_PENDING)))
                .collect(),
            slots: Mutex::new((0..slot_count).map(|_| SlotState::default()).collect()),
            queries_per_slot,
            period_ns,
            inside_encoders,
        }
    }

    /// Nanoseconds per timestamp tick.
    pub fn period_ns(&self) -> f32 {
        self.period_ns
    }

    /// Whether timestamps are written straight into the encoder rather than
    /// through an empty compute pass.
    pub fn writes_inside_encoders(&self) -> bool {
        self.inside_encoders
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, Vec<SlotState>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn global_index(&self, slot: u32, query: u32) -> Option<u32> {
        let valid = (slot as usize) < self.staging_buffers.len() && query < self.queries_per_slot;
        valid.then_some(slot * self.queries_per_slot + query)
    }

    /// Records a timestamp at the current position of `encoder`.
    ///
    /// Without encoder-level timestamps, an empty compute pass carries the write.
    pub(crate) fn write(&self, encoder: &mut wgpu::CommandEncoder, slot: u32, query: u32) {
        let Some(index) = self.global_index(slot, query) else {
            log::error!("Timestamp {query} of slot {slot} is out of range.");
            return;
        };
        if self.inside_encoders {
            encoder.write_timestamp(&self.query_set, index);
        } else {
            encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Lumen Timestamp"),
                timestamp_writes: Some(wgpu::ComputePassTimestampWrites {
                    query_set: &self.query_set,
                    beginning_of_pass_write_index: Some(index),
                    end_of_pass_write_index: None,
                }),
            });
        }
    }

    /// Resolves the first `count` queries of `slot` and copies them to its staging buffer.
    ///
    /// Returns `false` when the staging buffer is still being mapped for an earlier frame.
    pub(crate) fn encode_resolve(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        slot: u32,
        count: u32,
    ) -> bool {
        let count = count.min(self.queries_per_slot);
        let Some(first) = self.global_index(slot, 0) else {
            return false;
        };
        let index = slot as usize;
        let mut slots = self.slots();
        let state = &mut slots[index];

        if state.mapping {
            match self.map_status[index].load(Ordering::SeqCst) {
                MAP_PENDING => {
                    log::debug!(
                        "Timestamp staging buffer {slot} is still pending, skipping overwrite."
                    );
                    return false;
                }
                MAP_DONE => {
                    log::debug!(
                        "Discarding unread timestamps of frame {:?} in slot {slot}.",
                        state.frame
                    );
                    self.staging_buffers[index].unmap();
                }
                _ => {}
            }
            state.mapping = false;
            state.frame = None;
        }

        let offset = slot as u64 * wgpu::QUERY_RESOLVE_BUFFER_ALIGNMENT;
        encoder.resolve_query_set(
            &self.query_set,
            first..first + count,
            &self.resolve_buffer,
            offset,
        );
        encoder.copy_buffer_to_buffer(
            &self.resolve_buffer,
            offset,
            &self.staging_buffers[index],
            0,
            count as u64 * TIMESTAMP_SIZE,
        );
        state.copied = Some(count);
        true
    }

    /// Requests the mapping of the slot's staging buffer once its copy has been submitted.
    pub(crate) fn schedule_map(
        &self,
        slot: u32,
        frame_tag: u64,
        submission: Option<wgpu::SubmissionIndex>,
    ) {
        let index = slot as usize;
        let mut slots = self.slots();
        let Some(state) = slots.get_mut(index) else {
            return;
        };
        let Some(count) = state.copied.take() else {
            return;
        };

        let flag = self.map_status[index].clone();
        flag.store(MAP_PENDING, Ordering::SeqCst);
        let bytes = count as u64 * TIMESTAMP_SIZE;
        self.staging_buffers[index]
            .slice(..bytes)
            .map_async(wgpu::MapMode::Read, move |res| {
                let status = match res {
                    Ok(()) => MAP_DONE,
                    Err(e) => {
                        log::error!("GPU timestamp staging map_async failed: {:?}", e);
                        MAP_FAILED
                    }
                };
                flag.store(status, Ordering::SeqCst);
            });

        state.mapping = true;
        state.frame = Some(frame_tag);
        state.count = count;
        state.submission = submission;
    }

    /// Reads the slot's timestamps if they belong to `frame_tag` and are available.
    pub(crate) fn read(
        &self,
        device: &wgpu::Device,
        slot: u32,
        frame_tag: u64,
        strategy: ReadbackStrategy,
    ) -> TimestampReadback {
        let index = slot as usize;
        let mut slots = self.slots();
        let Some(state) = slots.get_mut(index) else {
            return TimestampReadback::Unavailable;
        };
        if !state.mapping || state.frame != Some(frame_tag) {
            return TimestampReadback::Unavailable;
        }

        let status = &self.map_status[index];
        if status.load(Ordering::SeqCst) == MAP_PENDING {
            // The map callback only touches the atomic, so polling under the lock is safe.
            let poll = match strategy {
                ReadbackStrategy::Poll => wgpu::PollType::Poll,
                ReadbackStrategy::BoundedWait => wgpu::PollType::Wait {
                    submission_index: state.submission.clone(),
                    timeout: Some(READBACK_TIMEOUT),
                },
            };
            if let Err(e) = device.poll(poll) {
                log::debug!("Device poll during timestamp readback: {e:?}");
            }
        }

        match status.load(Ordering::SeqCst) {
            MAP_PENDING => TimestampReadback::NotReady,
            MAP_DONE => {
                let buffer = &self.staging_buffers[index];
                let bytes = state.count as u64 * TIMESTAMP_SIZE;
                let ticks = {
                    let data = buffer.slice(..bytes).get_mapped_range();
                    bytemuck::pod_collect_to_vec::<u8, u64>(&data)
                };
                buffer.unmap();
                state.mapping = false;
                state.frame = None;
                TimestampReadback::Ready(ticks)
            }
            _ => {
                state.mapping = false;
                state.frame = None;
                TimestampReadback::Unavailable
            }
        }
    }

    /// Waits for outstanding mappings and unmaps every staging buffer.
    pub fn shutdown(&self, device: &wgpu::Device) {
        log::debug!("Shutting down GPU timestamp queries...");
        if let Err(e) = device.poll(wgpu::PollType::wait_indefinitely()) {
            log::warn!("Failed to poll device during shutdown: {:?}", e);
        }
        let mut slots = self.slots();
        for (i, state) in slots.iter_mut().enumerate() {
            if state.mapping {
                self.staging_buffers[i].unmap();
                state.mapping = false;
                state.frame = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WgpuTimestampQueries;
    use lumen_core::renderer::{ReadbackStrategy, TimestampReadback};

    use crate::graphics::wgpu::WgpuGraphicsContext;

    #[test]
    fn unscheduled_slots_are_unavailable_or_skips() {
        // This test requires a physical device, so it might be skipped on CI without one.
        let context = match WgpuGraphicsContext::new_headless() {
            Ok(context) => context,
            Err(_) => {
                println!("Skipping profiler test: could not create test device.");
                return;
            }
        };
        if !WgpuTimestampQueries::feature_available(context.active_device_features) {
            println!("Skipping profiler test: TIMESTAMP_QUERY feature not available.");
            return;
        }

        let queries = WgpuTimestampQueries::new(&context, 2, 12);
        assert!(queries.period_ns() > 0.0);
        assert_eq!(
            queries.writes_inside_encoders(),
            context.supports_encoder_timestamps()
        );
        for slot in 0..2 {
            assert_eq!(
                queries.read(&context.device, slot, 0, ReadbackStrategy::BoundedWait),
                TimestampReadback::Unavailable
            );
        }
        assert_eq!(
            queries.read(&context.device, 5, 0, ReadbackStrategy::Poll),
            TimestampReadback::Unavailable
        );
        queries.shutdown(&context.device);
    }
}
