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

use lumen_core::renderer::{
    CommandEncoder, GpuStage, GraphicsDevice, ReadbackStrategy, TimestampReadback,
    QUERIES_PER_SLOT, QUERY_SLOT_COUNT,
};

/// The outcome of [`GpuTimerPool::collect_completed`].
#[derive(Debug, Clone, PartialEq)]
pub enum TimerReadout {
    /// No valid sample exists for the previous frame (first frame, nothing
    /// issued, resolve skipped, issued before a resize, or profiling off).
    Invalid,
    /// The previous frame's queries are issued but the GPU has not produced them yet.
    NotReady,
    /// Per-stage durations in milliseconds of the frame that issued them.
    Ready {
        /// The frame whose queries were read back.
        frame: u64,
        /// `None` for a stage that was not timed.
        times: [Option<f32>; GpuStage::COUNT],
    },
}

/// What was issued into one query slot, and for which frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SlotIssue {
    frame: Option<u64>,
    epoch: u64,
    begun: u8,
    ended: u8,
    resolved: bool,
    scheduled: bool,
}

impl SlotIssue {
    fn timed(&self, stage: GpuStage) -> bool {
        let bit = 1 << stage.index();
        self.begun & bit != 0 && self.ended & bit != 0
    }
}

/// Double-buffered pool of timestamp query pairs, one pair per [`GpuStage`].
///
/// Frame `f` writes slot `f % 2` and reads back slot `(f + 1) % 2`, filled by
/// frame `f - 1`. The pool tracks what was issued into each slot so that a slot
/// is only read back once every pair it reports was both begun and ended,
/// resolved, and scheduled for readback in the current resize epoch.
#[derive(Debug)]
pub struct GpuTimerPool {
    enabled: bool,
    frame_index: u64,
    epoch: u64,
    slots: [SlotIssue; QUERY_SLOT_COUNT as usize],
}

impl GpuTimerPool {
    /// Creates a pool. A disabled pool records nothing and always reads back `Invalid`.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            frame_index: 0,
            epoch: 0,
            slots: [SlotIssue::default(); QUERY_SLOT_COUNT as usize],
        }
    }

    /// Whether timestamps are being recorded.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turns recording on or off. Slots issued before the change are discarded.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.invalidate_in_flight();
        }
    }

    /// Slot written by the current frame.
    pub fn active_slot(&self) -> u32 {
        (self.frame_index % QUERY_SLOT_COUNT as u64) as u32
    }

    /// Slot read back by the current frame.
    pub fn readback_slot(&self) -> u32 {
        ((self.frame_index + 1) % QUERY_SLOT_COUNT as u64) as u32
    }

    /// Current resize epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Selects `frame_index % 2` as the active slot and clears its issuance record.
    pub fn begin_frame(&mut self, frame_index: u64) {
        self.frame_index = frame_index;
        let epoch = self.epoch;
        self.slots[self.active_slot() as usize] = SlotIssue {
            frame: Some(frame_index),
            epoch,
            ..Default::default()
        };
    }

    /// Writes the start timestamp of `stage` into the active slot.
    pub fn begin_section(&mut self, encoder: &mut dyn CommandEncoder, stage: GpuStage) {
        if !self.enabled {
            return;
        }
        let slot = self.active_slot();
        let issue = &mut self.slots[slot as usize];
        let bit = 1 << stage.index();
        if issue.begun & bit != 0 {
            log::error!(
                "GPU section '{}' begun twice in frame {}, ignoring.",
                stage,
                self.frame_index
            );
            return;
        }
        encoder.write_timestamp(slot, stage.start_query());
        issue.begun |= bit;
    }

    /// Writes the end timestamp of `stage` into the active slot.
    pub fn end_section(&mut self, encoder: &mut dyn CommandEncoder, stage: GpuStage) {
        if !self.enabled {
            return;
        }
        let slot = self.active_slot();
        let issue = &mut self.slots[slot as usize];
        let bit = 1 << stage.index();
        if issue.begun & bit == 0 || issue.ended & bit != 0 {
            log::error!(
                "GPU section '{}' ended without a matching begin in frame {}, ignoring.",
                stage,
                self.frame_index
            );
            return;
        }
        encoder.write_timestamp(slot, stage.end_query());
        issue.ended |= bit;
    }

    /// Resolves the active slot at the end of recording.
    pub fn resolve(&mut self, encoder: &mut dyn CommandEncoder) {
        if !self.enabled {
            return;
        }
        let slot = self.active_slot();
        let issue = &mut self.slots[slot as usize];
        if issue.begun != issue.ended {
            log::error!(
                "GPU sections left open in frame {} (begun {:#08b}, ended {:#08b}).",
                self.frame_index,
                issue.begun,
                issue.ended
            );
        }
        if issue.ended == 0 {
            return;
        }
        // Every query in the resolved range must be written by this submission;
        // skipped stages get a back-to-back pair and stay untimed.
        for stage in GpuStage::ALL {
            let bit = 1 << stage.index();
            if issue.begun & bit == 0 {
                encoder.write_timestamp(slot, stage.start_query());
            }
            if issue.ended & bit == 0 {
                encoder.write_timestamp(slot, stage.end_query());
            }
        }
        issue.resolved = encoder.resolve_timestamps(slot, QUERIES_PER_SLOT);
        if !issue.resolved {
            log::debug!(
                "Timestamp readback buffer {} still in use, frame {} will not be timed.",
                slot,
                self.frame_index
            );
        }
    }

    /// Schedules the asynchronous readback of the active slot. Call once the
    /// command buffer that resolved it has been submitted.
    pub fn after_submit(&mut self, device: &dyn GraphicsDevice) {
        let slot = self.active_slot();
        let issue = &mut self.slots[slot as usize];
        if let (true, Some(frame)) = (issue.resolved, issue.frame) {
            device.schedule_timestamp_readback(slot, frame);
            issue.scheduled = true;
        }
    }

    /// Reads back the previous frame's slot, never the active one.
    pub fn collect_completed(
        &mut self,
        device: &dyn GraphicsDevice,
        strategy: ReadbackStrategy,
    ) -> TimerReadout {
        if !self.enabled {
            return TimerReadout::Invalid;
        }
        let slot = self.readback_slot();
        let issue = self.slots[slot as usize];
        let frame = match issue.frame {
            Some(frame) if issue.scheduled && issue.epoch == self.epoch => frame,
            _ => return TimerReadout::Invalid,
        };

        match device.read_timestamps(slot, frame, strategy) {
            TimestampReadback::NotReady => {
                log::trace!("Timestamps of frame {frame} not ready yet.");
                TimerReadout::NotReady
            }
            TimestampReadback::Unavailable => {
                log::debug!("Timestamps of frame {frame} unavailable, dropping sample.");
                self.slots[slot as usize].scheduled = false;
                TimerReadout::Invalid
            }
            TimestampReadback::Ready(ticks) => {
                self.slots[slot as usize].scheduled = false;
                if ticks.len() < QUERIES_PER_SLOT as usize {
                    log::error!(
                        "Timestamp readback returned {} values, expected {}.",
                        ticks.len(),
                        QUERIES_PER_SLOT
                    );
                    return TimerReadout::Invalid;
                }
                TimerReadout::Ready {
                    frame,
                    times: Self::durations(&issue, &ticks, device.timestamp_period_ns()),
                }
            }
        }
    }

    /// Discards every slot issued so far. Called when the targets are recreated.
    pub fn invalidate_in_flight(&mut self) {
        self.epoch += 1;
        log::debug!("Timer pool epoch advanced to {}.", self.epoch);
    }

    fn durations(
        issue: &SlotIssue,
        ticks: &[u64],
        period_ns: f32,
    ) -> [Option<f32>; GpuStage::COUNT] {
        let mut times = [None; GpuStage::COUNT];
        for stage in GpuStage::ALL {
            if !issue.timed(stage) {
                continue;
            }
            let start = ticks[stage.start_query() as usize];
            let end = ticks[stage.end_query() as usize];
            if end < start {
                log::debug!("Stage '{stage}' has an end timestamp before its start, dropping it.");
                continue;
            }
            let ms = (end - start) as f64 * period_ns as f64 / 1_000_000.0;
            times[stage.index()] = Some(ms as f32);
        }
        times
    }
}
