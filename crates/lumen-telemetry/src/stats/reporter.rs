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

//! Turns the frame pipeline's statistics into something a diagnostics panel can show.

use lumen_core::renderer::{FrameStats, GpuStage};
use serde::Serialize;

use super::StatsHistory;

/// One stage line of a [`StatsReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    /// The stage.
    pub stage: GpuStage,
    /// Time of the stage in the latest valid sample. `None` if the stage did not run.
    pub time_ms: Option<f32>,
    /// Mean over the rolling window, 0.0 if the stage never ran.
    pub average_ms: f32,
}

/// What the diagnostics panel should display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatsReport {
    /// No frame has been read back yet.
    NoData,
    /// The latest valid sample together with the rolling averages.
    Sample {
        /// Frame that delivered the sample.
        frame_index: u64,
        /// Frame the GPU timings were measured on, usually `frame_index - 1`.
        gpu_frame_index: Option<u64>,
        /// Host-measured CPU time of `frame_index`.
        cpu_frame_time_ms: f32,
        /// Per-stage timings, in execution order.
        stages: Vec<StageReport>,
        /// Sum of the measured stage times.
        total_gpu_ms: f32,
        /// Mean of the total over the rolling window.
        average_total_gpu_ms: f32,
        /// Trend of the total over the rolling window. Positive when slowing down.
        total_gpu_trend_ms: f32,
    },
}

/// Aggregates [`FrameStats`] into a latest valid sample plus rolling histories.
///
/// Samples whose GPU data is not valid never replace the latest sample, so the
/// panel keeps showing the last real numbers while readbacks are pending.
#[derive(Debug, Clone)]
pub struct StatsReporter {
    latest: Option<FrameStats>,
    total: StatsHistory,
    stages: [StatsHistory; GpuStage::COUNT],
    // CPU time is known for every frame, valid or not.
    cpu: StatsHistory,
    frames_recorded: u64,
    valid_samples: u64,
}

impl StatsReporter {
    /// Creates a reporter whose rolling windows hold `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            latest: None,
            total: StatsHistory::new(capacity),
            stages: std::array::from_fn(|_| StatsHistory::new(capacity)),
            cpu: StatsHistory::new(capacity),
            frames_recorded: 0,
            valid_samples: 0,
        }
    }

    /// Consumes the statistics of one frame.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.cpu.push(stats.cpu_frame_time_ms);
        if !stats.gpu_data_valid {
            log::trace!("Frame {} has no GPU timings yet.", stats.frame_index);
            return;
        }

        self.valid_samples += 1;
        self.total.push(stats.total_gpu_time_ms());
        for stage in GpuStage::ALL {
            if let Some(time) = stats.gpu_time(stage) {
                self.stages[stage.index()].push(time);
            }
        }
        self.latest = Some(stats);
    }

    /// The latest sample carrying valid GPU timings.
    pub fn latest(&self) -> Option<&FrameStats> {
        self.latest.as_ref()
    }

    /// Number of frames recorded, valid or not.
    pub fn frames_recorded(&self) -> u64 {
        self.frames_recorded
    }

    /// Number of frames that carried valid GPU timings.
    pub fn valid_samples(&self) -> u64 {
        self.valid_samples
    }

    /// Rolling window of the total GPU time.
    pub fn total_history(&self) -> &StatsHistory {
        &self.total
    }

    /// Rolling window of one stage's GPU time.
    pub fn stage_history(&self, stage: GpuStage) -> &StatsHistory {
        &self.stages[stage.index()]
    }

    /// Rolling window of the CPU frame time.
    pub fn cpu_history(&self) -> &StatsHistory {
        &self.cpu
    }

    /// Forgets every sample, e.g. after a settings change that invalidates comparisons.
    pub fn reset(&mut self) {
        self.latest = None;
        self.total.clear();
        self.stages.iter_mut().for_each(StatsHistory::clear);
        self.cpu.clear();
    }

    /// Builds the report for the current state.
    pub fn report(&self) -> StatsReport {
        let Some(latest) = &self.latest else {
            return StatsReport::NoData;
        };
        let stages = GpuStage::ALL
            .into_iter()
            .map(|stage| StageReport {
                stage,
                time_ms: latest.gpu_time(stage),
                average_ms: self.stage_history(stage).average(),
            })
            .collect();
        StatsReport::Sample {
            frame_index: latest.frame_index,
            gpu_frame_index: latest.gpu_frame_index,
            cpu_frame_time_ms: latest.cpu_frame_time_ms,
            stages,
            total_gpu_ms: latest.total_gpu_time_ms(),
            average_total_gpu_ms: self.total.average(),
            total_gpu_trend_ms: self.total.trend(),
        }
    }

    /// The report as plain text lines.
    pub fn panel_lines(&self) -> Vec<String> {
        let mut lines = vec!["GPU Timings".to_string()];
        match self.report() {
            StatsReport::NoData => lines.push("  No data available".to_string()),
            StatsReport::Sample {
                gpu_frame_index,
                cpu_frame_time_ms,
                stages,
                total_gpu_ms,
                average_total_gpu_ms,
                ..
            } => {
                if let Some(gpu_frame) = gpu_frame_index {
                    lines[0] = format!("GPU Timings (frame {gpu_frame})");
                }
                for report in stages {
                    let label = report.stage.label();
                    match report.time_ms {
                        Some(time) => lines.push(format!(
                            "  {label:<18} {time:>8.3} ms  (avg {:.3})",
                            report.average_ms
                        )),
                        None => lines.push(format!("  {label:<18} {:>8}", "off")),
                    }
                }
                lines.push(format!(
                    "  {:<18} {total_gpu_ms:>8.3} ms  (avg {average_total_gpu_ms:.3})",
                    "Total GPU"
                ));
                lines.push(format!("  {:<18} {cpu_frame_time_ms:>8.3} ms", "CPU Frame"));
            }
        }
        lines
    }

    /// The report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.report())
    }
}

impl Default for StatsReporter {
    fn default() -> Self {
        Self::new(60)
    }
}
