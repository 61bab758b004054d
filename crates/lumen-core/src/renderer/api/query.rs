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

//! Timestamp query layout and readback results.

/// Number of query slots. Slot `frame_index % QUERY_SLOT_COUNT` is written each frame.
pub const QUERY_SLOT_COUNT: u32 = 2;

/// Number of timestamp queries in one slot: a start/end pair per [`GpuStage`](crate::renderer::GpuStage).
pub const QUERIES_PER_SLOT: u32 = 12;

/// The outcome of reading a slot's resolved timestamps back from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampReadback {
    /// The raw ticks of every query in the slot, in query order.
    Ready(Vec<u64>),
    /// The GPU has not finished writing the slot yet.
    NotReady,
    /// The slot holds no data for the requested frame (never copied, stale,
    /// or profiling unsupported).
    Unavailable,
}
