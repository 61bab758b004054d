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

//! Rendering lane: the frame pipeline and its building blocks.

mod error;
mod frame_pipeline;
mod jitter;
mod ping_pong;
mod stage;
pub mod stages;
mod targets;
mod timer_pool;

pub use error::*;
pub use frame_pipeline::*;
pub use jitter::*;
pub use ping_pong::*;
pub use stage::*;
pub use targets::*;
pub use timer_pool::*;
