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

//! # Lumen Telemetry
//!
//! Consumes the per-frame statistics produced by the frame pipeline and turns
//! them into rolling histories, a text panel and JSON for external diagnostics.
//! Also owns the logger setup shared by every host binary.

#![warn(missing_docs)]

pub mod logging;
pub mod stats;

pub use logging::init_logging;
pub use stats::{StageReport, StatsHistory, StatsReport, StatsReporter};
