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

//! Backend-agnostic rendering API.
//!
//! - **[`texture`]**: texture handles, formats, usages and descriptors.
//! - **[`pipeline`]**: stage program keys and registration descriptors.
//! - **[`command`]**: dispatch, full-screen draw and barrier commands.
//! - **[`params`]**: the uniform block shared by every stage.
//! - **[`query`]**: timestamp query layout and readback results.
//! - **[`scene`]**: per-frame host inputs.
//! - **[`settings`]**: runtime-tunable pipeline settings.
//! - **[`stats`]**: per-frame statistics.

pub mod command;
pub mod params;
pub mod pipeline;
pub mod query;
pub mod scene;
pub mod settings;
pub mod stats;
pub mod texture;

pub use self::command::*;
pub use self::params::*;
pub use self::pipeline::*;
pub use self::query::*;
pub use self::scene::*;
pub use self::settings::*;
pub use self::stats::*;
pub use self::texture::*;
