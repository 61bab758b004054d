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

//! Logger initialization.

use env_logger::{Builder, Env};

/// Installs `env_logger` as the global logger.
///
/// `RUST_LOG` takes precedence over `default_filter`. Backend internals are
/// capped at `warn` so per-frame validation chatter does not drown the frame log.
/// Calling this more than once is harmless: later calls are ignored.
pub fn init_logging(default_filter: &str) {
    let result = Builder::from_env(Env::default().default_filter_or(default_filter))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .filter_module("wgpu_core", log::LevelFilter::Warn)
        .filter_module("naga", log::LevelFilter::Warn)
        .format_timestamp_millis()
        .try_init();
    if result.is_err() {
        log::debug!("Logger already initialized, keeping the existing one.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_ignored() {
        init_logging("debug");
        init_logging("info");
        log::info!("still logging");
    }
}
