// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::Duration;

/// Scan timeout of `Central::scan_default()` unless configured otherwise.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables of a `Central`.
#[derive(Clone, Debug)]
pub struct CentralConfig {
    /// Timeout applied by `Central::scan_default()`.
    pub default_scan_timeout: Duration,
    /// Stop and restart discovery whenever the effective filter changes,
    /// even on radios able to swap the filter of a running discovery.
    pub restart_on_filter_change: bool,
}

impl Default for CentralConfig {
    fn default() -> Self {
        CentralConfig {
            default_scan_timeout: DEFAULT_SCAN_TIMEOUT,
            restart_on_filter_change: false,
        }
    }
}
