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

use bluetooth::{BluetoothError, PublicPowerState};
use thiserror::Error;

/// Errors surfaced by the Central, either returned from a call or delivered
/// as the terminal result of a scan.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CentralError {
    /// A service filter was given but holds no service. Pass `None` to
    /// discover every peripheral.
    #[error("service filter is empty, pass `None` to match every peripheral")]
    EmptyServiceFilter,
    /// The radio rejected or dropped discovery.
    #[error("radio error: {0}")]
    Radio(#[from] BluetoothError),
    /// The radio settled on a state other than `PoweredOn`.
    #[error("radio is {0}")]
    RadioUnavailable(PublicPowerState),
    /// The engine loop is gone, so nothing can be queued anymore.
    #[error("central engine is not running")]
    EngineStopped,
    /// The engine could not build its own runtime.
    #[error("runtime error: {0}")]
    Runtime(String),
}
