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

use std::sync::Arc;

use async_trait::async_trait;

use crate::common::{
    BleAdvertisement, BluetoothError, PowerState, ScanFilter,
};

/// Concrete types implementing this trait drive a platform BLE radio in the
/// Central role. Commands are fire-and-forget: their outcome, along with
/// every other radio event, is reported later through the attached
/// [`RadioEventSink`].
#[async_trait]
pub trait Radio: Send + Sized + 'static {
    /// Retrieve the system-default radio.
    async fn default() -> Result<Self, BluetoothError>;

    /// Register the receiver of all future radio events. Replaces any sink
    /// attached before.
    fn attach(&mut self, sink: Arc<dyn RadioEventSink>);

    /// Raw power state of the radio, possibly transient.
    fn power_state(&self) -> PowerState;

    /// Begin discovering peripherals matching `filter`. Calling this while
    /// discovery is running replaces the filter if
    /// [`Radio::supports_filter_update`] is true.
    fn start_discovery(
        &mut self,
        filter: &ScanFilter,
    ) -> Result<(), BluetoothError>;

    /// Stop discovering peripherals.
    fn stop_discovery(&mut self) -> Result<(), BluetoothError>;

    /// Whether `start_discovery()` may be called again mid-discovery to
    /// swap the filter. Radios returning `false` are stopped and restarted.
    fn supports_filter_update(&self) -> bool {
        false
    }
}

/// Receiver of asynchronous radio events. Implementations must be cheap and
/// non-blocking: radios call them from their own event threads.
pub trait RadioEventSink: Send + Sync {
    /// The radio changed power state.
    fn on_power_state_changed(&self, state: PowerState);

    /// An advertisement was received while discovery was running.
    fn on_device_discovered(&self, advertisement: BleAdvertisement);

    /// A previously accepted `start_discovery()` failed.
    fn on_discovery_failed(&self, error: BluetoothError);
}
