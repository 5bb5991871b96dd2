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

pub mod api;
mod common;
pub mod emulator;

pub use common::{
    BleAddress, BleAddressKind, BleAdvertisement, BluetoothError, PowerState,
    PublicPowerState, ScanFilter, ServiceData, ServiceUuid,
};

cfg_if::cfg_if! {
    if #[cfg(feature = "emulator")] {
        use emulator as platform;
    } else {
        mod unsupported;
        use unsupported as platform;
    }
}

pub struct Platform;

impl Platform {
    /// Retrieve the radio of the target platform. Builds with the `emulator`
    /// feature get the software radio from [`emulator`].
    pub async fn default_radio() -> Result<impl api::Radio, BluetoothError> {
        <platform::Radio as api::Radio>::default().await
    }
}
