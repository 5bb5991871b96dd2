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

use crate::{
    api::{self, RadioEventSink},
    common::{BluetoothError, PowerState, ScanFilter},
};

/// Concrete type implementing `api::Radio`, used on targets without a radio
/// backend. It can't be constructed through `default()`; every command
/// reports `NotSupported`.
pub struct Radio;

fn unsupported() -> BluetoothError {
    BluetoothError::NotSupported(String::from(
        "no radio backend for this target platform",
    ))
}

#[async_trait]
impl api::Radio for Radio {
    async fn default() -> Result<Self, BluetoothError> {
        Err(unsupported())
    }

    fn attach(&mut self, _sink: Arc<dyn RadioEventSink>) {}

    fn power_state(&self) -> PowerState {
        PowerState::Unsupported
    }

    fn start_discovery(
        &mut self,
        _filter: &ScanFilter,
    ) -> Result<(), BluetoothError> {
        Err(unsupported())
    }

    fn stop_discovery(&mut self) -> Result<(), BluetoothError> {
        Err(unsupported())
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::api::Radio as _;

    #[test]
    fn default_is_not_supported() {
        let result = block_on(Radio::default());
        assert!(matches!(result, Err(BluetoothError::NotSupported(_))));
    }

    #[test]
    fn commands_are_not_supported() {
        let mut radio = Radio;
        assert_eq!(radio.power_state(), PowerState::Unsupported);
        assert!(radio.start_discovery(&ScanFilter::All).is_err());
        assert!(radio.stop_discovery().is_err());
    }
}
