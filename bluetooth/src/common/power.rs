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

use std::fmt;

use super::BluetoothError;

/// Raw power state reported by a radio.
///
/// `Unknown` and `Resetting` are transient: the radio is expected to settle
/// on one of the other, stable, values shortly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowerState {
    Unknown,
    Resetting,
    Unsupported,
    Unauthorized,
    PoweredOff,
    PoweredOn,
}

impl PowerState {
    /// True for the states nothing can be done in but wait.
    pub fn is_transient(&self) -> bool {
        matches!(self, PowerState::Unknown | PowerState::Resetting)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PowerState::Unknown => "unknown",
            PowerState::Resetting => "resetting",
            PowerState::Unsupported => "unsupported",
            PowerState::Unauthorized => "unauthorized",
            PowerState::PoweredOff => "powered off",
            PowerState::PoweredOn => "powered on",
        };
        f.write_str(name)
    }
}

/// The stable subset of `PowerState`, the only values ever surfaced to
/// callers waiting on a resolved state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PublicPowerState {
    Unsupported,
    Unauthorized,
    PoweredOff,
    PoweredOn,
}

impl TryFrom<PowerState> for PublicPowerState {
    type Error = BluetoothError;

    fn try_from(state: PowerState) -> Result<Self, Self::Error> {
        match state {
            PowerState::Unsupported => Ok(PublicPowerState::Unsupported),
            PowerState::Unauthorized => Ok(PublicPowerState::Unauthorized),
            PowerState::PoweredOff => Ok(PublicPowerState::PoweredOff),
            PowerState::PoweredOn => Ok(PublicPowerState::PoweredOn),
            PowerState::Unknown | PowerState::Resetting => {
                Err(BluetoothError::BadTypeConversion(format!(
                    "power state `{}` is transient",
                    state
                )))
            }
        }
    }
}

impl From<PublicPowerState> for PowerState {
    fn from(state: PublicPowerState) -> Self {
        match state {
            PublicPowerState::Unsupported => PowerState::Unsupported,
            PublicPowerState::Unauthorized => PowerState::Unauthorized,
            PublicPowerState::PoweredOff => PowerState::PoweredOff,
            PublicPowerState::PoweredOn => PowerState::PoweredOn,
        }
    }
}

impl fmt::Display for PublicPowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&PowerState::from(*self), f)
    }
}
