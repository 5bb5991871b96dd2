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

/// The Bluetooth Base UUID, 00000000-0000-1000-8000-00805F9B34FB.
/// Bluetooth Core Specification, Vol 3, Part B, Section 2.5.1.
const BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;

/// 128-bit identifier of a GATT service, as listed in advertisements and
/// used to filter discovery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceUuid(u128);

impl ServiceUuid {
    pub const fn from_u128(uuid: u128) -> Self {
        ServiceUuid(uuid)
    }

    /// Expand a 16-bit assigned number onto the Base UUID.
    pub const fn from_u16(short: u16) -> Self {
        ServiceUuid(BASE_UUID | ((short as u128) << 96))
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }

    /// The 16-bit assigned number, if this UUID is derived from the Base UUID.
    pub fn as_u16(&self) -> Option<u16> {
        let short = (self.0 >> 96) as u16;
        (Self::from_u16(short) == *self).then_some(short)
    }
}

impl From<u16> for ServiceUuid {
    fn from(short: u16) -> Self {
        ServiceUuid::from_u16(short)
    }
}

impl From<u128> for ServiceUuid {
    fn from(uuid: u128) -> Self {
        ServiceUuid(uuid)
    }
}

impl fmt::Display for ServiceUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:04X}-{:012X}",
            v >> 96,
            (v >> 80) & 0xFFFF,
            (v >> 64) & 0xFFFF,
            (v >> 48) & 0xFFFF,
            v & 0xFFFF_FFFF_FFFF,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u16_expands_onto_base_uuid() {
        let heart_rate = ServiceUuid::from_u16(0x180D);
        assert_eq!(
            heart_rate.as_u128(),
            0x0000_180D_0000_1000_8000_0080_5F9B_34FB
        );
        assert_eq!(heart_rate.as_u16(), Some(0x180D));
    }

    #[test]
    fn as_u16_of_vendor_uuid() {
        let vendor =
            ServiceUuid::from_u128(0x6E40_0001_B5A3_F393_E0A9_E50E_24DC_CA9E);
        assert_eq!(vendor.as_u16(), None);
    }

    #[test]
    fn display() {
        assert_eq!(
            ServiceUuid::from_u16(0xFE2C).to_string(),
            "0000FE2C-0000-1000-8000-00805F9B34FB"
        );
    }
}
