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

/// BLE Addresses can either be the peripheral's public MAC address, or various
/// types of random addresses.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum BleAddressKind {
    Public,
    Random,
}

/// Struct representing a 48-bit BLE Address and its type.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub struct BleAddress {
    val: [u8; 6],
    kind: BleAddressKind,
}

impl BleAddress {
    /// `BleAddress` constructor. Only the six least significant bytes of
    /// `addr` are kept.
    pub fn new(addr: u64, kind: BleAddressKind) -> Self {
        let addr = u64_to_6lsb(addr);

        BleAddress { val: addr, kind }
    }

    /// Retrieve the type of BLE Address (public or random).
    pub fn kind(&self) -> BleAddressKind {
        self.kind
    }
}

/// Function for converting the six LSB of a u64 into a 6-byte array.
#[inline]
fn u64_to_6lsb(num: u64) -> [u8; 6] {
    let bytes = num.to_le_bytes();
    [bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]]
}

impl From<BleAddress> for u64 {
    fn from(addr: BleAddress) -> Self {
        let mut bytes = [0u8; 8];
        bytes[..6].copy_from_slice(&addr.val);

        u64::from_le_bytes(bytes)
    }
}

// Most significant byte first, the way radios print addresses.
impl fmt::Display for BleAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.val;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            v[5], v[4], v[3], v[2], v[1], v[0]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ble_address_new() {
        let addr = BleAddress::new(0x112233445566, BleAddressKind::Public);
        assert_eq!(addr.val, [0x66, 0x55, 0x44, 0x33, 0x22, 0x11]);
        assert_eq!(addr.kind(), BleAddressKind::Public);
    }

    #[test]
    fn ble_address_into_u64() {
        let ble_addr = BleAddress::new(0xAABBCCDDEEFF, BleAddressKind::Random);
        let u64_addr: u64 = ble_addr.into();
        assert_eq!(u64_addr, 0xAABBCCDDEEFF);
    }

    #[test]
    fn ble_address_display() {
        let addr = BleAddress::new(0x0A1B2C3D4E5F, BleAddressKind::Public);
        assert_eq!(addr.to_string(), "0A:1B:2C:3D:4E:5F");
    }

    #[test]
    fn test_u64_to_6lsb() {
        assert_eq!(u64_to_6lsb(0x123456), [0x56, 0x34, 0x12, 0, 0, 0]);

        // The two most significant bytes get dropped.
        assert_eq!(
            u64_to_6lsb(0x1122334455667788),
            [0x88, 0x77, 0x66, 0x55, 0x44, 0x33]
        );
    }
}
