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

use super::{BleAddress, ServiceUuid};

/// Holds data related to an incoming BLE Advertisement: the address of the
/// sender and the sections of the advertisement the Central cares about.
#[derive(Clone, Debug, PartialEq)]
pub struct BleAdvertisement {
    address: BleAddress,
    local_name: Option<String>,
    rssi: Option<i16>,
    service_uuids: Vec<ServiceUuid>,
    service_data: Vec<ServiceData>,
}

impl BleAdvertisement {
    /// Construct a new `BleAdvertisement` carrying no data sections.
    pub fn new(address: BleAddress) -> Self {
        BleAdvertisement {
            address,
            local_name: None,
            rssi: None,
            service_uuids: Vec::new(),
            service_data: Vec::new(),
        }
    }

    pub fn with_local_name(mut self, name: impl Into<String>) -> Self {
        self.local_name = Some(name.into());
        self
    }

    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi = Some(rssi);
        self
    }

    pub fn with_service_uuids(
        mut self,
        uuids: impl IntoIterator<Item = ServiceUuid>,
    ) -> Self {
        self.service_uuids.extend(uuids);
        self
    }

    pub fn with_service_data(mut self, data: ServiceData) -> Self {
        self.service_data.push(data);
        self
    }

    /// Retrieve the `BleAddress` that emitted this advertisement.
    pub fn address(&self) -> BleAddress {
        self.address
    }

    pub fn local_name(&self) -> Option<&str> {
        self.local_name.as_deref()
    }

    /// Received signal strength in dBm, when the radio reports it.
    pub fn rssi(&self) -> Option<i16> {
        self.rssi
    }

    pub fn service_uuids(&self) -> &[ServiceUuid] {
        &self.service_uuids
    }

    pub fn service_data(&self) -> &[ServiceData] {
        &self.service_data
    }

    /// Whether the peripheral lists `uuid`, either in its service UUID
    /// sections or as the key of a service data section.
    pub fn advertises(&self, uuid: &ServiceUuid) -> bool {
        self.service_uuids.contains(uuid)
            || self.service_data.iter().any(|data| data.uuid() == *uuid)
    }
}

/// Struct representing the Bluetooth Service Data common data type.
/// Bluetooth Supplement to the Core Specification, Part A, Section 1.11.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceData {
    uuid: ServiceUuid,
    data: Vec<u8>,
}

impl ServiceData {
    pub fn new(uuid: ServiceUuid, data: Vec<u8>) -> Self {
        ServiceData { uuid, data }
    }

    pub fn uuid(&self) -> ServiceUuid {
        self.uuid
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::BleAddressKind;

    #[test]
    fn advertises_listed_and_service_data_uuids() {
        let fast_pair = ServiceUuid::from_u16(0xFE2C);
        let battery = ServiceUuid::from_u16(0x180F);
        let adv = BleAdvertisement::new(BleAddress::new(
            0x112233445566,
            BleAddressKind::Public,
        ))
        .with_service_uuids([battery])
        .with_service_data(ServiceData::new(fast_pair, vec![0x00, 0x01]));

        assert!(adv.advertises(&battery));
        assert!(adv.advertises(&fast_pair));
        assert!(!adv.advertises(&ServiceUuid::from_u16(0x180D)));
        assert_eq!(adv.service_data()[0].data(), &[0x00, 0x01]);
    }

    #[test]
    fn optional_sections() {
        let adv = BleAdvertisement::new(BleAddress::new(
            0x1,
            BleAddressKind::Random,
        ));
        assert_eq!(adv.local_name(), None);
        assert_eq!(adv.rssi(), None);

        let adv = adv.with_local_name("Pixel Buds").with_rssi(-61);
        assert_eq!(adv.local_name(), Some("Pixel Buds"));
        assert_eq!(adv.rssi(), Some(-61));
    }
}
