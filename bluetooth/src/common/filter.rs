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

use std::collections::BTreeSet;
use std::fmt;

use super::{BleAdvertisement, ServiceUuid};

/// Which peripherals a discovery should report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ScanFilter {
    /// Every peripheral.
    #[default]
    All,
    /// Peripherals advertising at least one of these services. Never empty.
    Services(BTreeSet<ServiceUuid>),
}

impl ScanFilter {
    /// Build a filter from an optional service list. `None` and an empty list
    /// both mean "match all".
    pub fn from_services<I>(services: Option<I>) -> Self
    where
        I: IntoIterator<Item = ServiceUuid>,
    {
        let services: BTreeSet<ServiceUuid> =
            services.into_iter().flatten().collect();
        if services.is_empty() {
            ScanFilter::All
        } else {
            ScanFilter::Services(services)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, ScanFilter::All)
    }

    /// Services to hand to the radio, `None` for "match all".
    pub fn services(&self) -> Option<&BTreeSet<ServiceUuid>> {
        match self {
            ScanFilter::All => None,
            ScanFilter::Services(services) => Some(services),
        }
    }

    /// Whether a received advertisement passes this filter.
    pub fn matches(&self, advertisement: &BleAdvertisement) -> bool {
        match self {
            ScanFilter::All => true,
            ScanFilter::Services(services) => services
                .iter()
                .any(|uuid| advertisement.advertises(uuid)),
        }
    }

    /// The smallest filter letting through everything either filter does.
    pub fn union(&self, other: &ScanFilter) -> ScanFilter {
        match (self, other) {
            (ScanFilter::Services(a), ScanFilter::Services(b)) => {
                ScanFilter::Services(a.union(b).copied().collect())
            }
            _ => ScanFilter::All,
        }
    }
}

impl fmt::Display for ScanFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanFilter::All => f.write_str("*"),
            ScanFilter::Services(services) => {
                f.write_str("{")?;
                for (i, uuid) in services.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match uuid.as_u16() {
                        Some(short) => write!(f, "{:04X}", short)?,
                        None => write!(f, "{}", uuid)?,
                    }
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{BleAddress, BleAddressKind};

    fn services(shorts: &[u16]) -> ScanFilter {
        ScanFilter::from_services(Some(
            shorts.iter().map(|s| ServiceUuid::from_u16(*s)),
        ))
    }

    fn advertising(shorts: &[u16]) -> BleAdvertisement {
        BleAdvertisement::new(BleAddress::new(
            0x112233445566,
            BleAddressKind::Random,
        ))
        .with_service_uuids(shorts.iter().map(|s| ServiceUuid::from_u16(*s)))
    }

    #[test]
    fn absent_and_empty_mean_all() {
        assert_eq!(ScanFilter::from_services::<Vec<_>>(None), ScanFilter::All);
        assert_eq!(ScanFilter::from_services(Some(vec![])), ScanFilter::All);
        assert!(!services(&[0x180D]).is_all());
    }

    #[test]
    fn all_matches_everything() {
        assert!(ScanFilter::All.matches(&advertising(&[])));
        assert!(ScanFilter::All.matches(&advertising(&[0x180F])));
    }

    #[test]
    fn services_match_any_advertised_uuid() {
        let filter = services(&[0x180D, 0x180F]);
        assert!(filter.matches(&advertising(&[0x180F])));
        assert!(!filter.matches(&advertising(&[0x1812])));
        assert!(!filter.matches(&advertising(&[])));
    }

    #[test]
    fn union() {
        assert_eq!(
            services(&[0x180D]).union(&services(&[0x180F])),
            services(&[0x180D, 0x180F])
        );
        assert_eq!(
            services(&[0x180D]).union(&ScanFilter::All),
            ScanFilter::All
        );
        assert_eq!(
            ScanFilter::All.union(&services(&[0x180D])),
            ScanFilter::All
        );
    }

    #[test]
    fn display() {
        assert_eq!(ScanFilter::All.to_string(), "*");
        assert_eq!(services(&[0x180F, 0x180D]).to_string(), "{180D, 180F}");
    }
}
