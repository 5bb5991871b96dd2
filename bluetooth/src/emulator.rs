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

//! Software radio for demos and for hosts without Bluetooth hardware.
//!
//! The emulated radio starts out in a transient power state, settles on
//! `PoweredOn` shortly after a sink is attached, and while discovering
//! replays a fixed set of advertisements from its own thread.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread,
    time::Duration,
};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    api::{self, RadioEventSink},
    common::{
        BleAddress, BleAddressKind, BleAdvertisement, BluetoothError,
        PowerState, ScanFilter, ServiceData, ServiceUuid,
    },
};

/// Behaviour of an emulated radio.
#[derive(Clone, Debug)]
pub struct EmulatorConfig {
    /// Power state before any event is emitted.
    pub initial_state: PowerState,
    /// Delay after `attach()` before reporting `PoweredOn`. `None` keeps the
    /// radio in `initial_state` until `EmulatorController::set_power_state()`.
    pub powered_on_after: Option<Duration>,
    /// Pause between two emitted advertisements.
    pub advertising_interval: Duration,
    /// Advertisements replayed, in order, while discovering.
    pub peripherals: Vec<BleAdvertisement>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        EmulatorConfig {
            initial_state: PowerState::Unknown,
            powered_on_after: Some(Duration::from_millis(100)),
            advertising_interval: Duration::from_millis(250),
            peripherals: vec![
                BleAdvertisement::new(BleAddress::new(
                    0xC0FFEE000001,
                    BleAddressKind::Random,
                ))
                .with_local_name("Heart Rate Sensor")
                .with_rssi(-58)
                .with_service_uuids([ServiceUuid::from_u16(0x180D)]),
                BleAdvertisement::new(BleAddress::new(
                    0xC0FFEE000002,
                    BleAddressKind::Public,
                ))
                .with_local_name("Earbuds")
                .with_rssi(-71)
                .with_service_data(ServiceData::new(
                    ServiceUuid::from_u16(0xFE2C),
                    vec![0x2A, 0x41, 0x0C],
                )),
                BleAdvertisement::new(BleAddress::new(
                    0xC0FFEE000003,
                    BleAddressKind::Random,
                ))
                .with_rssi(-83)
                .with_service_uuids([ServiceUuid::from_u16(0x180F)]),
            ],
        }
    }
}

/// State shared between the radio, its worker threads and controllers.
struct Shared {
    state: Mutex<PowerState>,
    sink: Mutex<Option<Arc<dyn RadioEventSink>>>,
}

impl Shared {
    fn state(&self) -> PowerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sink(&self) -> Option<Arc<dyn RadioEventSink>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_state(&self, state: PowerState) {
        {
            let mut current =
                self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *current == state {
                return;
            }
            *current = state;
        }
        info!("Emulated radio is now {}.", state);
        if let Some(sink) = self.sink() {
            sink.on_power_state_changed(state);
        }
    }
}

/// Drives the power state of an emulated radio after it has been handed
/// over to its owner.
#[derive(Clone)]
pub struct EmulatorController {
    shared: Arc<Shared>,
}

impl EmulatorController {
    /// Simulate the user or the OS toggling the radio. Any running discovery
    /// goes quiet until the radio is `PoweredOn` and discovery is restarted.
    pub fn set_power_state(&self, state: PowerState) {
        self.shared.set_state(state);
    }

    pub fn power_state(&self) -> PowerState {
        self.shared.state()
    }
}

/// Concrete type implementing `api::Radio` in software.
pub struct Radio {
    config: EmulatorConfig,
    shared: Arc<Shared>,
    /// Cleared to end the worker of the current discovery.
    discovery: Option<Arc<AtomicBool>>,
}

impl Radio {
    pub fn new(config: EmulatorConfig) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(config.initial_state),
            sink: Mutex::new(None),
        });
        Radio {
            config,
            shared,
            discovery: None,
        }
    }

    pub fn controller(&self) -> EmulatorController {
        EmulatorController {
            shared: self.shared.clone(),
        }
    }

    pub fn is_discovering(&self) -> bool {
        self.discovery.is_some()
    }

    fn halt_worker(&mut self) -> bool {
        match self.discovery.take() {
            Some(running) => {
                running.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl api::Radio for Radio {
    async fn default() -> Result<Self, BluetoothError> {
        Ok(Radio::new(EmulatorConfig::default()))
    }

    fn attach(&mut self, sink: Arc<dyn RadioEventSink>) {
        *self.shared.sink.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(sink);

        if let Some(delay) = self.config.powered_on_after {
            if self.shared.state().is_transient() {
                let shared = self.shared.clone();
                thread::spawn(move || {
                    thread::sleep(delay);
                    shared.set_state(PowerState::PoweredOn);
                });
            }
        }
    }

    fn power_state(&self) -> PowerState {
        self.shared.state()
    }

    fn start_discovery(
        &mut self,
        filter: &ScanFilter,
    ) -> Result<(), BluetoothError> {
        let state = self.shared.state();
        if state != PowerState::PoweredOn {
            return Err(BluetoothError::FailedPrecondition(format!(
                "radio is {}",
                state
            )));
        }
        if self.halt_worker() {
            info!("Emulated discovery filter updated to {}.", filter);
        }

        let peripherals: Vec<BleAdvertisement> = self
            .config
            .peripherals
            .iter()
            .filter(|advertisement| filter.matches(advertisement))
            .cloned()
            .collect();
        if peripherals.is_empty() {
            warn!("No emulated peripheral matches {}.", filter);
        }

        let running = Arc::new(AtomicBool::new(true));
        let interval = self.config.advertising_interval;
        let shared = self.shared.clone();
        let worker_running = running.clone();
        thread::spawn(move || {
            for advertisement in peripherals.iter().cycle() {
                thread::sleep(interval);
                if !worker_running.load(Ordering::SeqCst)
                    || shared.state() != PowerState::PoweredOn
                {
                    break;
                }
                if let Some(sink) = shared.sink() {
                    sink.on_device_discovered(advertisement.clone());
                }
            }
        });

        self.discovery = Some(running);
        info!("Emulated discovery started for {}.", filter);
        Ok(())
    }

    fn stop_discovery(&mut self) -> Result<(), BluetoothError> {
        if self.halt_worker() {
            info!("Emulated discovery stopped.");
            Ok(())
        } else {
            Err(BluetoothError::FailedPrecondition(String::from(
                "discovery hasn't started, please call `start_discovery()`",
            )))
        }
    }

    fn supports_filter_update(&self) -> bool {
        true
    }
}

impl Drop for Radio {
    fn drop(&mut self) {
        self.halt_worker();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::api::Radio as _;

    #[derive(Debug, PartialEq)]
    enum Event {
        PowerState(PowerState),
        Discovered(BleAdvertisement),
        Failed(BluetoothError),
    }

    struct RecordingSink {
        tx: Mutex<mpsc::Sender<Event>>,
    }

    impl RecordingSink {
        fn new() -> (Arc<Self>, mpsc::Receiver<Event>) {
            let (tx, rx) = mpsc::channel();
            (Arc::new(RecordingSink { tx: Mutex::new(tx) }), rx)
        }

        fn record(&self, event: Event) {
            let _ = self.tx.lock().unwrap().send(event);
        }
    }

    impl RadioEventSink for RecordingSink {
        fn on_power_state_changed(&self, state: PowerState) {
            self.record(Event::PowerState(state));
        }

        fn on_device_discovered(&self, advertisement: BleAdvertisement) {
            self.record(Event::Discovered(advertisement));
        }

        fn on_discovery_failed(&self, error: BluetoothError) {
            self.record(Event::Failed(error));
        }
    }

    const WAIT: Duration = Duration::from_secs(5);

    fn fast_config() -> EmulatorConfig {
        EmulatorConfig {
            powered_on_after: Some(Duration::ZERO),
            advertising_interval: Duration::from_millis(1),
            ..EmulatorConfig::default()
        }
    }

    #[test]
    fn powers_on_after_attach() {
        let mut radio = Radio::new(fast_config());
        assert_eq!(radio.power_state(), PowerState::Unknown);

        let (sink, events) = RecordingSink::new();
        radio.attach(sink);

        assert_eq!(
            events.recv_timeout(WAIT).unwrap(),
            Event::PowerState(PowerState::PoweredOn)
        );
        assert_eq!(radio.power_state(), PowerState::PoweredOn);
    }

    #[test]
    fn discovery_honours_filter() {
        let mut radio = Radio::new(fast_config());
        let (sink, events) = RecordingSink::new();
        radio.attach(sink);
        events.recv_timeout(WAIT).unwrap();

        let battery = ServiceUuid::from_u16(0x180F);
        radio
            .start_discovery(&ScanFilter::from_services(Some([battery])))
            .unwrap();
        assert!(radio.is_discovering());

        for _ in 0..3 {
            match events.recv_timeout(WAIT).unwrap() {
                Event::Discovered(advertisement) => {
                    assert!(advertisement.advertises(&battery))
                }
                other => panic!("unexpected event {:?}", other),
            }
        }

        radio.stop_discovery().unwrap();
        assert!(!radio.is_discovering());
    }

    #[test]
    fn discovery_requires_power() {
        let mut radio = Radio::new(EmulatorConfig {
            powered_on_after: None,
            ..fast_config()
        });
        let (sink, _events) = RecordingSink::new();
        radio.attach(sink);

        assert!(matches!(
            radio.start_discovery(&ScanFilter::All),
            Err(BluetoothError::FailedPrecondition(_))
        ));

        radio.controller().set_power_state(PowerState::PoweredOn);
        assert!(radio.start_discovery(&ScanFilter::All).is_ok());
    }

    #[test]
    fn stop_without_start() {
        let mut radio = Radio::new(fast_config());
        assert!(matches!(
            radio.stop_discovery(),
            Err(BluetoothError::FailedPrecondition(_))
        ));
    }

    #[test]
    fn controller_reports_power_changes() {
        let mut radio = Radio::new(EmulatorConfig {
            initial_state: PowerState::PoweredOn,
            ..fast_config()
        });
        let (sink, events) = RecordingSink::new();
        radio.attach(sink);

        let controller = radio.controller();
        controller.set_power_state(PowerState::PoweredOn);
        controller.set_power_state(PowerState::PoweredOff);

        // Re-reporting the current state is not an event.
        assert_eq!(
            events.recv_timeout(WAIT).unwrap(),
            Event::PowerState(PowerState::PoweredOff)
        );
        assert_eq!(radio.power_state(), PowerState::PoweredOff);
    }

    #[test]
    fn default_radio() {
        let radio = futures::executor::block_on(Radio::default()).unwrap();
        assert_eq!(radio.power_state(), PowerState::Unknown);
    }
}
