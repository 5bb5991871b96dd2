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

use std::collections::VecDeque;
use std::time::Duration;

use bluetooth::{
    api::{Radio, RadioEventSink},
    BleAdvertisement, BluetoothError, PowerState, PublicPowerState,
    ScanFilter,
};
use log::{debug, error, info, warn};
use tokio::runtime::Builder;
use tokio::sync::{mpsc, oneshot, watch};

use crate::config::CentralConfig;
use crate::error::CentralError;
use crate::scan_session::{
    ScanCallback, ScanId, ScanResult, ScanSessionManager, StopReason,
};
use crate::state_resolver::{StateCallback, StateResolver};
use crate::timer_provider::TimerProvider;

/// Events processed, one at a time, by the engine loop: commands from
/// `Central` handles and notifications from the radio.
pub(crate) enum CentralEvent {
    StartScan {
        id: ScanId,
        filter: ScanFilter,
        timeout: Duration,
        callback: ScanCallback,
    },
    StopScan,
    StateQuery(StateCallback),
    PowerStateChanged(PowerState),
    DeviceDiscovered(BleAdvertisement),
    DiscoveryFailed(BluetoothError),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// What `Central` handles can read without going through the queue.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Snapshot {
    pub(crate) power_state: PowerState,
    pub(crate) is_scanning: bool,
}

/// Attached to the radio; forwards its events into the engine queue.
pub(crate) struct RadioCallback {
    event_tx: mpsc::UnboundedSender<CentralEvent>,
}

impl RadioCallback {
    pub(crate) fn new(event_tx: mpsc::UnboundedSender<CentralEvent>) -> Self {
        Self { event_tx }
    }

    fn forward(&self, event: CentralEvent) {
        if let Err(e) = self.event_tx.send(event) {
            error!("Radio callback send error: {}", e);
        }
    }
}

impl RadioEventSink for RadioCallback {
    fn on_power_state_changed(&self, state: PowerState) {
        self.forward(CentralEvent::PowerStateChanged(state));
    }

    fn on_device_discovered(&self, advertisement: BleAdvertisement) {
        self.forward(CentralEvent::DeviceDiscovered(advertisement));
    }

    fn on_discovery_failed(&self, error: BluetoothError) {
        self.forward(CentralEvent::DiscoveryFailed(error));
    }
}

/// A scan that arrived while the radio was still settling.
struct ParkedScan {
    id: ScanId,
    filter: ScanFilter,
    timeout: Duration,
    callback: ScanCallback,
}

/// Serialized execution context of a `Central`. Owns the radio and every
/// piece of scan and state bookkeeping; nothing else touches them.
pub struct Engine<R: Radio> {
    radio: R,
    event_rx: mpsc::UnboundedReceiver<CentralEvent>,
    snapshot_tx: watch::Sender<Snapshot>,
    resolver: StateResolver,
    sessions: ScanSessionManager,
    timers: TimerProvider,
    parked: VecDeque<ParkedScan>,
}

impl<R: Radio> Engine<R> {
    pub(crate) fn new(
        radio: R,
        config: &CentralConfig,
        event_rx: mpsc::UnboundedReceiver<CentralEvent>,
        snapshot_tx: watch::Sender<Snapshot>,
    ) -> Self {
        let resolver = StateResolver::new(radio.power_state());
        Self {
            radio,
            event_rx,
            snapshot_tx,
            resolver,
            sessions: ScanSessionManager::new(config.restart_on_filter_change),
            timers: TimerProvider::new(),
            parked: VecDeque::new(),
        }
    }

    /// Process events until `Central::shutdown()` is called or every
    /// `Central` handle is dropped.
    pub async fn run(mut self) {
        info!("Central engine starts, radio is {}.", self.resolver.current_state());
        self.publish();
        loop {
            tokio::select! {
                // Expiries first, so a deadline that has passed is honoured
                // before any command queued at the same instant.
                biased;
                Some(id) = self.timers.next_expired() => {
                    self.process_timeout(id);
                }
                event = self.event_rx.recv() => match event {
                    Some(CentralEvent::Shutdown) | None => break,
                    Some(event) => self.process_event(event),
                },
            }
            if !self.sessions.has_live_requests() {
                self.timers.cancel_all();
            }
            self.publish();
        }
        info!("Central engine stopped.");
    }

    /// Run the engine on a current-thread runtime of its own, blocking the
    /// calling thread.
    pub fn run_blocking(self) -> Result<(), CentralError> {
        Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| CentralError::Runtime(e.to_string()))?
            .block_on(self.run());
        Ok(())
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(Snapshot {
            power_state: self.resolver.current_state(),
            is_scanning: self.sessions.is_scanning(),
        });
    }

    fn process_event(&mut self, event: CentralEvent) {
        match event {
            CentralEvent::StartScan {
                id,
                filter,
                timeout,
                callback,
            } => self.process_start_scan(ParkedScan {
                id,
                filter,
                timeout,
                callback,
            }),
            CentralEvent::StopScan => self.process_stop_scan(),
            CentralEvent::StateQuery(callback) => {
                self.resolver.resolved_state(callback)
            }
            CentralEvent::PowerStateChanged(state) => {
                self.process_power_state(state)
            }
            CentralEvent::DeviceDiscovered(advertisement) => {
                self.sessions.on_device_discovered(&advertisement)
            }
            CentralEvent::DiscoveryFailed(error) => {
                self.sessions.on_discovery_failed(error)
            }
            CentralEvent::Flush(done) => {
                let _ = done.send(());
            }
            CentralEvent::Shutdown => {}
        }
    }

    fn process_start_scan(&mut self, scan: ParkedScan) {
        match self.resolver.resolved() {
            None => {
                debug!(
                    "Radio is {}, parking {} until it settles.",
                    self.resolver.current_state(),
                    scan.id
                );
                self.parked.push_back(scan);
            }
            Some(PublicPowerState::PoweredOn) => self.start_now(scan),
            Some(state) => {
                warn!("Refusing {}, radio is {}.", scan.id, state);
                let mut callback = scan.callback;
                callback(ScanResult::Failed(CentralError::RadioUnavailable(
                    state,
                )));
            }
        }
    }

    fn start_now(&mut self, scan: ParkedScan) {
        if let Some(deadline) = self.sessions.start_scan(
            &mut self.radio,
            scan.id,
            scan.filter,
            scan.timeout,
            scan.callback,
        ) {
            self.timers.add_timer(scan.id, deadline);
            debug!("{} timers armed.", self.timers.len());
        }
    }

    fn process_stop_scan(&mut self) {
        self.sessions.stop_scan(&mut self.radio);
        for scan in std::mem::take(&mut self.parked) {
            let mut callback = scan.callback;
            callback(ScanResult::Stopped(StopReason::ByCaller));
        }
        self.timers.cancel_all();
    }

    fn process_timeout(&mut self, id: ScanId) {
        if self.sessions.on_timeout(&mut self.radio, id) {
            info!("{} timed out.", id);
        }
    }

    fn process_power_state(&mut self, state: PowerState) {
        debug!("Radio reports {}.", state);
        let previous = self.resolver.current_state();
        let Some(resolved) = self.resolver.on_power_state_changed(state) else {
            return;
        };

        if resolved != PublicPowerState::PoweredOn {
            self.sessions.fail_all(
                &mut self.radio,
                CentralError::RadioUnavailable(resolved),
            );
        } else if previous != PowerState::PoweredOn {
            // Discovery does not survive the radio leaving PoweredOn.
            self.sessions.resume(&mut self.radio);
        }

        for scan in std::mem::take(&mut self.parked) {
            if resolved == PublicPowerState::PoweredOn {
                self.start_now(scan);
            } else {
                let mut callback = scan.callback;
                callback(ScanResult::Failed(CentralError::RadioUnavailable(
                    resolved,
                )));
            }
        }
    }
}
