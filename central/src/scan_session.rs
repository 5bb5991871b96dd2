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

//! Multiplexes overlapping scan requests onto the radio's single discovery.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use bluetooth::{api::Radio, BleAdvertisement, BluetoothError, ScanFilter};
use log::{debug, error, info, warn};
use tokio::time::Instant;

use crate::error::CentralError;

/// Identifies one `scan_with_timeout()` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScanId(pub(crate) u64);

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan#{}", self.0)
    }
}

/// Why a scan ended without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The scan ran for its whole timeout.
    TimedOut,
    /// `stop_scan()` was called.
    ByCaller,
}

/// What a scan callback receives: any number of `Discovered`, then exactly
/// one terminal `Stopped` or `Failed`.
#[derive(Clone, Debug, PartialEq)]
pub enum ScanResult {
    Discovered(BleAdvertisement),
    Stopped(StopReason),
    Failed(CentralError),
}

impl ScanResult {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScanResult::Discovered(_))
    }
}

pub type ScanCallback = Box<dyn FnMut(ScanResult) + Send>;

/// Stands in for the deadline of a timeout too long to represent, such as
/// `Duration::MAX`. About 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

/// A live scan request.
struct ScanRequest {
    id: ScanId,
    filter: ScanFilter,
    deadline: Instant,
    callback: ScanCallback,
}

impl ScanRequest {
    fn deliver(&mut self, result: ScanResult) {
        (self.callback)(result)
    }

    // Consumes the request, so nothing can follow a terminal result.
    fn complete(mut self, result: ScanResult) {
        debug!("{} ends with {:?}.", self.id, result);
        (self.callback)(result)
    }
}

/// The discovery currently running on the radio.
#[derive(Debug)]
struct ActiveSession {
    // Filter the radio was last started with.
    filter: ScanFilter,
}

pub struct ScanSessionManager {
    // Ordered, so fan-out follows registration order.
    requests: BTreeMap<ScanId, ScanRequest>,
    session: Option<ActiveSession>,
    restart_on_filter_change: bool,
}

impl ScanSessionManager {
    pub fn new(restart_on_filter_change: bool) -> Self {
        Self {
            requests: BTreeMap::new(),
            session: None,
            restart_on_filter_change,
        }
    }

    /// Whether a discovery session exists.
    pub fn is_scanning(&self) -> bool {
        self.session.is_some()
    }

    pub fn has_live_requests(&self) -> bool {
        !self.requests.is_empty()
    }

    /// Filter the radio is running with, `None` when not scanning.
    pub fn effective_filter(&self) -> Option<&ScanFilter> {
        self.session.as_ref().map(|session| &session.filter)
    }

    pub fn earliest_deadline(&self) -> Option<Instant> {
        self.requests.values().map(|request| request.deadline).min()
    }

    /// Register a request and bring the radio in line with it. Returns the
    /// deadline to arm a timer for, or `None` if the radio refused to start
    /// and the request has already been completed with the error.
    pub fn start_scan<R: Radio>(
        &mut self,
        radio: &mut R,
        id: ScanId,
        filter: ScanFilter,
        timeout: Duration,
        callback: ScanCallback,
    ) -> Option<Instant> {
        let deadline = deadline_after(timeout);
        info!("{} registered for {:?} with filter {}.", id, timeout, filter);
        self.requests.insert(
            id,
            ScanRequest {
                id,
                filter,
                deadline,
                callback,
            },
        );
        self.sync_radio(radio);
        self.requests.get(&id).map(|request| request.deadline)
    }

    /// Fan a discovered peripheral out to every request whose filter matches.
    pub fn on_device_discovered(&mut self, advertisement: &BleAdvertisement) {
        if self.session.is_none() {
            debug!(
                "Dropping advertisement from {}, no discovery running.",
                advertisement.address()
            );
            return;
        }
        for request in self.requests.values_mut() {
            if request.filter.matches(advertisement) {
                request.deliver(ScanResult::Discovered(advertisement.clone()));
            }
        }
    }

    /// Complete the request `id` as timed out. Returns false for a request
    /// that already ended.
    pub fn on_timeout<R: Radio>(&mut self, radio: &mut R, id: ScanId) -> bool {
        let Some(request) = self.requests.remove(&id) else {
            debug!("Ignoring timer of {}, it already ended.", id);
            return false;
        };
        request.complete(ScanResult::Stopped(StopReason::TimedOut));
        self.sync_radio(radio);
        true
    }

    /// Stop every live request. Stopping always ends the whole shared
    /// session: overlapping scans can't be stopped one by one. Returns how
    /// many requests were stopped.
    pub fn stop_scan<R: Radio>(&mut self, radio: &mut R) -> usize {
        let stopped = self.complete_all(ScanResult::Stopped(StopReason::ByCaller));
        info!("Stopped {} scan requests.", stopped);
        self.teardown(radio);
        stopped
    }

    /// Restart the running discovery after the radio came back to
    /// `PoweredOn`, which drops any discovery it had accepted before.
    pub fn resume<R: Radio>(&mut self, radio: &mut R) {
        let Some(session) = &self.session else {
            return;
        };
        info!("Radio is back, restarting discovery with filter {}.", session.filter);
        if let Err(e) = radio.start_discovery(&session.filter) {
            error!("Radio refused to restart discovery: {}.", e);
            self.session = None;
            self.complete_all(ScanResult::Failed(CentralError::Radio(e)));
        }
    }

    /// The radio dropped a discovery it had accepted.
    pub fn on_discovery_failed(&mut self, error: BluetoothError) {
        if self.session.take().is_none() {
            warn!("Discovery failure without a session: {}.", error);
            return;
        }
        error!("Discovery failed: {}.", error);
        self.complete_all(ScanResult::Failed(CentralError::Radio(error)));
    }

    /// Fail every live request with `error` and tear the session down.
    pub fn fail_all<R: Radio>(&mut self, radio: &mut R, error: CentralError) {
        let failed = self.complete_all(ScanResult::Failed(error));
        if failed > 0 {
            warn!("Failed {} scan requests.", failed);
        }
        self.teardown(radio);
    }

    fn complete_all(&mut self, result: ScanResult) -> usize {
        let requests = std::mem::take(&mut self.requests);
        let count = requests.len();
        for request in requests.into_values() {
            request.complete(result.clone());
        }
        count
    }

    /// Union of the filters of all live requests.
    fn wanted_filter(&self) -> Option<ScanFilter> {
        self.requests
            .values()
            .map(|request| request.filter.clone())
            .reduce(|merged, filter| merged.union(&filter))
    }

    /// Start, retarget or stop the radio so it runs the union of the live
    /// requests' filters.
    fn sync_radio<R: Radio>(&mut self, radio: &mut R) {
        let Some(wanted) = self.wanted_filter() else {
            self.teardown(radio);
            return;
        };

        let result = match &self.session {
            None => {
                info!("Starting discovery with filter {}.", wanted);
                radio.start_discovery(&wanted)
            }
            Some(session) if session.filter == wanted => return,
            Some(session) => {
                info!(
                    "Effective filter changed from {} to {}.",
                    session.filter, wanted
                );
                self.retarget(radio, &wanted)
            }
        };

        match result {
            Ok(()) => self.session = Some(ActiveSession { filter: wanted }),
            Err(e) => {
                error!("Radio refused to start discovery: {}.", e);
                if self.session.take().is_some()
                    && radio.supports_filter_update()
                    && !self.restart_on_filter_change
                {
                    // The previous discovery may still be running.
                    if let Err(e) = radio.stop_discovery() {
                        warn!("Failed to stop discovery: {}.", e);
                    }
                }
                self.complete_all(ScanResult::Failed(CentralError::Radio(e)));
            }
        }
    }

    fn retarget<R: Radio>(
        &self,
        radio: &mut R,
        filter: &ScanFilter,
    ) -> Result<(), BluetoothError> {
        if radio.supports_filter_update() && !self.restart_on_filter_change {
            return radio.start_discovery(filter);
        }
        if let Err(e) = radio.stop_discovery() {
            warn!("Failed to stop discovery before restarting it: {}.", e);
        }
        radio.start_discovery(filter)
    }

    fn teardown<R: Radio>(&mut self, radio: &mut R) {
        if self.session.take().is_none() {
            return;
        }
        info!("Stopping discovery.");
        if let Err(e) = radio.stop_discovery() {
            warn!("Failed to stop discovery: {}.", e);
        }
    }
}
