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

//! Central role coordination over a single event-driven BLE radio.
//!
//! A [`Central`] multiplexes overlapping, timed scans onto the radio's one
//! discovery and resolves transient power states before reporting them.
//! Every command and radio event is funnelled through the queue of an
//! [`Engine`], which owns the radio and processes them one at a time.

pub mod config;
mod engine;
mod error;
pub mod scan_session;
pub mod state_resolver;
mod timer_provider;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bluetooth::{
    api::Radio, Platform, PowerState, PublicPowerState,
    ScanFilter, ServiceUuid,
};
use log::{error, info};
use tokio::sync::{mpsc, oneshot, watch, OnceCell};

pub use crate::config::CentralConfig;
pub use crate::engine::Engine;
pub use crate::error::CentralError;
pub use crate::scan_session::{ScanId, ScanResult, StopReason};

use crate::engine::{CentralEvent, RadioCallback, Snapshot};

static SHARED: OnceCell<Central> = OnceCell::const_new();

/// Handle to a running Central. Cheap to clone; every clone talks to the
/// same engine.
#[derive(Clone)]
pub struct Central {
    event_tx: mpsc::UnboundedSender<CentralEvent>,
    snapshot_rx: watch::Receiver<Snapshot>,
    next_id: Arc<AtomicU64>,
    config: Arc<CentralConfig>,
}

impl Central {
    /// Wrap `radio`. The returned engine does nothing until it is run.
    pub fn new<R: Radio>(radio: R) -> (Self, Engine<R>) {
        Self::with_config(radio, CentralConfig::default())
    }

    pub fn with_config<R: Radio>(
        mut radio: R,
        config: CentralConfig,
    ) -> (Self, Engine<R>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        radio.attach(Arc::new(RadioCallback::new(event_tx.clone())));

        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot {
            power_state: radio.power_state(),
            is_scanning: false,
        });
        let engine = Engine::new(radio, &config, event_rx, snapshot_tx);
        let central = Self {
            event_tx,
            snapshot_rx,
            next_id: Arc::new(AtomicU64::new(1)),
            config: Arc::new(config),
        };
        (central, engine)
    }

    /// Wrap `radio` and run its engine on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<R: Radio>(radio: R) -> Self {
        Self::spawn_with_config(radio, CentralConfig::default())
    }

    pub fn spawn_with_config<R: Radio>(radio: R, config: CentralConfig) -> Self {
        let (central, engine) = Self::with_config(radio, config);
        tokio::spawn(engine.run());
        central
    }

    /// The process-wide Central over the platform radio, created on first
    /// use. Its engine runs on a thread of its own, so it keeps running
    /// after the runtime of that first caller is gone.
    pub async fn shared() -> Result<&'static Central, CentralError> {
        SHARED
            .get_or_try_init(|| async {
                let radio = Platform::default_radio().await?;
                let (central, engine) = Central::new(radio);
                thread::Builder::new()
                    .name(String::from("central-engine"))
                    .spawn(move || {
                        if let Err(e) = engine.run_blocking() {
                            error!("Process-wide central engine failed: {}", e);
                        }
                    })
                    .map_err(|e| CentralError::Runtime(e.to_string()))?;
                info!("Process-wide central created.");
                Ok::<_, CentralError>(central)
            })
            .await
    }

    /// Scan for peripherals for `timeout`.
    ///
    /// `services` restricts the scan to peripherals advertising at least one
    /// of them; `None` discovers every peripheral. An empty list is a caller
    /// error and is rejected before anything reaches the radio.
    ///
    /// `callback` receives zero or more `ScanResult::Discovered`, then one
    /// terminal result: `Stopped(TimedOut)`, `Stopped(ByCaller)` or `Failed`.
    /// It runs on the engine, so it must not block.
    pub fn scan_with_timeout<F>(
        &self,
        timeout: Duration,
        services: Option<Vec<ServiceUuid>>,
        callback: F,
    ) -> Result<ScanId, CentralError>
    where
        F: FnMut(ScanResult) + Send + 'static,
    {
        if services.as_ref().is_some_and(|services| services.is_empty()) {
            return Err(CentralError::EmptyServiceFilter);
        }
        let id = ScanId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.send(CentralEvent::StartScan {
            id,
            filter: ScanFilter::from_services(services),
            timeout,
            callback: Box::new(callback),
        })?;
        Ok(id)
    }

    /// `scan_with_timeout()` with the configured default timeout.
    pub fn scan_default<F>(
        &self,
        services: Option<Vec<ServiceUuid>>,
        callback: F,
    ) -> Result<ScanId, CentralError>
    where
        F: FnMut(ScanResult) + Send + 'static,
    {
        self.scan_with_timeout(self.config.default_scan_timeout, services, callback)
    }

    /// `scan_with_timeout()` delivering results through a channel. The
    /// channel closes after the terminal result.
    pub fn scan(
        &self,
        timeout: Duration,
        services: Option<Vec<ServiceUuid>>,
    ) -> Result<mpsc::UnboundedReceiver<ScanResult>, CentralError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.scan_with_timeout(timeout, services, move |result| {
            let _ = tx.send(result);
        })?;
        Ok(rx)
    }

    /// Stop every scan. All live scans share one discovery, so they all end
    /// with `Stopped(ByCaller)`.
    pub fn stop_scan(&self) -> Result<(), CentralError> {
        self.send(CentralEvent::StopScan)
    }

    /// Invoke `callback` once the radio is in a stable power state. There is
    /// no timeout: the callback waits for as long as the radio stays
    /// `Unknown` or `Resetting`.
    pub fn async_state<F>(&self, callback: F) -> Result<(), CentralError>
    where
        F: FnOnce(PublicPowerState) + Send + 'static,
    {
        self.send(CentralEvent::StateQuery(Box::new(callback)))
    }

    /// `async_state()` as a future.
    pub async fn state(&self) -> Result<PublicPowerState, CentralError> {
        let (tx, rx) = oneshot::channel();
        self.async_state(move |state| {
            let _ = tx.send(state);
        })?;
        rx.await.map_err(|_| CentralError::EngineStopped)
    }

    /// Raw power state, possibly transient.
    pub fn current_state(&self) -> PowerState {
        self.snapshot_rx.borrow().power_state
    }

    /// Whether a discovery session is running.
    pub fn is_scanning(&self) -> bool {
        self.snapshot_rx.borrow().is_scanning
    }

    /// Resolves once the engine has processed everything queued before it.
    pub async fn flush(&self) -> Result<(), CentralError> {
        let (tx, rx) = oneshot::channel();
        self.send(CentralEvent::Flush(tx))?;
        rx.await.map_err(|_| CentralError::EngineStopped)
    }

    /// Stop the engine. Callbacks still registered are dropped without a
    /// terminal result.
    pub fn shutdown(&self) -> Result<(), CentralError> {
        self.send(CentralEvent::Shutdown)
    }

    fn send(&self, event: CentralEvent) -> Result<(), CentralError> {
        self.event_tx
            .send(event)
            .map_err(|_| CentralError::EngineStopped)
    }
}
