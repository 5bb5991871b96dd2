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

//! Turns the raw, possibly transient, radio power state into a
//! `PublicPowerState`, parking callers until the radio settles.

use std::collections::VecDeque;

use bluetooth::{PowerState, PublicPowerState};
use log::debug;

/// Receives the resolved power state, exactly once.
pub type StateCallback = Box<dyn FnOnce(PublicPowerState) + Send>;

pub struct StateResolver {
    current: PowerState,
    // FIFO, flushed as a whole on the first stable state.
    pending: VecDeque<StateCallback>,
}

impl StateResolver {
    pub fn new(initial: PowerState) -> Self {
        Self {
            current: initial,
            pending: VecDeque::new(),
        }
    }

    /// Raw state as last reported by the radio.
    pub fn current_state(&self) -> PowerState {
        self.current
    }

    /// The current state, unless it is transient.
    pub fn resolved(&self) -> Option<PublicPowerState> {
        PublicPowerState::try_from(self.current).ok()
    }

    /// Invoke `callback` with the resolved state: right away if the radio is
    /// stable, otherwise once it becomes stable.
    pub fn resolved_state(&mut self, callback: StateCallback) {
        match self.resolved() {
            Some(state) => callback(state),
            None => {
                debug!(
                    "Radio is {}, parking state query #{}.",
                    self.current,
                    self.pending.len() + 1
                );
                self.pending.push_back(callback);
            }
        }
    }

    /// Record a power state reported by the radio. Returns the resolved state
    /// if `state` is stable, after flushing every parked query with it.
    pub fn on_power_state_changed(
        &mut self,
        state: PowerState,
    ) -> Option<PublicPowerState> {
        self.current = state;
        let resolved = self.resolved()?;
        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            debug!(
                "Radio settled on {}, resolving {} parked state queries.",
                resolved,
                pending.len()
            );
        }
        for callback in pending {
            callback(resolved);
        }
        Some(resolved)
    }

    pub fn pending_queries(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Log = Arc<Mutex<Vec<(usize, PublicPowerState)>>>;

    fn recorder(log: &Log, tag: usize) -> StateCallback {
        let log = log.clone();
        Box::new(move |state| log.lock().unwrap().push((tag, state)))
    }

    #[test]
    fn current_state_is_raw() {
        let resolver = StateResolver::new(PowerState::Resetting);
        assert_eq!(resolver.current_state(), PowerState::Resetting);
        assert_eq!(resolver.resolved(), None);
    }

    #[test]
    fn stable_state_resolves_synchronously() {
        let log = Log::default();
        let mut resolver = StateResolver::new(PowerState::PoweredOff);

        resolver.resolved_state(recorder(&log, 0));

        assert_eq!(*log.lock().unwrap(), vec![(0, PublicPowerState::PoweredOff)]);
        assert_eq!(resolver.pending_queries(), 0);
    }

    #[test]
    fn transient_state_defers_until_stable() {
        let log = Log::default();
        let mut resolver = StateResolver::new(PowerState::Unknown);

        for tag in 0..3 {
            resolver.resolved_state(recorder(&log, tag));
        }
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(resolver.pending_queries(), 3);

        // Still transient.
        assert_eq!(resolver.on_power_state_changed(PowerState::Resetting), None);
        assert!(log.lock().unwrap().is_empty());

        assert_eq!(
            resolver.on_power_state_changed(PowerState::PoweredOn),
            Some(PublicPowerState::PoweredOn)
        );
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                (0, PublicPowerState::PoweredOn),
                (1, PublicPowerState::PoweredOn),
                (2, PublicPowerState::PoweredOn),
            ]
        );
        assert_eq!(resolver.pending_queries(), 0);
    }

    #[test]
    fn queries_are_flushed_once() {
        let log = Log::default();
        let mut resolver = StateResolver::new(PowerState::Resetting);
        resolver.resolved_state(recorder(&log, 0));

        resolver.on_power_state_changed(PowerState::Unauthorized);
        resolver.on_power_state_changed(PowerState::PoweredOn);

        assert_eq!(
            *log.lock().unwrap(),
            vec![(0, PublicPowerState::Unauthorized)]
        );
    }
}
