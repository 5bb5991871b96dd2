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

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::debug;
use tokio::time::{sleep_until, Instant};

use crate::scan_session::ScanId;

/// Scan deadlines, polled by the engine loop alongside radio events so that
/// expiries are processed on the same serialized context.
pub(crate) struct TimerProvider {
    timers: FuturesUnordered<BoxFuture<'static, ScanId>>,
}

impl TimerProvider {
    pub(crate) fn new() -> Self {
        Self {
            timers: FuturesUnordered::new(),
        }
    }

    pub(crate) fn add_timer(&mut self, id: ScanId, deadline: Instant) {
        debug!("Timer armed for {}.", id);
        self.timers.push(Box::pin(async move {
            sleep_until(deadline).await;
            id
        }));
    }

    /// Drop every armed timer.
    pub(crate) fn cancel_all(&mut self) {
        if !self.timers.is_empty() {
            debug!("Cancelling {} timers.", self.timers.len());
            self.timers = FuturesUnordered::new();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.timers.len()
    }

    /// Resolves with the id of the next expired timer, or `None` right away
    /// when no timer is armed.
    pub(crate) async fn next_expired(&mut self) -> Option<ScanId> {
        self.timers.next().await
    }
}
