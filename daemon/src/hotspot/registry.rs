// Copyright 2025 Google LLC
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

//! The set of processes currently interested in the local-only hotspot.
//!
//! The registry holds either a single exclusive requestor (one that brought
//! its own configuration) or any number of shared requestors, never both.
//! A conflicting newcomer from a different process is always the one that
//! loses; a process registering again replaces its own earlier entry.

use crate::hotspot::callback::LocalOnlyHotspotCallback;
use crate::hotspot::types::{Pid, SoftApConfiguration, WorkSource};
use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One registered local-only hotspot interest.
#[derive(Clone)]
pub struct Requestor {
    pub pid: Pid,
    pub work_source: WorkSource,
    callback: Arc<dyn LocalOnlyHotspotCallback>,
    custom_config: Option<SoftApConfiguration>,
}

impl Requestor {
    pub fn new(
        pid: Pid,
        work_source: WorkSource,
        callback: Arc<dyn LocalOnlyHotspotCallback>,
        custom_config: Option<SoftApConfiguration>,
    ) -> Self {
        Requestor { pid, work_source, callback, custom_config }
    }

    pub fn custom_config(&self) -> Option<&SoftApConfiguration> {
        self.custom_config.as_ref()
    }

    pub fn is_exclusive(&self) -> bool {
        self.custom_config.is_some()
    }

    pub fn send_started(&self, config: &SoftApConfiguration) {
        debug!("lohs started -> pid {}", self.pid);
        self.callback.on_hotspot_started(config);
    }

    pub fn send_stopped(&self) {
        debug!("lohs stopped -> pid {}", self.pid);
        self.callback.on_hotspot_stopped();
    }

    pub fn send_failed(&self, reason: i32) {
        debug!("lohs failed({reason}) -> pid {}", self.pid);
        self.callback.on_hotspot_failed(reason);
    }
}

impl std::fmt::Debug for Requestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Requestor")
            .field("pid", &self.pid)
            .field("work_source", &self.work_source)
            .field("exclusive", &self.is_exclusive())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// An exclusive/shared clash with a requestor of another process.
    IncompatibleExisting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    Rejected(RejectReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnregisterOutcome {
    pub removed: bool,
    pub now_empty: bool,
}

#[derive(Default)]
pub struct RequestorRegistry {
    // BTreeMap keeps fan-out order stable.
    entries: BTreeMap<Pid, Requestor>,
}

impl RequestorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether `pid` could register with `custom_config` right now,
    /// ignoring the caller's own existing entry.
    pub fn check(&self, pid: Pid, custom_config: Option<&SoftApConfiguration>) -> RegisterOutcome {
        let mut others = self.entries.values().filter(|r| r.pid != pid).peekable();
        let Some(first) = others.peek() else {
            return RegisterOutcome::Registered;
        };
        if custom_config.is_some() || first.is_exclusive() {
            return RegisterOutcome::Rejected(RejectReason::IncompatibleExisting);
        }
        RegisterOutcome::Registered
    }

    /// Adds `requestor`, replacing any entry of the same pid. Leaves the
    /// registry untouched when rejected.
    pub fn register(&mut self, requestor: Requestor) -> RegisterOutcome {
        let outcome = self.check(requestor.pid, requestor.custom_config());
        match outcome {
            RegisterOutcome::Registered => {
                if self.entries.contains_key(&requestor.pid) {
                    info!("pid {} re-registered, superseding its previous request", requestor.pid);
                }
                self.entries.insert(requestor.pid, requestor);
            }
            RegisterOutcome::Rejected(reason) => {
                info!("pid {} rejected: {reason:?}", requestor.pid);
            }
        }
        outcome
    }

    /// Removes the entry of `pid` if present.
    pub fn unregister(&mut self, pid: Pid) -> UnregisterOutcome {
        let removed = self.entries.remove(&pid).is_some();
        UnregisterOutcome { removed, now_empty: self.entries.is_empty() }
    }

    /// The current requestors, for fan-out.
    pub fn snapshot(&self) -> Vec<Requestor> {
        self.entries.values().cloned().collect()
    }

    /// Removes and returns every requestor.
    pub fn drain(&mut self) -> Vec<Requestor> {
        std::mem::take(&mut self.entries).into_values().collect()
    }

    pub fn get(&self, pid: Pid) -> Option<&Requestor> {
        self.entries.get(&pid)
    }

    pub fn pids(&self) -> Vec<Pid> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_exclusive(&self) -> bool {
        self.entries.values().any(Requestor::is_exclusive)
    }
}
