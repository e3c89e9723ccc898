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

//! A radio-mode authority that fakes AP hardware.
//!
//! Each start gets a fresh interface (`wlan1`, `wlan2`, ...) and walks
//! `Enabling -> Enabled` on a background runtime, one configured delay per
//! step. Stops walk `Disabling -> Disabled` the same way. A pending failure
//! armed through `FaultInjector` makes the next start report `Failed(code)`
//! instead. A mode that is up must be stopped before it can start again.

use crate::hotspot::error::RadioError;
use crate::hotspot::radio::{ApStateListener, RadioModeAuthority};
use crate::hotspot::types::{ApMode, ApState, SoftApConfiguration, WorkSource};
use crate::id_factory::IdFactory;
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio::task::AbortHandle;

/// Arms failures of the simulated hardware from outside the worker.
#[derive(Clone, Default)]
pub struct FaultInjector {
    next_start_failure: Arc<Mutex<Option<i32>>>,
}

impl FaultInjector {
    /// The next start reports `Failed(code)`.
    pub fn fail_next_start(&self, code: i32) {
        if let Ok(mut next) = self.next_start_failure.lock() {
            *next = Some(code);
        }
    }

    fn take(&self) -> Option<i32> {
        self.next_start_failure.lock().ok().and_then(|mut next| next.take())
    }
}

struct Interface {
    name: String,
    pending: AbortHandle,
    /// The start was armed to fail, so the interface never comes up.
    failing: bool,
}

pub struct SimulatedRadio {
    runtime: Runtime,
    listener: Option<ApStateListener>,
    interface_ids: IdFactory<u32>,
    interface_prefix: String,
    interfaces: BTreeMap<ApMode, Interface>,
    delay: Duration,
    dual_ap: bool,
    faults: FaultInjector,
}

impl SimulatedRadio {
    pub fn new(interface_prefix: &str, delay: Duration, dual_ap: bool) -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("simulated_radio")
            .enable_time()
            .build()?;
        Ok(SimulatedRadio {
            runtime,
            listener: None,
            interface_ids: IdFactory::default(),
            interface_prefix: interface_prefix.to_string(),
            interfaces: BTreeMap::new(),
            delay,
            dual_ap,
            faults: FaultInjector::default(),
        })
    }

    pub fn fault_injector(&self) -> FaultInjector {
        self.faults.clone()
    }

    /// Reports `states` for `interface_name`, one delay apart.
    fn walk(&self, listener: ApStateListener, interface_name: String, states: Vec<ApState>) -> AbortHandle {
        let delay = self.delay;
        self.runtime
            .spawn(async move {
                for state in states {
                    tokio::time::sleep(delay).await;
                    listener.on_state_changed(Some(&interface_name), state);
                }
            })
            .abort_handle()
    }
}

impl RadioModeAuthority for SimulatedRadio {
    fn start_soft_ap(
        &mut self,
        mode: ApMode,
        config: &SoftApConfiguration,
        attribution: &WorkSource,
    ) -> Result<(), RadioError> {
        let listener = self.listener.clone().ok_or(RadioError::Unavailable)?;
        if let Some(previous) = self.interfaces.get(&mode) {
            if !previous.failing {
                return Err(RadioError::Rejected(format!("{mode} already up on {}", previous.name)));
            }
            warn!("{mode} restarted after failing on {}", previous.name);
            previous.pending.abort();
        }
        let name = format!("{}{}", self.interface_prefix, self.interface_ids.next_id());
        info!(
            "simulated {mode} AP '{}' on {name} for uid {} ({})",
            config.ssid, attribution.uid, attribution.package_name
        );
        listener.on_interface_assigned(mode, &name);
        let failure = self.faults.take();
        let states = match failure {
            Some(code) => vec![ApState::Enabling, ApState::Failed(code)],
            None => vec![ApState::Enabling, ApState::Enabled],
        };
        let pending = self.walk(listener, name.clone(), states);
        self.interfaces.insert(mode, Interface { name, pending, failing: failure.is_some() });
        Ok(())
    }

    fn stop_soft_ap(&mut self, mode: ApMode) -> Result<(), RadioError> {
        let listener = self.listener.clone().ok_or(RadioError::Unavailable)?;
        let Some(interface) = self.interfaces.remove(&mode) else {
            info!("simulated {mode} AP already stopped");
            return Ok(());
        };
        interface.pending.abort();
        info!("stopping simulated {mode} AP on {}", interface.name);
        self.walk(listener, interface.name, vec![ApState::Disabling, ApState::Disabled]);
        Ok(())
    }

    fn register_ap_state_callback(&mut self, listener: ApStateListener) {
        self.listener = Some(listener);
    }

    fn can_support_dual_ap(&self, _attribution: &WorkSource) -> bool {
        self.dual_ap
    }
}
