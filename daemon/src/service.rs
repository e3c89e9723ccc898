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

//! Module to control startup, console commands and shutdown of hotspotd.

use crate::commands::{ConsoleCommand, LohsStart};
use crate::config::HotspotConfig;
use crate::events::Events;
use crate::hotspot::{
    client_link, AllowAllPolicy, ClientIdentity, ClientToken, DefaultConfigStore, HotspotService,
    HotspotStatus, LocalOnlyHotspotCallback, LocalOnlyHotspotObserver, LohsResult, ObserverId,
    Pid, SoftApConfiguration,
};
use crate::simulated_radio::{FaultInjector, SimulatedRadio};
use log::info;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::{Arc, Mutex};

const CONSOLE_UID: u32 = 10000;
const CONSOLE_PACKAGE: &str = "hotspotd.console";
const SYSTEM_UID: u32 = 1000;
const SYSTEM_PACKAGE: &str = "android";

/// Logs what a simulated console client is told.
struct ConsoleCallback {
    pid: Pid,
}

impl LocalOnlyHotspotCallback for ConsoleCallback {
    fn on_hotspot_started(&self, config: &SoftApConfiguration) {
        info!(
            "pid {}: hotspot started, ssid {:?} passphrase {:?}",
            self.pid,
            config.ssid,
            config.passphrase.as_deref().unwrap_or("")
        );
    }

    fn on_hotspot_stopped(&self) {
        info!("pid {}: hotspot stopped", self.pid);
    }

    fn on_hotspot_failed(&self, reason: i32) {
        info!("pid {}: hotspot failed ({reason})", self.pid);
    }
}

struct ConsoleObserver;

impl LocalOnlyHotspotObserver for ConsoleObserver {
    fn on_registered(&self) {
        info!("observer registered");
    }

    fn on_started(&self, config: &SoftApConfiguration) {
        info!("observer: hotspot started, ssid {:?}", config.ssid);
    }

    fn on_stopped(&self) {
        info!("observer: hotspot stopped");
    }
}

pub struct Service {
    hotspot: HotspotService,
    faults: FaultInjector,
    // Client halves of the simulated callers' links.
    clients: BTreeMap<Pid, ClientToken>,
    observers: BTreeMap<ObserverId, ClientToken>,
}

impl Service {
    /// Starts the broker on a simulated radio.
    pub fn start(config: &HotspotConfig, events: Arc<Mutex<Events>>) -> anyhow::Result<Service> {
        let radio = SimulatedRadio::new(
            &config.sim_interface_prefix,
            config.sim_transition_delay,
            config.sim_dual_ap,
        )?;
        let faults = radio.fault_injector();
        let store = DefaultConfigStore::new(
            &config.lohs_ssid_prefix,
            config.lohs_band,
            config.sim_supports_5ghz,
        );
        let hotspot = HotspotService::start(
            Box::new(radio),
            Box::new(store),
            Box::new(AllowAllPolicy),
            events,
            config.request_timeout,
        )?;
        Ok(Service { hotspot, faults, clients: BTreeMap::new(), observers: BTreeMap::new() })
    }

    /// Runs one console command and returns the line to print.
    pub fn execute(&mut self, command: ConsoleCommand) -> String {
        match command {
            ConsoleCommand::LohsStart(request) => self.start_local_only(request),
            ConsoleCommand::LohsStop { pid } => {
                self.hotspot.stop_local_only_hotspot(pid);
                self.clients.remove(&pid);
                format!("pid {pid} unregistered")
            }
            ConsoleCommand::LohsKill { pid } => match self.clients.remove(&pid) {
                Some(_) => format!("pid {pid} killed"),
                None => format!("pid {pid} has no link"),
            },
            ConsoleCommand::Watch => {
                let (link, token) = client_link();
                match self.hotspot.watch_local_only_hotspot(link, Arc::new(ConsoleObserver)) {
                    Ok(id) => {
                        self.observers.insert(id, token);
                        format!("observer {id} watching")
                    }
                    Err(err) => format!("watch failed: {err}"),
                }
            }
            ConsoleCommand::Unwatch { id } => {
                self.hotspot.unwatch_local_only_hotspot(id);
                self.observers.remove(&id);
                format!("observer {id} removed")
            }
            ConsoleCommand::TetherStart => {
                let client = ClientIdentity::new(std::process::id(), SYSTEM_UID, SYSTEM_PACKAGE);
                format!("tethering: {:?}", self.hotspot.start_tethered_hotspot(client, None))
            }
            ConsoleCommand::TetherStop => {
                format!("tethering stop sent: {}", self.hotspot.stop_tethered_hotspot())
            }
            ConsoleCommand::FailNext { code } => {
                self.faults.fail_next_start(code);
                format!("next hardware start fails with {code}")
            }
            ConsoleCommand::Status => match self.hotspot.status() {
                Ok(status) => format_status(&status),
                Err(err) => format!("status failed: {err}"),
            },
            ConsoleCommand::Quit => self.shut_down("quit"),
        }
    }

    fn start_local_only(&mut self, request: LohsStart) -> String {
        let pid = request.pid;
        let custom_config = request.ssid.map(|ssid| {
            SoftApConfiguration::new(&ssid, request.passphrase.as_deref(), request.band)
        });
        let (link, token) = client_link();
        let result = self.hotspot.start_local_only_hotspot(
            ClientIdentity::new(pid, CONSOLE_UID + pid, CONSOLE_PACKAGE),
            link,
            Arc::new(ConsoleCallback { pid }),
            custom_config,
        );
        if result == LohsResult::Registered {
            self.clients.insert(pid, token);
        }
        format!("pid {pid}: {result:?} ({})", result.code())
    }

    /// Stops every session and the worker; publishes `Event::ShutDown`.
    pub fn shut_down(&mut self, reason: &str) -> String {
        let line = match self.hotspot.shut_down(reason) {
            Ok(()) => "shut down".to_string(),
            Err(err) => format!("shut down: {err}"),
        };
        self.clients.clear();
        self.observers.clear();
        line
    }
}

fn format_status(status: &HotspotStatus) -> String {
    let mut out = format!(
        "requestors {:?} ({}), observers {}",
        status.requestor_pids,
        if status.exclusive { "exclusive" } else { "shared" },
        status.observer_count
    );
    for session in &status.sessions {
        let _ = write!(
            out,
            "\n  {} on {}: {:?}{}",
            session.mode,
            session.interface_name.as_deref().unwrap_or("-"),
            session.state,
            if session.teardown_requested { " (tearing down)" } else { "" }
        );
    }
    out
}
