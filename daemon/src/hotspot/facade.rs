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

//! The broker state owned by the hotspot worker thread.
//!
//! `HotspotCore` composes the requestor registry, the liveness watcher, the
//! admission arbiter and the AP state projector with the external
//! collaborators. Every method runs on the worker thread; nothing here is
//! shared or locked.

use crate::events::{self, Event, Events};
use crate::hotspot::arbiter::{self, Admission};
use crate::hotspot::callback::{LocalOnlyHotspotCallback, LocalOnlyHotspotObserver};
use crate::hotspot::error::{ConfigError, LinkError};
use crate::hotspot::liveness::{ClientLink, DeathNotice, LivenessWatcher, WatchKey};
use crate::hotspot::projector::{ApStateProjector, LohsOutcome, Transition};
use crate::hotspot::radio::{HotspotPolicy, RadioEvent, RadioModeAuthority, SoftApConfigStore};
use crate::hotspot::registry::{RegisterOutcome, Requestor, RequestorRegistry};
use crate::hotspot::types::{
    ApMode, ClientIdentity, HotspotStatus, LohsResult, ObserverId, Pid, SoftApConfiguration,
    TetheringResult, WorkSource, ERROR_INCOMPATIBLE_MODE,
};
use crate::id_factory::IdFactory;
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// A committed local-only registration awaiting the caller's answer.
pub struct LohsRegistration {
    requestor: Requestor,
    /// The caller's own earlier entry and its link, replaced by this one.
    superseded: Option<(Requestor, ClientLink)>,
    /// The session was restarted for this registration's config.
    restarted: bool,
}

pub struct HotspotCore {
    radio: Box<dyn RadioModeAuthority>,
    config_store: Box<dyn SoftApConfigStore>,
    policy: Box<dyn HotspotPolicy>,
    registry: RequestorRegistry,
    projector: ApStateProjector,
    watcher: LivenessWatcher,
    observers: BTreeMap<ObserverId, Arc<dyn LocalOnlyHotspotObserver>>,
    observer_ids: IdFactory<ObserverId>,
    events: Arc<Mutex<Events>>,
}

impl HotspotCore {
    /// `radio` must already have an `ApStateListener` registered that feeds
    /// `on_radio_event`.
    pub fn new(
        radio: Box<dyn RadioModeAuthority>,
        config_store: Box<dyn SoftApConfigStore>,
        policy: Box<dyn HotspotPolicy>,
        watcher: LivenessWatcher,
        events: Arc<Mutex<Events>>,
    ) -> Self {
        HotspotCore {
            radio,
            config_store,
            policy,
            registry: RequestorRegistry::new(),
            projector: ApStateProjector::new(),
            watcher,
            observers: BTreeMap::new(),
            observer_ids: IdFactory::default(),
            events,
        }
    }

    /// Admits and registers `client`. The registration is committed, but the
    /// late-joiner notification is held back until the caller has been
    /// answered: pass the result to `confirm_local_only`, or to
    /// `roll_back_local_only` if the caller is gone.
    pub fn start_local_only_hotspot(
        &mut self,
        client: &ClientIdentity,
        link: ClientLink,
        callback: Arc<dyn LocalOnlyHotspotCallback>,
        custom_config: Option<SoftApConfiguration>,
    ) -> Result<LohsRegistration, LohsResult> {
        let pid = client.pid;
        if self.policy.is_tethering_disallowed(client) {
            info!("lohs request from pid {pid}: tethering disallowed");
            return Err(LohsResult::ErrorTetheringDisallowed);
        }

        let dual_ap = self.radio.can_support_dual_ap(&client.work_source);
        let join = match arbiter::can_start(ApMode::LocalOnly, self.projector.active_sessions(), dual_ap) {
            Admission::Approve => false,
            Admission::JoinExisting => true,
            Admission::RejectIncompatibleMode => {
                info!("lohs request from pid {pid}: tethering holds the only AP");
                return Err(LohsResult::ErrorIncompatibleMode);
            }
            other => {
                warn!("lohs request from pid {pid}: unexpected admission {other:?}");
                return Err(LohsResult::ErrorGeneric);
            }
        };

        if let RegisterOutcome::Rejected(reason) = self.registry.check(pid, custom_config.as_ref()) {
            info!("lohs request from pid {pid}: {reason:?}");
            return Err(LohsResult::ErrorGeneric);
        }
        let mut restart = false;
        if join {
            if let Some(session) = self.projector.active_session(ApMode::LocalOnly) {
                if session.requested_custom != custom_config {
                    // Only the caller's own earlier request holds the session.
                    if !self.registry.pids().iter().all(|other| *other == pid) {
                        info!("lohs request from pid {pid}: config differs from the running session");
                        return Err(LohsResult::ErrorGeneric);
                    }
                    restart = true;
                }
            }
        }
        if !link.is_alive() {
            info!("lohs request from pid {pid}: caller already gone");
            return Err(LohsResult::ErrorGeneric);
        }

        if !join || restart {
            self.launch_local_only(pid, &client.work_source, custom_config.clone())?;
        }

        let key = WatchKey::Requestor(pid);
        let superseded = self.registry.get(pid).cloned().zip(self.watcher.link(key));
        let requestor = Requestor::new(pid, client.work_source.clone(), callback, custom_config);
        self.registry.register(requestor.clone());
        let registration = LohsRegistration { requestor, superseded, restarted: restart };
        if self.watcher.attach(key, link).is_err() {
            info!("lohs request from pid {pid}: caller died while registering");
            self.roll_back_local_only(registration);
            return Err(LohsResult::ErrorGeneric);
        }
        info!("pid {pid} registered for lohs, {} requestors", self.registry.len());
        Ok(registration)
    }

    /// Starts a local-only session for `custom_config`, first stopping the
    /// one that is running, if any.
    fn launch_local_only(
        &mut self,
        pid: Pid,
        work_source: &WorkSource,
        custom_config: Option<SoftApConfiguration>,
    ) -> Result<(), LohsResult> {
        let config = match self.config_store.generate_local_only_hotspot_config(custom_config.as_ref())
        {
            Ok(config) => config,
            Err(ConfigError::NoChannel) => {
                info!("lohs request from pid {pid}: no channel");
                return Err(LohsResult::ErrorNoChannel);
            }
            Err(err) => {
                info!("lohs request from pid {pid}: {err}");
                return Err(LohsResult::ErrorGeneric);
            }
        };
        if let Some(running) = self.projector.active_session(ApMode::LocalOnly) {
            let was_enabled = running.is_enabled();
            info!("restarting lohs for the new config of pid {pid}");
            if let Err(err) = self.radio.stop_soft_ap(ApMode::LocalOnly) {
                warn!("failed to stop lohs: {err}");
            }
            self.projector.request_teardown(ApMode::LocalOnly);
            if was_enabled {
                self.notify_observers_stopped();
            }
        }
        if let Err(err) = self.radio.start_soft_ap(ApMode::LocalOnly, &config, work_source) {
            warn!("lohs request from pid {pid}: {err}");
            return Err(LohsResult::ErrorGeneric);
        }
        self.projector.begin_session(ApMode::LocalOnly, config, custom_config);
        Ok(())
    }

    /// Completes a registration whose caller was told `Registered`. A late
    /// joiner of a running session is told right away.
    pub fn confirm_local_only(&self, registration: LohsRegistration) {
        if let Some(session) = self.projector.session(ApMode::LocalOnly) {
            if session.is_enabled() {
                registration.requestor.send_started(&session.config);
            }
        }
    }

    /// Undoes a registration whose caller never learned of it, restoring the
    /// caller's earlier registration if this one superseded it.
    pub fn roll_back_local_only(&mut self, registration: LohsRegistration) {
        let pid = registration.requestor.pid;
        let Some((previous, link)) = registration.superseded else {
            self.stop_local_only_hotspot(pid);
            return;
        };
        info!("restoring the previous lohs registration of pid {pid}");
        if registration.restarted {
            let custom_config = previous.custom_config().cloned();
            if self.launch_local_only(pid, &previous.work_source, custom_config).is_err() {
                warn!("could not restore the lohs session of pid {pid}");
                self.stop_local_only_hotspot(pid);
                return;
            }
        }
        self.registry.register(previous);
        if self.watcher.attach(WatchKey::Requestor(pid), link).is_err() {
            info!("pid {pid} died while its registration was restored");
            self.release_requestor(pid);
        }
    }

    pub fn stop_local_only_hotspot(&mut self, pid: Pid) {
        self.watcher.detach(WatchKey::Requestor(pid));
        self.release_requestor(pid);
    }

    fn release_requestor(&mut self, pid: Pid) {
        let outcome = self.registry.unregister(pid);
        if outcome.removed {
            info!("pid {pid} unregistered from lohs, {} remain", self.registry.len());
        }
        if outcome.removed && outcome.now_empty {
            self.teardown_local_only();
        }
    }

    fn teardown_local_only(&mut self) {
        if self.projector.active_session(ApMode::LocalOnly).is_none() {
            return;
        }
        info!("last lohs requestor gone, tearing down");
        if let Err(err) = self.radio.stop_soft_ap(ApMode::LocalOnly) {
            warn!("failed to stop lohs: {err}");
        }
        self.projector.request_teardown(ApMode::LocalOnly);
    }

    pub fn watch_local_only_hotspot(
        &mut self,
        link: ClientLink,
        observer: Arc<dyn LocalOnlyHotspotObserver>,
    ) -> Result<ObserverId, LinkError> {
        let id = self.observer_ids.next_id();
        self.watcher.attach(WatchKey::Observer(id), link)?;
        observer.on_registered();
        if let Some(session) = self.projector.session(ApMode::LocalOnly) {
            if session.is_enabled() {
                observer.on_started(&session.config);
            }
        }
        self.observers.insert(id, observer);
        info!("lohs observer {id} registered");
        Ok(id)
    }

    pub fn unwatch_local_only_hotspot(&mut self, id: ObserverId) {
        self.watcher.detach(WatchKey::Observer(id));
        if self.observers.remove(&id).is_some() {
            info!("lohs observer {id} removed");
        }
    }

    pub fn start_tethered_hotspot(
        &mut self,
        client: &ClientIdentity,
        config: Option<SoftApConfiguration>,
    ) -> TetheringResult {
        if self.policy.is_tethering_disallowed(client) {
            info!("tethering request from pid {}: disallowed", client.pid);
            return TetheringResult::ErrorDisallowed;
        }
        let dual_ap = self.radio.can_support_dual_ap(&client.work_source);
        match arbiter::can_start(ApMode::Tethered, self.projector.active_sessions(), dual_ap) {
            Admission::Approve => {}
            Admission::AlreadyActive => {
                info!("tethering request from pid {}: already active", client.pid);
                return TetheringResult::ErrorAlreadyActive;
            }
            Admission::PreemptLocalOnly => self.preempt_local_only(),
            other => {
                warn!("tethering request from pid {}: unexpected admission {other:?}", client.pid);
                return TetheringResult::ErrorGeneric;
            }
        }
        let config = config.unwrap_or_else(|| self.config_store.tethered_config());
        if let Err(err) = self.radio.start_soft_ap(ApMode::Tethered, &config, &client.work_source) {
            warn!("tethering request from pid {}: {err}", client.pid);
            return TetheringResult::ErrorGeneric;
        }
        self.projector.begin_session(ApMode::Tethered, config, None);
        TetheringResult::Started
    }

    fn preempt_local_only(&mut self) {
        let released = self.projector.fail_local_only(ERROR_INCOMPATIBLE_MODE, &mut self.registry);
        info!("tethering preempts lohs, failing {} requestors", released.len());
        for pid in released {
            self.watcher.detach(WatchKey::Requestor(pid));
        }
        self.notify_observers_stopped();
        if let Err(err) = self.radio.stop_soft_ap(ApMode::LocalOnly) {
            warn!("failed to stop preempted lohs: {err}");
        }
    }

    /// Stopping tethering is unconditional; returns false if the authority
    /// could not be reached.
    pub fn stop_tethered_hotspot(&mut self) -> bool {
        let result = self.radio.stop_soft_ap(ApMode::Tethered);
        self.projector.request_teardown(ApMode::Tethered);
        match result {
            Ok(()) => true,
            Err(err) => {
                warn!("failed to stop tethering: {err}");
                false
            }
        }
    }

    pub fn on_radio_event(&mut self, event: RadioEvent) {
        match event {
            RadioEvent::InterfaceAssigned { mode, interface_name } => {
                self.projector.on_interface_assigned(mode, &interface_name)
            }
            RadioEvent::StateChanged { interface_name, state } => {
                let transitions = self.projector.on_hardware_state_changed(
                    interface_name.as_deref(),
                    state,
                    &mut self.registry,
                );
                for transition in transitions {
                    self.after_transition(transition);
                }
            }
        }
    }

    fn after_transition(&mut self, transition: Transition) {
        for pid in &transition.released {
            self.watcher.detach(WatchKey::Requestor(*pid));
        }
        match &transition.outcome {
            Some(LohsOutcome::Started(config)) => {
                for observer in self.observers.values() {
                    observer.on_started(config);
                }
            }
            Some(LohsOutcome::Stopped) | Some(LohsOutcome::Failed(_)) => {
                self.notify_observers_stopped()
            }
            None => {}
        }
        let event = match transition.mode {
            ApMode::Tethered => Event::TetheredStateChanged {
                interface_name: transition.interface_name,
                state: transition.state,
            },
            ApMode::LocalOnly => Event::LocalOnlyStateChanged {
                interface_name: transition.interface_name,
                state: transition.state,
            },
        };
        events::publish(&self.events, event);
    }

    fn notify_observers_stopped(&self) {
        for observer in self.observers.values() {
            observer.on_stopped();
        }
    }

    pub fn on_client_died(&mut self, notice: DeathNotice) {
        if !self.watcher.take_if_current(notice) {
            return;
        }
        match notice.key {
            WatchKey::Requestor(pid) => self.release_requestor(pid),
            WatchKey::Observer(id) => {
                self.observers.remove(&id);
            }
        }
    }

    pub fn status(&self) -> HotspotStatus {
        HotspotStatus {
            requestor_pids: self.registry.pids(),
            exclusive: self.registry.is_exclusive(),
            observer_count: self.observers.len(),
            sessions: self.projector.statuses(),
        }
    }

    /// Stops every session and forgets every client.
    pub fn shut_down(&mut self) {
        if self.projector.active_session(ApMode::Tethered).is_some() {
            self.stop_tethered_hotspot();
        }
        if self.projector.session(ApMode::LocalOnly).is_some() {
            let released = self.projector.stop_local_only(&mut self.registry);
            info!("shutting down lohs, stopping {} requestors", released.len());
            self.notify_observers_stopped();
            if let Err(err) = self.radio.stop_soft_ap(ApMode::LocalOnly) {
                warn!("failed to stop lohs: {err}");
            }
        }
        self.observers.clear();
        self.watcher.detach_all();
    }
}
