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

//! Maps the radio-mode authority's AP state stream onto sessions and, for
//! local-only sessions, onto per-requestor started/stopped/failed
//! notifications.
//!
//! The projector is the only writer of session state. Every session attempt
//! remembers whether its "started" and its terminal notification have been
//! sent, so repeated hardware callbacks (for instance `Disabling` followed by
//! `Disabled`) never notify twice.

use crate::hotspot::arbiter::ActiveSessions;
use crate::hotspot::registry::{Requestor, RequestorRegistry};
use crate::hotspot::types::{ApMode, ApState, Pid, SessionStatus, SoftApConfiguration};
use crate::id_factory::IdFactory;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// One physical AP use, from the accepted start request until the hardware
/// reports `Disabled` or `Failed`.
#[derive(Clone, Debug)]
pub struct ApSession {
    pub mode: ApMode,
    pub attempt: u64,
    pub interface_name: Option<String>,
    /// `Disabled` until the authority reports the first transition.
    pub state: ApState,
    pub config: SoftApConfiguration,
    /// Caller-supplied config the session was started for, if any.
    pub requested_custom: Option<SoftApConfiguration>,
    started_reported: bool,
    terminal_reported: bool,
    teardown_requested: bool,
}

impl ApSession {
    /// Whether the session still holds the AP for admission purposes.
    pub fn is_active(&self) -> bool {
        !self.terminal_reported && !self.teardown_requested && self.state != ApState::Disabling
    }

    pub fn is_enabled(&self) -> bool {
        self.state == ApState::Enabled && !self.terminal_reported
    }

    fn status(&self) -> SessionStatus {
        SessionStatus {
            mode: self.mode,
            interface_name: self.interface_name.clone(),
            state: self.state,
            teardown_requested: self.teardown_requested,
        }
    }
}

/// Logical local-only outcome of a hardware transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LohsOutcome {
    Started(SoftApConfiguration),
    Stopped,
    Failed(i32),
}

/// A session state change produced by one hardware callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub mode: ApMode,
    pub interface_name: Option<String>,
    pub previous: ApState,
    pub state: ApState,
    pub outcome: Option<LohsOutcome>,
    /// Requestors removed from the registry by this transition.
    pub released: Vec<Pid>,
}

pub struct ApStateProjector {
    sessions: BTreeMap<ApMode, ApSession>,
    attempts: IdFactory<u64>,
}

impl Default for ApStateProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl ApStateProjector {
    pub fn new() -> Self {
        ApStateProjector { sessions: BTreeMap::new(), attempts: IdFactory::default() }
    }

    /// Records a new session attempt for `mode`, replacing any previous
    /// attempt of that mode.
    pub fn begin_session(
        &mut self,
        mode: ApMode,
        config: SoftApConfiguration,
        requested_custom: Option<SoftApConfiguration>,
    ) -> u64 {
        let attempt = self.attempts.next_id();
        let session = ApSession {
            mode,
            attempt,
            interface_name: None,
            state: ApState::Disabled,
            config,
            requested_custom,
            started_reported: false,
            terminal_reported: false,
            teardown_requested: false,
        };
        if let Some(old) = self.sessions.insert(mode, session) {
            info!("{mode} session attempt {} replaced by attempt {attempt}", old.attempt);
        } else {
            info!("{mode} session attempt {attempt} begins");
        }
        attempt
    }

    pub fn session(&self, mode: ApMode) -> Option<&ApSession> {
        self.sessions.get(&mode)
    }

    /// The session of `mode` if it still holds the AP.
    pub fn active_session(&self, mode: ApMode) -> Option<&ApSession> {
        self.sessions.get(&mode).filter(|s| s.is_active())
    }

    pub fn active_sessions(&self) -> ActiveSessions {
        ActiveSessions {
            tethered: self.active_session(ApMode::Tethered).is_some(),
            local_only: self.active_session(ApMode::LocalOnly).is_some(),
        }
    }

    pub fn statuses(&self) -> Vec<SessionStatus> {
        self.sessions.values().map(ApSession::status).collect()
    }

    /// Marks the session of `mode` as being torn down. Returns false when
    /// there is no such session.
    pub fn request_teardown(&mut self, mode: ApMode) -> bool {
        match self.sessions.get_mut(&mode) {
            Some(session) => {
                session.teardown_requested = true;
                true
            }
            None => false,
        }
    }

    /// Binds `interface_name` to the session of `mode`. The newest
    /// assignment owns the name: a session of the other mode still holding
    /// it is retired if it is already on its way out, or loses the name.
    pub fn on_interface_assigned(&mut self, mode: ApMode, interface_name: &str) {
        if !self.sessions.contains_key(&mode) {
            debug!("interface {interface_name} assigned to {mode} without a session");
            return;
        }
        let holders: Vec<(ApMode, bool)> = self
            .sessions
            .values()
            .filter(|s| s.mode != mode && s.interface_name.as_deref() == Some(interface_name))
            .map(|s| (s.mode, s.is_active()))
            .collect();
        for (holder, active) in holders {
            if active {
                warn!("{holder} session lost {interface_name} to {mode}");
                if let Some(session) = self.sessions.get_mut(&holder) {
                    session.interface_name = None;
                }
            } else if let Some(session) = self.sessions.remove(&holder) {
                info!("{holder} session attempt {} retired, {interface_name} reused", session.attempt);
            }
        }
        if let Some(session) = self.sessions.get_mut(&mode) {
            if let Some(old) = &session.interface_name {
                if old != interface_name {
                    warn!("{mode} session moved from {old} to {interface_name}");
                }
            }
            info!("{mode} session attempt {} on {interface_name}", session.attempt);
            session.interface_name = Some(interface_name.to_string());
        }
    }

    /// Applies one hardware callback. Returns the transitions it caused;
    /// repeated or unknown callbacks cause none.
    pub fn on_hardware_state_changed(
        &mut self,
        interface_name: Option<&str>,
        state: ApState,
        registry: &mut RequestorRegistry,
    ) -> Vec<Transition> {
        let modes: Vec<ApMode> = match interface_name {
            Some(name) => self
                .sessions
                .values()
                .filter(|s| s.interface_name.as_deref() == Some(name))
                .map(|s| s.mode)
                .collect(),
            // The authority can fail a start before any interface exists.
            None if matches!(state, ApState::Failed(_)) => self
                .sessions
                .values()
                .filter(|s| s.interface_name.is_none())
                .map(|s| s.mode)
                .collect(),
            None => Vec::new(),
        };
        if modes.is_empty() {
            debug!("ignoring {state:?} for unknown interface {interface_name:?}");
        }
        modes.into_iter().filter_map(|mode| self.apply(mode, state, registry)).collect()
    }

    fn apply(
        &mut self,
        mode: ApMode,
        state: ApState,
        registry: &mut RequestorRegistry,
    ) -> Option<Transition> {
        let session = self.sessions.get_mut(&mode)?;
        let previous = session.state;
        if previous == ApState::Disabled && matches!(state, ApState::Disabling | ApState::Disabled) {
            // Never came up: a teardown of whatever held the interface before.
            if session.teardown_requested && state == ApState::Disabled {
                let attempt = session.attempt;
                self.sessions.remove(&mode);
                info!("{mode} session attempt {attempt} torn down before it came up");
            } else {
                debug!("{mode} ignoring {state:?} before the session came up");
            }
            return None;
        }
        if previous == state {
            debug!("{mode} repeated {state:?}");
            return None;
        }
        if !previous.can_transition_to(state) {
            warn!("{mode} unexpected transition {previous:?} -> {state:?}");
        }
        session.state = state;
        info!(
            "{mode} {} {previous:?} -> {state:?}",
            session.interface_name.as_deref().unwrap_or("<no iface>")
        );

        let mut outcome = None;
        let mut released = Vec::new();
        if mode == ApMode::LocalOnly && !session.terminal_reported {
            match state {
                ApState::Enabled if !session.started_reported => {
                    session.started_reported = true;
                    let requestors = registry.snapshot();
                    for requestor in &requestors {
                        requestor.send_started(&session.config);
                    }
                    info!("lohs started, notified {} requestors", requestors.len());
                    outcome = Some(LohsOutcome::Started(session.config.clone()));
                }
                ApState::Disabling | ApState::Disabled => {
                    session.terminal_reported = true;
                    let requestors = registry.drain();
                    for requestor in &requestors {
                        requestor.send_stopped();
                    }
                    info!("lohs stopped, notified {} requestors", requestors.len());
                    released = requestors.iter().map(|r| r.pid).collect();
                    outcome = Some(LohsOutcome::Stopped);
                }
                ApState::Failed(code) => {
                    session.terminal_reported = true;
                    let requestors = registry.drain();
                    for requestor in &requestors {
                        requestor.send_failed(code);
                    }
                    info!("lohs failed({code}), notified {} requestors", requestors.len());
                    released = requestors.iter().map(|r| r.pid).collect();
                    outcome = Some(LohsOutcome::Failed(code));
                }
                _ => {}
            }
        }

        let transition = Transition {
            mode,
            interface_name: session.interface_name.clone(),
            previous,
            state,
            outcome,
            released,
        };
        if state.is_terminal() {
            let attempt = session.attempt;
            self.sessions.remove(&mode);
            info!("{mode} session attempt {attempt} ended");
        }
        Some(transition)
    }

    /// Ends the local-only session on the broker's side: every requestor is
    /// told `failed(reason)` and released. The hardware teardown is the
    /// caller's business; its later callbacks report nothing further.
    pub fn fail_local_only(&mut self, reason: i32, registry: &mut RequestorRegistry) -> Vec<Pid> {
        self.end_local_only(registry, |requestor| requestor.send_failed(reason))
    }

    /// Like `fail_local_only`, reporting `stopped` instead.
    pub fn stop_local_only(&mut self, registry: &mut RequestorRegistry) -> Vec<Pid> {
        self.end_local_only(registry, |requestor| requestor.send_stopped())
    }

    fn end_local_only(
        &mut self,
        registry: &mut RequestorRegistry,
        notify: impl Fn(&Requestor),
    ) -> Vec<Pid> {
        if let Some(session) = self.sessions.get_mut(&ApMode::LocalOnly) {
            if session.terminal_reported {
                return Vec::new();
            }
            session.terminal_reported = true;
            session.teardown_requested = true;
        }
        let requestors = registry.drain();
        requestors.iter().for_each(&notify);
        requestors.iter().map(|r| r.pid).collect()
    }
}
