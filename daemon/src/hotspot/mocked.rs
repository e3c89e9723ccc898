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

//! Test doubles for the hotspot broker.

use crate::hotspot::callback::{LocalOnlyHotspotCallback, LocalOnlyHotspotObserver};
use crate::hotspot::error::RadioError;
use crate::hotspot::radio::{ApStateListener, RadioModeAuthority};
use crate::hotspot::types::{ApMode, SoftApConfiguration, WorkSource};
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackEvent {
    Started(SoftApConfiguration),
    Stopped,
    Failed(i32),
}

/// Records every notification delivered to a requestor.
#[derive(Default)]
pub struct RecordingCallback {
    events: Mutex<Vec<CallbackEvent>>,
}

impl RecordingCallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<CallbackEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl LocalOnlyHotspotCallback for RecordingCallback {
    fn on_hotspot_started(&self, config: &SoftApConfiguration) {
        self.events.lock().unwrap().push(CallbackEvent::Started(config.clone()));
    }

    fn on_hotspot_stopped(&self) {
        self.events.lock().unwrap().push(CallbackEvent::Stopped);
    }

    fn on_hotspot_failed(&self, reason: i32) {
        self.events.lock().unwrap().push(CallbackEvent::Failed(reason));
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObserverEvent {
    Registered,
    Started(SoftApConfiguration),
    Stopped,
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl LocalOnlyHotspotObserver for RecordingObserver {
    fn on_registered(&self) {
        self.events.lock().unwrap().push(ObserverEvent::Registered);
    }

    fn on_started(&self, config: &SoftApConfiguration) {
        self.events.lock().unwrap().push(ObserverEvent::Started(config.clone()));
    }

    fn on_stopped(&self) {
        self.events.lock().unwrap().push(ObserverEvent::Stopped);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RadioCall {
    Start(ApMode, SoftApConfiguration),
    Stop(ApMode),
}

/// Shared view into a `MockRadio` after it has been moved into the core.
#[derive(Clone, Default)]
pub struct MockRadioState {
    pub calls: Arc<Mutex<Vec<RadioCall>>>,
    pub dual_ap: Arc<Mutex<bool>>,
    pub fail_start: Arc<Mutex<bool>>,
    pub listener: Arc<Mutex<Option<ApStateListener>>>,
}

impl MockRadioState {
    pub fn calls(&self) -> Vec<RadioCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn start_count(&self, mode: ApMode) -> usize {
        self.calls().iter().filter(|c| matches!(c, RadioCall::Start(m, _) if *m == mode)).count()
    }

    pub fn stop_count(&self, mode: ApMode) -> usize {
        self.calls().iter().filter(|c| **c == RadioCall::Stop(mode)).count()
    }

    pub fn set_dual_ap(&self, dual_ap: bool) {
        *self.dual_ap.lock().unwrap() = dual_ap;
    }

    pub fn set_fail_start(&self, fail: bool) {
        *self.fail_start.lock().unwrap() = fail;
    }
}

/// Radio-mode authority that records calls and never emits events on its
/// own; tests drive state changes explicitly.
pub struct MockRadio {
    state: MockRadioState,
}

impl MockRadio {
    pub fn new() -> (Self, MockRadioState) {
        let state = MockRadioState::default();
        (MockRadio { state: state.clone() }, state)
    }
}

impl RadioModeAuthority for MockRadio {
    fn start_soft_ap(
        &mut self,
        mode: ApMode,
        config: &SoftApConfiguration,
        _attribution: &WorkSource,
    ) -> Result<(), RadioError> {
        if *self.state.fail_start.lock().unwrap() {
            return Err(RadioError::Unavailable);
        }
        self.state.calls.lock().unwrap().push(RadioCall::Start(mode, config.clone()));
        Ok(())
    }

    fn stop_soft_ap(&mut self, mode: ApMode) -> Result<(), RadioError> {
        self.state.calls.lock().unwrap().push(RadioCall::Stop(mode));
        Ok(())
    }

    fn register_ap_state_callback(&mut self, listener: ApStateListener) {
        *self.state.listener.lock().unwrap() = Some(listener);
    }

    fn can_support_dual_ap(&self, _attribution: &WorkSource) -> bool {
        *self.state.dual_ap.lock().unwrap()
    }
}
