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

//! Drives the hotspot service end to end on the simulated radio.

use hotspot_common::util::hotspot_logger::init_for_test;
use hotspot_daemon::events::{Event, Events};
use hotspot_daemon::hotspot::{
    client_link, AllowAllPolicy, ApMode, ApState, Band, ClientIdentity, ClientToken,
    DefaultConfigStore, HotspotService, HotspotStatus, LocalOnlyHotspotCallback, LohsResult, Pid,
    SoftApConfiguration, TetheringResult, ERROR_INCOMPATIBLE_MODE,
};
use hotspot_daemon::simulated_radio::{FaultInjector, SimulatedRadio};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
enum Notification {
    Started(String),
    Stopped,
    Failed(i32),
}

#[derive(Default)]
struct Recorder {
    notifications: Mutex<Vec<Notification>>,
}

impl Recorder {
    fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    fn wait_for(&self, count: usize) -> Vec<Notification> {
        let deadline = Instant::now() + WAIT;
        while self.notifications().len() < count {
            assert!(Instant::now() < deadline, "only got {:?}", self.notifications());
            thread::sleep(Duration::from_millis(5));
        }
        self.notifications()
    }
}

impl LocalOnlyHotspotCallback for Recorder {
    fn on_hotspot_started(&self, config: &SoftApConfiguration) {
        self.notifications.lock().unwrap().push(Notification::Started(config.ssid.clone()));
    }

    fn on_hotspot_stopped(&self) {
        self.notifications.lock().unwrap().push(Notification::Stopped);
    }

    fn on_hotspot_failed(&self, reason: i32) {
        self.notifications.lock().unwrap().push(Notification::Failed(reason));
    }
}

struct Fixture {
    service: HotspotService,
    faults: FaultInjector,
    events: Receiver<Event>,
}

impl Fixture {
    fn new(dual_ap: bool) -> Fixture {
        init_for_test();
        let radio = SimulatedRadio::new("wlan", Duration::from_millis(2), dual_ap).unwrap();
        let faults = radio.fault_injector();
        let bus = Events::new();
        let events = bus.lock().unwrap().subscribe();
        let service = HotspotService::start(
            Box::new(radio),
            Box::new(DefaultConfigStore::new("Share", Band::Only24Ghz, true)),
            Box::new(AllowAllPolicy),
            bus,
            Duration::from_secs(2),
        )
        .unwrap();
        Fixture { service, faults, events }
    }

    fn start_lohs(
        &self,
        pid: Pid,
        custom_config: Option<SoftApConfiguration>,
    ) -> (LohsResult, Arc<Recorder>, ClientToken) {
        let (link, token) = client_link();
        let recorder = Arc::new(Recorder::default());
        let result = self.service.start_local_only_hotspot(
            ClientIdentity::new(pid, 10000 + pid, "com.example"),
            link,
            recorder.clone(),
            custom_config,
        );
        (result, recorder, token)
    }

    fn wait_status(&self, done: impl Fn(&HotspotStatus) -> bool) -> HotspotStatus {
        let deadline = Instant::now() + WAIT;
        loop {
            let status = self.service.status().unwrap();
            if done(&status) {
                return status;
            }
            assert!(Instant::now() < deadline, "gave up waiting, last status {status:?}");
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Waits for the next published event matching `wanted`.
    fn wait_event(&self, wanted: impl Fn(&Event) -> bool) -> Event {
        let deadline = Instant::now() + WAIT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let event = self.events.recv_timeout(remaining).unwrap();
            if wanted(&event) {
                return event;
            }
        }
    }
}

fn system() -> ClientIdentity {
    ClientIdentity::new(1000, 1000, "android")
}

fn session_state(status: &HotspotStatus, mode: ApMode) -> Option<ApState> {
    status.sessions.iter().find(|s| s.mode == mode).map(|s| s.state)
}

#[test]
fn test_shared_hotspot_lifecycle() {
    let fixture = Fixture::new(false);
    let (result, first, _first_token) = fixture.start_lohs(1, None);
    assert_eq!(result, LohsResult::Registered);
    let started = first.wait_for(1);
    let Notification::Started(ssid) = &started[0] else {
        panic!("expected a start, got {started:?}");
    };
    assert!(ssid.starts_with("Share_"));

    // A late joiner shares the running AP.
    let (result, second, _second_token) = fixture.start_lohs(2, None);
    assert_eq!(result, LohsResult::Registered);
    assert_eq!(second.wait_for(1), started);

    fixture.service.stop_local_only_hotspot(1);
    let status = fixture.wait_status(|s| s.requestor_pids == vec![2]);
    assert_eq!(session_state(&status, ApMode::LocalOnly), Some(ApState::Enabled));

    fixture.service.stop_local_only_hotspot(2);
    fixture.wait_event(|e| {
        matches!(e, Event::LocalOnlyStateChanged { state: ApState::Disabled, .. })
    });
    assert!(fixture.service.status().unwrap().sessions.is_empty());
    // Callers that stopped on their own are not told about the teardown.
    assert_eq!(first.notifications(), started);
    assert_eq!(second.notifications(), started);
    fixture.service.shut_down("test").unwrap();
}

#[test]
fn test_reregistration_with_new_config_restarts() {
    let fixture = Fixture::new(false);
    let (_, first, _first_token) = fixture.start_lohs(5, None);
    first.wait_for(1);

    let custom = SoftApConfiguration::new("Mine", Some("password1"), Band::Any);
    let (result, second, _second_token) = fixture.start_lohs(5, Some(custom));
    assert_eq!(result, LohsResult::Registered);
    assert_eq!(second.wait_for(1), vec![Notification::Started("Mine".to_string())]);

    let status = fixture.service.status().unwrap();
    assert_eq!(status.requestor_pids, vec![5]);
    assert!(status.exclusive);
    // The superseded callback is not told about the restart.
    assert_eq!(first.notifications().len(), 1);
    fixture.service.shut_down("test").unwrap();
}

#[test]
fn test_client_death_tears_down() {
    let fixture = Fixture::new(false);
    let (_, recorder, token) = fixture.start_lohs(7, None);
    recorder.wait_for(1);
    drop(token);
    fixture.wait_status(|s| s.requestor_pids.is_empty() && s.sessions.is_empty());
    assert_eq!(recorder.notifications().len(), 1);
    fixture.service.shut_down("test").unwrap();
}

#[test]
fn test_exclusive_request_blocks_others() {
    let fixture = Fixture::new(false);
    let custom = SoftApConfiguration::new("Private", Some("password1"), Band::Only5Ghz);
    let (result, owner, _owner_token) = fixture.start_lohs(10, Some(custom));
    assert_eq!(result, LohsResult::Registered);
    assert_eq!(owner.wait_for(1), vec![Notification::Started("Private".to_string())]);

    let (result, _, _token) = fixture.start_lohs(11, None);
    assert_eq!(result, LohsResult::ErrorGeneric);
    let other = SoftApConfiguration::new("Other", Some("password1"), Band::Any);
    let (result, _, _token) = fixture.start_lohs(12, Some(other));
    assert_eq!(result, LohsResult::ErrorGeneric);
    assert_eq!(fixture.service.status().unwrap().requestor_pids, vec![10]);
    fixture.service.shut_down("test").unwrap();
}

#[test]
fn test_tethering_preempts_on_single_ap() {
    let fixture = Fixture::new(false);
    let (_, recorder, _token) = fixture.start_lohs(1, None);
    recorder.wait_for(1);

    assert_eq!(fixture.service.start_tethered_hotspot(system(), None), TetheringResult::Started);
    assert_eq!(recorder.wait_for(2)[1], Notification::Failed(ERROR_INCOMPATIBLE_MODE));
    fixture.wait_event(|e| {
        matches!(e, Event::TetheredStateChanged { state: ApState::Enabled, .. })
    });

    let (result, late, _late_token) = fixture.start_lohs(2, None);
    assert_eq!(result, LohsResult::ErrorIncompatibleMode);
    assert_eq!(
        fixture.service.start_tethered_hotspot(system(), None),
        TetheringResult::ErrorAlreadyActive
    );

    assert!(fixture.service.stop_tethered_hotspot());
    fixture.wait_status(|s| s.sessions.is_empty());
    assert!(late.notifications().is_empty());
    assert_eq!(recorder.notifications().len(), 2);
    fixture.service.shut_down("test").unwrap();
}

#[test]
fn test_dual_ap_runs_both_modes() {
    let fixture = Fixture::new(true);
    let (_, recorder, _token) = fixture.start_lohs(1, None);
    recorder.wait_for(1);
    assert_eq!(fixture.service.start_tethered_hotspot(system(), None), TetheringResult::Started);
    let status = fixture.wait_status(|s| {
        session_state(s, ApMode::Tethered) == Some(ApState::Enabled)
    });
    assert_eq!(session_state(&status, ApMode::LocalOnly), Some(ApState::Enabled));
    assert_eq!(status.requestor_pids, vec![1]);
    assert_eq!(recorder.notifications().len(), 1);

    fixture.service.shut_down("test").unwrap();
    assert_eq!(recorder.notifications().last(), Some(&Notification::Stopped));
}

#[test]
fn test_hardware_failure_reported_once() {
    let fixture = Fixture::new(false);
    fixture.faults.fail_next_start(-5);
    let (result, recorder, _token) = fixture.start_lohs(1, None);
    assert_eq!(result, LohsResult::Registered);
    assert_eq!(recorder.wait_for(1), vec![Notification::Failed(-5)]);
    fixture.wait_status(|s| s.requestor_pids.is_empty() && s.sessions.is_empty());

    // The next attempt runs normally.
    let (_, retry, _retry_token) = fixture.start_lohs(1, None);
    assert!(matches!(retry.wait_for(1)[0], Notification::Started(_)));
    assert_eq!(recorder.notifications().len(), 1);
    fixture.service.shut_down("test").unwrap();
}
