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

//! Request/response hand-off between callers and the hotspot worker.
//!
//! `HotspotService` is a cheap cloneable handle. Every operation is posted to
//! the `hotspot_worker` thread, which owns the `HotspotCore` and drains its
//! queue serially. Radio events and client deaths are posted into the same
//! queue, so all broker state is touched by that one thread only.
//!
//! A caller waits for its reply at most `request_timeout`. A request found
//! past its deadline is dropped unexecuted. Caller and worker race to claim
//! each reply slot: a caller that gives up first leaves the worker to roll
//! back whatever the request committed, and a worker that answers first is
//! waited for. A request the caller saw fail never stays committed.

use crate::events::{self, Event, Events};
use crate::hotspot::callback::{LocalOnlyHotspotCallback, LocalOnlyHotspotObserver};
use crate::hotspot::error::{LinkError, ServiceError};
use crate::hotspot::facade::HotspotCore;
use crate::hotspot::liveness::{ClientLink, DeathNotice, DeathSink, LivenessWatcher};
use crate::hotspot::radio::{
    ApStateListener, HotspotPolicy, RadioEvent, RadioModeAuthority, SoftApConfigStore,
};
use crate::hotspot::types::{
    ClientIdentity, HotspotStatus, LohsResult, ObserverId, Pid, SoftApConfiguration,
    TetheringResult,
};
use log::{info, warn};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const PENDING: u8 = 0;
const ANSWERED: u8 = 1;
const ABANDONED: u8 = 2;

/// One-shot reply slot carried by a request.
struct Reply<T> {
    deadline: Instant,
    claim: Arc<AtomicU8>,
    tx: Sender<T>,
}

impl<T> Reply<T> {
    fn expired(&self) -> bool {
        Instant::now() >= self.deadline || self.claim.load(Ordering::Acquire) == ABANDONED
    }

    /// Drops the request unanswered.
    fn abandon(self) {
        self.claim.store(ABANDONED, Ordering::Release);
    }

    /// Returns false when the caller has stopped waiting.
    fn send(self, value: T) -> bool {
        if self
            .claim
            .compare_exchange(PENDING, ANSWERED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        // The caller keeps waiting once the slot is answered.
        self.tx.send(value).is_ok()
    }
}

struct LohsRequest {
    client: ClientIdentity,
    link: ClientLink,
    callback: Arc<dyn LocalOnlyHotspotCallback>,
    custom_config: Option<SoftApConfiguration>,
}

struct WatchRequest {
    link: ClientLink,
    observer: Arc<dyn LocalOnlyHotspotObserver>,
}

enum Message {
    StartLocalOnly(LohsRequest, Reply<LohsResult>),
    StopLocalOnly(Pid),
    Watch(WatchRequest, Reply<Result<ObserverId, LinkError>>),
    Unwatch(ObserverId),
    StartTethered(ClientIdentity, Option<SoftApConfiguration>, Reply<TetheringResult>),
    StopTethered(Reply<bool>),
    Status(Reply<HotspotStatus>),
    Radio(RadioEvent),
    ClientDied(DeathNotice),
    ShutDown(String, Reply<()>),
}

#[derive(Clone)]
pub struct HotspotService {
    sender: Sender<Message>,
    request_timeout: Duration,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl HotspotService {
    /// Starts the worker thread and registers its listener with `radio`.
    pub fn start(
        mut radio: Box<dyn RadioModeAuthority>,
        config_store: Box<dyn SoftApConfigStore>,
        policy: Box<dyn HotspotPolicy>,
        events: Arc<Mutex<Events>>,
        request_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let (sender, rx) = mpsc::channel::<Message>();

        let radio_tx = sender.clone();
        radio.register_ap_state_callback(ApStateListener::new(move |event| {
            let _ = radio_tx.send(Message::Radio(event));
        }));
        let death_tx = sender.clone();
        let sink: DeathSink = Arc::new(move |notice| {
            let _ = death_tx.send(Message::ClientDied(notice));
        });
        let watcher = LivenessWatcher::new(sink)?;

        let core = HotspotCore::new(radio, config_store, policy, watcher, events.clone());
        let handle = thread::Builder::new()
            .name("hotspot_worker".to_string())
            .spawn(move || run_worker(core, rx, events))?;
        info!("hotspot worker started, request timeout {request_timeout:?}");
        Ok(HotspotService { sender, request_timeout, worker: Arc::new(Mutex::new(Some(handle))) })
    }

    fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Message) -> Result<T, ServiceError> {
        let (tx, rx) = mpsc::channel();
        let claim = Arc::new(AtomicU8::new(PENDING));
        let reply =
            Reply { deadline: Instant::now() + self.request_timeout, claim: claim.clone(), tx };
        self.sender.send(make(reply)).map_err(|_| ServiceError::WorkerGone)?;
        match rx.recv_timeout(self.request_timeout) {
            Ok(value) => Ok(value),
            Err(RecvTimeoutError::Timeout) => {
                match claim.compare_exchange(PENDING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
                {
                    Ok(_) => Err(ServiceError::Timeout),
                    // Answered just now; the value is on its way.
                    Err(_) => rx.recv().map_err(|_| ServiceError::WorkerGone),
                }
            }
            Err(RecvTimeoutError::Disconnected) if claim.load(Ordering::Acquire) == ABANDONED => {
                Err(ServiceError::Timeout)
            }
            Err(RecvTimeoutError::Disconnected) => Err(ServiceError::WorkerGone),
        }
    }

    fn post(&self, message: Message) {
        if self.sender.send(message).is_err() {
            warn!("hotspot worker is gone, dropping request");
        }
    }

    /// Registers `client` for the shared local-only hotspot. `link` is the
    /// service half of the caller's liveness link.
    pub fn start_local_only_hotspot(
        &self,
        client: ClientIdentity,
        link: ClientLink,
        callback: Arc<dyn LocalOnlyHotspotCallback>,
        custom_config: Option<SoftApConfiguration>,
    ) -> LohsResult {
        let pid = client.pid;
        let request = LohsRequest { client, link, callback, custom_config };
        match self.call(|reply| Message::StartLocalOnly(request, reply)) {
            Ok(result) => result,
            Err(err) => {
                warn!("lohs request from pid {pid}: {err}");
                LohsResult::ErrorGeneric
            }
        }
    }

    pub fn stop_local_only_hotspot(&self, pid: Pid) {
        self.post(Message::StopLocalOnly(pid));
    }

    pub fn watch_local_only_hotspot(
        &self,
        link: ClientLink,
        observer: Arc<dyn LocalOnlyHotspotObserver>,
    ) -> Result<ObserverId, ServiceError> {
        let request = WatchRequest { link, observer };
        Ok(self.call(|reply| Message::Watch(request, reply))??)
    }

    pub fn unwatch_local_only_hotspot(&self, id: ObserverId) {
        self.post(Message::Unwatch(id));
    }

    pub fn start_tethered_hotspot(
        &self,
        client: ClientIdentity,
        config: Option<SoftApConfiguration>,
    ) -> TetheringResult {
        match self.call(|reply| Message::StartTethered(client, config, reply)) {
            Ok(result) => result,
            Err(err) => {
                warn!("tethering request: {err}");
                TetheringResult::ErrorGeneric
            }
        }
    }

    pub fn stop_tethered_hotspot(&self) -> bool {
        self.call(Message::StopTethered).unwrap_or_else(|err| {
            warn!("tethering stop: {err}");
            false
        })
    }

    pub fn status(&self) -> Result<HotspotStatus, ServiceError> {
        self.call(Message::Status)
    }

    /// Stops every session, ends the worker and publishes `Event::ShutDown`.
    pub fn shut_down(&self, reason: &str) -> Result<(), ServiceError> {
        let result = self.call(|reply| Message::ShutDown(reason.to_string(), reply));
        let handle = self.worker.lock().ok().and_then(|mut worker| worker.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("hotspot worker panicked");
            }
        }
        result
    }
}

fn run_worker(mut core: HotspotCore, rx: mpsc::Receiver<Message>, events: Arc<Mutex<Events>>) {
    while let Ok(message) = rx.recv() {
        match message {
            Message::StartLocalOnly(request, reply) => {
                let pid = request.client.pid;
                if reply.expired() {
                    warn!("lohs request from pid {pid} expired before it ran");
                    reply.abandon();
                    continue;
                }
                match core.start_local_only_hotspot(
                    &request.client,
                    request.link,
                    request.callback,
                    request.custom_config,
                ) {
                    Ok(registration) => {
                        if reply.send(LohsResult::Registered) {
                            core.confirm_local_only(registration);
                        } else {
                            warn!("pid {pid} stopped waiting, rolling back its registration");
                            core.roll_back_local_only(registration);
                        }
                    }
                    Err(result) => {
                        reply.send(result);
                    }
                }
            }
            Message::StopLocalOnly(pid) => core.stop_local_only_hotspot(pid),
            Message::Watch(request, reply) => {
                if reply.expired() {
                    warn!("watch request expired before it ran");
                    reply.abandon();
                    continue;
                }
                let result = core.watch_local_only_hotspot(request.link, request.observer);
                if !reply.send(result) {
                    if let Ok(id) = result {
                        core.unwatch_local_only_hotspot(id);
                    }
                }
            }
            Message::Unwatch(id) => core.unwatch_local_only_hotspot(id),
            Message::StartTethered(client, config, reply) => {
                if reply.expired() {
                    warn!("tethering request from pid {} expired before it ran", client.pid);
                    reply.abandon();
                    continue;
                }
                let result = core.start_tethered_hotspot(&client, config);
                if !reply.send(result) && result == TetheringResult::Started {
                    warn!("tethering caller stopped waiting, stopping tethering");
                    core.stop_tethered_hotspot();
                }
            }
            Message::StopTethered(reply) => {
                reply.send(core.stop_tethered_hotspot());
            }
            Message::Status(reply) => {
                reply.send(core.status());
            }
            Message::Radio(event) => core.on_radio_event(event),
            Message::ClientDied(notice) => core.on_client_died(notice),
            Message::ShutDown(reason, reply) => {
                info!("hotspot worker shutting down: {reason}");
                core.shut_down();
                events::publish(&events, Event::ShutDown { reason });
                reply.send(());
                break;
            }
        }
    }
    info!("hotspot worker stopped");
}
