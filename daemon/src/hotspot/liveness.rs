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

//! Process-death detection for hotspot clients.
//!
//! A client and the service share a `ClientLink`/`ClientToken` pair. The
//! client keeps the token for as long as it lives; dropping it (or the
//! process exiting) closes the link. For every registration the watcher
//! spawns one task that waits for the link to close and then posts a
//! `DeathNotice` back to the hotspot worker. Watches are keyed, and each
//! attach gets a new generation so a notice raised by a superseded link is
//! recognised as stale.

use crate::hotspot::error::LinkError;
use crate::hotspot::types::{ObserverId, Pid};
use crate::id_factory::IdFactory;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Service half of a client connection.
#[derive(Clone, Debug)]
pub struct ClientLink {
    tx: mpsc::Sender<()>,
}

/// Client half of a client connection. Dropping it signals death.
#[derive(Debug)]
pub struct ClientToken {
    _rx: mpsc::Receiver<()>,
}

/// Creates a connected link/token pair.
pub fn client_link() -> (ClientLink, ClientToken) {
    let (tx, rx) = mpsc::channel(1);
    (ClientLink { tx }, ClientToken { _rx: rx })
}

impl ClientLink {
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    async fn closed(&self) {
        self.tx.closed().await
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WatchKey {
    Requestor(Pid),
    Observer(ObserverId),
}

/// Posted by a watch task when its link closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeathNotice {
    pub key: WatchKey,
    pub generation: u64,
}

pub type DeathSink = Arc<dyn Fn(DeathNotice) + Send + Sync>;

struct Watch {
    generation: u64,
    link: ClientLink,
    abort: AbortHandle,
}

pub struct LivenessWatcher {
    runtime: Runtime,
    sink: DeathSink,
    watches: HashMap<WatchKey, Watch>,
    generations: IdFactory<u64>,
}

impl LivenessWatcher {
    pub fn new(sink: DeathSink) -> std::io::Result<Self> {
        let runtime =
            Builder::new_multi_thread().worker_threads(1).thread_name("hotspot_liveness").build()?;
        Ok(LivenessWatcher {
            runtime,
            sink,
            watches: HashMap::new(),
            generations: IdFactory::default(),
        })
    }

    /// Starts watching `link` under `key`, replacing any watch already held
    /// for that key. Fails if the link is already closed.
    pub fn attach(&mut self, key: WatchKey, link: ClientLink) -> Result<(), LinkError> {
        if !link.is_alive() {
            return Err(LinkError::Closed);
        }
        let generation = self.generations.next_id();
        let sink = self.sink.clone();
        let watched = link.clone();
        let task = self.runtime.spawn(async move {
            watched.closed().await;
            sink(DeathNotice { key, generation });
        });
        let watch = Watch { generation, link, abort: task.abort_handle() };
        if let Some(previous) = self.watches.insert(key, watch) {
            previous.abort.abort();
        }
        debug!("watching {key:?} (generation {generation})");
        Ok(())
    }

    /// Stops watching `key`. No-op when absent.
    pub fn detach(&mut self, key: WatchKey) {
        if let Some(watch) = self.watches.remove(&key) {
            watch.abort.abort();
        }
    }

    pub fn detach_all(&mut self) {
        for (_, watch) in self.watches.drain() {
            watch.abort.abort();
        }
    }

    /// Consumes `notice` if it belongs to the live watch of its key.
    /// Returns false for stale notices.
    pub fn take_if_current(&mut self, notice: DeathNotice) -> bool {
        match self.watches.get(&notice.key) {
            Some(watch) if watch.generation == notice.generation => {
                self.watches.remove(&notice.key);
                info!("client death: {:?}", notice.key);
                true
            }
            _ => {
                debug!("ignoring stale death notice {notice:?}");
                false
            }
        }
    }

    /// The link currently watched under `key`.
    pub fn link(&self, key: WatchKey) -> Option<ClientLink> {
        self.watches.get(&key).map(|watch| watch.link.clone())
    }
}

impl Drop for LivenessWatcher {
    fn drop(&mut self) {
        self.detach_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn new_watcher() -> (LivenessWatcher, std_mpsc::Receiver<DeathNotice>) {
        let (tx, rx) = std_mpsc::channel();
        let sink: DeathSink = Arc::new(move |notice| {
            let _ = tx.send(notice);
        });
        (LivenessWatcher::new(sink).unwrap(), rx)
    }

    #[test]
    fn test_death_is_reported() {
        let (mut watcher, rx) = new_watcher();
        let (link, token) = client_link();
        watcher.attach(WatchKey::Requestor(42), link).unwrap();
        drop(token);
        let notice = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(notice.key, WatchKey::Requestor(42));
        assert!(watcher.take_if_current(notice));
        // Consumed; the same notice is not taken twice.
        assert!(!watcher.take_if_current(notice));
        assert!(watcher.link(WatchKey::Requestor(42)).is_none());
    }

    #[test]
    fn test_attach_closed_link_fails() {
        let (mut watcher, _rx) = new_watcher();
        let (link, token) = client_link();
        drop(token);
        assert_eq!(watcher.attach(WatchKey::Observer(1), link), Err(LinkError::Closed));
        assert!(watcher.link(WatchKey::Observer(1)).is_none());
    }

    #[test]
    fn test_detached_watch_stays_silent() {
        let (mut watcher, rx) = new_watcher();
        let (link, token) = client_link();
        watcher.attach(WatchKey::Requestor(1), link).unwrap();
        watcher.detach(WatchKey::Requestor(1));
        drop(token);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_superseded_notice_is_stale() {
        let (mut watcher, _rx) = new_watcher();
        let (first, _first_token) = client_link();
        let (second, _second_token) = client_link();
        watcher.attach(WatchKey::Requestor(5), first).unwrap();
        watcher.attach(WatchKey::Requestor(5), second).unwrap();
        // Generation 1 belonged to the replaced link.
        assert!(!watcher.take_if_current(DeathNotice { key: WatchKey::Requestor(5), generation: 1 }));
        assert!(watcher.link(WatchKey::Requestor(5)).is_some());
        assert!(watcher.take_if_current(DeathNotice { key: WatchKey::Requestor(5), generation: 2 }));
    }

    #[test]
    fn test_reattached_link_is_watched_again() {
        let (mut watcher, rx) = new_watcher();
        let (first, first_token) = client_link();
        let (second, _second_token) = client_link();
        watcher.attach(WatchKey::Requestor(5), first).unwrap();
        let saved = watcher.link(WatchKey::Requestor(5)).unwrap();
        watcher.attach(WatchKey::Requestor(5), second).unwrap();
        watcher.attach(WatchKey::Requestor(5), saved).unwrap();

        drop(first_token);
        let notice = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(notice.key, WatchKey::Requestor(5));
        assert!(watcher.take_if_current(notice));
    }
}
