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

//! A module with mpmc channels for distributing global events.

use crate::hotspot::types::ApState;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

/// Event messages shared across various components in a loosely
/// coupled manner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Relayed to the tethering collaborator; the broker itself does not
    /// notify anyone about tethered sessions.
    TetheredStateChanged {
        interface_name: Option<String>,
        state: ApState,
    },
    LocalOnlyStateChanged {
        interface_name: Option<String>,
        state: ApState,
    },
    ShutDown {
        reason: String,
    },
}

/// A multi-producer, multi-consumer broadcast queue based on
/// `std::sync::mpsc`.
///
/// Each Event message `published` is seen by all subscribers.
///
/// Warning: invoke `subscribe()` before `publish()` or else messages
/// will be lost.
pub struct Events {
    subscribers: Vec<Sender<Event>>,
}

impl Events {
    // Events is always owned by multiple publishers and subscribers
    // across threads so return an Arc type.
    pub fn new() -> Arc<Mutex<Events>> {
        Arc::new(Mutex::new(Self { subscribers: Vec::new() }))
    }

    // Creates a new asynchronous channel, returning the receiver
    // half. All `Event` messages sent through `publish` will become
    // available on the receiver in the same order as it was sent.
    pub fn subscribe(&mut self) -> Receiver<Event> {
        let (tx, rx) = channel::<Event>();
        self.subscribers.push(tx);
        rx
    }

    // Attempts to send an Event on the events channel.
    pub fn publish(&mut self, msg: Event) {
        if self.subscribers.is_empty() {
            log::debug!("No Subscribers to the event: {msg:?}");
        } else {
            // Any channel with a disconnected receiver will return an
            // error and be removed by retain.
            self.subscribers.retain(|subscriber| subscriber.send(msg.clone()).is_ok())
        }
    }
}

/// Publishes on a shared `Events`, tolerating a poisoned lock.
pub fn publish(events: &Arc<Mutex<Events>>, msg: Event) {
    match events.lock() {
        Ok(mut events) => events.publish(msg),
        Err(poisoned) => poisoned.into_inner().publish(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn enabled(iface: &str) -> Event {
        Event::TetheredStateChanged {
            interface_name: Some(iface.to_string()),
            state: ApState::Enabled,
        }
    }

    #[test]
    fn test_publish_to_multiple_subscribers() {
        let events = Events::new();

        let num_subscribers = 10;
        let mut handles = Vec::with_capacity(num_subscribers);
        for _ in 0..num_subscribers {
            let rx = events.lock().unwrap().subscribe();
            let handle = thread::spawn(move || match rx.recv() {
                Ok(event) => assert_eq!(event, enabled("wlan1")),
                _ => panic!("Unexpected event"),
            });
            handles.push(handle);
        }

        publish(&events, enabled("wlan1"));

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    // A dropped receiver is removed the next time something is published.
    fn test_publish_to_dropped_subscriber() {
        let events = Events::new();
        let rx = events.lock().unwrap().subscribe();
        assert_eq!(events.lock().unwrap().subscribers.len(), 1);
        std::mem::drop(rx);
        publish(&events, Event::ShutDown { reason: "test".to_string() });
        assert_eq!(events.lock().unwrap().subscribers.len(), 0);
    }
}
