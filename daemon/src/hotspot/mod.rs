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

//! Local-only and tethered hotspot lifecycle broker.

pub mod arbiter;
pub mod callback;
pub mod error;
pub mod facade;
#[cfg(test)]
pub mod mocked;
pub mod liveness;
pub mod projector;
pub mod radio;
pub mod registry;
pub mod service;
pub mod types;

pub use crate::hotspot::callback::{LocalOnlyHotspotCallback, LocalOnlyHotspotObserver};
pub use crate::hotspot::error::{ConfigError, LinkError, RadioError, ServiceError};
pub use crate::hotspot::liveness::{client_link, ClientLink, ClientToken};
pub use crate::hotspot::radio::{
    AllowAllPolicy, ApStateListener, DefaultConfigStore, HotspotPolicy, RadioEvent,
    RadioModeAuthority, SoftApConfigStore,
};
pub use crate::hotspot::service::HotspotService;
pub use crate::hotspot::types::*;
