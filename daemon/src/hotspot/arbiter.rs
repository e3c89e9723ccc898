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

//! Admission control for AP start requests.
//!
//! Tethering is a deliberate, higher-priority action: on hardware that can
//! run only one AP it preempts a local-only session, while a local-only
//! request never preempts tethering.

use crate::hotspot::types::ApMode;

/// Which sessions are currently holding the AP.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActiveSessions {
    pub tethered: bool,
    pub local_only: bool,
}

impl ActiveSessions {
    pub fn is_active(&self, mode: ApMode) -> bool {
        match mode {
            ApMode::Tethered => self.tethered,
            ApMode::LocalOnly => self.local_only,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Start a new session.
    Approve,
    /// A session of the same mode exists; a tethered start is refused.
    AlreadyActive,
    /// A local-only session exists; the requestor may join it, subject to
    /// the registry's compatibility rules.
    JoinExisting,
    /// Tear the local-only session down first, then start tethering.
    PreemptLocalOnly,
    /// Tethering holds the only AP.
    RejectIncompatibleMode,
}

/// Decides whether a start of `requested` may proceed given the sessions in
/// `current` and whether the device can run two APs at once.
pub fn can_start(requested: ApMode, current: ActiveSessions, can_support_dual_ap: bool) -> Admission {
    if !current.tethered && !current.local_only {
        return Admission::Approve;
    }
    if current.is_active(requested) {
        return match requested {
            ApMode::Tethered => Admission::AlreadyActive,
            ApMode::LocalOnly => Admission::JoinExisting,
        };
    }
    if can_support_dual_ap {
        return Admission::Approve;
    }
    match requested {
        ApMode::Tethered => Admission::PreemptLocalOnly,
        ApMode::LocalOnly => Admission::RejectIncompatibleMode,
    }
}
