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

use crate::hotspot::types::SoftApConfiguration;

/// Per-requestor notification channel of a local-only hotspot caller.
///
/// Each requestor sees at most one `on_hotspot_started` and at most one of
/// `on_hotspot_stopped`/`on_hotspot_failed` per session attempt.
pub trait LocalOnlyHotspotCallback: Send + Sync {
    fn on_hotspot_started(&self, config: &SoftApConfiguration);

    fn on_hotspot_stopped(&self);

    /// `reason` is forwarded verbatim from the radio-mode authority, or is
    /// `ERROR_INCOMPATIBLE_MODE` when tethering preempted the session.
    fn on_hotspot_failed(&self, reason: i32);
}

/// A passive watcher of the local-only hotspot. Observers never start or
/// stop the AP.
pub trait LocalOnlyHotspotObserver: Send + Sync {
    fn on_registered(&self);

    fn on_started(&self, config: &SoftApConfiguration);

    fn on_stopped(&self);
}
