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

//! Vocabulary shared by the hotspot broker components.

use std::fmt;

/// Process identity of a caller. A process holds at most one local-only
/// hotspot registration.
pub type Pid = u32;

/// Which use case a physical AP session serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApMode {
    Tethered,
    LocalOnly,
}

impl fmt::Display for ApMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApMode::Tethered => write!(f, "tethered"),
            ApMode::LocalOnly => write!(f, "local-only"),
        }
    }
}

/// Hardware AP state as reported by the radio-mode authority.
///
/// `Failed` carries the authority's error code, which is opaque here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApState {
    Disabled,
    Enabling,
    Enabled,
    Disabling,
    Failed(i32),
}

impl ApState {
    /// True for the states after which a session attempt is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApState::Disabled | ApState::Failed(_))
    }

    /// Whether the hardware state machine may move from `self` to `next`.
    pub fn can_transition_to(&self, next: ApState) -> bool {
        use ApState::*;
        matches!(
            (self, next),
            (Disabled, Enabling)
                | (Enabling, Enabled)
                | (Enabling, Disabling)
                | (Enabled, Disabling)
                | (Disabling, Disabled)
                | (Enabling | Enabled | Disabling, Failed(_))
        )
    }
}

/// Band restriction of a soft AP configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    Any,
    Only24Ghz,
    Only5Ghz,
}

impl std::str::FromStr for Band {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(Band::Any),
            "2g" | "2.4g" | "2.4ghz" => Ok(Band::Only24Ghz),
            "5g" | "5ghz" => Ok(Band::Only5Ghz),
            other => Err(format!("unknown band {other:?}")),
        }
    }
}

/// A concrete AP configuration handed to the radio-mode authority and
/// reported to requestors when the hotspot starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoftApConfiguration {
    pub ssid: String,
    pub passphrase: Option<String>,
    pub band: Band,
}

impl SoftApConfiguration {
    pub fn new(ssid: &str, passphrase: Option<&str>, band: Band) -> Self {
        SoftApConfiguration {
            ssid: ssid.to_string(),
            passphrase: passphrase.map(str::to_string),
            band,
        }
    }
}

/// Attribution of a request, charged for system accounting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkSource {
    pub uid: u32,
    pub package_name: String,
}

/// Who is asking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientIdentity {
    pub pid: Pid,
    pub work_source: WorkSource,
}

impl ClientIdentity {
    pub fn new(pid: Pid, uid: u32, package_name: &str) -> Self {
        ClientIdentity {
            pid,
            work_source: WorkSource { uid, package_name: package_name.to_string() },
        }
    }
}

/// Result of a local-only hotspot start request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LohsResult {
    Registered,
    ErrorNoChannel,
    ErrorGeneric,
    ErrorIncompatibleMode,
    ErrorTetheringDisallowed,
}

impl LohsResult {
    /// Stable numeric code reported to remote callers.
    pub fn code(&self) -> i32 {
        match self {
            LohsResult::Registered => 0,
            LohsResult::ErrorNoChannel => 1,
            LohsResult::ErrorGeneric => 2,
            LohsResult::ErrorIncompatibleMode => 3,
            LohsResult::ErrorTetheringDisallowed => 4,
        }
    }
}

/// Failure code delivered to local-only requestors preempted by tethering.
pub const ERROR_INCOMPATIBLE_MODE: i32 = 3;

/// Result of a tethered hotspot start request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TetheringResult {
    Started,
    ErrorAlreadyActive,
    ErrorDisallowed,
    ErrorGeneric,
}

/// Identifier handed out to local-only hotspot observers.
pub type ObserverId = u32;

/// Snapshot of one AP session, for status queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionStatus {
    pub mode: ApMode,
    pub interface_name: Option<String>,
    pub state: ApState,
    pub teardown_requested: bool,
}

/// Snapshot of the broker, for status queries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HotspotStatus {
    pub requestor_pids: Vec<Pid>,
    pub exclusive: bool,
    pub observer_count: usize,
    pub sessions: Vec<SessionStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        assert!(ApState::Disabled.can_transition_to(ApState::Enabling));
        assert!(ApState::Enabling.can_transition_to(ApState::Failed(5)));
        assert!(ApState::Disabling.can_transition_to(ApState::Disabled));
        assert!(!ApState::Disabled.can_transition_to(ApState::Enabled));
        assert!(!ApState::Failed(1).can_transition_to(ApState::Enabled));
        assert!(ApState::Failed(1).is_terminal());
        assert!(!ApState::Disabling.is_terminal());
    }

    #[test]
    fn test_band_from_str() {
        assert_eq!("5G".parse::<Band>(), Ok(Band::Only5Ghz));
        assert_eq!("any".parse::<Band>(), Ok(Band::Any));
        assert!("60g".parse::<Band>().is_err());
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(LohsResult::Registered.code(), 0);
        assert_eq!(LohsResult::ErrorIncompatibleMode.code(), ERROR_INCOMPATIBLE_MODE);
    }
}
