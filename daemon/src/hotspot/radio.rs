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

//! Collaborators the broker consumes but does not implement: the
//! radio-mode authority that owns the physical AP, the configuration
//! store and the permission policy.

use crate::hotspot::error::{ConfigError, RadioError};
use crate::hotspot::types::{ApMode, ApState, Band, ClientIdentity, SoftApConfiguration, WorkSource};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;

const SSID_MAX_BYTES: usize = 32;
const PASSPHRASE_MIN_LEN: usize = 8;
const PASSPHRASE_MAX_LEN: usize = 63;

/// Notification from the radio-mode authority's single AP state stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RadioEvent {
    /// The authority bound `interface_name` to a session of `mode`.
    InterfaceAssigned { mode: ApMode, interface_name: String },
    /// A hardware state change. `interface_name` is `None` when the
    /// authority failed before an interface existed.
    StateChanged { interface_name: Option<String>, state: ApState },
}

/// Sink handed to the radio-mode authority through
/// `register_ap_state_callback`. Cloneable so the authority can deliver
/// from any of its threads.
#[derive(Clone)]
pub struct ApStateListener {
    sink: Arc<dyn Fn(RadioEvent) + Send + Sync>,
}

impl ApStateListener {
    pub fn new(sink: impl Fn(RadioEvent) + Send + Sync + 'static) -> Self {
        ApStateListener { sink: Arc::new(sink) }
    }

    pub fn on_interface_assigned(&self, mode: ApMode, interface_name: &str) {
        (self.sink)(RadioEvent::InterfaceAssigned {
            mode,
            interface_name: interface_name.to_string(),
        });
    }

    pub fn on_state_changed(&self, interface_name: Option<&str>, state: ApState) {
        (self.sink)(RadioEvent::StateChanged {
            interface_name: interface_name.map(str::to_string),
            state,
        });
    }
}

/// The authority that owns the AP state machine and physical interface
/// allocation. Calls are fire-and-forget; completion arrives later through
/// the registered `ApStateListener`.
pub trait RadioModeAuthority: Send {
    fn start_soft_ap(
        &mut self,
        mode: ApMode,
        config: &SoftApConfiguration,
        attribution: &WorkSource,
    ) -> Result<(), RadioError>;

    fn stop_soft_ap(&mut self, mode: ApMode) -> Result<(), RadioError>;

    fn register_ap_state_callback(&mut self, listener: ApStateListener);

    fn can_support_dual_ap(&self, attribution: &WorkSource) -> bool;
}

/// Produces concrete AP configurations.
pub trait SoftApConfigStore: Send {
    /// With `None`, generates the shared default config. With a custom config,
    /// validates it and returns the concrete config to bring up.
    fn generate_local_only_hotspot_config(
        &mut self,
        custom: Option<&SoftApConfiguration>,
    ) -> Result<SoftApConfiguration, ConfigError>;

    /// The persisted configuration used when tethering starts without one.
    fn tethered_config(&self) -> SoftApConfiguration;
}

/// Permission authority consulted before admission.
pub trait HotspotPolicy: Send {
    fn is_tethering_disallowed(&self, client: &ClientIdentity) -> bool;
}

/// Policy that never restricts tethering.
pub struct AllowAllPolicy;

impl HotspotPolicy for AllowAllPolicy {
    fn is_tethering_disallowed(&self, _client: &ClientIdentity) -> bool {
        false
    }
}

/// Config store generating a random SSID and passphrase for each shared
/// local-only session.
pub struct DefaultConfigStore {
    ssid_prefix: String,
    band: Band,
    supports_5ghz: bool,
    tethered: SoftApConfiguration,
}

impl DefaultConfigStore {
    pub fn new(ssid_prefix: &str, band: Band, supports_5ghz: bool) -> Self {
        DefaultConfigStore {
            ssid_prefix: ssid_prefix.to_string(),
            band,
            supports_5ghz,
            tethered: SoftApConfiguration::new(
                &format!("{ssid_prefix}Tether"),
                Some(&random_passphrase()),
                Band::Any,
            ),
        }
    }

    pub fn with_tethered_config(mut self, config: SoftApConfiguration) -> Self {
        self.tethered = config;
        self
    }

    fn check_band(&self, band: Band) -> Result<(), ConfigError> {
        if band == Band::Only5Ghz && !self.supports_5ghz {
            return Err(ConfigError::NoChannel);
        }
        Ok(())
    }
}

impl SoftApConfigStore for DefaultConfigStore {
    fn generate_local_only_hotspot_config(
        &mut self,
        custom: Option<&SoftApConfiguration>,
    ) -> Result<SoftApConfiguration, ConfigError> {
        match custom {
            Some(config) => {
                validate(config)?;
                self.check_band(config.band)?;
                Ok(config.clone())
            }
            None => {
                self.check_band(self.band)?;
                let suffix: u16 = rand::thread_rng().gen_range(1000..10000);
                Ok(SoftApConfiguration::new(
                    &format!("{}_{suffix}", self.ssid_prefix),
                    Some(&random_passphrase()),
                    self.band,
                ))
            }
        }
    }

    fn tethered_config(&self) -> SoftApConfiguration {
        self.tethered.clone()
    }
}

fn random_passphrase() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(15).map(char::from).collect()
}

fn validate(config: &SoftApConfiguration) -> Result<(), ConfigError> {
    if config.ssid.is_empty() || config.ssid.len() > SSID_MAX_BYTES {
        return Err(ConfigError::Invalid(format!("ssid length {}", config.ssid.len())));
    }
    if let Some(passphrase) = &config.passphrase {
        if !(PASSPHRASE_MIN_LEN..=PASSPHRASE_MAX_LEN).contains(&passphrase.len()) {
            return Err(ConfigError::Invalid(format!("passphrase length {}", passphrase.len())));
        }
    }
    Ok(())
}
