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

//! Daemon configuration: defaults, then the ini file, then flags.

use crate::args::HotspotdArgs;
use crate::hotspot::types::Band;
use anyhow::Context;
use hotspot_common::system::default_config_filepath;
use hotspot_common::util::ini_file::IniFile;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

const REQUEST_TIMEOUT_MS: &str = "request.timeout_ms";
const LOHS_SSID_PREFIX: &str = "lohs.ssid_prefix";
const LOHS_BAND: &str = "lohs.band";
const SIM_DUAL_AP: &str = "sim.dual_ap";
const SIM_SUPPORTS_5GHZ: &str = "sim.supports_5ghz";
const SIM_TRANSITION_DELAY_MS: &str = "sim.transition_delay_ms";
const SIM_INTERFACE_PREFIX: &str = "sim.interface_prefix";

const KNOWN_KEYS: [&str; 7] = [
    REQUEST_TIMEOUT_MS,
    LOHS_SSID_PREFIX,
    LOHS_BAND,
    SIM_DUAL_AP,
    SIM_SUPPORTS_5GHZ,
    SIM_TRANSITION_DELAY_MS,
    SIM_INTERFACE_PREFIX,
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HotspotConfig {
    pub request_timeout: Duration,
    pub lohs_ssid_prefix: String,
    pub lohs_band: Band,
    pub sim_dual_ap: bool,
    pub sim_supports_5ghz: bool,
    pub sim_transition_delay: Duration,
    pub sim_interface_prefix: String,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        HotspotConfig {
            request_timeout: Duration::from_millis(1000),
            lohs_ssid_prefix: "AndroidShare".to_string(),
            lohs_band: Band::Only24Ghz,
            sim_dual_ap: false,
            sim_supports_5ghz: true,
            sim_transition_delay: Duration::from_millis(200),
            sim_interface_prefix: "wlan".to_string(),
        }
    }
}

impl HotspotConfig {
    /// Builds the config for `args`. The ini file named by `--config` must
    /// exist; the default one is read only when present.
    pub fn load(args: &HotspotdArgs) -> anyhow::Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path.clone())?,
            None => {
                let path = default_config_filepath();
                if path.is_file() {
                    Self::from_file(path)?
                } else {
                    HotspotConfig::default()
                }
            }
        };
        config.apply_args(args);
        Ok(config)
    }

    fn from_file(path: PathBuf) -> anyhow::Result<Self> {
        let mut ini = IniFile::new(path);
        ini.read().with_context(|| format!("reading {}", ini.filepath().display()))?;
        info!("loading config from {}", ini.filepath().display());
        Self::from_ini(&ini)
    }

    /// Overlays the keys present in `ini` on the defaults.
    pub fn from_ini(ini: &IniFile) -> anyhow::Result<Self> {
        for key in ini.keys().filter(|key| !KNOWN_KEYS.iter().any(|known| known == key)) {
            warn!("ignoring unknown config key {key}");
        }
        let mut config = HotspotConfig::default();
        if let Some(ms) = ini.get_parsed::<u64>(REQUEST_TIMEOUT_MS)? {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(prefix) = ini.get(LOHS_SSID_PREFIX) {
            anyhow::ensure!(!prefix.is_empty(), "{LOHS_SSID_PREFIX} must not be empty");
            config.lohs_ssid_prefix = prefix.to_string();
        }
        if let Some(band) = ini.get(LOHS_BAND) {
            config.lohs_band = band
                .parse()
                .map_err(|err: String| anyhow::anyhow!("invalid {LOHS_BAND}: {err}"))?;
        }
        if let Some(dual_ap) = ini.get_parsed::<bool>(SIM_DUAL_AP)? {
            config.sim_dual_ap = dual_ap;
        }
        if let Some(supports_5ghz) = ini.get_parsed::<bool>(SIM_SUPPORTS_5GHZ)? {
            config.sim_supports_5ghz = supports_5ghz;
        }
        if let Some(ms) = ini.get_parsed::<u64>(SIM_TRANSITION_DELAY_MS)? {
            config.sim_transition_delay = Duration::from_millis(ms);
        }
        if let Some(prefix) = ini.get(SIM_INTERFACE_PREFIX) {
            config.sim_interface_prefix = prefix.to_string();
        }
        Ok(config)
    }

    pub fn apply_args(&mut self, args: &HotspotdArgs) {
        if args.dual_ap {
            self.sim_dual_ap = true;
        }
        if let Some(ms) = args.timeout_ms {
            self.request_timeout = Duration::from_millis(ms);
        }
    }
}
