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

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Default, Parser)]
#[command(name = "hotspotd", about = "Local-only and tethered hotspot broker")]
pub struct HotspotdArgs {
    /// Path of the ini config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Let the simulated radio run tethering and local-only hotspot together
    #[arg(long)]
    pub dual_ap: bool,

    /// Bounded wait of each request, in milliseconds
    #[arg(short, long, alias = "timeout_ms")]
    pub timeout_ms: Option<u64>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = HotspotdArgs::try_parse_from([
            "hotspotd",
            "--config",
            "/tmp/h.ini",
            "--dual-ap",
            "-t",
            "250",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/h.ini")));
        assert!(args.dual_ap);
        assert_eq!(args.timeout_ms, Some(250));
        assert!(args.verbose);
    }

    #[test]
    fn test_defaults() {
        let args = HotspotdArgs::try_parse_from(["hotspotd"]).unwrap();
        assert!(args.config.is_none());
        assert!(!args.dual_ap);
        assert!(args.timeout_ms.is_none());
    }
}
