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

//! Line commands accepted on the daemon console.

use crate::hotspot::types::{Band, ObserverId, Pid};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
pub struct ConsoleLine {
    #[command(subcommand)]
    pub command: ConsoleCommand,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum ConsoleCommand {
    /// Register a simulated client for the local-only hotspot
    LohsStart(LohsStart),
    /// Unregister a simulated client
    LohsStop { pid: Pid },
    /// Drop a simulated client's link without unregistering it
    LohsKill { pid: Pid },
    /// Observe the local-only hotspot without requesting it
    Watch,
    /// Stop observing
    Unwatch { id: ObserverId },
    /// Start tethering as the system user
    TetherStart,
    /// Stop tethering
    TetherStop,
    /// Make the next hardware start fail with `code`
    FailNext {
        #[arg(allow_negative_numbers = true)]
        code: i32,
    },
    /// Print requestors, observers and sessions
    Status,
    /// Shut the daemon down
    Quit,
}

#[derive(Debug, PartialEq, Eq, Args)]
pub struct LohsStart {
    pub pid: Pid,
    /// Request an exclusive hotspot with this SSID
    #[arg(long)]
    pub ssid: Option<String>,
    /// Passphrase of the exclusive hotspot
    #[arg(long, requires = "ssid")]
    pub passphrase: Option<String>,
    /// Band of the exclusive hotspot: any, 2g or 5g
    #[arg(long, requires = "ssid", default_value = "any")]
    pub band: Band,
}

/// Parses one console line. Blank lines parse to `None`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    ConsoleLine::try_parse_from(words).map(|parsed| Some(parsed.command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lohs_start() {
        assert_eq!(
            parse_line("lohs-start 42").unwrap(),
            Some(ConsoleCommand::LohsStart(LohsStart {
                pid: 42,
                ssid: None,
                passphrase: None,
                band: Band::Any
            }))
        );
        assert_eq!(
            parse_line("lohs-start 7 --ssid Lab --passphrase secret123 --band 5g").unwrap(),
            Some(ConsoleCommand::LohsStart(LohsStart {
                pid: 7,
                ssid: Some("Lab".to_string()),
                passphrase: Some("secret123".to_string()),
                band: Band::Only5Ghz
            }))
        );
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_line("  ").unwrap(), None);
        assert_eq!(parse_line("lohs-kill 3").unwrap(), Some(ConsoleCommand::LohsKill { pid: 3 }));
        assert_eq!(parse_line("fail-next -1").unwrap(), Some(ConsoleCommand::FailNext { code: -1 }));
        assert_eq!(parse_line("tether-start").unwrap(), Some(ConsoleCommand::TetherStart));
        assert_eq!(parse_line("quit").unwrap(), Some(ConsoleCommand::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("lohs-start").is_err());
        assert!(parse_line("lohs-start abc").is_err());
        assert!(parse_line("lohs-start 1 --passphrase secret123").is_err());
        assert!(parse_line("reboot").is_err());
    }
}
