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

//! A logger for use by hotspotd and its tests.
//!
//! Uses the env_logger crate that allows control of logging through
//! the RUST_LOG environment variable.

use env_logger::{Builder, Env};
use log::{Level, Record};
use std::{ffi::OsStr, io::Write, path::Path};

use crate::util::time_display::log_current_time;

/// Initiating the environment for logging with given prefix.
///
/// `verbose` lowers the default filter from `info` to `debug`. RUST_LOG
/// still takes precedence when set.
pub fn init(prefix: &'static str, verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));
    builder.format(move |buf, record| {
        writeln!(
            buf,
            "{} {} {} {}:{} - {}",
            prefix,
            level_to_string(record.level()),
            log_current_time(),
            format_file(record),
            record.line().unwrap_or(0),
            record.args()
        )
    });
    if let Err(err) = builder.try_init() {
        eprintln!("{prefix}: logger already initialized: {err}");
    }
}

/// Initiating the environment for logging in Rust unit tests.
///
/// Safe to call more than once; only the first call installs the logger.
pub fn init_for_test() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("debug"));
    builder.is_test(true);
    builder.format(move |buf, record| {
        writeln!(
            buf,
            "{} {} \t| hotspot-test: {}",
            level_to_string(record.level()),
            log_current_time(),
            record.args()
        )
    });
    let _ = builder.try_init();
}

/// Helper function for parsing the file name from given record file path
fn format_file<'a>(record: &'a Record<'a>) -> &'a str {
    record
        .file()
        .and_then(|filepath| Path::new(filepath).file_name().and_then(OsStr::to_str))
        .unwrap_or("N/A")
}

/// Helper function for translating log levels to string.
fn level_to_string(level: Level) -> &'static str {
    match level {
        Level::Error => "E",
        Level::Warn => "W",
        Level::Info => "I",
        Level::Debug => "D",
        Level::Trace => "T",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_for_test_twice() {
        init_for_test();
        init_for_test();
        log::info!("Hello hotspot");
    }

    #[test]
    fn test_level_to_string() {
        assert_eq!(level_to_string(Level::Warn), "W");
        assert_eq!(level_to_string(Level::Trace), "T");
    }
}
