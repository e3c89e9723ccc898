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

//! Where hotspotd keeps its files.
//!
//! The base is `$ANDROID_TMP` when set (Forge), otherwise the system temp
//! directory. Outside Windows a per-user `android-$USER` level keeps users
//! apart, so the daemon directory is `<base>/android-$USER/hotspotd`.

use std::env;
use std::path::PathBuf;

const DAEMON_DIR: &str = "hotspotd";
const CONFIG_FILE: &str = "hotspotd.ini";
/// Overrides the default config file location.
pub const CONFIG_ENV: &str = "HOTSPOTD_CONFIG";

/// Returns the hotspotd temp directory, creating it if needed.
pub fn hotspotd_temp_dir() -> std::io::Result<PathBuf> {
    let path = temp_dir_path();
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

/// `$HOTSPOTD_CONFIG` if set, else `hotspotd.ini` in the temp directory.
/// The file may not exist.
pub fn default_config_filepath() -> PathBuf {
    match env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => temp_dir_path().join(CONFIG_FILE),
    }
}

fn temp_dir_path() -> PathBuf {
    let base = env::var_os("ANDROID_TMP").map(PathBuf::from).unwrap_or_else(env::temp_dir);
    user_dir(base).join(DAEMON_DIR)
}

#[cfg(not(target_os = "windows"))]
fn user_dir(base: PathBuf) -> PathBuf {
    match env::var("USER") {
        Ok(user) => base.join(format!("android-{user}")),
        Err(_) => base.join("android"),
    }
}

// GetTempPath() is already per user on Windows.
#[cfg(target_os = "windows")]
fn user_dir(base: PathBuf) -> PathBuf {
    base
}
