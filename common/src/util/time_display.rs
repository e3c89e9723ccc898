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

//! Timestamps for log lines.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// A point in time expressed relative to std::time::UNIX_EPOCH.
pub struct TimeDisplay {
    secs: i64,
    nsecs: u32,
}

impl TimeDisplay {
    pub fn new(secs: i64, nsecs: u32) -> TimeDisplay {
        TimeDisplay { secs, nsecs }
    }

    fn to_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.secs, self.nsecs)
    }

    /// Displays time in UTC for logs with a format MM-DD HH:MM:SS.mmm
    pub fn utc_display_log(&self) -> String {
        match self.to_utc() {
            Some(datetime) => datetime.format("%m-%d %H:%M:%S%.3f").to_string(),
            None => "INVALID-TIMESTAMP".to_string(),
        }
    }
}

fn get_current_time() -> TimeDisplay {
    let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    TimeDisplay::new(since_epoch.as_secs() as i64, since_epoch.subsec_nanos())
}

/// Return the timestamp of the current time for logs
pub fn log_current_time() -> String {
    get_current_time().utc_display_log()
}

#[cfg(test)]
mod tests {
    use super::TimeDisplay;

    #[test]
    fn test_utc_display_log() {
        assert_eq!(TimeDisplay::new(0, 0).utc_display_log(), "01-01 00:00:00.000");
        assert_eq!(TimeDisplay::new(946684900, 200_000_000).utc_display_log(), "01-01 00:01:40.200");
    }

    #[test]
    fn test_utc_display_log_invalid() {
        assert_eq!(TimeDisplay::new(i64::MAX, 0).utc_display_log(), "INVALID-TIMESTAMP");
    }
}
