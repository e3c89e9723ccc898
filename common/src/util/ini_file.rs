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

//! # IniFile class

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Error raised when reading or interpreting an ini file.
#[derive(Debug)]
pub enum IniError {
    Io(std::io::Error),
    /// A key was present but its value could not be parsed.
    InvalidValue { key: String, value: String },
}

impl fmt::Display for IniError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IniError::Io(err) => write!(f, "ini io error: {err}"),
            IniError::InvalidValue { key, value } => {
                write!(f, "invalid value for {key}: {value:?}")
            }
        }
    }
}

impl std::error::Error for IniError {}

impl From<std::io::Error> for IniError {
    fn from(err: std::io::Error) -> Self {
        IniError::Io(err)
    }
}

/// A flat `key=value` file. Lines without `=` and lines starting with
/// `#` or `;` are skipped.
pub struct IniFile {
    data: BTreeMap<String, String>,
    filepath: PathBuf,
}

impl IniFile {
    pub fn new(filepath: PathBuf) -> IniFile {
        IniFile { data: BTreeMap::new(), filepath }
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    /// Reads data into IniFile from the backing file, overwriting any
    /// existing data.
    pub fn read(&mut self) -> Result<(), IniError> {
        self.data.clear();
        let reader = BufReader::new(File::open(&self.filepath)?);
        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }
            if let Some((key, value)) = trimmed.split_once('=') {
                self.data.insert(key.trim().to_owned(), value.trim().to_owned());
            }
        }
        Ok(())
    }

    /// Writes the current IniFile to the backing file.
    pub fn write(&self) -> Result<(), IniError> {
        let mut f = File::create(&self.filepath)?;
        for (key, value) in &self.data {
            writeln!(&mut f, "{}={}", key, value)?;
        }
        f.flush()?;
        Ok(())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|v| v.as_str())
    }

    /// Gets a value parsed as `T`. A present but unparsable value is an error.
    pub fn get_parsed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, IniError> {
        match self.data.get(key) {
            None => Ok(None),
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|_| IniError::InvalidValue { key: key.to_owned(), value: value.clone() }),
        }
    }

    /// Iterates over every key in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(|k| k.as_str())
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.data.insert(key.to_owned(), value.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use rand::{distributions::Alphanumeric, Rng};
    use std::env;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;

    use super::{IniError, IniFile};

    fn get_temp_ini_filepath(prefix: &str) -> PathBuf {
        env::temp_dir().join(format!(
            "{prefix}_{}.ini",
            rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(8)
                .map(char::from)
                .collect::<String>()
        ))
    }

    #[test]
    fn test_read_trims_and_skips_comments() {
        let filepath = get_temp_ini_filepath("test_read");
        {
            let mut tmpfile = File::create(&filepath).unwrap();
            writeln!(tmpfile, "# comment").unwrap();
            writeln!(tmpfile, " request.timeout_ms = 250 ").unwrap();
            writeln!(tmpfile, "no separator here").unwrap();
            write!(tmpfile, "lohs.ssid_prefix=Share").unwrap();
        }

        let mut inifile = IniFile::new(filepath.clone());
        inifile.read().unwrap();

        assert_eq!(inifile.get("request.timeout_ms"), Some("250"));
        assert_eq!(inifile.get("lohs.ssid_prefix"), Some("Share"));
        assert!(!inifile.contains_key("# comment"));
        assert_eq!(inifile.keys().count(), 2);

        std::fs::remove_file(filepath).unwrap();
    }

    #[test]
    fn test_read_no_file() {
        let mut inifile = IniFile::new(get_temp_ini_filepath("test_read_no_file"));
        assert!(matches!(inifile.read(), Err(IniError::Io(_))));
    }

    #[test]
    fn test_get_parsed() {
        let mut inifile = IniFile::new(get_temp_ini_filepath("test_get_parsed"));
        inifile.insert("sim.dual_ap", "true");
        inifile.insert("request.timeout_ms", "soon");

        assert_eq!(inifile.get_parsed::<bool>("sim.dual_ap").unwrap(), Some(true));
        assert_eq!(inifile.get_parsed::<u64>("missing").unwrap(), None);
        assert!(matches!(
            inifile.get_parsed::<u64>("request.timeout_ms"),
            Err(IniError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_write_and_read() {
        let filepath = get_temp_ini_filepath("test_write_and_read");
        let mut inifile = IniFile::new(filepath.clone());
        inifile.insert("sim.interface_prefix", "ap");
        inifile.write().unwrap();

        let mut reread = IniFile::new(filepath.clone());
        reread.read().unwrap();
        assert_eq!(reread.get("sim.interface_prefix"), Some("ap"));

        std::fs::remove_file(filepath).unwrap();
    }
}
