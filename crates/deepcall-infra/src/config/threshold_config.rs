// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Loading of the recursion thresholds from the per-user configuration file.
//!
//! The file is read line by line: any line mentioning a known key and a `:`
//! provides that key's value. This accepts both plain `key: value` files and
//! flat JSON objects written one key per line. Anything missing or malformed
//! falls back to the defaults.

use anyhow::Context;
use deepcall_core::ThresholdPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Key holding the warning depth.
pub const RECURSION_DEPTH_KEY: &str = "recursion_depth_warning";
/// Key holding the call-count threshold.
pub const CALL_COUNT_KEY: &str = "function_call_warning";

/// The raw threshold values as read from the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Depth above which recursion is reported.
    pub recursion_depth_warning: usize,
    /// Call-count threshold. Carried through but not enforced.
    pub function_call_warning: u64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            recursion_depth_warning: ThresholdPolicy::DEFAULT_WARNING_DEPTH,
            function_call_warning: ThresholdPolicy::DEFAULT_CALL_COUNT_WARNING,
        }
    }
}

impl ThresholdConfig {
    /// The well-known location of the configuration file under `home`.
    pub fn path_in(home: &Path) -> PathBuf {
        home.join(".claude")
            .join("config")
            .join("debug_workflow_config.json")
    }

    /// The configuration file location for the current user, if a home
    /// directory can be determined.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| Self::path_in(&home))
    }

    /// Parses configuration text, keeping defaults for anything absent or invalid.
    pub fn parse(text: &str) -> Self {
        let mut config = Self::default();

        for line in text.lines() {
            if line.contains(RECURSION_DEPTH_KEY) {
                if let Some(value) = parse_value::<usize>(line, RECURSION_DEPTH_KEY) {
                    config.recursion_depth_warning = value;
                }
            } else if line.contains(CALL_COUNT_KEY) {
                if let Some(value) = parse_value::<u64>(line, CALL_COUNT_KEY) {
                    config.function_call_warning = value;
                }
            }
        }

        config
    }

    /// Reads and parses the file at `path`.
    pub fn read_from(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    /// Loads the file at `path`, falling back to defaults if it cannot be read.
    pub fn load_from(path: &Path) -> Self {
        match Self::read_from(path) {
            Ok(config) => {
                log::info!(
                    "Recursion configuration loaded from {} ({RECURSION_DEPTH_KEY}={}, {CALL_COUNT_KEY}={})",
                    path.display(),
                    config.recursion_depth_warning,
                    config.function_call_warning
                );
                config
            }
            Err(e) => {
                log::warn!("{e:#}; using default recursion thresholds");
                Self::default()
            }
        }
    }

    /// Loads the configuration for the current user.
    pub fn load_default() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::warn!("Home directory not found; using default recursion thresholds");
                Self::default()
            }
        }
    }

    /// Converts the raw values into a policy.
    ///
    /// A warning depth of zero is rejected by the policy and replaced by the
    /// default.
    pub fn into_policy(self) -> ThresholdPolicy {
        ThresholdPolicy::new(self.recursion_depth_warning, self.function_call_warning)
            .unwrap_or_else(|e| {
                log::warn!("{e}; using default warning depth");
                ThresholdPolicy::new(
                    ThresholdPolicy::DEFAULT_WARNING_DEPTH,
                    self.function_call_warning,
                )
                .unwrap_or_default()
            })
    }
}

/// Extracts the unsigned value after the first `:` of `line`.
fn parse_value<T: std::str::FromStr>(line: &str, key: &str) -> Option<T> {
    let (_, raw) = line.split_once(':')?;
    let value = raw.trim_matches(|c: char| c.is_whitespace() || c == ',');
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("Ignoring invalid value '{value}' for {key}");
            None
        }
    }
}
