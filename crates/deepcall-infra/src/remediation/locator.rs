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

//! Discovery of the remediation script at its well-known per-user paths.

use std::path::{Path, PathBuf};

/// File name of the remediation script.
pub const SCRIPT_NAME: &str = "debug_workflow_engine.js";

/// An ordered list of places the remediation script may live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationLocator {
    candidates: Vec<PathBuf>,
}

impl RemediationLocator {
    /// The well-known candidates under `home`, in priority order.
    pub fn for_home(home: &Path) -> Self {
        Self {
            candidates: vec![
                home.join(".claude").join("tools").join("debug").join(SCRIPT_NAME),
                home.join("claude-code").join("scripts").join(SCRIPT_NAME),
            ],
        }
    }

    /// The candidates for the current user; empty if there is no home directory.
    pub fn for_current_user() -> Self {
        match dirs::home_dir() {
            Some(home) => Self::for_home(&home),
            None => Self {
                candidates: Vec::new(),
            },
        }
    }

    /// An explicit candidate list.
    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Returns the first candidate that exists as a file.
    pub fn locate(&self) -> Option<PathBuf> {
        let found = self.candidates.iter().find(|path| path.is_file()).cloned();
        match &found {
            Some(path) => log::info!("Remediation script found: {}", path.display()),
            None => log::warn!("Remediation script not found; remediation disabled"),
        }
        found
    }
}
