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

//! Point-in-time statistics reported for a monitored function.

use crate::diagnostic::DiagnosticSnapshot;
use crate::identity::FunctionId;
use serde::Serialize;
use std::fmt::{self, Display};
use std::time::Duration;

/// A copy of the per-function counters, detached from the live store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionStatsSnapshot {
    /// The function these statistics belong to.
    pub function: FunctionId,
    /// Total number of entries, aborted ones included.
    pub call_count: u64,
    /// Highest recursion depth ever observed on any thread.
    pub max_depth: usize,
    /// Number of calls aborted at the abort depth.
    pub bailouts: u64,
    /// Number of calls allowed to run above the warning depth.
    pub deep_entries: u64,
    /// Cumulative wall-clock time of all completed calls.
    pub total_time: Duration,
    /// The most recent diagnostic snapshot, if deep recursion was ever captured.
    pub last_diagnostic: Option<DiagnosticSnapshot>,
}

impl FunctionStatsSnapshot {
    /// Returns the cumulative time in seconds.
    pub fn total_time_secs(&self) -> f64 {
        self.total_time.as_secs_f64()
    }

    /// Average time per call in seconds, or zero if the function never ran.
    pub fn average_time_secs(&self) -> f64 {
        if self.call_count > 0 {
            self.total_time_secs() / self.call_count as f64
        } else {
            0.0
        }
    }
}

impl Display for FunctionStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.function)?;
        writeln!(f, "  Calls:      {}", self.call_count)?;
        writeln!(f, "  Max depth:  {}", self.max_depth)?;
        writeln!(f, "  Bailouts:   {}", self.bailouts)?;
        writeln!(f, "  Deep calls: {}", self.deep_entries)?;
        write!(f, "  Total time: {:.6} s", self.total_time_secs())?;
        if let Some(diagnostic) = &self.last_diagnostic {
            write!(f, "\n  Last diagnostic:\n{diagnostic}")?;
        }
        Ok(())
    }
}
