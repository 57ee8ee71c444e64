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

//! The end-of-process recursion report.
//!
//! The text form is meant for humans and is not a stability contract.

use anyhow::Context;
use deepcall_core::{FunctionId, FunctionStatsSnapshot, ThresholdPolicy};
use serde::Serialize;
use std::fmt::{self, Display};
use std::path::Path;

/// Statistics for every function a monitor has observed.
#[derive(Debug, Clone, Serialize)]
pub struct RecursionReport {
    pub policy: ThresholdPolicy,
    pub functions: Vec<FunctionStatsSnapshot>,
}

impl RecursionReport {
    pub fn new(policy: ThresholdPolicy, functions: Vec<FunctionStatsSnapshot>) -> Self {
        Self { policy, functions }
    }

    pub fn function(&self, id: &FunctionId) -> Option<&FunctionStatsSnapshot> {
        self.functions.iter().find(|f| &f.function == id)
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Total bailouts across all functions.
    pub fn total_bailouts(&self) -> u64 {
        self.functions.iter().map(|f| f.bailouts).sum()
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the JSON form of the report to `path`.
    pub fn save_json(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = self.to_json().context("Failed to serialize recursion report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write recursion report to {}", path.display()))?;
        Ok(())
    }
}

impl Display for RecursionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Recursion statistics ===")?;
        writeln!(
            f,
            "(warning depth {}, abort depth {}, call count warning {})",
            self.policy.warning_depth(),
            self.policy.abort_depth(),
            self.policy.call_count_warning()
        )?;
        if self.is_empty() {
            return write!(f, "No instrumented functions were called.");
        }
        for (index, stats) in self.functions.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{stats}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stats(name: &str, bailouts: u64) -> FunctionStatsSnapshot {
        FunctionStatsSnapshot {
            function: FunctionId::new(name, 1),
            call_count: 3,
            max_depth: 2,
            bailouts,
            deep_entries: 0,
            total_time: Duration::from_millis(5),
            last_diagnostic: None,
        }
    }

    #[test]
    fn test_empty_report_display() {
        let report = RecursionReport::new(ThresholdPolicy::default(), Vec::new());
        let text = report.to_string();
        assert!(text.contains("warning depth 1000, abort depth 2000"));
        assert!(text.ends_with("No instrumented functions were called."));
    }

    #[test]
    fn test_report_lookup_and_totals() {
        let report = RecursionReport::new(
            ThresholdPolicy::default(),
            vec![stats("a", 1), stats("b", 2)],
        );
        assert_eq!(report.total_bailouts(), 3);
        assert_eq!(
            report.function(&FunctionId::new("b", 1)).unwrap().bailouts,
            2
        );
        assert!(report.function(&FunctionId::new("c", 1)).is_none());
    }

    #[test]
    fn test_json_contains_functions() {
        let report = RecursionReport::new(ThresholdPolicy::default(), vec![stats("a", 0)]);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["functions"][0]["function"], "a:1");
        assert_eq!(json["functions"][0]["call_count"], 3);
        assert_eq!(json["policy"]["warning_depth"], 1000);
    }
}
