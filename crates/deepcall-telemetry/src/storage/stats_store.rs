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

//! Per-function call statistics.

use deepcall_core::{DiagnosticSnapshot, FunctionId, FunctionStatsSnapshot};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Live counters for a single instrumented function.
///
/// Created lazily on the first call and never removed for the lifetime of
/// the store.
#[derive(Debug, Default)]
pub struct FunctionStats {
    call_count: AtomicU64,
    max_depth: AtomicUsize,
    bailouts: AtomicU64,
    deep_entries: AtomicU64,
    total_time: Duration,
    last_diagnostic: Option<DiagnosticSnapshot>,
}

impl FunctionStats {
    /// Counts one more entry.
    pub fn record_call(&self) -> u64 {
        self.call_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Raises the high-water mark to `depth` if it is higher.
    ///
    /// `fetch_max` is a compare-and-retry loop internally, so a racing
    /// observer can never lower the stored maximum.
    pub fn observe_depth(&self, depth: usize) {
        self.max_depth.fetch_max(depth, Ordering::Relaxed);
    }

    /// Counts one aborted call.
    pub fn record_bailout(&self) {
        self.bailouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one call allowed past the warning depth.
    pub fn record_deep_entry(&self) {
        self.deep_entries.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds the duration of one completed call.
    pub fn add_time(&mut self, duration: Duration) {
        self.total_time = self.total_time.saturating_add(duration);
    }

    /// Replaces the stored diagnostic with a newer one.
    pub fn set_last_diagnostic(&mut self, diagnostic: DiagnosticSnapshot) {
        self.last_diagnostic = Some(diagnostic);
    }

    pub fn last_diagnostic(&self) -> Option<&DiagnosticSnapshot> {
        self.last_diagnostic.as_ref()
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth.load(Ordering::Relaxed)
    }

    pub fn bailouts(&self) -> u64 {
        self.bailouts.load(Ordering::Relaxed)
    }

    pub fn deep_entries(&self) -> u64 {
        self.deep_entries.load(Ordering::Relaxed)
    }

    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    /// Copies the counters into a detached snapshot.
    pub fn snapshot(&self, function: &FunctionId) -> FunctionStatsSnapshot {
        FunctionStatsSnapshot {
            function: function.clone(),
            call_count: self.call_count(),
            max_depth: self.max_depth(),
            bailouts: self.bailouts(),
            deep_entries: self.deep_entries(),
            total_time: self.total_time,
            last_diagnostic: self.last_diagnostic.clone(),
        }
    }
}

/// The mapping from function identity to its statistics.
///
/// The store is not synchronized on its own; the monitor keeps it behind the
/// same lock as the depth tracker so both are always updated together.
#[derive(Debug, Default)]
pub struct StatsStore {
    functions: HashMap<FunctionId, FunctionStats>,
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the statistics for `function`, creating them on first use.
    pub fn entry(&mut self, function: &FunctionId) -> &mut FunctionStats {
        self.functions.entry(function.clone()).or_default()
    }

    pub fn get(&self, function: &FunctionId) -> Option<&FunctionStats> {
        self.functions.get(function)
    }

    /// Snapshots every function, sorted by identity.
    pub fn snapshot_all(&self) -> Vec<FunctionStatsSnapshot> {
        let mut all: Vec<_> = self
            .functions
            .iter()
            .map(|(id, stats)| stats.snapshot(id))
            .collect();
        all.sort_by(|a, b| a.function.cmp(&b.function));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepcall_core::CallSite;

    #[test]
    fn test_entry_is_created_lazily() {
        let mut store = StatsStore::new();
        let id = FunctionId::new("fib", 1);
        assert!(store.get(&id).is_none());

        store.entry(&id).record_call();
        store.entry(&id).record_call();

        assert_eq!(store.snapshot_all().len(), 1);
        assert_eq!(store.get(&id).unwrap().call_count(), 2);
    }

    #[test]
    fn test_max_depth_never_regresses() {
        let stats = FunctionStats::default();
        stats.observe_depth(5);
        stats.observe_depth(3);
        stats.observe_depth(9);
        stats.observe_depth(1);
        assert_eq!(stats.max_depth(), 9);
    }

    #[test]
    fn test_last_diagnostic_is_overwritten() {
        let site = CallSite::new("walk", "src/tree.rs", 4);
        let mut stats = FunctionStats::default();
        stats.set_last_diagnostic(DiagnosticSnapshot::capture(site.function_id(), &site, 100));
        stats.set_last_diagnostic(DiagnosticSnapshot::capture(site.function_id(), &site, 200));
        assert_eq!(stats.last_diagnostic().unwrap().depth, 200);
    }

    #[test]
    fn test_snapshot_all_is_sorted() {
        let mut store = StatsStore::new();
        for name in ["zeta", "alpha", "mid"] {
            let id = FunctionId::new(name, 1);
            store.entry(&id).record_call();
            store.entry(&id).add_time(Duration::from_millis(2));
        }
        let names: Vec<_> = store
            .snapshot_all()
            .into_iter()
            .map(|s| s.function.to_string())
            .collect();
        assert_eq!(names, vec!["alpha:1", "mid:1", "zeta:1"]);
    }
}
