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

//! The central coordinator of recursion monitoring.

use crate::memo::cache::MemoCache;
use crate::monitor::report::RecursionReport;
use crate::storage::{depth_tracker::DepthTracker, stats_store::StatsStore};
use deepcall_core::{
    CallSite, Decision, DiagnosticSnapshot, DisabledRemediation, FunctionId,
    FunctionStatsSnapshot, MonitorResult, RemediationRequest, RemediationSink, ThresholdPolicy,
};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// A diagnostic snapshot is captured at every multiple of this depth past the
/// warning depth.
pub const DIAGNOSTIC_INTERVAL: usize = 100;

/// A deep-recursion warning is logged at every multiple of this depth past the
/// warning depth.
pub const WARNING_INTERVAL: usize = 500;

/// Whether a deep call at `depth` logs a warning: on the first level past
/// `warning_depth`, then at every multiple of [`WARNING_INTERVAL`].
fn should_warn(depth: usize, warning_depth: usize) -> bool {
    depth > warning_depth && (depth == warning_depth + 1 || depth % WARNING_INTERVAL == 0)
}

/// The state guarded by the monitor's single lock.
///
/// Statistics and depths live together so that every `enter` and `exit` sees
/// them in a consistent state.
#[derive(Debug, Default)]
struct MonitorState {
    stats: StatsStore,
    depths: DepthTracker,
}

/// What `enter` decided while holding the lock. Side effects (logging,
/// remediation) are carried out only after the lock is released.
enum EnterOutcome {
    Continue,
    Deep { depth: usize, warn: bool },
    Abort { depth: usize, request: RemediationRequest },
}

/// Detects pathological recursion across all instrumented functions.
///
/// One monitor is meant to be constructed by the process entry point and
/// shared (typically as an `Arc<RecursionMonitor>`) with every instrumented
/// call site.
#[derive(Debug)]
pub struct RecursionMonitor {
    policy: ThresholdPolicy,
    state: Mutex<MonitorState>,
    memo: MemoCache,
    remediation: Arc<dyn RemediationSink>,
}

impl RecursionMonitor {
    /// Creates a monitor that dispatches catastrophic recursion to `remediation`.
    pub fn new(policy: ThresholdPolicy, remediation: Arc<dyn RemediationSink>) -> Self {
        log::debug!(
            "RecursionMonitor created (warning depth {}, abort depth {}, remediation {})",
            policy.warning_depth(),
            policy.abort_depth(),
            if remediation.is_enabled() {
                "enabled"
            } else {
                "disabled"
            }
        );
        Self {
            policy,
            state: Mutex::new(MonitorState::default()),
            memo: MemoCache::new(),
            remediation,
        }
    }

    /// Creates a monitor with remediation disabled.
    pub fn with_policy(policy: ThresholdPolicy) -> Self {
        Self::new(policy, Arc::new(DisabledRemediation))
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    fn lock_state(&self) -> MutexGuard<'_, MonitorState> {
        // A panic inside an instrumented body must not disable bookkeeping
        // for every other thread.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records entry into the function at `site` and decides whether it may run.
    pub fn enter(&self, site: &CallSite) -> Decision {
        self.enter_function(&site.function_id(), site)
    }

    /// Records entry into `function` and decides whether it may run.
    ///
    /// On [`Decision::Abort`] the depth increment is rolled back before
    /// returning, and no matching [`exit`](Self::exit) must be made.
    pub fn enter_function(&self, function: &FunctionId, site: &CallSite) -> Decision {
        let thread = thread::current().id();
        let warning_depth = self.policy.warning_depth();
        let abort_depth = self.policy.abort_depth();

        let outcome = {
            let mut state = self.lock_state();
            let MonitorState { stats, depths } = &mut *state;

            let entry = stats.entry(function);
            entry.record_call();
            let depth = depths.increment(thread, function);
            entry.observe_depth(depth);

            if depth <= warning_depth {
                EnterOutcome::Continue
            } else {
                if depth % DIAGNOSTIC_INTERVAL == 0 || depth >= abort_depth {
                    entry.set_last_diagnostic(DiagnosticSnapshot::capture(
                        function.clone(),
                        site,
                        depth,
                    ));
                }

                if depth >= abort_depth {
                    entry.record_bailout();
                    depths.decrement(thread, function);
                    EnterOutcome::Abort {
                        depth,
                        request: RemediationRequest {
                            function: function.clone(),
                            source_file: site.file,
                            diagnostic: entry.last_diagnostic().cloned(),
                        },
                    }
                } else {
                    entry.record_deep_entry();
                    EnterOutcome::Deep {
                        depth,
                        warn: should_warn(depth, warning_depth),
                    }
                }
            }
        };

        match outcome {
            EnterOutcome::Continue => Decision::Continue,
            EnterOutcome::Deep { depth, warn } => {
                if warn {
                    log::warn!("Deep recursion in {function} (depth: {depth})");
                }
                Decision::Continue
            }
            EnterOutcome::Abort { depth, request } => {
                log::warn!(
                    "Aborting call to {function} at depth {depth} (abort depth {abort_depth})"
                );
                self.remediation.fire(request);
                Decision::Abort
            }
        }
    }

    /// Records exit from `function` after it ran for `duration`.
    ///
    /// An exit without a matching open call leaves the depth untouched; the
    /// duration is accumulated either way.
    pub fn exit(&self, function: &FunctionId, duration: Duration) {
        let thread = thread::current().id();
        let mut state = self.lock_state();
        state.depths.decrement(thread, function);
        state.stats.entry(function).add_time(duration);
    }

    /// Current depth of `function` on the calling thread.
    pub fn current_depth(&self, function: &FunctionId) -> usize {
        self.lock_state()
            .depths
            .depth(thread::current().id(), function)
    }

    /// Number of threads with at least one open recursion chain.
    pub fn active_thread_count(&self) -> usize {
        self.lock_state().depths.active_threads()
    }

    /// Statistics for `function`, if it was ever entered.
    pub fn stats(&self, function: &FunctionId) -> Option<FunctionStatsSnapshot> {
        self.lock_state()
            .stats
            .get(function)
            .map(|stats| stats.snapshot(function))
    }

    /// A report covering every function observed so far.
    pub fn report(&self) -> RecursionReport {
        let functions = self.lock_state().stats.snapshot_all();
        RecursionReport::new(self.policy, functions)
    }

    /// Looks up a memoized result for `function`.
    pub fn memo_get<K, V>(&self, function: &FunctionId, key: &K) -> Option<V>
    where
        K: Hash + Eq + Send + 'static,
        V: Clone + Send + 'static,
    {
        self.memo.get(function, key)
    }

    /// Memoizes a result for `function`, overwriting any previous value.
    pub fn memo_put<K, V>(&self, function: &FunctionId, key: K, value: V) -> MonitorResult<()>
    where
        K: Hash + Eq + Send + 'static,
        V: Send + 'static,
    {
        self.memo.put(function, key, value)
    }

    /// Number of memoized results for `function`.
    pub fn memo_len(&self, function: &FunctionId) -> usize {
        self.memo.len(function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Default)]
    struct RecordingSink {
        requests: StdMutex<Vec<RemediationRequest>>,
    }

    impl RemediationSink for RecordingSink {
        fn fire(&self, request: RemediationRequest) {
            self.requests.lock().unwrap().push(request);
        }
    }

    fn site() -> CallSite {
        CallSite::new("recurse", "src/lib.rs", 10)
    }

    fn monitor(warning_depth: usize) -> (RecursionMonitor, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let policy = ThresholdPolicy::new(warning_depth, 100).unwrap();
        (RecursionMonitor::new(policy, sink.clone()), sink)
    }

    #[test]
    fn test_continue_below_warning_depth() {
        let (monitor, sink) = monitor(10);
        let id = site().function_id();

        for expected in 1..=10 {
            assert_eq!(monitor.enter(&site()), Decision::Continue);
            assert_eq!(monitor.current_depth(&id), expected);
        }

        let stats = monitor.stats(&id).unwrap();
        assert_eq!(stats.call_count, 10);
        assert_eq!(stats.max_depth, 10);
        assert_eq!(stats.deep_entries, 0);
        assert!(stats.last_diagnostic.is_none());
        assert!(sink.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_abort_rolls_back_depth() {
        let (monitor, sink) = monitor(3);
        let id = site().function_id();

        for _ in 0..5 {
            assert_eq!(monitor.enter(&site()), Decision::Continue);
        }
        assert_eq!(monitor.enter(&site()), Decision::Abort);
        assert_eq!(monitor.current_depth(&id), 5);

        let stats = monitor.stats(&id).unwrap();
        assert_eq!(stats.bailouts, 1);
        assert_eq!(stats.call_count, 6);
        assert_eq!(stats.max_depth, 6);
        assert_eq!(stats.deep_entries, 2);
        assert_eq!(stats.last_diagnostic.as_ref().unwrap().depth, 6);

        let requests = sink.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].function, id);
        assert_eq!(requests[0].source_file, "src/lib.rs");
        assert_eq!(requests[0].diagnostic.as_ref().unwrap().depth, 6);
    }

    #[test]
    fn test_each_abort_counts_one_bailout() {
        let (monitor, sink) = monitor(2);
        let id = site().function_id();

        for _ in 0..3 {
            monitor.enter(&site());
        }
        for _ in 0..3 {
            assert_eq!(monitor.enter(&site()), Decision::Abort);
        }

        assert_eq!(monitor.stats(&id).unwrap().bailouts, 3);
        assert_eq!(monitor.current_depth(&id), 3);
        assert_eq!(sink.requests.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_warning_cadence() {
        let warned: Vec<usize> = (1..1200).filter(|&d| should_warn(d, 600)).collect();
        assert_eq!(warned, vec![601, 1000]);

        for quiet in [600, 700, 999, 1001] {
            assert!(!should_warn(quiet, 600), "no warning expected at {quiet}");
        }
        // Multiples of the interval at or below the warning depth stay quiet.
        assert!(!should_warn(500, 600));
    }

    #[test]
    fn test_diagnostic_captured_every_hundred_levels() {
        let (monitor, _sink) = monitor(150);
        let id = site().function_id();

        for _ in 0..199 {
            monitor.enter(&site());
        }
        // Depth 100 is below the warning depth, so nothing is captured yet.
        assert!(monitor.stats(&id).unwrap().last_diagnostic.is_none());

        monitor.enter(&site());
        let diagnostic = monitor.stats(&id).unwrap().last_diagnostic.unwrap();
        assert_eq!(diagnostic.depth, 200);
    }

    #[test]
    fn test_exit_accumulates_time_and_unwinds() {
        let (monitor, _sink) = monitor(10);
        let id = site().function_id();

        monitor.enter(&site());
        monitor.enter(&site());
        monitor.exit(&id, Duration::from_millis(3));
        assert_eq!(monitor.current_depth(&id), 1);
        monitor.exit(&id, Duration::from_millis(4));
        assert_eq!(monitor.current_depth(&id), 0);
        assert_eq!(monitor.active_thread_count(), 0);

        let stats = monitor.stats(&id).unwrap();
        assert_eq!(stats.total_time, Duration::from_millis(7));
    }

    #[test]
    fn test_unmatched_exit_is_tolerated() {
        let (monitor, _sink) = monitor(10);
        let id = FunctionId::new("never_entered", 1);

        monitor.exit(&id, Duration::from_millis(1));
        assert_eq!(monitor.current_depth(&id), 0);

        let stats = monitor.stats(&id).unwrap();
        assert_eq!(stats.call_count, 0);
        assert_eq!(stats.total_time, Duration::from_millis(1));
    }

    #[test]
    fn test_memo_roundtrip_through_monitor() {
        let (monitor, _sink) = monitor(10);
        let id = FunctionId::new("fib", 4);

        assert_eq!(monitor.memo_get::<u32, u64>(&id, &20), None);
        monitor.memo_put(&id, 20u32, 6765u64).unwrap();
        assert_eq!(monitor.memo_get::<u32, u64>(&id, &20), Some(6765));
        assert_eq!(monitor.memo_len(&id), 1);
    }
}
