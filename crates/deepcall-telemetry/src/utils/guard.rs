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

//! Provides the RAII guard that wires a function invocation into the monitor.

use crate::monitor::recursion_monitor::RecursionMonitor;
use deepcall_core::{CallSite, Decision, FunctionId, MonitorResult, Stopwatch};
use std::hash::Hash;

/// A guard bound to the lifetime of one instrumented call.
///
/// Constructing the guard records entry and asks the monitor whether the call
/// may proceed. The instrumented function must check [`should_continue`]
/// immediately and return early when it is `false`:
///
/// ```
/// use deepcall_core::ThresholdPolicy;
/// use deepcall_telemetry::{CallGuard, RecursionMonitor};
///
/// fn depth_first(monitor: &RecursionMonitor, n: u64) -> u64 {
///     let guard = CallGuard::enter(monitor, "depth_first");
///     if !guard.should_continue() {
///         return 0;
///     }
///     if n == 0 { 0 } else { 1 + depth_first(monitor, n - 1) }
/// }
///
/// let monitor = RecursionMonitor::with_policy(ThresholdPolicy::default());
/// assert_eq!(depth_first(&monitor, 10), 10);
/// ```
///
/// Dropping the guard records the exit and the elapsed time, on every exit
/// path including unwinding, but only if the call was allowed to continue: an
/// aborted entry has already rolled back its own bookkeeping.
///
/// [`should_continue`]: CallGuard::should_continue
#[must_use = "the call is recorded as exited as soon as the guard is dropped"]
pub struct CallGuard<'a> {
    monitor: &'a RecursionMonitor,
    function: FunctionId,
    stopwatch: Stopwatch,
    decision: Decision,
}

impl<'a> CallGuard<'a> {
    /// Enters `function`, identified by the caller's source line.
    #[track_caller]
    pub fn enter(monitor: &'a RecursionMonitor, function: &'static str) -> Self {
        Self::enter_at(monitor, CallSite::caller(function))
    }

    /// Enters the function at an explicit call site.
    pub fn enter_at(monitor: &'a RecursionMonitor, site: CallSite) -> Self {
        let stopwatch = Stopwatch::new();
        let function = site.function_id();
        let decision = monitor.enter_function(&function, &site);
        Self {
            monitor,
            function,
            stopwatch,
            decision,
        }
    }

    /// Whether the wrapped body should run.
    pub fn should_continue(&self) -> bool {
        self.decision.should_continue()
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn function_id(&self) -> &FunctionId {
        &self.function
    }

    /// Looks up a memoized result for this guard's function.
    pub fn memo_get<K, V>(&self, key: &K) -> Option<V>
    where
        K: Hash + Eq + Send + 'static,
        V: Clone + Send + 'static,
    {
        self.monitor.memo_get(&self.function, key)
    }

    /// Memoizes a result for this guard's function.
    pub fn memo_put<K, V>(&self, key: K, value: V) -> MonitorResult<()>
    where
        K: Hash + Eq + Send + 'static,
        V: Send + 'static,
    {
        self.monitor.memo_put(&self.function, key, value)
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if self.decision.should_continue() {
            self.stopwatch.stop();
            self.monitor.exit(&self.function, self.stopwatch.elapsed());
        }
    }
}

impl std::fmt::Debug for CallGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallGuard")
            .field("function", &self.function)
            .field("decision", &self.decision)
            .finish()
    }
}
