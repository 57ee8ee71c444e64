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

//! Service owning the recursion monitor for the lifetime of the process.

use crate::monitor::recursion_monitor::RecursionMonitor;
use crate::monitor::report::RecursionReport;
use deepcall_core::{RemediationSink, ThresholdPolicy};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Owns the process-wide [`RecursionMonitor`] and reports on it exactly once.
///
/// The entry point creates the service, hands `monitor()` clones to the code
/// it instruments, and either calls [`shutdown`](Self::shutdown) or lets the
/// service drop at the end of `main`.
#[derive(Debug)]
pub struct MonitorService {
    monitor: Arc<RecursionMonitor>,
    reported: AtomicBool,
    print_on_shutdown: bool,
}

impl MonitorService {
    /// Creates a service around a new monitor.
    pub fn new(policy: ThresholdPolicy, remediation: Arc<dyn RemediationSink>) -> Self {
        Self::from_monitor(Arc::new(RecursionMonitor::new(policy, remediation)))
    }

    /// Creates a service around an existing monitor.
    pub fn from_monitor(monitor: Arc<RecursionMonitor>) -> Self {
        log::info!(
            "Recursion monitor service started (warning depth {}, abort depth {})",
            monitor.policy().warning_depth(),
            monitor.policy().abort_depth()
        );
        Self {
            monitor,
            reported: AtomicBool::new(false),
            print_on_shutdown: true,
        }
    }

    /// Keeps the final report off stdout; it is still logged and returned.
    pub fn quiet(mut self) -> Self {
        self.print_on_shutdown = false;
        self
    }

    /// Returns a shared handle to the monitor.
    pub fn monitor(&self) -> Arc<RecursionMonitor> {
        Arc::clone(&self.monitor)
    }

    /// Produces the final report.
    ///
    /// Only the first call (or the drop, if `shutdown` was never called)
    /// reports; later calls return `None`.
    pub fn shutdown(&self) -> Option<RecursionReport> {
        if self.reported.swap(true, Ordering::SeqCst) {
            return None;
        }

        let report = self.monitor.report();
        log::info!(
            "Recursion monitor service stopped: {} function(s) observed, {} bailout(s)",
            report.functions.len(),
            report.total_bailouts()
        );
        if self.print_on_shutdown {
            // Stdout may already be closed at process exit.
            let _ = writeln!(std::io::stdout().lock(), "\n{report}");
        }
        Some(report)
    }
}

impl Drop for MonitorService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::guard::CallGuard;
    use deepcall_core::DisabledRemediation;

    fn service() -> MonitorService {
        MonitorService::new(ThresholdPolicy::default(), Arc::new(DisabledRemediation)).quiet()
    }

    #[test]
    fn test_shutdown_reports_once() {
        let service = service();
        {
            let monitor = service.monitor();
            let _guard = CallGuard::enter(&monitor, "work");
        }

        let report = service.shutdown().unwrap();
        assert_eq!(report.functions.len(), 1);
        assert_eq!(report.functions[0].call_count, 1);

        assert!(service.shutdown().is_none());
    }

    #[test]
    fn test_monitor_handles_share_state() {
        let service = service();
        let a = service.monitor();
        let b = service.monitor();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
