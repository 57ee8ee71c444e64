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

//! Threshold policy and the decision a monitor returns on function entry.

use crate::error::{MonitorError, MonitorResult};
use serde::Serialize;

/// The decision returned when an instrumented call is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Decision {
    /// The function body may run.
    Continue,
    /// The recursion is judged catastrophic; the call site must return immediately.
    Abort,
}

impl Decision {
    /// Returns `true` if the wrapped body should run.
    pub fn should_continue(self) -> bool {
        matches!(self, Decision::Continue)
    }
}

/// The two recursion knobs, fixed for the lifetime of a monitor.
///
/// The abort depth is not configured independently: it is always twice the
/// warning depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThresholdPolicy {
    warning_depth: usize,
    call_count_warning: u64,
}

impl ThresholdPolicy {
    /// Default depth above which deep recursion is reported.
    pub const DEFAULT_WARNING_DEPTH: usize = 1000;
    /// Default call-count threshold. Tracked only; it has no runtime effect.
    pub const DEFAULT_CALL_COUNT_WARNING: u64 = 10_000;

    /// Creates a policy. The warning depth must be at least 1.
    pub fn new(warning_depth: usize, call_count_warning: u64) -> MonitorResult<Self> {
        if warning_depth == 0 {
            return Err(MonitorError::InvalidThreshold(
                "warning depth must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            warning_depth,
            call_count_warning,
        })
    }

    /// Depth above which calls are reported as deep recursion.
    pub fn warning_depth(&self) -> usize {
        self.warning_depth
    }

    /// Depth at which calls are aborted.
    pub fn abort_depth(&self) -> usize {
        self.warning_depth.saturating_mul(2)
    }

    /// The configured call-count threshold.
    pub fn call_count_warning(&self) -> u64 {
        self.call_count_warning
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            warning_depth: Self::DEFAULT_WARNING_DEPTH,
            call_count_warning: Self::DEFAULT_CALL_COUNT_WARNING,
        }
    }
}
