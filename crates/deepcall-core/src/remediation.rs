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

//! The contract between the monitor and an external remediation action.
//!
//! When recursion reaches the abort depth the monitor hands a
//! [`RemediationRequest`] to a [`RemediationSink`]. The sink owns all the
//! details of what remediation means; the monitor only requires that firing
//! never blocks and never fails loudly.

use crate::diagnostic::DiagnosticSnapshot;
use crate::identity::FunctionId;
use serde::Serialize;
use std::fmt::Debug;

/// The fixed action category sent to the remediation tool.
pub const RUNTIME_ERROR_ACTION: &str = "runtime_error";

/// Everything the remediation action is told about a runaway recursion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemediationRequest {
    /// The offending function.
    pub function: FunctionId,
    /// The source file of the offending function.
    pub source_file: &'static str,
    /// The diagnostic snapshot captured when the abort depth was reached.
    pub diagnostic: Option<DiagnosticSnapshot>,
}

impl RemediationRequest {
    /// The action category, always [`RUNTIME_ERROR_ACTION`].
    pub fn action(&self) -> &'static str {
        RUNTIME_ERROR_ACTION
    }

    /// The human-readable message passed along with the request.
    pub fn message(&self) -> String {
        format!("Deep recursion detected in {}", self.function)
    }
}

/// A fire-and-forget receiver of remediation requests.
///
/// Implementations must return promptly: `fire` is invoked from the thread
/// whose call was just aborted. Failures are the sink's to log and swallow.
pub trait RemediationSink: Send + Sync + Debug + 'static {
    /// Dispatches a remediation request without waiting for its outcome.
    fn fire(&self, request: RemediationRequest);

    /// Whether this sink will actually do anything when fired.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// The sink used when no remediation target was found at startup.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRemediation;

impl RemediationSink for DisabledRemediation {
    fn fire(&self, request: RemediationRequest) {
        log::trace!(
            "Remediation disabled, ignoring request for {}",
            request.function
        );
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
