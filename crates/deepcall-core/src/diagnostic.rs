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

//! Diagnostic snapshots captured when recursion runs deep.
//!
//! A snapshot is a cheap, fixed-size description of where and how deep a
//! recursion chain was when it was captured. It is not a symbolic stack trace.

use crate::identity::{CallSite, FunctionId};
use serde::Serialize;
use std::fmt::{self, Display};
use std::time::{SystemTime, UNIX_EPOCH};

/// A description of program state at the moment deep recursion was detected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticSnapshot {
    /// The function whose recursion was captured.
    pub function: FunctionId,
    /// The source file of the instrumentation point.
    pub file: &'static str,
    /// The source line of the instrumentation point.
    pub line: u32,
    /// The recursion depth on the owning thread at capture time.
    pub depth: usize,
    /// The name of the capturing thread, or its id if unnamed.
    pub thread: String,
    /// Seconds since the Unix epoch at capture time.
    pub captured_at_secs: f64,
}

impl DiagnosticSnapshot {
    /// Captures a snapshot for `site` at `depth` on the calling thread.
    pub fn capture(function: FunctionId, site: &CallSite, depth: usize) -> Self {
        let current = std::thread::current();
        let thread = match current.name() {
            Some(name) => name.to_string(),
            None => format!("{:?}", current.id()),
        };
        let captured_at_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();

        Self {
            function,
            file: site.file,
            line: site.line,
            depth,
            thread,
            captured_at_secs,
        }
    }
}

impl Display for DiagnosticSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    function: {}", self.function)?;
        writeln!(f, "    location: {}:{}", self.file, self.line)?;
        writeln!(f, "    depth:    {}", self.depth)?;
        writeln!(f, "    thread:   {}", self.thread)?;
        write!(f, "    at:       {:.3}s since epoch", self.captured_at_secs)
    }
}
