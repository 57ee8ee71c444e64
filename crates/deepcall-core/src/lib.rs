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

//! # Deepcall Core
//!
//! Foundational crate containing the types and contracts shared by the
//! recursion monitor and its concrete integrations.
//!
//! This crate defines the abstract "what" of recursion monitoring: how a call
//! site is identified, which thresholds apply, what a monitor decides, and how
//! remediation is requested. `deepcall-telemetry` provides the live service
//! that does the bookkeeping, and `deepcall-infra` provides the bindings to
//! the filesystem and external processes.

#![warn(missing_docs)]

pub mod diagnostic;
pub mod error;
pub mod identity;
pub mod policy;
pub mod remediation;
pub mod stats;
pub mod utils;

pub use diagnostic::DiagnosticSnapshot;
pub use error::{MonitorError, MonitorResult};
pub use identity::{CallSite, FunctionId};
pub use policy::{Decision, ThresholdPolicy};
pub use remediation::{DisabledRemediation, RemediationRequest, RemediationSink};
pub use stats::FunctionStatsSnapshot;
pub use utils::timer::Stopwatch;
