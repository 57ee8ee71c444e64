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

//! # Deepcall Telemetry
//!
//! The live side of recursion monitoring: the [`RecursionMonitor`] that does
//! the per-call bookkeeping, the [`CallGuard`] that instrumented functions hold
//! for the duration of a call, and the [`MonitorService`] that owns the monitor
//! for the lifetime of the process and dumps its report on shutdown.

pub mod memo;
pub mod monitor;
pub mod service;
pub mod storage;
pub mod utils;

pub use monitor::recursion_monitor::RecursionMonitor;
pub use monitor::report::RecursionReport;
pub use service::MonitorService;
pub use utils::guard::CallGuard;
