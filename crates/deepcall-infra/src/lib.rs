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

//! # Deepcall Infra
//!
//! Everything that touches the outside world: reading the threshold
//! configuration from the user's home directory, and locating and running
//! the remediation script when a recursion is aborted.

pub mod config;
pub mod remediation;

pub use config::ThresholdConfig;
pub use remediation::{RemediationLocator, ScriptRemediation};
