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

//! Error types for the recursion monitoring facility.

use crate::identity::FunctionId;

/// A specialized `Result` type for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors that can surface from the recursion monitor and its integrations.
///
/// None of these are ever raised from the `enter`/`exit` hot path; they only
/// come back from threshold validation, memoization and remediation setup.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// A threshold value was rejected (e.g. a warning depth of zero).
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
    /// A memo table already exists for this function with different key/value types.
    #[error("Memo table for '{function}' holds different key/value types")]
    MemoTypeMismatch {
        /// The function whose memo table was addressed.
        function: FunctionId,
    },
    /// The remediation action could not be prepared or dispatched.
    #[error("Remediation error: {0}")]
    Remediation(String),
    /// An underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
