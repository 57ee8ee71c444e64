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

//! Identification of instrumented call sites.

use serde::{Serialize, Serializer};
use std::fmt::{self, Display};
use std::panic::Location;
use std::sync::Arc;

/// A stable key uniquely identifying an instrumented call site.
///
/// A `FunctionId` combines the function name with the source line of the
/// instrumentation point (`"name:line"`), so that helpers sharing a name do not
/// collide. It is immutable and cheap to clone, since it is used as the key of
/// every map in the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(Arc<str>);

impl FunctionId {
    /// Creates an identity from a function name and a source line.
    pub fn new(name: &str, line: u32) -> Self {
        Self(Arc::from(format!("{name}:{line}")))
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for FunctionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// The source location of an instrumented function, as seen by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    /// The function name as written by the instrumenting code.
    pub function: &'static str,
    /// The source file containing the instrumentation point.
    pub file: &'static str,
    /// The source line of the instrumentation point.
    pub line: u32,
}

impl CallSite {
    /// Creates a call site from explicit parts.
    pub const fn new(function: &'static str, file: &'static str, line: u32) -> Self {
        Self {
            function,
            file,
            line,
        }
    }

    /// Creates a call site for `function` located at the caller's position.
    ///
    /// Because this is `#[track_caller]`, the file and line recorded are those
    /// of the code that invoked it, or of the nearest caller up the chain that
    /// is not itself `#[track_caller]`.
    #[track_caller]
    pub fn caller(function: &'static str) -> Self {
        let location = Location::caller();
        Self::new(function, location.file(), location.line())
    }

    /// Forms the [`FunctionId`] for this call site.
    pub fn function_id(&self) -> FunctionId {
        FunctionId::new(self.function, self.line)
    }
}

impl Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.function, self.file, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_id_includes_line() {
        let a = FunctionId::new("walk", 10);
        let b = FunctionId::new("walk", 42);
        assert_eq!(a.as_str(), "walk:10");
        assert_ne!(a, b);
        assert_eq!(a, FunctionId::new("walk", 10));
        assert_eq!(a.to_string(), "walk:10");
    }

    #[test]
    fn test_call_site_captures_caller_location() {
        let expected_line = line!() + 1;
        let site = CallSite::caller("probe");
        assert_eq!(site.line, expected_line);
        assert!(site.file.ends_with("identity.rs"));
        assert_eq!(site.function_id().as_str(), format!("probe:{expected_line}"));
    }

    #[test]
    fn test_function_id_serializes_as_string() {
        let id = FunctionId::new("fib", 7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"fib:7\"");
    }
}
