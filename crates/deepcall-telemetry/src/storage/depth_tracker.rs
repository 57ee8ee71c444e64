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

//! Current recursion depth per thread and per function.
//!
//! The tracker only holds active recursion chains: a function entry is removed
//! as soon as its depth returns to zero, and a thread entry is removed once it
//! has no active functions left.

use deepcall_core::FunctionId;
use std::collections::HashMap;
use std::thread::ThreadId;

#[derive(Debug, Default)]
pub struct DepthTracker {
    threads: HashMap<ThreadId, HashMap<FunctionId, usize>>,
}

impl DepthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens one more call of `function` on `thread` and returns the new depth.
    pub fn increment(&mut self, thread: ThreadId, function: &FunctionId) -> usize {
        let depth = self
            .threads
            .entry(thread)
            .or_default()
            .entry(function.clone())
            .or_insert(0);
        *depth += 1;
        *depth
    }

    /// Closes one call of `function` on `thread` and returns the remaining depth.
    ///
    /// Decrementing a chain that is not open is a no-op returning zero.
    pub fn decrement(&mut self, thread: ThreadId, function: &FunctionId) -> usize {
        let Some(depths) = self.threads.get_mut(&thread) else {
            return 0;
        };
        let remaining = match depths.get_mut(function) {
            Some(depth) if *depth > 1 => {
                *depth -= 1;
                *depth
            }
            Some(_) => {
                depths.remove(function);
                0
            }
            None => 0,
        };
        if depths.is_empty() {
            self.threads.remove(&thread);
        }
        remaining
    }

    /// Current depth of `function` on `thread`, zero if no chain is open.
    pub fn depth(&self, thread: ThreadId, function: &FunctionId) -> usize {
        self.threads
            .get(&thread)
            .and_then(|depths| depths.get(function))
            .copied()
            .unwrap_or(0)
    }

    /// Number of threads with at least one open chain.
    pub fn active_threads(&self) -> usize {
        self.threads.len()
    }
}
