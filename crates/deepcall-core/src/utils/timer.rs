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

//! Lightweight wall-clock timing.

use std::time::{Duration, Instant};

/// A simple stopwatch that starts running when it is created.
///
/// A stopped stopwatch keeps the elapsed time it had when it was stopped.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
    stopped_at: Option<Instant>,
}

impl Stopwatch {
    /// Creates and starts a new stopwatch.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            stopped_at: None,
        }
    }

    /// Freezes the elapsed time. Stopping twice keeps the first stop.
    pub fn stop(&mut self) {
        if self.stopped_at.is_none() {
            self.stopped_at = Some(Instant::now());
        }
    }

    /// Returns the time elapsed since the stopwatch started (or until it stopped).
    pub fn elapsed(&self) -> Duration {
        let end = self.stopped_at.unwrap_or_else(Instant::now);
        end.saturating_duration_since(self.start)
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
