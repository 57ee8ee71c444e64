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

use deepcall_core::{CallSite, FunctionId, ThresholdPolicy};
use deepcall_telemetry::{CallGuard, RecursionMonitor};
use std::sync::{Arc, Barrier};
use std::thread;

const SITE: CallSite = CallSite::new("descend", "tests/concurrency_test.rs", 1);

/// Recurses `remaining` more levels, waits on `barrier` at the bottom, and
/// returns the deepest depth this thread observed for itself.
fn descend(monitor: &RecursionMonitor, remaining: usize, barrier: &Barrier) -> usize {
    let guard = CallGuard::enter_at(monitor, SITE);
    if !guard.should_continue() {
        return 0;
    }
    let here = monitor.current_depth(guard.function_id());
    if remaining == 1 {
        barrier.wait();
        return here;
    }
    here.max(descend(monitor, remaining - 1, barrier))
}

#[test]
fn test_two_threads_depth_two() {
    // --- ARRANGE ---
    let monitor = Arc::new(RecursionMonitor::with_policy(ThresholdPolicy::default()));
    let barrier = Arc::new(Barrier::new(2));

    // --- ACT ---
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let monitor = Arc::clone(&monitor);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || descend(&monitor, 2, &barrier))
        })
        .collect();
    let observed: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // --- ASSERT ---
    assert_eq!(observed, vec![2, 2], "each thread tracks its own depth");

    let stats = monitor.stats(&SITE.function_id()).unwrap();
    assert_eq!(stats.call_count, 4);
    assert_eq!(stats.max_depth, 2);
    assert_eq!(stats.bailouts, 0);
    assert_eq!(monitor.active_thread_count(), 0);
}

#[test]
fn test_max_depth_is_true_maximum_across_threads() {
    let monitor = Arc::new(RecursionMonitor::with_policy(ThresholdPolicy::default()));
    let depths = [3usize, 17, 9, 40, 25, 1, 33, 12];
    let barrier = Arc::new(Barrier::new(depths.len()));

    thread::scope(|scope| {
        for &depth in &depths {
            let monitor = &monitor;
            let barrier = &barrier;
            scope.spawn(move || {
                assert_eq!(descend(monitor, depth, barrier), depth);
            });
        }
    });

    let stats = monitor.stats(&SITE.function_id()).unwrap();
    assert_eq!(stats.max_depth, 40);
    assert_eq!(stats.call_count, depths.iter().sum::<usize>() as u64);
    assert_eq!(monitor.active_thread_count(), 0);
}

#[test]
fn test_aborts_are_per_thread() {
    // Each thread hits the abort depth on its own chain; depths never mix.
    let policy = ThresholdPolicy::new(4, 0).unwrap();
    let monitor = Arc::new(RecursionMonitor::with_policy(policy));
    let barrier = Barrier::new(1);
    let threads = 6;

    thread::scope(|scope| {
        for _ in 0..threads {
            let monitor = &monitor;
            let barrier = &barrier;
            scope.spawn(move || {
                // Asked for 100 levels, each thread is stopped at 8 and sees 7.
                assert_eq!(descend(monitor, 100, barrier), 7);
                assert_eq!(monitor.current_depth(&SITE.function_id()), 0);
            });
        }
    });

    let stats = monitor.stats(&SITE.function_id()).unwrap();
    assert_eq!(stats.bailouts, threads);
    assert_eq!(stats.max_depth, 8);
    assert_eq!(stats.call_count, threads * 8);
}

#[test]
fn test_distinct_functions_do_not_share_depth() {
    let monitor = RecursionMonitor::with_policy(ThresholdPolicy::default());
    let a = CallSite::new("same_name", "tests/concurrency_test.rs", 100);
    let b = CallSite::new("same_name", "tests/concurrency_test.rs", 200);

    let _outer = CallGuard::enter_at(&monitor, a);
    let _inner = CallGuard::enter_at(&monitor, b);
    let _again = CallGuard::enter_at(&monitor, a);

    assert_eq!(monitor.current_depth(&FunctionId::new("same_name", 100)), 2);
    assert_eq!(monitor.current_depth(&FunctionId::new("same_name", 200)), 1);
}
