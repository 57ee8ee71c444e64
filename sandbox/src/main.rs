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

// Deepcall Sandbox
// Runs a few instrumented recursions and prints the collected statistics.
// Usage: sandbox [report.json]

use anyhow::Result;
use deepcall_infra::{ScriptRemediation, ThresholdConfig};
use deepcall_telemetry::{CallGuard, MonitorService, RecursionMonitor};
use std::thread;

fn fib(monitor: &RecursionMonitor, n: u64) -> u64 {
    let guard = CallGuard::enter(monitor, "fib");
    if !guard.should_continue() {
        return 0;
    }
    if n < 2 {
        return n;
    }
    fib(monitor, n - 1) + fib(monitor, n - 2)
}

fn memo_fib(monitor: &RecursionMonitor, n: u64) -> Result<u64> {
    let guard = CallGuard::enter(monitor, "memo_fib");
    if !guard.should_continue() {
        return Ok(0);
    }
    if let Some(hit) = guard.memo_get::<u64, u64>(&n) {
        return Ok(hit);
    }
    let result = if n < 2 {
        n
    } else {
        memo_fib(monitor, n - 1)? + memo_fib(monitor, n - 2)?
    };
    guard.memo_put(n, result)?;
    Ok(result)
}

/// Never terminates on its own; returns the level at which it was stopped.
fn runaway(monitor: &RecursionMonitor, level: usize) -> usize {
    let guard = CallGuard::enter(monitor, "runaway");
    if !guard.should_continue() {
        return level;
    }
    runaway(monitor, level + 1)
}

struct Node {
    value: u64,
    children: Vec<Node>,
}

fn build_tree(depth: usize, fanout: usize, value: u64) -> Node {
    let children = if depth == 0 {
        Vec::new()
    } else {
        (0..fanout as u64)
            .map(|i| build_tree(depth - 1, fanout, value * fanout as u64 + i))
            .collect()
    };
    Node { value, children }
}

fn sum_tree(monitor: &RecursionMonitor, node: &Node) -> u64 {
    let guard = CallGuard::enter(monitor, "sum_tree");
    if !guard.should_continue() {
        return 0;
    }
    node.value
        + node
            .children
            .iter()
            .map(|child| sum_tree(monitor, child))
            .sum::<u64>()
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let policy = ThresholdConfig::load_default().into_policy();
    log::info!(
        "Monitoring recursion: warning depth {}, abort depth {}",
        policy.warning_depth(),
        policy.abort_depth()
    );
    let service = MonitorService::new(policy, ScriptRemediation::discover());
    let monitor = service.monitor();

    log::info!("fib(20) = {}", fib(&monitor, 20));
    log::info!("memo_fib(80) = {}", memo_fib(&monitor, 80)?);

    let stopped_at = runaway(&monitor, 1);
    log::info!("runaway recursion stopped at level {stopped_at}");

    let tree = build_tree(6, 3, 1);
    let sums: Vec<u64> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| sum_tree(&monitor, &tree)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_default())
            .collect()
    });
    log::info!("tree sums per thread: {sums:?}");

    let report = service.shutdown();
    if let (Some(report), Some(path)) = (report, std::env::args().nth(1)) {
        report.save_json(&path)?;
        log::info!("Report written to {path}");
    }
    Ok(())
}
