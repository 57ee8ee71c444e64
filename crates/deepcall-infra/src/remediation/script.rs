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

//! Fire-and-forget remediation through an external script.
//!
//! Requests are posted to a dedicated worker thread over a channel; the worker
//! launches the script and waits for it, so the aborted call never does.
//! A function with a request still queued or running is not queued again.

use crate::remediation::locator::RemediationLocator;
use deepcall_core::{
    DisabledRemediation, FunctionId, MonitorError, MonitorResult, RemediationRequest,
    RemediationSink,
};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// The interpreter used to run the remediation script.
pub const DEFAULT_INTERPRETER: &str = "node";

/// How the external action is launched.
#[derive(Debug, Clone)]
pub(crate) struct Invocation {
    interpreter: OsString,
    script: PathBuf,
}

impl Invocation {
    /// `<interpreter> <script> trigger runtime_error --file <file> --error <message>`
    pub(crate) fn command(&self, request: &RemediationRequest) -> Command {
        let mut command = Command::new(&self.interpreter);
        command
            .arg(&self.script)
            .arg("trigger")
            .arg(request.action())
            .arg("--file")
            .arg(request.source_file)
            .arg("--error")
            .arg(request.message())
            .stdin(Stdio::null());
        command
    }

    fn dispatch(&self, request: &RemediationRequest) {
        log::info!("Triggering remediation for {}", request.function);
        if let Some(diagnostic) = &request.diagnostic {
            log::debug!("Remediation diagnostic:\n{diagnostic}");
        }

        match self.command(request).spawn() {
            Ok(mut child) => match child.wait() {
                Ok(status) => log::debug!(
                    "Remediation for {} finished with {status}",
                    request.function
                ),
                Err(e) => log::warn!("Failed to wait for remediation process: {e}"),
            },
            Err(e) => log::error!(
                "Failed to launch remediation for {} ({}): {e}",
                request.function,
                self.interpreter.to_string_lossy()
            ),
        }
    }
}

/// Functions with a remediation queued or running.
type PendingSet = Mutex<HashSet<FunctionId>>;

fn lock_pending(pending: &PendingSet) -> MutexGuard<'_, HashSet<FunctionId>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs one request on the worker thread, then releases its function.
fn process(invocation: &Invocation, pending: &PendingSet, request: RemediationRequest) {
    invocation.dispatch(&request);
    lock_pending(pending).remove(&request.function);
}

/// A [`RemediationSink`] that runs the remediation script on a worker thread.
#[derive(Debug)]
pub struct ScriptRemediation {
    script: PathBuf,
    sender: Option<flume::Sender<RemediationRequest>>,
    worker: Option<JoinHandle<()>>,
    pending: Arc<PendingSet>,
}

impl ScriptRemediation {
    /// Starts a worker that runs `script` with the default interpreter.
    pub fn spawn(script: PathBuf) -> MonitorResult<Self> {
        Self::spawn_with_interpreter(script, DEFAULT_INTERPRETER)
    }

    /// Starts a worker that runs `script` with `interpreter`.
    ///
    /// Fails if `script` is not an existing file.
    pub fn spawn_with_interpreter(
        script: PathBuf,
        interpreter: impl Into<OsString>,
    ) -> MonitorResult<Self> {
        if !script.is_file() {
            return Err(MonitorError::Remediation(format!(
                "script not found: {}",
                script.display()
            )));
        }

        let (sender, receiver) = flume::unbounded::<RemediationRequest>();
        let invocation = Invocation {
            interpreter: interpreter.into(),
            script: script.clone(),
        };
        let pending = Arc::new(PendingSet::default());
        let worker_pending = Arc::clone(&pending);

        let worker = thread::Builder::new()
            .name("deepcall-remediation".to_string())
            .spawn(move || {
                log::debug!("Remediation worker started.");
                for request in receiver.iter() {
                    process(&invocation, &worker_pending, request);
                }
                log::debug!("Remediation worker stopped.");
            })?;

        Ok(Self {
            script,
            sender: Some(sender),
            worker: Some(worker),
            pending,
        })
    }

    /// Finds the script for the current user and starts a worker for it.
    ///
    /// Returns a disabled sink if no script exists or the worker cannot start.
    pub fn discover() -> Arc<dyn RemediationSink> {
        Self::discover_with(&RemediationLocator::for_current_user())
    }

    /// Like [`discover`](Self::discover), with an explicit locator.
    pub fn discover_with(locator: &RemediationLocator) -> Arc<dyn RemediationSink> {
        let Some(script) = locator.locate() else {
            return Arc::new(DisabledRemediation);
        };
        match Self::spawn(script) {
            Ok(sink) => Arc::new(sink),
            Err(e) => {
                log::error!("Failed to start remediation worker: {e}; remediation disabled");
                Arc::new(DisabledRemediation)
            }
        }
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Stops accepting requests and waits for queued ones to finish.
    pub fn shutdown(mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Remediation worker panicked.");
            }
        }
    }
}

impl RemediationSink for ScriptRemediation {
    fn fire(&self, request: RemediationRequest) {
        let Some(sender) = &self.sender else {
            return;
        };
        if !lock_pending(&self.pending).insert(request.function.clone()) {
            log::debug!(
                "Remediation for {} already pending, skipping request",
                request.function
            );
            return;
        }

        let function = request.function.clone();
        if let Err(e) = sender.send(request) {
            lock_pending(&self.pending).remove(&function);
            log::error!("Failed to queue remediation request: {e}. Worker likely stopped.");
        }
    }
}
