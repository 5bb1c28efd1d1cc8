//! In-memory transport with scripted pipeline results, for tests.

use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use crate::{
    config::WinRmOptions,
    connection_info::ConnectionInfo,
    error::TransportError,
    host::{HostCall, HostUi},
    transport::{PipelineHandle, RunspacePoolHandle, RunspacePoolState, RunspaceTransport},
};

/// Everything the fake transport was asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Journal {
    pub opens: usize,
    pub closes: usize,
    pub pipelines: usize,
    pub scripts: Vec<String>,
    pub inputs: Vec<Vec<String>>,
    pub opened_with: Vec<ConnectionInfo>,
    pub copied_to_remote: Vec<(PathBuf, String)>,
    pub fetched_from_remote: Vec<(String, PathBuf)>,
    pub max_concurrent_invocations: usize,
}

/// Result of the next pipeline invocation.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInvocation {
    output: Vec<String>,
    errors: Vec<String>,
    host_calls: Vec<HostCall>,
    had_errors: bool,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl ScriptedInvocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(mut self, value: impl Into<String>) -> Self {
        self.output.push(value.into());
        self
    }

    /// Adds an error record, which also marks the pipeline as having errors.
    pub fn error(mut self, record: impl Into<String>) -> Self {
        self.errors.push(record.into());
        self.had_errors = true;
        self
    }

    pub fn had_errors(mut self, had_errors: bool) -> Self {
        self.had_errors = had_errors;
        self
    }

    /// Host callback raised by the remote while the pipeline runs.
    pub fn host_call(mut self, call: HostCall) -> Self {
        self.host_calls.push(call);
        self
    }

    /// Fail the invocation after the host callbacks were delivered.
    pub fn failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Default)]
struct FakeState {
    journal: Journal,
    unavailable: Option<String>,
    pool_state: Option<RunspacePoolState>,
    fail_next_open: Option<String>,
    fail_next_close: Option<String>,
    fail_transfers: Option<String>,
    invocations: VecDeque<ScriptedInvocation>,
    in_flight: usize,
}

fn lock(shared: &Mutex<FakeState>) -> MutexGuard<'_, FakeState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Transport double. Clones share state, so a test keeps one clone to script
/// results and inspect the [`Journal`].
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    shared: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose dependencies are missing.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let transport = Self::new();
        lock(&transport.shared).unavailable = Some(reason.into());
        transport
    }

    pub fn push_invocation(&self, invocation: ScriptedInvocation) {
        lock(&self.shared).invocations.push_back(invocation);
    }

    pub fn fail_next_open(&self, message: impl Into<String>) {
        lock(&self.shared).fail_next_open = Some(message.into());
    }

    pub fn fail_next_close(&self, message: impl Into<String>) {
        lock(&self.shared).fail_next_close = Some(message.into());
    }

    pub fn fail_transfers(&self, message: impl Into<String>) {
        lock(&self.shared).fail_transfers = Some(message.into());
    }

    /// Override the state reported by the open pool.
    pub fn set_pool_state(&self, state: RunspacePoolState) {
        lock(&self.shared).pool_state = Some(state);
    }

    pub fn journal(&self) -> Journal {
        lock(&self.shared).journal.clone()
    }
}

impl RunspaceTransport for FakeTransport {
    type Pool = FakePool;

    fn check_available(&self) -> Result<(), String> {
        lock(&self.shared).unavailable.clone().map_or(Ok(()), Err)
    }

    fn open(
        &self,
        info: &ConnectionInfo,
        host: Arc<dyn HostUi>,
    ) -> Result<Self::Pool, TransportError> {
        let mut state = lock(&self.shared);
        if let Some(message) = state.fail_next_open.take() {
            return Err(TransportError::new(message));
        }

        state.journal.opens += 1;
        state.journal.opened_with.push(info.clone());
        state.pool_state = None;

        Ok(FakePool {
            shared: Arc::clone(&self.shared),
            host,
        })
    }
}

pub struct FakePool {
    shared: Arc<Mutex<FakeState>>,
    host: Arc<dyn HostUi>,
}

impl std::fmt::Debug for FakePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakePool")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl RunspacePoolHandle for FakePool {
    type Pipeline = FakePipeline;

    fn state(&self) -> RunspacePoolState {
        lock(&self.shared)
            .pool_state
            .unwrap_or(RunspacePoolState::Opened)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let mut state = lock(&self.shared);
        if let Some(message) = state.fail_next_close.take() {
            return Err(TransportError::new(message));
        }

        state.journal.closes += 1;
        state.pool_state = Some(RunspacePoolState::Closed);
        Ok(())
    }

    fn create_pipeline(&mut self) -> Self::Pipeline {
        lock(&self.shared).journal.pipelines += 1;

        FakePipeline {
            shared: Arc::clone(&self.shared),
            host: Arc::clone(&self.host),
            scripts: Vec::new(),
            errors: Vec::new(),
            had_errors: false,
        }
    }

    fn copy_to_remote(&mut self, local: &Path, remote: &str) -> Result<(), TransportError> {
        let mut state = lock(&self.shared);
        if let Some(message) = state.fail_transfers.clone() {
            return Err(TransportError::new(message));
        }

        state
            .journal
            .copied_to_remote
            .push((local.to_path_buf(), remote.to_owned()));
        Ok(())
    }

    fn fetch_from_remote(&mut self, remote: &str, local: &Path) -> Result<(), TransportError> {
        let mut state = lock(&self.shared);
        if let Some(message) = state.fail_transfers.clone() {
            return Err(TransportError::new(message));
        }

        state
            .journal
            .fetched_from_remote
            .push((remote.to_owned(), local.to_path_buf()));
        Ok(())
    }
}

pub struct FakePipeline {
    shared: Arc<Mutex<FakeState>>,
    host: Arc<dyn HostUi>,
    scripts: Vec<String>,
    errors: Vec<String>,
    had_errors: bool,
}

impl std::fmt::Debug for FakePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakePipeline")
            .field("scripts", &self.scripts)
            .field("errors", &self.errors)
            .field("had_errors", &self.had_errors)
            .finish_non_exhaustive()
    }
}

impl PipelineHandle for FakePipeline {
    type Output = String;
    type ErrorRecord = String;

    fn add_script(&mut self, script: &str) {
        self.scripts.push(script.to_owned());
    }

    fn invoke(&mut self, input: &[String]) -> Result<Vec<String>, TransportError> {
        let invocation = {
            let mut state = lock(&self.shared);
            state.journal.scripts.extend(self.scripts.iter().cloned());
            state.journal.inputs.push(input.to_vec());
            state.in_flight += 1;
            state.journal.max_concurrent_invocations = state
                .journal
                .max_concurrent_invocations
                .max(state.in_flight);
            state.invocations.pop_front().unwrap_or_default()
        };

        if let Some(delay) = invocation.delay {
            std::thread::sleep(delay);
        }

        // Callbacks are delivered from a transport thread, not the caller's.
        let host = Arc::clone(&self.host);
        let calls = invocation.host_calls;
        let delivered = std::thread::spawn(move || {
            for call in calls {
                call.dispatch(host.as_ref());
            }
        })
        .join();

        lock(&self.shared).in_flight -= 1;
        delivered.map_err(|_| TransportError::new("host callback thread panicked"))?;

        self.errors = invocation.errors;
        self.had_errors = invocation.had_errors;

        match invocation.failure {
            Some(message) => Err(TransportError::new(message)),
            None => Ok(invocation.output),
        }
    }

    fn had_errors(&self) -> bool {
        self.had_errors
    }

    fn error_stream(&self) -> Vec<String> {
        self.errors.clone()
    }
}

/// Connection info of a plain HTTP WinRM endpoint.
pub fn fake_winrm_info() -> ConnectionInfo {
    let options = WinRmOptions::builder()
        .hostname("win01.example.com")
        .remote_user("admin")
        .remote_password("secret")
        .build();

    options
        .resolve()
        .map(ConnectionInfo::WsMan)
        .unwrap_or_else(|e| panic!("fake winrm options must resolve: {e}"))
}
