use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use super::HostUi;

/// Everything the host collected during one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Accumulates the host UI writes and the exit signal of the remote interpreter.
///
/// One sink is owned by a session and reused across invocations. The executor
/// calls [`HostCallbackSink::drain`] after every command, which hands back the
/// collected text and resets the sink for the next call.
#[derive(Debug, Default)]
pub struct HostCallbackSink {
    inner: Mutex<HostOutput>,
}

impl HostCallbackSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn buffers(&self) -> MutexGuard<'_, HostOutput> {
        // The buffers are plain strings, a panic mid-write leaves them usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the collected output and reset buffers and exit code in one step.
    pub fn drain(&self) -> HostOutput {
        std::mem::take(&mut *self.buffers())
    }

    pub fn exit_code(&self) -> i32 {
        self.buffers().exit_code
    }

    pub fn is_empty(&self) -> bool {
        let buffers = self.buffers();
        buffers.stdout.is_empty() && buffers.stderr.is_empty() && buffers.exit_code == 0
    }

    fn push_stdout(&self, text: &str) {
        self.buffers().stdout.push_str(text);
    }

    fn push_tagged_line(&self, tag: &str, line: &str) {
        let mut buffers = self.buffers();
        buffers.stdout.push_str(tag);
        buffers.stdout.push_str(line);
        buffers.stdout.push('\n');
    }
}

impl HostUi for HostCallbackSink {
    fn write(&self, text: &str) {
        trace!(text_len = text.len(), newline = false, "host wrote text");
        self.push_stdout(text);
    }

    fn write_line(&self, line: Option<&str>) {
        trace!(newline = true, "host wrote line");
        let mut buffers = self.buffers();
        buffers.stdout.push_str(line.unwrap_or_default());
        buffers.stdout.push('\n');
    }

    fn write_debug_line(&self, line: &str) {
        self.push_tagged_line("DEBUG: ", line);
    }

    fn write_verbose_line(&self, line: &str) {
        self.push_tagged_line("VERBOSE: ", line);
    }

    fn write_warning_line(&self, line: &str) {
        self.push_tagged_line("WARNING: ", line);
    }

    fn write_error_line(&self, line: &str) {
        trace!(text_len = line.len(), "host wrote error line");
        let mut buffers = self.buffers();
        buffers.stderr.push_str(line);
        buffers.stderr.push('\n');
    }

    fn set_should_exit(&self, exit_code: i32) {
        trace!(exit_code, "host received exit signal");
        self.buffers().exit_code = exit_code;
    }
}
