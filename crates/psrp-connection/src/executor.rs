use std::{path::Path, sync::Arc};

use tracing::{debug, instrument, trace};

use crate::{
    command::CommandRequest,
    error::ConnectionError,
    host::HostCallbackSink,
    runspace::RunspaceSession,
    transport::{PipelineHandle, RunspacePoolHandle, RunspaceTransport},
};

/// Outcome of one command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub rc: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Return code of an invocation.
///
/// An exit code of 0 from the host is the same as no exit signal at all, so a
/// script that runs `exit 0` after writing errors still reports 1.
pub fn derive_exit_code(host_exit_code: i32, had_errors: bool) -> i32 {
    if host_exit_code != 0 {
        host_exit_code
    } else {
        i32::from(had_errors)
    }
}

/// Drains the host on every exit path of an invocation.
struct ResetHost<'a>(&'a HostCallbackSink);

impl Drop for ResetHost<'_> {
    fn drop(&mut self) {
        let _ = self.0.drain();
    }
}

/// Runs command requests and file transfers against a [`RunspaceSession`].
pub struct CommandExecutor;

impl CommandExecutor {
    #[instrument(skip_all, fields(transport = session.transport_name()))]
    pub fn execute<T: RunspaceTransport>(
        session: &mut RunspaceSession<T>,
        request: &CommandRequest,
    ) -> Result<CommandResult, ConnectionError> {
        let transport = session.transport_name();
        let host = Arc::clone(session.host());
        let _reset = ResetHost(&host);

        // Rejected before anything reaches the session.
        if let Some(interpreter) = request.shebang_interpreter() {
            return Err(ConnectionError::Execution(format!(
                "cannot run the interpreter '{interpreter}' on the {transport} connection plugin"
            )));
        }

        let input: Vec<String> = request.input_text().into_iter().collect();
        let script = request.script_body();

        let pool = session.get_or_open()?;
        let mut pipeline = pool.create_pipeline();

        debug!(%script, "PSRP: EXEC");
        pipeline.add_script(&script);

        let output = pipeline
            .invoke(&input)
            .map_err(|source| ConnectionError::Transport { transport, source })?;

        let host_output = host.drain();
        let rc = derive_exit_code(host_output.exit_code, pipeline.had_errors());

        let mut stdout: Vec<String> = output.iter().map(ToString::to_string).collect();
        if !host_output.stdout.is_empty() {
            stdout.push(host_output.stdout);
        }

        let mut stderr: Vec<String> = pipeline
            .error_stream()
            .iter()
            .map(ToString::to_string)
            .collect();
        if !host_output.stderr.is_empty() {
            stderr.push(host_output.stderr);
        }

        let stdout = stdout.join("\n");
        let stderr = stderr.join("\n");
        trace!(rc, "PSRP RC");
        trace!(%stdout, "PSRP STDOUT");
        trace!(%stderr, "PSRP STDERR");

        Ok(CommandResult {
            rc,
            stdout: stdout.into_bytes(),
            stderr: stderr.into_bytes(),
        })
    }

    /// Copy a local file to the remote host through the transport.
    #[instrument(skip(session), fields(transport = session.transport_name()))]
    pub fn put_file<T: RunspaceTransport>(
        session: &mut RunspaceSession<T>,
        local: &Path,
        remote: &str,
    ) -> Result<(), ConnectionError> {
        let transport = session.transport_name();
        session
            .get_or_open()?
            .copy_to_remote(local, remote)
            .map_err(|source| ConnectionError::Transfer { transport, source })
    }

    /// Copy a remote file to the local host through the transport.
    #[instrument(skip(session), fields(transport = session.transport_name()))]
    pub fn fetch_file<T: RunspaceTransport>(
        session: &mut RunspaceSession<T>,
        remote: &str,
        local: &Path,
    ) -> Result<(), ConnectionError> {
        let transport = session.transport_name();
        session
            .get_or_open()?
            .fetch_from_remote(remote, local)
            .map_err(|source| ConnectionError::Transfer { transport, source })
    }
}
