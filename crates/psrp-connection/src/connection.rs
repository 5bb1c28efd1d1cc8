use std::{
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use tracing::debug;

use crate::{
    command::CommandRequest,
    config::ConnectionOptions,
    connection_info::ConnectionInfo,
    error::ConnectionError,
    executor::{CommandExecutor, CommandResult},
    runspace::{RunspaceSession, SessionState},
    transport::RunspaceTransport,
};

/// A PowerShell remoting connection.
///
/// Owns exactly one [`RunspaceSession`]. Commands, file transfers, `close` and
/// `reset` are serialized, the underlying pipeline state is not reentrant.
#[derive(Debug)]
pub struct PsrpConnection<T: RunspaceTransport> {
    session: Mutex<RunspaceSession<T>>,
}

impl<T: RunspaceTransport> PsrpConnection<T> {
    /// Shell family of the remote end.
    pub const SHELL_TYPE: &'static str = "powershell";
    /// Module flavours this connection can run, in order of preference.
    pub const MODULE_IMPLEMENTATION_PREFERENCES: &'static [&'static str] = &[".ps1", ".exe", ""];
    pub const HAS_PIPELINING: bool = true;
    pub const ALLOW_EXECUTABLE: bool = false;

    /// Validate and resolve `options`, nothing is opened until first use.
    pub fn new(transport: T, options: &ConnectionOptions) -> Result<Self, ConnectionError> {
        options.validate()?;
        let info = options.resolve()?;
        Ok(Self::with_connection_info(transport, info))
    }

    pub fn with_connection_info(transport: T, info: ConnectionInfo) -> Self {
        Self {
            session: Mutex::new(RunspaceSession::new(transport, info)),
        }
    }

    fn session(&self) -> MutexGuard<'_, RunspaceSession<T>> {
        // Every session operation leaves it consistent, a panicking caller
        // cannot corrupt it.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn transport_name(&self) -> &'static str {
        self.session().transport_name()
    }

    pub fn is_connected(&self) -> bool {
        self.session().is_connected()
    }

    pub fn state(&self) -> SessionState {
        self.session().state()
    }

    /// Connecting is deferred to the first command or file transfer.
    pub fn connect(&self) -> Result<(), ConnectionError> {
        debug!(
            transport = self.transport_name(),
            "connect requested, runspace opens on first use"
        );
        Ok(())
    }

    /// Run `cmd`, piping `in_data` to it when present.
    pub fn exec_command(
        &self,
        cmd: &str,
        in_data: Option<&[u8]>,
    ) -> Result<CommandResult, ConnectionError> {
        let mut request = CommandRequest::parse(cmd)?;
        if let Some(in_data) = in_data {
            request = request.with_input(in_data);
        }

        CommandExecutor::execute(&mut *self.session(), &request)
    }

    pub fn put_file(&self, local: &Path, remote: &str) -> Result<(), ConnectionError> {
        CommandExecutor::put_file(&mut *self.session(), local, remote)
    }

    pub fn fetch_file(&self, remote: &str, local: &Path) -> Result<(), ConnectionError> {
        CommandExecutor::fetch_file(&mut *self.session(), remote, local)
    }

    pub fn close(&self) -> Result<(), ConnectionError> {
        self.session().close()
    }

    /// Replace a session presumed broken, e.g. after a fatal transport error.
    pub fn reset(&self) -> Result<(), ConnectionError> {
        self.session().reset()
    }
}
